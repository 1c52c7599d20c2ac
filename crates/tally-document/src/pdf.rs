//! # PDF Encoder
//!
//! Draws a [`RenderedDocument`] with printpdf's builtin Helvetica faces.
//!
//! Builtin fonts only cover WinAnsi, so amounts are printed without the
//! rupee sign (column headings carry the currency) and characters outside
//! Latin-1 are replaced with `?`.

use std::cell::Cell;
use std::io::BufWriter;

use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};
use tracing::debug;

use crate::error::EncodeError;
use crate::export::DocumentEncoder;
use crate::layout::{Block, Page, PageLayout, RenderedDocument, SummaryLine, TableRow};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Column x offsets (mm from the left margin) of the item table.
const COLUMN_OFFSETS: [f32; 6] = [0.0, 10.0, 85.0, 115.0, 130.0, 155.0];

/// Characters that fit in the item column.
const ITEM_COLUMN_CHARS: usize = 42;

/// Encodes documents as PDF.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfEncoder;

impl PdfEncoder {
    pub fn new() -> Self {
        PdfEncoder
    }
}

impl DocumentEncoder for PdfEncoder {
    fn content_type(&self) -> &'static str {
        PDF_CONTENT_TYPE
    }

    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn encode(&self, document: &RenderedDocument) -> Result<Vec<u8>, EncodeError> {
        let layout = &document.layout;
        let width = Mm(layout.page_width_mm);
        let height = Mm(layout.page_height_mm);

        let (doc, first_page, first_layer) = PdfDocument::new(document.title.clone(), width, height, "Layer 1");
        let fonts = Fonts {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(EncodeError::new)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(EncodeError::new)?,
        };

        for (i, page) in document.pages.iter().enumerate() {
            let layer = if i == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_index, layer_index) = doc.add_page(width, height, "Layer 1");
                doc.get_page(page_index).get_layer(layer_index)
            };
            PageWriter::new(layer, &fonts, layout).draw(page)?;
        }

        let mut writer = BufWriter::new(Vec::<u8>::new());
        doc.save(&mut writer).map_err(EncodeError::new)?;
        let bytes = writer.into_inner().map_err(EncodeError::new)?;

        debug!(pages = document.pages.len(), bytes = bytes.len(), "PDF encoded");
        Ok(bytes)
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Top-down cursor over one page.
///
/// Nothing is drawn below the bottom margin; reaching it fails the page
/// instead of clipping content.
struct PageWriter<'a> {
    layer: PdfLayerReference,
    fonts: &'a Fonts,
    layout: &'a PageLayout,
    y: f32,
    overflowed: Cell<bool>,
}

impl<'a> PageWriter<'a> {
    fn new(layer: PdfLayerReference, fonts: &'a Fonts, layout: &'a PageLayout) -> Self {
        PageWriter {
            layer,
            fonts,
            layout,
            y: layout.page_height_mm - layout.margin_mm,
            overflowed: Cell::new(false),
        }
    }

    /// False (and remembered) once the cursor is below the bottom margin.
    fn in_bounds(&self) -> bool {
        let ok = self.y >= self.layout.margin_mm;
        if !ok {
            self.overflowed.set(true);
        }
        ok
    }

    fn left(&self) -> f32 {
        self.layout.margin_mm
    }

    fn right(&self) -> f32 {
        self.layout.page_width_mm - self.layout.margin_mm
    }

    fn draw(&mut self, page: &Page) -> Result<(), EncodeError> {
        for block in &page.blocks {
            match block {
                Block::Header {
                    title,
                    invoice_number,
                    invoice_date,
                    due_date,
                    status,
                } => {
                    self.text(title, 20.0, self.left(), true);
                    self.text_right(invoice_number, 11.0, self.right(), true);
                    self.y -= 7.0;
                    self.text_right(&format!("Date: {}", invoice_date), 9.0, self.right(), false);
                    if let Some(due) = due_date {
                        self.y -= 5.0;
                        self.text_right(&format!("Due: {}", due), 9.0, self.right(), false);
                    }
                    self.y -= 5.0;
                    self.text_right(&format!("Status: {}", status), 9.0, self.right(), false);
                    self.y -= 4.0;
                    self.rule();
                    self.y -= 8.0;
                }
                Block::Party {
                    heading,
                    name,
                    contact_lines,
                } => {
                    self.text(heading, 9.0, self.left(), true);
                    self.y -= 5.5;
                    self.text(name, 11.0, self.left(), true);
                    for line in contact_lines {
                        self.y -= 5.0;
                        self.text(line, 9.0, self.left(), false);
                    }
                    self.y -= 10.0;
                }
                Block::ItemTable {
                    columns,
                    rows,
                    continued,
                } => self.table(columns, rows, *continued),
                Block::Summary { lines } => self.summary(lines),
                Block::Notes { heading, lines } => {
                    self.y -= 4.0;
                    self.text(heading, 9.0, self.left(), true);
                    for line in lines {
                        self.y -= 5.0;
                        self.text(line, 9.0, self.left(), false);
                    }
                }
                Block::Footer { text } => {
                    let y = self.layout.margin_mm - 5.0;
                    self.layer.use_text(
                        sanitize(text),
                        8.0,
                        Mm(self.right() - approx_width_mm(text, 8.0)),
                        Mm(y),
                        &self.fonts.regular,
                    );
                }
            }
        }
        if self.overflowed.get() {
            return Err(EncodeError::new(format!(
                "page {} overflows the bottom margin",
                page.number
            )));
        }
        Ok(())
    }

    fn table(&mut self, columns: &[String], rows: &[TableRow], continued: bool) {
        let left = self.left();
        if continued {
            self.text("(continued)", 8.0, left, false);
            self.y -= 5.0;
        }
        for (i, column) in columns.iter().enumerate() {
            let x = left + COLUMN_OFFSETS.get(i).copied().unwrap_or(0.0);
            self.text(column, 9.0, x, true);
        }
        self.y -= 2.5;
        self.rule();
        self.y -= self.layout.row_height_mm - 1.5;

        for row in rows {
            let item = match &row.description {
                Some(description) => format!("{} - {}", row.name, description),
                None => row.name.clone(),
            };
            self.text(&row.index.to_string(), 9.0, left + COLUMN_OFFSETS[0], false);
            self.text(&truncate(&item, ITEM_COLUMN_CHARS), 9.0, left + COLUMN_OFFSETS[1], false);
            self.text(&row.category, 9.0, left + COLUMN_OFFSETS[2], false);
            self.text(&row.quantity, 9.0, left + COLUMN_OFFSETS[3], false);
            self.text(&row.rate, 9.0, left + COLUMN_OFFSETS[4], false);
            self.text_right(&row.amount, 9.0, self.right(), false);
            self.y -= self.layout.row_height_mm;
        }
        self.y -= 2.0;
    }

    fn summary(&mut self, lines: &[SummaryLine]) {
        self.rule();
        self.y -= 6.0;
        let label_x = self.left() + COLUMN_OFFSETS[4] - 25.0;
        for line in lines {
            let size = if line.emphasis { 11.0 } else { 9.5 };
            self.text(&line.label, size, label_x, line.emphasis);
            self.text_right(&line.value, size, self.right(), line.emphasis);
            self.y -= self.layout.row_height_mm;
        }
    }

    fn text(&self, text: &str, size: f32, x: f32, bold: bool) {
        if !self.in_bounds() {
            return;
        }
        let font = if bold { &self.fonts.bold } else { &self.fonts.regular };
        self.layer.use_text(sanitize(text), size, Mm(x), Mm(self.y), font);
    }

    fn text_right(&self, text: &str, size: f32, right: f32, bold: bool) {
        self.text(text, size, right - approx_width_mm(text, size), bold);
    }

    fn rule(&self) {
        if !self.in_bounds() {
            return;
        }
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(self.left()), Mm(self.y)), false),
                (Point::new(Mm(self.right()), Mm(self.y)), false),
            ],
            is_closed: false,
        });
    }
}

/// Rough Helvetica advance: digits are 0.556 em, other glyphs ~0.5 em.
fn approx_width_mm(text: &str, size: f32) -> f32 {
    const PT_TO_MM: f32 = 0.3528;
    let ems: f32 = text
        .chars()
        .map(|c| if c.is_ascii_digit() { 0.556 } else { 0.5 })
        .sum();
    ems * size * PT_TO_MM
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) <= 0xFF && !c.is_control() { c } else { '?' })
        .collect()
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
        out.push_str("...");
        out
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render, RenderOptions};
    use chrono::NaiveDate;
    use tally_core::pricing::calculate;
    use tally_core::{Category, Customer, InvoiceItem, InvoiceSnapshot, InvoiceStatus, ItemId, LineItem, Money, Percentage};

    fn snapshot(count: usize) -> InvoiceSnapshot {
        let items: Vec<LineItem> = (0..count)
            .map(|i| LineItem {
                id: ItemId(i as u64 + 1),
                name: format!("Consulting hour {}", i + 1),
                description: Some("Remote".to_string()),
                category: Category::Consulting,
                quantity: 1,
                rate: Money::from_cents(250_000),
            })
            .collect();
        InvoiceSnapshot {
            invoice_number: "INV-20240315-0007".to_string(),
            status: InvoiceStatus::Draft,
            invoice_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            due_date: None,
            customer: Customer {
                name: "Ravi Kumar".to_string(),
                ..Customer::default()
            },
            items: items.iter().map(InvoiceItem::from).collect(),
            discount: Percentage::zero(),
            tax_rate: Percentage::from_percent(18),
            totals: calculate(&items, Percentage::zero(), Percentage::from_percent(18)),
            notes: Some("Thank you".to_string()),
        }
    }

    #[test]
    fn test_encode_produces_pdf() {
        let doc = render(&snapshot(3), &RenderOptions::default()).unwrap();
        let bytes = PdfEncoder::new().encode(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn test_encode_multi_page() {
        let doc = render(&snapshot(80), &RenderOptions::default()).unwrap();
        assert!(doc.page_count() > 2);
        let bytes = PdfEncoder::new().encode(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_long_notes_stay_inside_margins() {
        let mut snapshot = snapshot(12);
        snapshot.notes = Some((1..=60).map(|i| format!("Clause {}", i)).collect::<Vec<_>>().join("\n"));
        let doc = render(&snapshot, &RenderOptions::default()).unwrap();
        assert!(doc.page_count() >= 2);
        let bytes = PdfEncoder::new().encode(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_overfull_page_is_an_error() {
        let mut doc = render(&snapshot(1), &RenderOptions::default()).unwrap();
        doc.pages[0].blocks.insert(
            1,
            Block::Notes {
                heading: "Notes".to_string(),
                lines: vec!["x".to_string(); 80],
            },
        );
        let err = PdfEncoder::new().encode(&doc).unwrap_err();
        assert!(err.to_string().contains("page 1"));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Café ₹10"), "Café ?10");
        assert_eq!(sanitize("a\tb"), "a?b");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_right_alignment_width_grows_with_text() {
        assert!(approx_width_mm("1,00,000.00", 9.0) > approx_width_mm("0.00", 9.0));
    }
}
