//! # Document Renderer
//!
//! Turns an [`InvoiceSnapshot`] into a [`RenderedDocument`].
//!
//! ## Pagination
//! ```text
//! page 1:  Party │ ItemTable ........................│
//! page 2:        │ ItemTable (continued) ............│ Summary │ Notes
//! page 3:                                                      │ Notes (continued)
//!
//! Each page body holds `body_rows`. Blocks are placed in order; item rows
//! and note lines spill onto a new page when the budget runs out, and the
//! summary moves whole to a fresh page when it does not fit.
//! ```
//!
//! Rendering is pure apart from `generated_at`.

use chrono::{NaiveDate, Utc};

use crate::error::RenderError;
use crate::layout::{Block, Page, PageLayout, RenderedDocument, SummaryLine, TableRow};
use tally_core::{InvoiceItem, InvoiceSnapshot};

/// Column headings of the item table.
pub const ITEM_COLUMNS: [&str; 6] = ["#", "Item", "Category", "Qty", "Rate (INR)", "Amount (INR)"];

/// Label of the grand-total summary line.
pub const TOTAL_LABEL: &str = "Total (INR)";

/// Smallest body that still fits a full party block, a one-row table and
/// the summary.
const MIN_BODY_ROWS: usize = 16;

/// Presentation options.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub title: String,
    pub layout: PageLayout,
    pub party_heading: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            title: "INVOICE".to_string(),
            layout: PageLayout::a4(),
            party_heading: "Bill To".to_string(),
        }
    }
}

/// Lays out a snapshot into pages.
///
/// ## Errors
/// `MissingField` when the invoice number or customer name is blank.
pub fn render(snapshot: &InvoiceSnapshot, options: &RenderOptions) -> Result<RenderedDocument, RenderError> {
    if snapshot.invoice_number.trim().is_empty() {
        return Err(RenderError::MissingField("invoice number"));
    }
    if snapshot.customer.name.trim().is_empty() {
        return Err(RenderError::MissingField("customer name"));
    }

    let layout = &options.layout;
    let mut flow = Flow::new(layout.body_rows.max(MIN_BODY_ROWS).max(layout.max_contact_lines + 10));

    flow.push(Block::Party {
        heading: options.party_heading.clone(),
        name: snapshot.customer.name.trim().to_string(),
        contact_lines: contact_lines(&snapshot.customer.contact_lines(), layout),
    });

    let mut rows = snapshot
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| table_row(i + 1, item))
        .peekable();
    let mut continued = false;
    loop {
        let overhead = Block::table_overhead(continued);
        let room = flow.remaining().saturating_sub(overhead);
        let chunk: Vec<TableRow> = rows.by_ref().take(room).collect();
        flow.push(Block::ItemTable {
            columns: ITEM_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: chunk,
            continued,
        });
        if rows.peek().is_none() {
            break;
        }
        flow.break_page();
        continued = true;
    }

    let summary = summary_block(snapshot);
    if flow.remaining() < summary.rows() {
        flow.break_page();
    }
    flow.push(summary);

    let mut notes = notes_lines(snapshot.notes.as_deref(), layout.line_chars).into_iter().peekable();
    let mut heading = "Notes";
    while notes.peek().is_some() {
        // heading plus at least one line
        if flow.remaining() < 2 {
            flow.break_page();
        }
        let lines: Vec<String> = notes.by_ref().take(flow.remaining() - 1).collect();
        flow.push(Block::Notes {
            heading: heading.to_string(),
            lines,
        });
        heading = "Notes (continued)";
    }

    let header = header_block(snapshot, &options.title);
    let page_total = flow.pages.len();
    let pages = flow
        .pages
        .into_iter()
        .enumerate()
        .map(|(i, body)| {
            let number = i + 1;
            let mut blocks = Vec::with_capacity(body.len() + 2);
            blocks.push(header.clone());
            blocks.extend(body);
            blocks.push(Block::Footer {
                text: format!("Page {} of {}", number, page_total),
            });
            Page { number, blocks }
        })
        .collect();

    Ok(RenderedDocument {
        title: options.title.clone(),
        layout: layout.clone(),
        pages,
        generated_at: Utc::now(),
    })
}

/// Page bodies being filled top to bottom.
struct Flow {
    capacity: usize,
    used: usize,
    pages: Vec<Vec<Block>>,
}

impl Flow {
    fn new(capacity: usize) -> Self {
        Flow {
            capacity,
            used: 0,
            pages: vec![Vec::new()],
        }
    }

    fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.used)
    }

    fn push(&mut self, block: Block) {
        self.used += block.rows();
        if let Some(page) = self.pages.last_mut() {
            page.push(block);
        }
    }

    fn break_page(&mut self) {
        self.pages.push(Vec::new());
        self.used = 0;
    }
}

fn header_block(snapshot: &InvoiceSnapshot, title: &str) -> Block {
    Block::Header {
        title: title.to_string(),
        invoice_number: snapshot.invoice_number.trim().to_string(),
        invoice_date: display_date(snapshot.invoice_date),
        due_date: snapshot.due_date.map(display_date),
        status: snapshot.status.label().to_string(),
    }
}

fn table_row(index: usize, item: &InvoiceItem) -> TableRow {
    TableRow {
        index,
        name: item.name.clone(),
        description: item.description.clone(),
        category: item.category.to_string(),
        quantity: item.quantity.to_string(),
        rate: item.rate.format_amount(),
        amount: item.total.format_amount(),
    }
}

fn summary_block(snapshot: &InvoiceSnapshot) -> Block {
    let totals = &snapshot.totals;
    let mut lines = vec![
        SummaryLine {
            label: "Subtotal".to_string(),
            value: totals.subtotal.format_amount(),
            emphasis: false,
        },
        SummaryLine {
            label: format!("Discount ({})", snapshot.discount),
            value: (-totals.discount_amount).format_amount(),
            emphasis: false,
        },
    ];
    if !snapshot.tax_rate.is_zero() {
        lines.push(SummaryLine {
            label: format!("Tax ({})", snapshot.tax_rate),
            value: totals.tax_amount.format_amount(),
            emphasis: false,
        });
    }
    lines.push(SummaryLine {
        label: TOTAL_LABEL.to_string(),
        value: totals.total.format_amount(),
        emphasis: true,
    });
    Block::Summary { lines }
}

fn notes_lines(notes: Option<&str>, width: usize) -> Vec<String> {
    let Some(text) = notes else {
        return Vec::new();
    };
    if text.trim().is_empty() {
        return Vec::new();
    }
    text.trim_end().lines().flat_map(|line| wrap(line, width)).collect()
}

/// Wrapped contact details, elided past `max_contact_lines`.
fn contact_lines(lines: &[String], layout: &PageLayout) -> Vec<String> {
    let mut wrapped: Vec<String> = lines.iter().flat_map(|line| wrap(line, layout.line_chars)).collect();
    let max = layout.max_contact_lines.max(1);
    if wrapped.len() > max {
        wrapped.truncate(max);
        if let Some(last) = wrapped.last_mut() {
            last.push_str(" ...");
        }
    }
    wrapped
}

/// Greedy word wrap. Words longer than `width` are split; a blank line
/// stays one blank line.
fn wrap(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > width {
            if current_len > 0 {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            out.push(chars.drain(..width).collect());
        }
        let len = chars.len();
        if current_len > 0 && current_len + 1 + len > width {
            out.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(chars);
        current_len += len;
    }
    if current_len > 0 || out.is_empty() {
        out.push(current);
    }
    out
}

/// `15 Mar 2024`.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::pricing::calculate;
    use tally_core::{Category, Customer, InvoiceStatus, ItemId, LineItem, Money, Percentage};

    fn snapshot_with(count: usize, discount: i64, tax: i64, notes: Option<&str>) -> InvoiceSnapshot {
        let items: Vec<LineItem> = (0..count)
            .map(|i| LineItem {
                id: ItemId(i as u64 + 1),
                name: format!("Item {}", i + 1),
                description: None,
                category: Category::Service,
                quantity: 2,
                rate: Money::from_cents(10_000),
            })
            .collect();
        let discount = Percentage::from_bps(discount);
        let tax_rate = Percentage::from_bps(tax);
        InvoiceSnapshot {
            invoice_number: "INV-20240315-0001".to_string(),
            status: InvoiceStatus::Sent,
            invoice_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 4, 14),
            customer: Customer {
                name: "Asha Traders".to_string(),
                email: Some("accounts@asha.in".to_string()),
                phone: None,
                address: Some("12 MG Road\nPune".to_string()),
            },
            items: items.iter().map(InvoiceItem::from).collect(),
            discount,
            tax_rate,
            totals: calculate(&items, discount, tax_rate),
            notes: notes.map(str::to_string),
        }
    }

    fn summary_labels(doc: &RenderedDocument) -> Vec<String> {
        doc.blocks()
            .find_map(|b| match b {
                Block::Summary { lines } => Some(lines.iter().map(|l| l.label.clone()).collect()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_render_single_page() {
        let doc = render(&snapshot_with(1, 1000, 0, None), &RenderOptions::default()).unwrap();
        assert_eq!(doc.page_count(), 1);

        let page = &doc.pages[0];
        assert!(matches!(page.blocks[0], Block::Header { .. }));
        match &page.blocks[1] {
            Block::Party { name, contact_lines, .. } => {
                assert_eq!(name, "Asha Traders");
                assert_eq!(contact_lines, &vec!["accounts@asha.in", "12 MG Road", "Pune"]);
            }
            other => panic!("expected party, got {:?}", other),
        }
        assert_eq!(
            page.blocks.last(),
            Some(&Block::Footer {
                text: "Page 1 of 1".to_string()
            })
        );
    }

    #[test]
    fn test_summary_lines() {
        // subtotal 200.00, 10% discount, no tax
        let doc = render(&snapshot_with(1, 1000, 0, None), &RenderOptions::default()).unwrap();
        assert_eq!(summary_labels(&doc), vec!["Subtotal", "Discount (10%)", TOTAL_LABEL]);
        assert_eq!(doc.summary_value("Subtotal"), Some("200.00"));
        assert_eq!(doc.summary_value("Discount (10%)"), Some("-20.00"));
        assert_eq!(doc.summary_value(TOTAL_LABEL), Some("180.00"));

        let taxed = render(&snapshot_with(1, 0, 1800, None), &RenderOptions::default()).unwrap();
        assert_eq!(
            summary_labels(&taxed),
            vec!["Subtotal", "Discount (0%)", "Tax (18%)", TOTAL_LABEL]
        );
        assert_eq!(taxed.summary_value("Tax (18%)"), Some("36.00"));
    }

    #[test]
    fn test_displayed_total_round_trips() {
        for (count, discount, tax) in [(1, 0, 0), (3, 1250, 1800), (7, 333, 825), (40, 5000, 2800)] {
            let snapshot = snapshot_with(count, discount, tax, None);
            let doc = render(&snapshot, &RenderOptions::default()).unwrap();
            let shown = doc.summary_value(TOTAL_LABEL).unwrap();
            assert_eq!(Money::parse(shown).unwrap(), snapshot.totals.total);
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let snapshot = snapshot_with(30, 1000, 1800, Some("Thanks!"));
        let a = render(&snapshot, &RenderOptions::default()).unwrap();
        let b = render(&snapshot, &RenderOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    /// Item rows that fit on page one under the three-line party block of
    /// `snapshot_with`.
    fn first_page_item_rows(layout: &PageLayout) -> usize {
        layout.body_rows - (3 + 3) - Block::table_overhead(false)
    }

    fn assert_within_budget(doc: &RenderedDocument) {
        for page in &doc.pages {
            assert!(
                page.rows() <= doc.layout.body_rows,
                "page {} uses {} of {} rows",
                page.number,
                page.rows(),
                doc.layout.body_rows
            );
        }
    }

    #[test]
    fn test_rows_split_across_pages() {
        let layout = PageLayout::a4();
        let count = first_page_item_rows(&layout) + 5;
        let doc = render(&snapshot_with(count, 0, 0, None), &RenderOptions::default()).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_within_budget(&doc);

        let rows: Vec<&TableRow> = doc
            .blocks()
            .filter_map(|b| match b {
                Block::ItemTable { rows, .. } => Some(rows.iter()),
                _ => None,
            })
            .flatten()
            .collect();
        assert_eq!(rows.len(), count);
        assert_eq!(rows.last().unwrap().index, count);

        match &doc.pages[1].blocks[1] {
            Block::ItemTable { continued, rows, .. } => {
                assert!(*continued);
                assert_eq!(rows.len(), 5);
            }
            other => panic!("expected table, got {:?}", other),
        }
        assert_eq!(
            doc.pages[1].blocks.last(),
            Some(&Block::Footer {
                text: "Page 2 of 2".to_string()
            })
        );
    }

    #[test]
    fn test_summary_moves_to_new_page_when_full() {
        let layout = PageLayout::a4();
        let doc = render(
            &snapshot_with(first_page_item_rows(&layout), 0, 0, None),
            &RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_within_budget(&doc);
        assert!(!doc.pages[1]
            .blocks
            .iter()
            .any(|b| matches!(b, Block::ItemTable { .. })));
        assert!(doc.pages[1].blocks.iter().any(|b| matches!(b, Block::Summary { .. })));
    }

    #[test]
    fn test_long_notes_continue_on_next_pages() {
        let notes: Vec<String> = (1..=45).map(|i| format!("Term {}: goods once sold are not returnable", i)).collect();
        let snapshot = snapshot_with(10, 0, 0, Some(&notes.join("\n")));
        let doc = render(&snapshot, &RenderOptions::default()).unwrap();

        assert!(doc.page_count() >= 2);
        assert_within_budget(&doc);

        let printed: Vec<String> = doc
            .blocks()
            .filter_map(|b| match b {
                Block::Notes { lines, .. } => Some(lines.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        assert_eq!(printed, notes);

        let headings: Vec<&str> = doc
            .blocks()
            .filter_map(|b| match b {
                Block::Notes { heading, .. } => Some(heading.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(headings[0], "Notes");
        assert!(headings[1..].iter().all(|h| *h == "Notes (continued)"));
        assert!(doc.pages.last().unwrap().blocks.iter().any(|b| matches!(b, Block::Notes { .. })));
    }

    #[test]
    fn test_long_note_lines_are_wrapped() {
        let paragraph = "word ".repeat(60);
        let doc = render(&snapshot_with(1, 0, 0, Some(&paragraph)), &RenderOptions::default()).unwrap();
        let width = doc.layout.line_chars;
        let lines: Vec<String> = doc
            .blocks()
            .filter_map(|b| match b {
                Block::Notes { lines, .. } => Some(lines.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= width));
        assert_eq!(lines.join(" ").split_whitespace().count(), 60);
    }

    #[test]
    fn test_long_address_is_counted_and_capped() {
        let mut snapshot = snapshot_with(60, 0, 0, None);
        snapshot.customer.address = Some((1..=20).map(|i| format!("Line {}", i)).collect::<Vec<_>>().join("\n"));
        let doc = render(&snapshot, &RenderOptions::default()).unwrap();
        assert_within_budget(&doc);

        let layout = PageLayout::a4();
        match &doc.pages[0].blocks[1] {
            Block::Party { contact_lines, .. } => {
                assert_eq!(contact_lines.len(), layout.max_contact_lines);
                assert!(contact_lines.last().unwrap().ends_with("..."));
            }
            other => panic!("expected party, got {:?}", other),
        }
        let rows: usize = doc
            .blocks()
            .filter_map(|b| match b {
                Block::ItemTable { rows, .. } => Some(rows.len()),
                _ => None,
            })
            .sum();
        assert_eq!(rows, 60);
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("", 10), vec![""]);
        assert_eq!(wrap("alpha beta gamma", 11), vec!["alpha beta", "gamma"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_notes_rendered_on_last_page() {
        let doc = render(
            &snapshot_with(2, 0, 0, Some("Pay within 30 days\nBank: HDFC")),
            &RenderOptions::default(),
        )
        .unwrap();
        let notes = doc.pages[0].blocks.iter().find_map(|b| match b {
            Block::Notes { lines, .. } => Some(lines.clone()),
            _ => None,
        });
        assert_eq!(notes, Some(vec!["Pay within 30 days".to_string(), "Bank: HDFC".to_string()]));

        let blank = render(&snapshot_with(2, 0, 0, Some("  ")), &RenderOptions::default()).unwrap();
        assert!(!blank.blocks().any(|b| matches!(b, Block::Notes { .. })));
    }

    #[test]
    fn test_missing_fields_rejected() {
        let mut snapshot = snapshot_with(1, 0, 0, None);
        snapshot.customer.name = "   ".to_string();
        assert_eq!(
            render(&snapshot, &RenderOptions::default()),
            Err(RenderError::MissingField("customer name"))
        );

        let mut snapshot = snapshot_with(1, 0, 0, None);
        snapshot.invoice_number = String::new();
        assert_eq!(
            render(&snapshot, &RenderOptions::default()),
            Err(RenderError::MissingField("invoice number"))
        );
    }

    #[test]
    fn test_empty_items_still_one_page() {
        let doc = render(&snapshot_with(0, 0, 0, None), &RenderOptions::default()).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.summary_value(TOTAL_LABEL), Some("0.00"));
    }

    #[test]
    fn test_header_dates() {
        let doc = render(&snapshot_with(1, 0, 0, None), &RenderOptions::default()).unwrap();
        match &doc.pages[0].blocks[0] {
            Block::Header {
                invoice_date,
                due_date,
                status,
                ..
            } => {
                assert_eq!(invoice_date, "15 Mar 2024");
                assert_eq!(due_date.as_deref(), Some("14 Apr 2024"));
                assert_eq!(status, "SENT");
            }
            other => panic!("expected header, got {:?}", other),
        }
    }
}
