//! # Document Layout
//!
//! The structured, paginated form of an invoice document, produced before
//! any binary encoding.
//!
//! ## Page Anatomy (A4, millimetres from the top-left)
//! ```text
//! ┌───────────────────────────────────────────┐
//! │ INVOICE                 INV-20240315-0001 │  Header   (every page)
//! │                         Date / Due / SENT │
//! │───────────────────────────────────────────│
//! │ Bill To                                   │  Party    (first page)
//! │ Asha Traders                              │
//! │ accounts@asha.in                          │
//! │                                           │
//! │ #  Item         Category  Qty  Rate  Amt  │  ItemTable (split across pages)
//! │ 1  Widget       Product     2  100  200   │
//! │ ...                                       │
//! │                          Subtotal   200.00│  Summary  (after the table)
//! │                     Discount (10%)  -20.00│
//! │                       Total (INR)   180.00│
//! │ Notes                                     │  Notes    (after summary, may continue)
//! │                               Page 1 of 1 │  Footer   (every page)
//! └───────────────────────────────────────────┘
//! ```
//!
//! Geometry is configuration ([`PageLayout`]), never computed from content.
//! Content is what flows: table rows and notes continue on the next page
//! when the body budget is spent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Page Layout
// =============================================================================

/// Fixed page geometry.
///
/// Vertical space is budgeted in rows of `row_height_mm`: every block
/// between the header and the footer reports its cost through
/// [`Block::rows`], and a page holds at most `body_rows` of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    /// Vertical advance of one table row or text line.
    pub row_height_mm: f32,
    /// Rows available between the header and the footer.
    pub body_rows: usize,
    /// Characters per wrapped line of notes or contact details.
    pub line_chars: usize,
    /// Contact lines printed under the customer name; the rest is elided.
    pub max_contact_lines: usize,
}

impl PageLayout {
    /// A4 portrait with 15 mm margins.
    pub fn a4() -> Self {
        PageLayout {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_mm: 15.0,
            row_height_mm: 6.0,
            body_rows: 36,
            line_chars: 90,
            max_contact_lines: 6,
        }
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        PageLayout::a4()
    }
}

// =============================================================================
// Rendered Document
// =============================================================================

/// Paginated document ready for encoding.
///
/// Equality ignores `generated_at`, so two renders of the same snapshot
/// compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub title: String,
    pub layout: PageLayout,
    pub pages: Vec<Page>,
    pub generated_at: DateTime<Utc>,
}

impl PartialEq for RenderedDocument {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title && self.layout == other.layout && self.pages == other.pages
    }
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All blocks in reading order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.pages.iter().flat_map(|p| p.blocks.iter())
    }

    /// The displayed text of a summary line, looked up by label.
    pub fn summary_value(&self, label: &str) -> Option<&str> {
        self.blocks().find_map(|block| match block {
            Block::Summary { lines } => lines
                .iter()
                .find(|line| line.label == label)
                .map(|line| line.value.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based.
    pub number: usize,
    pub blocks: Vec<Block>,
}

impl Page {
    /// Body rows taken by this page's blocks.
    pub fn rows(&self) -> usize {
        self.blocks.iter().map(Block::rows).sum()
    }
}

/// One positioned region of a page, in top-to-bottom order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Header {
        title: String,
        invoice_number: String,
        invoice_date: String,
        due_date: Option<String>,
        status: String,
    },
    Party {
        heading: String,
        name: String,
        contact_lines: Vec<String>,
    },
    ItemTable {
        columns: Vec<String>,
        rows: Vec<TableRow>,
        /// True on pages after the first table page.
        continued: bool,
    },
    Summary {
        lines: Vec<SummaryLine>,
    },
    Notes {
        heading: String,
        lines: Vec<String>,
    },
    Footer {
        text: String,
    },
}

impl Block {
    /// Body rows this block occupies. Header and footer sit outside the
    /// body and cost nothing.
    pub fn rows(&self) -> usize {
        match self {
            Block::Header { .. } | Block::Footer { .. } => 0,
            // heading, name, trailing gap
            Block::Party { contact_lines, .. } => 3 + contact_lines.len(),
            Block::ItemTable { rows, continued, .. } => {
                Block::table_overhead(*continued) + rows.len()
            }
            // rule, gap
            Block::Summary { lines } => 2 + lines.len(),
            Block::Notes { lines, .. } => 1 + lines.len(),
        }
    }

    /// Rows an item table needs besides its item rows.
    pub fn table_overhead(continued: bool) -> usize {
        if continued {
            3
        } else {
            2
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub index: usize,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub quantity: String,
    pub rate: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub label: String,
    pub value: String,
    /// Printed bold (the grand total).
    pub emphasis: bool,
}
