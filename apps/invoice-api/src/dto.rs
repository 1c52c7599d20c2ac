//! Request and response bodies.
//!
//! Incoming invoice forms are replayed through the draft reducer
//! (`tally_core::editor`), so the HTTP path applies the same clamping,
//! item rules and validation as the authoring form.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use tally_core::editor::{apply, DraftEvent, DraftState};
use tally_core::ledger::ItemUpdate;
use tally_core::status::is_past_due;
use tally_core::validation::{validate_page_size, validate_search_query, ValidationReport};
use tally_core::{non_blank, Invoice, InvoiceDraft, InvoiceStatus, Percentage, Totals};
use tally_db::{ListQuery, Pagination, SavedDraft};

// =============================================================================
// Envelope
// =============================================================================

/// `{ "success": true, "data": ... }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse { success: true, data }
    }
}

// =============================================================================
// Invoice Form
// =============================================================================

/// A decimal sent either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DecimalInput {
    Number(serde_json::Number),
    Text(String),
}

impl DecimalInput {
    /// Plain decimal text. Floats are printed without exponent or a
    /// trailing `.0`, so `2.0` and `1e2` read as `2` and `100`.
    fn as_text(&self) -> String {
        match self {
            DecimalInput::Number(n) if n.is_f64() => match n.as_f64() {
                Some(value) if value.is_finite() => value.to_string(),
                _ => n.to_string(),
            },
            DecimalInput::Number(n) => n.to_string(),
            DecimalInput::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemInput {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<DecimalInput>,
    pub rate: Option<DecimalInput>,
}

/// The authoring form as posted by the UI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceForm {
    pub customer: CustomerInput,
    pub invoice_date: Option<NaiveDate>,
    pub discount: Option<DecimalInput>,
    pub tax_rate: Option<DecimalInput>,
    pub notes: Option<String>,
    pub items: Vec<ItemInput>,
}

impl InvoiceForm {
    /// Replays the form into a draft state.
    ///
    /// Malformed numbers and unknown categories are rejected here; missing
    /// customer or item data is left for validation to report.
    pub fn into_state(self, today: NaiveDate) -> ApiResult<DraftState> {
        let mut state = DraftState::new(self.invoice_date.unwrap_or(today));

        let mut events = vec![
            DraftEvent::SetCustomerName(self.customer.name),
            DraftEvent::SetCustomerEmail(self.customer.email.unwrap_or_default()),
            DraftEvent::SetCustomerPhone(self.customer.phone.unwrap_or_default()),
            DraftEvent::SetCustomerAddress(self.customer.address.unwrap_or_default()),
            DraftEvent::SetNotes(self.notes.unwrap_or_default()),
        ];
        if let Some(discount) = self.discount {
            events.push(DraftEvent::SetDiscount(Percentage::parse(&discount.as_text())?));
        }
        if let Some(tax_rate) = self.tax_rate {
            events.push(DraftEvent::SetTaxRate(Percentage::parse(&tax_rate.as_text())?));
        }
        for event in events {
            state = apply(&state, event)?;
        }

        // The fresh form already holds one blank row.
        for (i, item) in self.items.into_iter().enumerate() {
            if i > 0 {
                state = apply(&state, DraftEvent::AddItem)?;
            }
            let id = state
                .draft
                .ledger
                .items()
                .last()
                .map(|line| line.id)
                .ok_or_else(|| ApiError::internal("Draft has no line items"))?;

            let mut updates = vec![
                ItemUpdate::Name(item.name),
                ItemUpdate::Description(item.description.and_then(non_blank)),
            ];
            if let Some(category) = item.category {
                updates.push(ItemUpdate::parse("category", &category)?);
            }
            if let Some(quantity) = item.quantity {
                updates.push(ItemUpdate::parse("quantity", &quantity.as_text())?);
            }
            if let Some(rate) = item.rate {
                updates.push(ItemUpdate::parse("rate", &rate.as_text())?);
            }
            for update in updates {
                state = apply(&state, DraftEvent::UpdateItem { id, update })?;
            }
        }

        Ok(state)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

// =============================================================================
// Listing
// =============================================================================

/// Query string of `GET /api/invoices`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ListParams {
    pub fn into_query(self, max_page_size: u32) -> ApiResult<ListQuery> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(raw.parse::<InvoiceStatus>()?),
        };
        let search = match self.search {
            Some(raw) => validate_search_query(&raw)?,
            None => None,
        };

        let mut query = ListQuery {
            page: self.page.unwrap_or(1).max(1),
            limit: validate_page_size(self.limit, max_page_size)?,
            search,
            status,
            ..ListQuery::default()
        };
        if let Some(sort_by) = self.sort_by.filter(|s| !s.is_empty()) {
            query.sort_by = sort_by.parse()?;
        }
        if let Some(sort_order) = self.sort_order.filter(|s| !s.is_empty()) {
            query.sort_order = sort_order.parse()?;
        }
        Ok(query)
    }
}

/// An invoice plus fields derived for the dashboard.
/// An invoice on the wire.
///
/// Money fields of the flattened invoice are integer paise and percentages
/// are integer basis points. `decimals` repeats them as decimal strings in
/// rupees and percent (`"180.00"`, `"12.5"`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub is_past_due: bool,
    pub decimals: DecimalAmounts,
}

impl InvoiceView {
    pub fn new(invoice: Invoice, today: NaiveDate) -> Self {
        let is_past_due = is_past_due(invoice.status, invoice.due_date, today);
        let decimals = DecimalAmounts::of(&invoice);
        InvoiceView {
            invoice,
            is_past_due,
            decimals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecimalAmounts {
    pub subtotal: String,
    pub discount: String,
    pub discount_amount: String,
    pub tax_rate: String,
    pub tax_amount: String,
    pub total: String,
}

impl DecimalAmounts {
    fn of(invoice: &Invoice) -> Self {
        DecimalAmounts {
            subtotal: invoice.subtotal.to_decimal_string(),
            discount: invoice.discount.to_decimal_string(),
            discount_amount: invoice.discount_amount.to_decimal_string(),
            tax_rate: invoice.tax_rate.to_decimal_string(),
            tax_amount: invoice.tax_amount.to_decimal_string(),
            total: invoice.total.to_decimal_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceView>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedInvoice {
    pub id: Uuid,
}

// =============================================================================
// Drafts
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CreatedDraft {
    pub id: Uuid,
}

/// A saved draft with its totals and validation recomputed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub draft: InvoiceDraft,
    pub totals: Totals,
    pub validation: ValidationReport,
}

impl From<SavedDraft> for DraftView {
    fn from(saved: SavedDraft) -> Self {
        let state = DraftState::from_draft(saved.draft);
        DraftView {
            id: saved.id,
            saved_at: saved.saved_at,
            draft: state.draft,
            totals: state.totals,
            validation: state.validation,
        }
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HealthView {
    pub status: &'static str,
    pub database: bool,
    pub version: &'static str,
}
