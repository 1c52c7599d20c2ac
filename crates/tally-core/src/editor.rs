//! # Draft Reducer
//!
//! Drives the invoice authoring form as an explicit reducer.
//!
//! ## Event Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   DraftState ──► apply(state, DraftEvent) ──► DraftState'              │
//! │                        │                                                │
//! │                        ├── mutate a clone of the draft                  │
//! │                        ├── Totals     = pricing::calculate(...)         │
//! │                        └── Validation = validation::validate_draft(...) │
//! │                                                                         │
//! │   A failed event returns Err and the caller keeps the old state.       │
//! │                                                                         │
//! │   DraftState::submit() ──► Submission (qualifying items only)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Input Policy
//! The calculator accepts any percentage. The form does not: a discount is
//! clamped to 0–100% and a tax rate to at least 0% when the event is applied.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::ledger::ItemUpdate;
use crate::pricing::{calculate, Totals};
use crate::status::InvoiceStatus;
use crate::types::{non_blank, Customer, InvoiceDraft, InvoiceItem, InvoiceSnapshot, ItemId, Percentage};
use crate::validation::{validate_draft, ValidationReport};

// =============================================================================
// Events
// =============================================================================

/// One user action on the authoring form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum DraftEvent {
    SetCustomerName(String),
    SetCustomerEmail(String),
    SetCustomerPhone(String),
    SetCustomerAddress(String),
    SetInvoiceDate(NaiveDate),
    SetDiscount(Percentage),
    SetTaxRate(Percentage),
    SetNotes(String),
    AddItem,
    UpdateItem { id: ItemId, update: ItemUpdate },
    RemoveItem(ItemId),
    /// Back to a fresh form dated with the payload.
    Reset(NaiveDate),
}

// =============================================================================
// State
// =============================================================================

/// The draft together with everything derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftState {
    pub draft: InvoiceDraft,
    pub totals: Totals,
    pub validation: ValidationReport,
}

impl DraftState {
    /// A fresh form dated `today`.
    pub fn new(today: NaiveDate) -> Self {
        DraftState::from_draft(InvoiceDraft::new(today))
    }

    /// Wraps an existing draft and derives its totals and validation.
    pub fn from_draft(draft: InvoiceDraft) -> Self {
        let totals = calculate(draft.ledger.items(), draft.discount, draft.tax_rate);
        let validation = validate_draft(&draft);
        DraftState {
            draft,
            totals,
            validation,
        }
    }

    /// Freezes the draft for persistence or export.
    ///
    /// ## Errors
    /// `InvalidDraft` with the ordered validation messages when the draft is
    /// incomplete.
    pub fn submit(&self) -> CoreResult<Submission> {
        if !self.validation.valid {
            return Err(CoreError::InvalidDraft(self.validation.errors.clone()));
        }

        let draft = &self.draft;
        let submitted: Vec<_> = draft.ledger.qualifying_items().cloned().collect();
        let totals = calculate(&submitted, draft.discount, draft.tax_rate);

        Ok(Submission {
            customer: Customer {
                name: draft.customer.name.trim().to_string(),
                email: draft.customer.email.clone().and_then(non_blank),
                phone: draft.customer.phone.clone().and_then(non_blank),
                address: draft.customer.address.clone().and_then(non_blank),
            },
            invoice_date: draft.invoice_date,
            discount: draft.discount,
            tax_rate: draft.tax_rate,
            notes: non_blank(draft.notes.clone()),
            items: submitted.iter().map(InvoiceItem::from).collect(),
            totals,
        })
    }
}

/// Applies one event and recomputes derived values.
///
/// Pure: the input state is never modified.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use tally_core::editor::{apply, DraftEvent, DraftState};
/// use tally_core::ledger::ItemUpdate;
/// use tally_core::{Money, Percentage};
///
/// let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let state = DraftState::new(today);
/// let id = state.draft.ledger.items()[0].id;
///
/// let state = apply(&state, DraftEvent::SetCustomerName("Asha Traders".into())).unwrap();
/// let state = apply(&state, DraftEvent::UpdateItem { id, update: ItemUpdate::Name("Audit".into()) }).unwrap();
/// let state = apply(&state, DraftEvent::UpdateItem { id, update: ItemUpdate::Quantity(2) }).unwrap();
/// let state = apply(&state, DraftEvent::UpdateItem { id, update: ItemUpdate::Rate(Money::from_cents(10000)) }).unwrap();
/// let state = apply(&state, DraftEvent::SetDiscount(Percentage::from_percent(10))).unwrap();
///
/// assert_eq!(state.totals.total.cents(), 18000);
/// assert!(state.validation.valid);
/// ```
pub fn apply(state: &DraftState, event: DraftEvent) -> CoreResult<DraftState> {
    let mut draft = state.draft.clone();

    match event {
        DraftEvent::SetCustomerName(name) => draft.customer.name = name,
        DraftEvent::SetCustomerEmail(email) => draft.customer.email = non_blank(email),
        DraftEvent::SetCustomerPhone(phone) => draft.customer.phone = non_blank(phone),
        DraftEvent::SetCustomerAddress(address) => draft.customer.address = non_blank(address),
        DraftEvent::SetInvoiceDate(date) => draft.invoice_date = date,
        DraftEvent::SetDiscount(discount) => {
            draft.discount = discount.clamp(Percentage::zero(), Percentage::FULL);
        }
        DraftEvent::SetTaxRate(tax_rate) => {
            draft.tax_rate = tax_rate.clamp(Percentage::zero(), Percentage::from_bps(i64::MAX));
        }
        DraftEvent::SetNotes(notes) => draft.notes = notes,
        DraftEvent::AddItem => {
            draft.ledger.add_blank()?;
        }
        DraftEvent::UpdateItem { id, update } => draft.ledger.update(id, update)?,
        DraftEvent::RemoveItem(id) => {
            draft.ledger.remove(id)?;
        }
        DraftEvent::Reset(today) => draft = InvoiceDraft::new(today),
    }

    Ok(DraftState::from_draft(draft))
}

// =============================================================================
// Submission
// =============================================================================

/// A validated draft reduced to what gets persisted or exported.
///
/// Only qualifying items survive, and `totals` is computed over them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub customer: Customer,
    pub invoice_date: NaiveDate,
    pub discount: Percentage,
    pub tax_rate: Percentage,
    pub notes: Option<String>,
    pub items: Vec<InvoiceItem>,
    pub totals: Totals,
}

impl Submission {
    /// Due date under the given payment terms.
    pub fn due_date(&self, payment_terms_days: u32) -> NaiveDate {
        self.invoice_date
            .checked_add_days(Days::new(payment_terms_days as u64))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Snapshot for an invoice that has been assigned a number.
    pub fn snapshot(&self, invoice_number: &str, due_date: Option<NaiveDate>) -> InvoiceSnapshot {
        InvoiceSnapshot {
            invoice_number: invoice_number.to_string(),
            status: InvoiceStatus::Draft,
            invoice_date: self.invoice_date,
            due_date,
            customer: self.customer.clone(),
            items: self.items.clone(),
            discount: self.discount,
            tax_rate: self.tax_rate,
            totals: self.totals,
            notes: self.notes.clone(),
        }
    }

    /// Snapshot for an unsaved draft, numbered `DRAFT-YYYYMMDD`.
    pub fn preview_snapshot(&self) -> InvoiceSnapshot {
        let number = format!("DRAFT-{}", self.invoice_date.format("%Y%m%d"));
        self.snapshot(&number, None)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::validation::{CUSTOMER_NAME_REQUIRED, VALID_ITEM_REQUIRED};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn first_id(state: &DraftState) -> ItemId {
        state.draft.ledger.items()[0].id
    }

    fn with_item(state: &DraftState, id: ItemId, name: &str, qty: u32, rate: i64) -> DraftState {
        let state = apply(state, DraftEvent::UpdateItem { id, update: ItemUpdate::Name(name.into()) }).unwrap();
        let state = apply(&state, DraftEvent::UpdateItem { id, update: ItemUpdate::Quantity(qty) }).unwrap();
        apply(
            &state,
            DraftEvent::UpdateItem {
                id,
                update: ItemUpdate::Rate(Money::from_cents(rate)),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_new_state_is_invalid_with_zero_totals() {
        let state = DraftState::new(today());
        assert_eq!(state.totals.total, Money::zero());
        assert_eq!(state.totals.item_count, 1);
        assert_eq!(
            state.validation.errors,
            vec![CUSTOMER_NAME_REQUIRED, VALID_ITEM_REQUIRED]
        );
    }

    #[test]
    fn test_totals_recomputed_after_every_event() {
        let state = DraftState::new(today());
        let id = first_id(&state);
        let state = with_item(&state, id, "Widget", 2, 10000);
        assert_eq!(state.totals.subtotal.cents(), 20000);

        let state = apply(&state, DraftEvent::SetDiscount(Percentage::from_percent(10))).unwrap();
        assert_eq!(state.totals.discount_amount.cents(), 2000);
        assert_eq!(state.totals.total.cents(), 18000);

        let state = apply(&state, DraftEvent::AddItem).unwrap();
        assert_eq!(state.totals.item_count, 2);
        assert_eq!(state.totals.total.cents(), 18000);
    }

    #[test]
    fn test_missing_customer_name_with_valid_item() {
        let state = DraftState::new(today());
        let id = first_id(&state);
        let state = with_item(&state, id, "Widget", 1, 500);
        assert!(!state.validation.valid);
        assert_eq!(state.validation.errors, vec![CUSTOMER_NAME_REQUIRED]);
    }

    #[test]
    fn test_discount_and_tax_are_clamped() {
        let state = DraftState::new(today());
        let state = apply(&state, DraftEvent::SetDiscount(Percentage::from_percent(150))).unwrap();
        assert_eq!(state.draft.discount, Percentage::FULL);
        let state = apply(&state, DraftEvent::SetDiscount(Percentage::from_percent(-5))).unwrap();
        assert_eq!(state.draft.discount, Percentage::zero());
        let state = apply(&state, DraftEvent::SetTaxRate(Percentage::from_percent(-18))).unwrap();
        assert_eq!(state.draft.tax_rate, Percentage::zero());
        let state = apply(&state, DraftEvent::SetTaxRate(Percentage::from_percent(28))).unwrap();
        assert_eq!(state.draft.tax_rate, Percentage::from_percent(28));
    }

    #[test]
    fn test_failed_event_leaves_state_untouched() {
        let state = DraftState::new(today());
        let id = first_id(&state);
        let before = state.clone();

        assert!(matches!(apply(&state, DraftEvent::RemoveItem(id)), Err(CoreError::LastItem)));
        assert!(apply(&state, DraftEvent::RemoveItem(ItemId(42))).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_blank_contact_fields_become_none() {
        let state = DraftState::new(today());
        let state = apply(&state, DraftEvent::SetCustomerEmail("  ".into())).unwrap();
        assert_eq!(state.draft.customer.email, None);
        let state = apply(&state, DraftEvent::SetCustomerPhone("98450 12345".into())).unwrap();
        assert_eq!(state.draft.customer.phone.as_deref(), Some("98450 12345"));
    }

    #[test]
    fn test_reset() {
        let state = DraftState::new(today());
        let state = apply(&state, DraftEvent::SetCustomerName("Asha".into())).unwrap();
        let later = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let state = apply(&state, DraftEvent::Reset(later)).unwrap();
        assert_eq!(state, DraftState::new(later));
    }

    #[test]
    fn test_submit_refuses_invalid_draft() {
        let state = DraftState::new(today());
        match state.submit() {
            Err(CoreError::InvalidDraft(errors)) => {
                assert_eq!(errors, vec![CUSTOMER_NAME_REQUIRED, VALID_ITEM_REQUIRED]);
            }
            other => panic!("expected InvalidDraft, got {:?}", other),
        }
    }

    #[test]
    fn test_submit_keeps_only_qualifying_items() {
        let state = DraftState::new(today());
        let state = apply(&state, DraftEvent::SetCustomerName("  Asha Traders ".into())).unwrap();
        let id = first_id(&state);
        let state = with_item(&state, id, "Widget", 2, 10000);
        let state = apply(&state, DraftEvent::AddItem).unwrap();
        let state = apply(&state, DraftEvent::SetDiscount(Percentage::from_percent(10))).unwrap();
        let state = apply(&state, DraftEvent::SetNotes("   ".into())).unwrap();

        let submission = state.submit().unwrap();
        assert_eq!(submission.customer.name, "Asha Traders");
        assert_eq!(submission.items.len(), 1);
        assert_eq!(submission.items[0].total.cents(), 20000);
        assert_eq!(submission.totals.item_count, 1);
        assert_eq!(submission.totals.total.cents(), 18000);
        assert_eq!(submission.notes, None);
    }

    #[test]
    fn test_due_date_and_preview_snapshot() {
        let state = DraftState::new(today());
        let state = apply(&state, DraftEvent::SetCustomerName("Asha".into())).unwrap();
        let id = first_id(&state);
        let state = with_item(&state, id, "Widget", 1, 100);
        let submission = state.submit().unwrap();

        assert_eq!(submission.due_date(30), NaiveDate::from_ymd_opt(2024, 4, 14).unwrap());
        let snapshot = submission.preview_snapshot();
        assert_eq!(snapshot.invoice_number, "DRAFT-20240315");
        assert_eq!(snapshot.due_date, None);
        assert_eq!(snapshot.totals, submission.totals);
    }
}
