//! # Line-Item Ledger
//!
//! The ordered collection of line items belonging to one invoice draft.
//!
//! ## Ledger Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Form Action             Ledger Call                State Change        │
//! │  ───────────             ───────────                ────────────        │
//! │  Click "Add Item" ─────► add_blank() ─────────────► items.push(blank)  │
//! │  Edit a field ─────────► update(id, ItemUpdate) ──► items[i].field = v │
//! │  Click "Remove" ───────► remove(id) ──────────────► items.remove(i)    │
//! │                                                                         │
//! │  The last remaining row cannot be removed: the form always shows one.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Typed Field Updates
//! Each editable field has its own [`ItemUpdate`] variant, so a quantity can
//! never be assigned a name. Raw form strings are converted once at the
//! boundary by [`ItemUpdate::parse`].

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{non_blank, Category, ItemId, LineItem, NewLineItem};
use crate::MAX_LEDGER_ITEMS;

// =============================================================================
// Item Update
// =============================================================================

/// A single-field change to a line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum ItemUpdate {
    Name(String),
    Description(Option<String>),
    Category(Category),
    Quantity(u32),
    Rate(Money),
}

impl ItemUpdate {
    /// Converts a raw form value into a typed update.
    ///
    /// ## Rules
    /// - `quantity`: non-negative integer; an empty box means 0
    /// - `rate`: non-negative decimal; an empty box means 0
    /// - `category`: one of the five categories
    /// - `description`: blank clears it
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::ledger::ItemUpdate;
    /// use tally_core::Money;
    ///
    /// assert_eq!(ItemUpdate::parse("quantity", "3").unwrap(), ItemUpdate::Quantity(3));
    /// assert_eq!(
    ///     ItemUpdate::parse("rate", "99.5").unwrap(),
    ///     ItemUpdate::Rate(Money::from_cents(9950))
    /// );
    /// assert!(ItemUpdate::parse("quantity", "-1").is_err());
    /// ```
    pub fn parse(field: &str, raw: &str) -> Result<ItemUpdate, ValidationError> {
        match field {
            "name" => Ok(ItemUpdate::Name(raw.to_string())),
            "description" => Ok(ItemUpdate::Description(non_blank(raw))),
            "category" => raw.parse().map(ItemUpdate::Category),
            "quantity" => {
                let raw = raw.trim();
                if raw.is_empty() {
                    return Ok(ItemUpdate::Quantity(0));
                }
                raw.parse::<u32>()
                    .map(ItemUpdate::Quantity)
                    .map_err(|_| ValidationError::InvalidFormat {
                        field: "quantity".to_string(),
                        reason: "must be a whole number of zero or more".to_string(),
                    })
            }
            "rate" => {
                if raw.trim().is_empty() {
                    return Ok(ItemUpdate::Rate(Money::zero()));
                }
                let rate = Money::parse(raw).map_err(|_| ValidationError::InvalidFormat {
                    field: "rate".to_string(),
                    reason: "must be a decimal amount".to_string(),
                })?;
                if rate.is_negative() {
                    return Err(ValidationError::OutOfRange {
                        field: "rate".to_string(),
                        min: 0,
                        max: i64::MAX,
                    });
                }
                Ok(ItemUpdate::Rate(rate))
            }
            other => Err(ValidationError::NotAllowed {
                field: format!("item field '{}'", other),
                allowed: ["name", "description", "category", "quantity", "rate"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }

    fn apply_to(self, item: &mut LineItem) {
        match self {
            ItemUpdate::Name(name) => item.name = name,
            ItemUpdate::Description(description) => item.description = description,
            ItemUpdate::Category(category) => item.category = category,
            ItemUpdate::Quantity(quantity) => item.quantity = quantity,
            ItemUpdate::Rate(rate) => item.rate = rate,
        }
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Ordered line items with session-stable identities.
///
/// ## Invariants
/// - Ids are unique and never reused within one ledger
/// - Insertion order is display order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    items: Vec<LineItem>,
    next_id: u64,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Ledger {
            items: Vec::new(),
            next_id: 1,
        }
    }

    /// Creates a ledger holding the single blank row the form starts with.
    pub fn with_blank_item() -> Self {
        let mut ledger = Ledger::new();
        ledger.push(NewLineItem::blank());
        ledger
    }

    /// Adds an item and returns its identity.
    pub fn add(&mut self, item: NewLineItem) -> CoreResult<ItemId> {
        if self.items.len() >= MAX_LEDGER_ITEMS {
            return Err(CoreError::LedgerFull {
                max: MAX_LEDGER_ITEMS,
            });
        }
        Ok(self.push(item))
    }

    /// Adds a blank row.
    pub fn add_blank(&mut self) -> CoreResult<ItemId> {
        self.add(NewLineItem::blank())
    }

    /// Applies a typed field update to one item.
    pub fn update(&mut self, id: ItemId, update: ItemUpdate) -> CoreResult<()> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(CoreError::ItemNotFound(id))?;
        update.apply_to(item);
        Ok(())
    }

    /// Removes an item, returning it.
    ///
    /// ## Errors
    /// - `ItemNotFound` for an unknown id
    /// - `LastItem` when it is the only row left
    pub fn remove(&mut self, id: ItemId) -> CoreResult<LineItem> {
        let index = self
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or(CoreError::ItemNotFound(id))?;
        if self.items.len() == 1 {
            return Err(CoreError::LastItem);
        }
        Ok(self.items.remove(index))
    }

    pub fn get(&self, id: ItemId) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items that may be submitted (see [`LineItem::qualifies`]).
    pub fn qualifying_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|i| i.qualifies())
    }

    fn push(&mut self, item: NewLineItem) -> ItemId {
        // A deserialized ledger may carry next_id = 0.
        let floor = self.items.iter().map(|i| i.id.0 + 1).max().unwrap_or(1);
        let id = ItemId(self.next_id.max(floor));
        self.next_id = id.0 + 1;
        self.items.push(LineItem {
            id,
            name: item.name,
            description: item.description,
            category: item.category,
            quantity: item.quantity,
            rate: item.rate,
        });
        id
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
