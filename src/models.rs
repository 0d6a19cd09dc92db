//! Domain model that mirrors the `Products` table. `Product` is a plain value
//! object: the UI builds one from the form fields, the store persists it, and
//! every read hands back fresh copies so no layer shares mutable state.

use std::fmt;

use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A single inventory record. Optional columns (`category`, `supplier`,
/// `status`) are plain strings where the empty string means "absent"; the
/// persistence layer maps that to SQL `NULL` and back.
pub struct Product {
    /// Primary key. Immutable once the record exists; updates and deletes are
    /// keyed by it.
    pub id: String,
    /// Display name, also the ordering key of every listing.
    pub name: String,
    /// Optional grouping label used by the category filter.
    pub category: String,
    /// Price per unit. Kept as a decimal so totals stay exact to the cent.
    pub unit_price: Decimal,
    /// Units on hand.
    pub quantity: i64,
    /// Optional supplier name.
    pub supplier: String,
    /// Optional free-form lifecycle label such as "Active" or "Discontinued".
    pub status: String,
}

impl Product {
    /// Build a product with only the required columns filled in.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            unit_price: Decimal::ZERO,
            quantity: 0,
            supplier: String::new(),
            status: String::new(),
        }
    }

    /// Value of the stock on hand for this record, or `None` on overflow.
    pub fn stock_value(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Read-side half of the optional column rule: `NULL` becomes `""`.
pub fn normalize_optional(value: Option<String>) -> String {
    value.unwrap_or_default()
}

/// Write-side half of the optional column rule: `""` becomes `NULL`.
pub fn optional_to_column(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
