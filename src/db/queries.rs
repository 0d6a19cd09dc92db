//! Derived views over the product list. The store methods always start from a
//! fresh full read; the free functions do the in-memory filtering so they can
//! be reused on a snapshot the UI already holds.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{Operation, StoreError, StoreResult};
use crate::models::Product;

use super::connection::ProductStore;

impl ProductStore {
    /// Products in `category` (case-insensitive), ordered by name. A blank
    /// category returns everything.
    pub fn by_category(&self, category: &str) -> StoreResult<Vec<Product>> {
        let products = self.load_products(Operation::ByCategory)?;
        let matched = filter_by_category(products, category);
        debug!(category, rows = matched.len(), "category filter");
        Ok(matched)
    }

    /// Products with `quantity <= threshold`, lowest stock first.
    pub fn low_stock(&self, threshold: i64) -> StoreResult<Vec<Product>> {
        let products = self.load_products(Operation::LowStock)?;
        let matched = filter_low_stock(products, threshold);
        debug!(threshold, rows = matched.len(), "low stock filter");
        Ok(matched)
    }

    /// Exact sum of `unit_price * quantity` across all products.
    pub fn total_inventory_value(&self) -> StoreResult<Decimal> {
        let op = Operation::TotalInventoryValue;
        let products = self.load_products(op)?;
        let total = inventory_value(&products).map_err(|id| StoreError::ValueOverflow {
            operation: op,
            id,
        })?;
        debug!(total = %total, rows = products.len(), "inventory value");
        Ok(total)
    }
}

/// Keep products whose category equals `category` ignoring case, sorted by
/// name. Blank input keeps everything.
pub fn filter_by_category(mut products: Vec<Product>, category: &str) -> Vec<Product> {
    let wanted = category.trim();
    if !wanted.is_empty() {
        let wanted = wanted.to_lowercase();
        products.retain(|product| product.category.to_lowercase() == wanted);
    }
    products.sort_by(|a, b| a.name.cmp(&b.name));
    products
}

/// Keep products at or below `threshold`, ordered by quantity. The sort is
/// stable, so ties keep the order they arrived in.
pub fn filter_low_stock(mut products: Vec<Product>, threshold: i64) -> Vec<Product> {
    products.retain(|product| product.quantity <= threshold);
    products.sort_by_key(|product| product.quantity);
    products
}

/// Sum of every product's stock value. On overflow the id of the product that
/// pushed the total out of range is returned as the error.
pub fn inventory_value(products: &[Product]) -> Result<Decimal, String> {
    products.iter().try_fold(Decimal::ZERO, |total, product| {
        product
            .stock_value()
            .and_then(|value| total.checked_add(value))
            .ok_or_else(|| product.id.clone())
    })
}
