//! Persistence module split across logical submodules: schema setup, the
//! record store, and the derived queries built on top of it.

mod connection;
mod products;
mod queries;

pub use connection::{ensure_schema, ProductStore};
pub use queries::{filter_by_category, filter_low_stock, inventory_value};
