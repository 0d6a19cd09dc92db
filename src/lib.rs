//! Core library surface for the product inventory manager.
//!
//! `db` is the persistence and query layer over the single `Products` table;
//! `ui` is a terminal client of it. `config` and `logging` cover process
//! startup so the binary stays a few lines long.
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod ui;

/// Store entry points: schema setup and the handle every operation hangs off.
pub use db::{ensure_schema, ProductStore};

pub use error::{Operation, StoreError, StoreResult};
pub use models::Product;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
