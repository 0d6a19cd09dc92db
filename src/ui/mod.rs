//! Ratatui front-end: a product grid with a modal form, delete confirmation,
//! and category / low-stock views. All field parsing happens here; the store
//! only ever receives complete `Product` values.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
