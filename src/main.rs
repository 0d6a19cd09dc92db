//! Binary entry point: resolve paths, start logging, make sure the database
//! is usable, then hand control to the terminal UI until the user quits.
use anyhow::Context;
use product_inventory::config::Config;
use product_inventory::{ensure_schema, logging, run_app, App};
use tracing::{error, info};

/// Any failure before the UI starts is fatal and is printed to the terminal.
fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(&config.log_path, &config.log_filter)?;
    info!(db = %config.db_path.display(), "starting product inventory");

    let store = ensure_schema(&config.db_path)
        .inspect_err(|err| error!(error = %err, "initialization failed"))
        .with_context(|| format!("Initialization error ({})", config.db_path.display()))?;
    let products = store.list_all().context("failed to load products")?;

    let mut app = App::new(store, products);
    run_app(&mut app)
}
