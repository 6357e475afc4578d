mod app;

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};

use tracing_subscriber::{prelude::*, EnvFilter};

use sprout_core::{
    config::{self, AppConfig},
    unix_now, Catalog, SaveManager,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    if let Err(err) = config.validate() {
        tracing::error!(%err, "configuration rejected");
        return Err(err).context("configuration rejected");
    }
    let catalog = match Catalog::new(config.crops.clone()) {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::error!(%err, "crop table rejected");
            return Err(err).context("crop table rejected");
        }
    };

    let save_manager = SaveManager::new(config.save_path());
    let outcome = save_manager.load(&config, &catalog, unix_now());

    let mut app = app::FarmApp::new(config, catalog, save_manager, outcome);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("sprout.log");

    let env_filter = EnvFilter::from_default_env();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
