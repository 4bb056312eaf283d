pub mod models;
pub mod pipeline;
pub mod schema;
pub mod staging;
pub mod storage;
pub mod transform;
pub mod utils;
pub mod warehouse;

#[cfg(test)]
mod test_support;

use common::config::Settings;
use common::{logging, Result};
use pipeline::LoadReport;

/// Runs the schema-reset unit against the configured warehouse.
pub async fn run_create_tables(config_path: &str) -> Result<()> {
    let settings = Settings::new(config_path)?;
    logging::init(&settings.logging);

    pipeline::create_tables(&settings).await
}

/// Runs the load unit: staging COPY followed by the transformation steps.
pub async fn run_etl_pipeline(config_path: &str) -> Result<LoadReport> {
    let settings = Settings::new(config_path)?;
    logging::init(&settings.logging);

    pipeline::load(&settings).await
}
