use common::config::Settings;
use common::Result;
use std::time::Instant;
use tracing::{info, warn};

use crate::models::Table;
use crate::schema;
use crate::staging::{self, StagingReport};
use crate::transform::{self, TransformReport};
use crate::warehouse::{self, Warehouse};

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub staging: StagingReport,
    pub transform: TransformReport,
    /// Rows in every table once the load finished, in creation order.
    pub row_counts: Vec<(Table, i64)>,
}

impl LoadReport {
    pub fn rows(&self, table: Table) -> Option<i64> {
        self.row_counts
            .iter()
            .find(|(t, _)| *t == table)
            .map(|(_, rows)| *rows)
    }
}

/// Schema-reset unit: drops and recreates every table.
pub async fn create_tables(settings: &Settings) -> Result<()> {
    let warehouse = warehouse::connect(settings).await?;
    let result = schema::reset_schema(warehouse.as_ref()).await;
    finish(warehouse, result).await
}

/// Load unit: bulk-loads staging, then runs the transformation steps.
/// Expects the schema to exist already.
pub async fn load(settings: &Settings) -> Result<LoadReport> {
    let started = Instant::now();
    let warehouse = warehouse::connect(settings).await?;
    let result = run_load(warehouse.as_ref(), settings).await;
    let report = finish(warehouse, result).await?;

    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        songplays = report.transform.songplays,
        "Load finished"
    );
    Ok(report)
}

async fn run_load(warehouse: &dyn Warehouse, settings: &Settings) -> Result<LoadReport> {
    let staging = staging::load_staging(warehouse, settings).await?;
    let transform = transform::run_all(warehouse).await?;

    let mut row_counts = Vec::with_capacity(Table::CREATE_ORDER.len());
    for table in Table::CREATE_ORDER {
        let rows = warehouse.count_rows(table).await?;
        info!(table = %table, rows, "Row count");
        row_counts.push((table, rows));
    }

    Ok(LoadReport {
        staging,
        transform,
        row_counts,
    })
}

/// Closes the session whatever the outcome; the unit's own error wins over
/// a failure to close.
async fn finish<T>(warehouse: Box<dyn Warehouse>, result: Result<T>) -> Result<T> {
    match (warehouse.close().await, result) {
        (Ok(()), result) => result,
        (Err(close_err), Ok(_)) => Err(close_err),
        (Err(close_err), Err(e)) => {
            warn!("Failed to close warehouse session: {}", close_err);
            Err(e)
        }
    }
}
