use common::config::Settings;
use common::Result;
use std::time::Instant;
use tracing::info;

use crate::models::Table;
use crate::warehouse::{CopyCommand, JsonFormat, Warehouse};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StagingReport {
    pub events_loaded: u64,
    pub songs_loaded: u64,
}

/// The two bulk-ingest requests: event log through its jsonpaths mapping,
/// song catalog with inferred keys.
pub fn copy_commands(settings: &Settings) -> [CopyCommand; 2] {
    [
        CopyCommand {
            table: Table::StagingEvent,
            source: settings.s3.log_data.clone(),
            iam_role: settings.iam_role.arn.clone(),
            region: settings.s3.region.clone(),
            format: JsonFormat::JsonPaths(settings.s3.log_jsonpath.clone()),
        },
        CopyCommand {
            table: Table::StagingSong,
            source: settings.s3.song_data.clone(),
            iam_role: settings.iam_role.arn.clone(),
            region: settings.s3.region.clone(),
            format: JsonFormat::Auto,
        },
    ]
}

/// Appends both sources to their staging tables. Existing staging rows are
/// kept, so loading twice without a schema reset duplicates them.
pub async fn load_staging(warehouse: &dyn Warehouse, settings: &Settings) -> Result<StagingReport> {
    let mut report = StagingReport::default();

    for command in copy_commands(settings) {
        let started = Instant::now();
        let rows = warehouse.copy_into(&command).await?;
        info!(
            table = %command.table,
            source = %command.source,
            rows,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Staging table loaded"
        );

        match command.table {
            Table::StagingEvent => report.events_loaded = rows,
            _ => report.songs_loaded = rows,
        }
    }

    Ok(report)
}
