pub mod copy;
mod dialect;
pub mod json_ingest;
pub mod redshift;
pub mod sqlite;

pub use copy::{CopyCommand, JsonFormat};
pub use dialect::Dialect;
pub use redshift::RedshiftWarehouse;
pub use sqlite::SqliteWarehouse;

use async_trait::async_trait;
use common::config::{Backend, Settings};
use common::Result;

use crate::models::Table;

/// A single database session. One statement is in flight at a time.
#[async_trait]
pub trait Warehouse: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Runs one statement, committed on its own. Returns the affected rows.
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Runs `statements` in order and commits them together; nothing is kept
    /// if any of them fails.
    async fn execute_unit(&self, statements: &[String]) -> Result<Vec<u64>>;

    /// Bulk-loads a staging table. Returns the number of rows loaded.
    async fn copy_into(&self, command: &CopyCommand) -> Result<u64>;

    async fn count_rows(&self, table: Table) -> Result<i64>;

    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens the session for the configured backend.
pub async fn connect(settings: &Settings) -> Result<Box<dyn Warehouse>> {
    match settings.warehouse.backend {
        Backend::Redshift => {
            let warehouse = RedshiftWarehouse::connect(settings.cluster()?).await?;
            Ok(Box::new(warehouse))
        }
        Backend::Sqlite => {
            let warehouse = SqliteWarehouse::open(&settings.warehouse.sqlite_path)?;
            Ok(Box::new(warehouse))
        }
    }
}
