use async_trait::async_trait;
use common::{Error, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params_from_iter, Connection};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::copy::CopyCommand;
use super::json_ingest;
use super::{Dialect, Warehouse};
use crate::models::Table;
use crate::utils::calendar::{self, CalendarField};

/// A single-file (or in-memory) warehouse for local runs and tests. Bulk
/// ingestion is emulated by reading the JSON sources directly.
pub struct SqliteWarehouse {
    conn: Mutex<Connection>,
}

impl SqliteWarehouse {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::Connection(format!("Failed to open SQLite database {}: {}", path, e)))?;
        info!(path, "Opened SQLite warehouse");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Connection(format!("Failed to open in-memory SQLite database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // songplay is filled before the dimensions it references
        conn.pragma_update(None, "foreign_keys", false)?;
        register_functions(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` against the underlying connection.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let conn = self.lock()?;
        Ok(f(&*conn)?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Other("SQLite connection lock poisoned".to_string()))
    }
}

/// `date_part(field, epoch_millis)`, standing in for the warehouse builtin.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "date_part",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let field = ctx
                .get::<String>(0)?
                .parse::<CalendarField>()
                .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;
            let millis = ctx.get::<Option<i64>>(1)?;
            Ok(millis.and_then(|ms| calendar::date_part(field, ms)))
        },
    )
}

#[async_trait]
impl Warehouse for SqliteWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let conn = self.lock()?;
        let affected = conn.execute(sql.trim(), [])?;
        Ok(affected as u64)
    }

    async fn execute_unit(&self, statements: &[String]) -> Result<Vec<u64>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut affected = Vec::with_capacity(statements.len());
        for statement in statements {
            affected.push(tx.execute(statement.trim(), [])? as u64);
        }
        tx.commit()?;
        Ok(affected)
    }

    async fn copy_into(&self, command: &CopyCommand) -> Result<u64> {
        let table = command.table.def();
        let ingestion_error = |e: Error| Error::Ingestion {
            table: table.name.to_string(),
            message: e.to_string(),
        };

        let rows = json_ingest::load_rows(command, table)
            .await
            .map_err(ingestion_error)?;

        let columns = table.column_names();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name,
            columns.join(", "),
            placeholders
        );

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut statement = tx
                .prepare(&insert_sql)
                .map_err(|e| ingestion_error(e.into()))?;
            for row in &rows {
                statement
                    .execute(params_from_iter(row.iter()))
                    .map_err(|e| ingestion_error(e.into()))?;
            }
        }
        tx.commit()?;

        debug!(table = table.name, rows = rows.len(), "Emulated COPY committed");
        Ok(rows.len() as u64)
    }

    async fn count_rows(&self, table: Table) -> Result<i64> {
        let conn = self.lock()?;
        let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let this = *self;
        let conn = this
            .conn
            .into_inner()
            .map_err(|_| Error::Other("SQLite connection lock poisoned".to_string()))?;
        conn.close().map_err(|(_, e)| Error::Sqlite(e))
    }
}
