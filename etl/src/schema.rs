use common::{Error, Result};
use tracing::{debug, info};

use crate::models::Table;
use crate::warehouse::Warehouse;

/// Drops all seven tables. Missing tables are skipped.
pub async fn drop_tables(warehouse: &dyn Warehouse) -> Result<()> {
    let dialect = warehouse.dialect();
    for table in Table::DROP_ORDER {
        let sql = dialect.drop_table_sql(table.def());
        warehouse
            .execute(&sql)
            .await
            .map_err(|e| ddl_error(table, e))?;
        debug!(table = %table, "Dropped table");
    }
    Ok(())
}

/// Creates all seven tables, dimensions before the fact table.
pub async fn create_tables(warehouse: &dyn Warehouse) -> Result<()> {
    let dialect = warehouse.dialect();
    for table in Table::CREATE_ORDER {
        let sql = dialect.create_table_sql(table.def());
        warehouse
            .execute(&sql)
            .await
            .map_err(|e| ddl_error(table, e))?;
        debug!(table = %table, "Created table");
    }
    Ok(())
}

/// Drops and recreates the whole schema, leaving every table empty.
pub async fn reset_schema(warehouse: &dyn Warehouse) -> Result<()> {
    drop_tables(warehouse).await?;
    create_tables(warehouse).await?;
    info!(tables = Table::CREATE_ORDER.len(), "Schema reset");
    Ok(())
}

fn ddl_error(table: Table, e: Error) -> Error {
    Error::Ddl {
        table: table.to_string(),
        message: e.to_string(),
    }
}
