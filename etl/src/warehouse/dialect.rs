use crate::models::{Column, ColumnType, DistStyle, TableDef};

/// SQL fragments that differ between the supported warehouses. Everything
/// else in the pipeline is written once in the common subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Redshift,
    Sqlite,
}

impl Dialect {
    pub fn create_table_sql(self, table: &TableDef) -> String {
        let columns = table
            .columns
            .iter()
            .map(|column| self.column_sql(column))
            .collect::<Vec<_>>()
            .join(",\n    ");

        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            table.name, columns
        );

        if let (Dialect::Redshift, Some(style)) = (self, table.dist_style) {
            sql.push_str(match style {
                DistStyle::Even => " DISTSTYLE EVEN",
                DistStyle::All => " DISTSTYLE ALL",
            });
        }

        sql
    }

    /// Dependent tables go with the dropped one where the dialect supports it.
    pub fn drop_table_sql(self, table: &TableDef) -> String {
        match self {
            Dialect::Redshift => format!("DROP TABLE IF EXISTS {} CASCADE", table.name),
            Dialect::Sqlite => format!("DROP TABLE IF EXISTS {}", table.name),
        }
    }

    /// Expression turning an epoch-milliseconds column into a value the
    /// dialect's `date_part` accepts.
    pub fn epoch_millis_to_timestamp(self, expr: &str) -> String {
        match self {
            Dialect::Redshift => format!(
                "'epoch'::timestamp + {} / 1000.0 * INTERVAL '1 second'",
                expr
            ),
            // the registered date_part() takes epoch milliseconds directly
            Dialect::Sqlite => expr.to_string(),
        }
    }

    fn column_sql(self, column: &Column) -> String {
        let mut sql = format!("{} {}", column.name, self.type_sql(column.column_type));

        if self == Dialect::Redshift && column.sort_key {
            sql.push_str(" SORTKEY");
        }
        if column.primary_key {
            sql.push_str(" PRIMARY KEY");
            if self == Dialect::Sqlite && column.column_type == ColumnType::Identity {
                sql.push_str(" AUTOINCREMENT");
            }
        }
        if let Some(target) = column.references {
            sql.push_str(&format!(" REFERENCES {}", target));
        }

        sql
    }

    fn type_sql(self, column_type: ColumnType) -> String {
        match (self, column_type) {
            (_, ColumnType::Int) => "INT".to_string(),
            (_, ColumnType::BigInt) => "BIGINT".to_string(),
            (_, ColumnType::Float) => "FLOAT".to_string(),
            (_, ColumnType::Varchar(length)) => format!("VARCHAR({})", length),
            (Dialect::Redshift, ColumnType::Identity) => "BIGINT IDENTITY(1, 1)".to_string(),
            (Dialect::Sqlite, ColumnType::Identity) => "INTEGER".to_string(),
        }
    }
}
