//! COPY-style JSON ingestion for warehouses without a native bulk loader.
//!
//! Follows the loader's rules: `auto` matches top-level keys to column names
//! exactly (case-sensitive, as Redshift's `'auto'` without `ignorecase`),
//! a `jsonpaths` document maps one path per column by position, records may be
//! concatenated or newline-delimited, and a record that cannot be converted
//! fails the whole load.

use crate::models::{Column, ColumnType, TableDef};
use crate::storage::SourceLocation;
use crate::utils::jsonpath::{parse_jsonpaths_document, JsonPath};
use crate::warehouse::copy::{CopyCommand, JsonFormat};
use common::{Error, Result};
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use tracing::debug;

pub enum ColumnMapping {
    Auto,
    Paths(Vec<JsonPath>),
}

impl ColumnMapping {
    fn extract<'a>(&self, record: &'a Value, position: usize, column: &Column) -> Option<&'a Value> {
        match self {
            ColumnMapping::Auto => record.get(column.name),
            ColumnMapping::Paths(paths) => paths[position].select(record),
        }
    }
}

/// Fetches every source record named by `command` and converts it into a row
/// of `table`'s columns.
pub async fn load_rows(command: &CopyCommand, table: &TableDef) -> Result<Vec<Vec<SqlValue>>> {
    let mapping = match &command.format {
        JsonFormat::Auto => ColumnMapping::Auto,
        JsonFormat::JsonPaths(location) => {
            let content = SourceLocation::parse(location, &command.region)?
                .read_object()
                .await?;
            ColumnMapping::Paths(parse_jsonpaths_document(&content)?)
        }
    };

    let source = SourceLocation::parse(&command.source, &command.region)?;
    let mut rows = Vec::new();
    for (key, content) in source.read_objects().await? {
        let records = parse_records(&content)
            .map_err(|e| Error::InvalidInput(format!("{}: {}", key, e)))?;
        debug!(object = %key, records = records.len(), "Parsed source object");

        for (index, record) in records.iter().enumerate() {
            let row = record_to_row(record, table, &mapping)
                .map_err(|e| Error::InvalidInput(format!("{} record {}: {}", key, index + 1, e)))?;
            rows.push(row);
        }
    }

    Ok(rows)
}

/// Splits concatenated or newline-delimited JSON objects.
pub fn parse_records(content: &[u8]) -> Result<Vec<Value>> {
    serde_json::Deserializer::from_slice(content)
        .into_iter::<Value>()
        .map(|record| {
            let record = record?;
            if record.is_object() {
                Ok(record)
            } else {
                Err(Error::InvalidInput("record is not a JSON object".to_string()))
            }
        })
        .collect()
}

pub fn record_to_row(record: &Value, table: &TableDef, mapping: &ColumnMapping) -> Result<Vec<SqlValue>> {
    if let ColumnMapping::Paths(paths) = mapping {
        if paths.len() != table.columns.len() {
            return Err(Error::InvalidInput(format!(
                "jsonpaths has {} entries but {} has {} columns",
                paths.len(),
                table.name,
                table.columns.len()
            )));
        }
    }

    table
        .columns
        .iter()
        .enumerate()
        .map(|(position, column)| {
            to_sql_value(mapping.extract(record, position, column), column)
        })
        .collect()
}

/// Converts one JSON value for `column`. Blank strings load as NULL into
/// numeric columns.
pub fn to_sql_value(value: Option<&Value>, column: &Column) -> Result<SqlValue> {
    let mismatch = |value: &Value| {
        Error::InvalidInput(format!(
            "cannot load {} into column {} ({:?})",
            value, column.name, column.column_type
        ))
    };

    let Some(value) = value else {
        return Ok(SqlValue::Null);
    };
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    if let Value::String(text) = value {
        if column.column_type.is_numeric() && text.trim().is_empty() {
            return Ok(SqlValue::Null);
        }
    }

    match column.column_type {
        ColumnType::Int | ColumnType::BigInt | ColumnType::Identity => {
            let integer = match value {
                Value::Number(number) => number
                    .as_i64()
                    .or_else(|| number.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
                Value::String(text) => text.trim().parse::<i64>().ok(),
                _ => None,
            }
            .ok_or_else(|| mismatch(value))?;

            if column.column_type == ColumnType::Int && i32::try_from(integer).is_err() {
                return Err(Error::InvalidInput(format!(
                    "{} overflows INT column {}",
                    integer, column.name
                )));
            }
            Ok(SqlValue::Integer(integer))
        }
        ColumnType::Float => match value {
            Value::Number(number) => number.as_f64().map(SqlValue::Real).ok_or_else(|| mismatch(value)),
            Value::String(text) => text
                .trim()
                .parse::<f64>()
                .map(SqlValue::Real)
                .map_err(|_| mismatch(value)),
            _ => Err(mismatch(value)),
        },
        ColumnType::Varchar(limit) => {
            let text = match value {
                Value::String(text) => text.clone(),
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                _ => return Err(mismatch(value)),
            };
            if text.len() > limit as usize {
                return Err(Error::InvalidInput(format!(
                    "value of {} bytes exceeds VARCHAR({}) column {}",
                    text.len(),
                    limit,
                    column.name
                )));
            }
            Ok(SqlValue::Text(text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Table;
    use serde_json::json;

    fn column(table: Table, name: &str) -> &'static Column {
        table
            .def()
            .columns
            .iter()
            .find(|column| column.name == name)
            .unwrap()
    }

    #[test]
    fn test_parses_concatenated_and_newline_delimited_records() {
        let content = b"{\"a\": 1}\n{\"a\": 2}{\"a\": 3}\n";
        assert_eq!(parse_records(content).unwrap().len(), 3);
        assert!(parse_records(b"[1, 2]").is_err());
        assert!(parse_records(b"{\"a\": ").is_err());
    }

    #[test]
    fn test_auto_mapping_matches_keys_exactly() {
        let record = json!({
            "ARTIST_ID": "AR1",
            "song_id": "SO1",
            "title": "Intro",
            "duration": 210.5,
            "year": 0,
            "unused": true
        });

        let row = record_to_row(&record, Table::StagingSong.def(), &ColumnMapping::Auto).unwrap();
        assert_eq!(row.len(), 10);
        assert_eq!(row[0], SqlValue::Null);
        // differs in case only
        assert_eq!(row[1], SqlValue::Null);
        assert_eq!(row[6], SqlValue::Text("SO1".to_string()));
        assert_eq!(row[8], SqlValue::Real(210.5));
        assert_eq!(row[9], SqlValue::Integer(0));
    }

    #[test]
    fn test_jsonpaths_must_cover_every_column() {
        let paths = vec!["$.artist".parse().unwrap()];
        let err = record_to_row(
            &json!({"artist": "Muse"}),
            Table::StagingEvent.def(),
            &ColumnMapping::Paths(paths),
        )
        .unwrap_err();
        assert!(err.to_string().contains("jsonpaths has 1 entries"));
    }

    #[test]
    fn test_blank_numeric_loads_as_null() {
        let user_id = column(Table::StagingEvent, "userId");
        assert_eq!(to_sql_value(Some(&json!("")), user_id).unwrap(), SqlValue::Null);
        assert_eq!(to_sql_value(Some(&json!("39")), user_id).unwrap(), SqlValue::Integer(39));
        assert_eq!(to_sql_value(None, user_id).unwrap(), SqlValue::Null);
    }

    #[test]
    fn test_type_mismatches_are_fatal() {
        let user_id = column(Table::StagingEvent, "userId");
        assert!(to_sql_value(Some(&json!("abc")), user_id).is_err());
        assert!(to_sql_value(Some(&json!(1.5)), user_id).is_err());
        assert!(to_sql_value(Some(&json!(4_000_000_000i64)), user_id).is_err());

        let length = column(Table::StagingEvent, "length");
        assert!(to_sql_value(Some(&json!({"nested": 1})), length).is_err());

        let gender = column(Table::StagingEvent, "gender");
        assert!(to_sql_value(Some(&json!("FM")), gender).is_err());
        assert_eq!(
            to_sql_value(Some(&json!("F")), gender).unwrap(),
            SqlValue::Text("F".to_string())
        );
    }

    #[test]
    fn test_bigint_accepts_integral_floats() {
        let ts = column(Table::StagingEvent, "ts");
        assert_eq!(
            to_sql_value(Some(&json!(1541105830796.0)), ts).unwrap(),
            SqlValue::Integer(1541105830796)
        );
    }
}
