use crate::models::Table;

/// How JSON source records map onto the target table's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonFormat {
    /// Top-level keys matched to column names.
    Auto,
    /// Location of a `jsonpaths` document, one path per column in order.
    JsonPaths(String),
}

/// A bulk-ingest request for one staging table.
#[derive(Debug, Clone)]
pub struct CopyCommand {
    pub table: Table,
    pub source: String,
    pub iam_role: String,
    pub region: String,
    pub format: JsonFormat,
}

impl CopyCommand {
    pub fn to_redshift_sql(&self) -> String {
        let format = match &self.format {
            JsonFormat::Auto => quote_literal("auto"),
            JsonFormat::JsonPaths(location) => quote_literal(location),
        };

        format!(
            "COPY {} FROM {}\nCREDENTIALS {}\nREGION {}\nFORMAT AS JSON {}",
            self.table,
            quote_literal(&self.source),
            quote_literal(&format!("aws_iam_role={}", self.iam_role)),
            quote_literal(&self.region),
            format
        )
    }
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_copy_uses_jsonpaths() {
        let command = CopyCommand {
            table: Table::StagingEvent,
            source: "s3://udacity-dend/log_data".to_string(),
            iam_role: "arn:aws:iam::123456789012:role/dwhRole".to_string(),
            region: "us-west-2".to_string(),
            format: JsonFormat::JsonPaths("s3://udacity-dend/log_json_path.json".to_string()),
        };

        assert_eq!(
            command.to_redshift_sql(),
            "COPY staging_event FROM 's3://udacity-dend/log_data'\n\
             CREDENTIALS 'aws_iam_role=arn:aws:iam::123456789012:role/dwhRole'\n\
             REGION 'us-west-2'\n\
             FORMAT AS JSON 's3://udacity-dend/log_json_path.json'"
        );
    }

    #[test]
    fn test_song_copy_is_auto_and_escapes_quotes() {
        let command = CopyCommand {
            table: Table::StagingSong,
            source: "s3://bucket/it's".to_string(),
            iam_role: "role".to_string(),
            region: "eu-west-1".to_string(),
            format: JsonFormat::Auto,
        };

        let sql = command.to_redshift_sql();
        assert!(sql.starts_with("COPY staging_song FROM 's3://bucket/it''s'"));
        assert!(sql.ends_with("FORMAT AS JSON 'auto'"));
    }
}
