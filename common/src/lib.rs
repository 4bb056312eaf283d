use thiserror::Error;
use url::ParseError;

pub mod config;
pub mod logging;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("DDL failed for table {table}: {message}")]
    Ddl { table: String, message: String },

    #[error("Bulk ingestion into {table} failed: {message}")]
    Ingestion { table: String, message: String },

    #[error("Transformation step {step} failed: {message}")]
    Transform { step: String, message: String },

    #[error("Object store error: {0}")]
    ObjectStore(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

impl From<object_store::Error> for Error {
    fn from(err: object_store::Error) -> Self {
        Error::ObjectStore(err.to_string())
    }
}

impl From<object_store::path::Error> for Error {
    fn from(err: object_store::path::Error) -> Self {
        Error::ObjectStore(format!("Invalid object path: {}", err))
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::InvalidInput(format!("URL parse error: {}", err))
    }
}
