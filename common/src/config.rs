use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::{Error, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub cluster: Option<ClusterConfig>,
    pub s3: S3Config,
    pub iam_role: IamRoleConfig,
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Clone)]
pub struct ClusterConfig {
    pub host: String,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    #[serde(default = "default_db_port")]
    pub db_port: u16,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("host", &self.host)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("db_password", &"***")
            .field("db_port", &self.db_port)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Bulk-source locations in object storage.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub log_data: String,
    pub log_jsonpath: String,
    pub song_data: String,
    #[serde(default = "default_region")]
    pub region: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IamRoleConfig {
    pub arn: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Redshift,
    Sqlite,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WarehouseConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_db_port() -> u16 {
    5439
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_sqlite_path() -> String {
    "dwh.sqlite".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Loads settings from `path`, then applies `DWH_`-prefixed environment
    /// overrides (`DWH_CLUSTER__DB_PASSWORD=...`).
    pub fn new(path: &str) -> Result<Self> {
        Self::load(path, environment())
    }

    fn load(path: &str, environment: Environment) -> Result<Self> {
        let builder = if is_ini(path) {
            let text = fs::read_to_string(path)?;
            Config::builder().add_source(File::from_str(&lowercase_ini_keys(&text), FileFormat::Ini))
        } else {
            Config::builder().add_source(File::with_name(path))
        };
        let builder = builder.add_source(environment);

        let config = builder.build()?;
        let mut settings: Settings = config.try_deserialize()?;
        settings.normalize();
        settings.validate()?;

        debug!(
            backend = ?settings.warehouse.backend,
            cluster = ?settings.cluster,
            s3 = ?settings.s3,
            "Loaded warehouse settings"
        );

        Ok(settings)
    }

    /// Connection settings, required whenever the Redshift backend is selected.
    pub fn cluster(&self) -> Result<&ClusterConfig> {
        self.cluster
            .as_ref()
            .ok_or_else(|| Error::InvalidConfig("missing [cluster] section".to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("s3.log_data", &self.s3.log_data),
            ("s3.log_jsonpath", &self.s3.log_jsonpath),
            ("s3.song_data", &self.s3.song_data),
            ("s3.region", &self.s3.region),
            ("iam_role.arn", &self.iam_role.arn),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{} must not be empty", key)));
            }
        }

        match self.warehouse.backend {
            Backend::Redshift => {
                let cluster = self.cluster()?;
                let required = [
                    ("cluster.host", &cluster.host),
                    ("cluster.db_name", &cluster.db_name),
                    ("cluster.db_user", &cluster.db_user),
                ];
                for (key, value) in required {
                    if value.trim().is_empty() {
                        return Err(Error::InvalidConfig(format!("{} must not be empty", key)));
                    }
                }
                if cluster.db_port == 0 {
                    return Err(Error::InvalidConfig("cluster.db_port must not be 0".to_string()));
                }
            }
            Backend::Sqlite => {
                if self.warehouse.sqlite_path.trim().is_empty() {
                    return Err(Error::InvalidConfig(
                        "warehouse.sqlite_path must not be empty".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    // dwh.cfg files conventionally quote locations: LOG_DATA='s3://bucket/log_data'
    fn normalize(&mut self) {
        for value in [
            &mut self.s3.log_data,
            &mut self.s3.log_jsonpath,
            &mut self.s3.song_data,
            &mut self.s3.region,
            &mut self.iam_role.arn,
        ] {
            *value = unquote(value).to_string();
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix("DWH")
        .prefix_separator("_")
        .separator("__")
}

// `.cfg` is not an extension the config crate recognises on its own.
fn is_ini(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("cfg") || ext.eq_ignore_ascii_case("ini"))
}

// INI sections and keys keep their case, while struct fields and environment
// overrides are lowercase. Values are left untouched.
fn lowercase_ini_keys(text: &str) -> String {
    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if trimmed.starts_with('[') {
                line.to_ascii_lowercase()
            } else if trimmed.starts_with(';') || trimmed.starts_with('#') {
                line.to_string()
            } else if let Some((key, value)) = line.split_once('=') {
                format!("{}={}", key.to_ascii_lowercase(), value)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn unquote(value: &str) -> &str {
    let trimmed = value.trim();
    for quote in ['\'', '"'] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_loads_ini_layout() {
        let file = write_config(
            ".cfg",
            r#"
[CLUSTER]
HOST=example.redshift.amazonaws.com
DB_NAME=dwh
DB_USER=dwhuser
DB_PASSWORD=secret
DB_PORT=5439

[IAM_ROLE]
ARN='arn:aws:iam::123456789012:role/dwhRole'

[S3]
LOG_DATA='s3://udacity-dend/log_data'
LOG_JSONPATH='s3://udacity-dend/log_json_path.json'
SONG_DATA='s3://udacity-dend/song_data'
"#,
        );

        let settings = Settings::new(file.path().to_str().unwrap()).unwrap();
        let cluster = settings.cluster().unwrap();
        assert_eq!(cluster.host, "example.redshift.amazonaws.com");
        assert_eq!(cluster.db_port, 5439);
        assert_eq!(settings.s3.log_data, "s3://udacity-dend/log_data");
        assert_eq!(settings.s3.region, "us-west-2");
        assert_eq!(settings.iam_role.arn, "arn:aws:iam::123456789012:role/dwhRole");
        assert_eq!(settings.warehouse.backend, Backend::Redshift);
    }

    #[test]
    fn test_shipped_dwh_cfg_with_env_overrides() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../dwh.cfg");
        let overrides: config::Map<String, String> = [
            ("DWH_CLUSTER__HOST", "example.redshift.amazonaws.com"),
            ("DWH_CLUSTER__DB_PASSWORD", "from-env"),
            ("DWH_IAM_ROLE__ARN", "arn:aws:iam::123456789012:role/dwhRole"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

        let settings = Settings::load(path, environment().source(Some(overrides))).unwrap();
        let cluster = settings.cluster().unwrap();
        assert_eq!(cluster.host, "example.redshift.amazonaws.com");
        assert_eq!(cluster.db_password, "from-env");
        assert_eq!(cluster.db_name, "dwh");
        assert_eq!(cluster.db_port, 5439);
        assert_eq!(settings.s3.song_data, "s3://udacity-dend/song_data");
        assert_eq!(settings.iam_role.arn, "arn:aws:iam::123456789012:role/dwhRole");
        assert_eq!(settings.warehouse.backend, Backend::Redshift);
        assert_eq!(settings.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_ini_keys_lowercased_values_kept() {
        let text = "[S3]\nLOG_DATA='s3://Bucket/Log_Data'\n; KEEP=comment\n";
        assert_eq!(
            lowercase_ini_keys(text),
            "[s3]\nlog_data='s3://Bucket/Log_Data'\n; KEEP=comment"
        );
    }

    #[test]
    fn test_sqlite_backend_needs_no_cluster() {
        let file = write_config(
            ".toml",
            r#"
[warehouse]
backend = "sqlite"
sqlite_path = ":memory:"

[s3]
log_data = "data/log_data"
log_jsonpath = "data/log_json_path.json"
song_data = "data/song_data"

[iam_role]
arn = "unused"

[logging]
format = "json"
"#,
        );

        let settings = Settings::new(file.path().to_str().unwrap()).unwrap();
        assert_eq!(settings.warehouse.backend, Backend::Sqlite);
        assert_eq!(settings.warehouse.sqlite_path, ":memory:");
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert!(settings.cluster.is_none());
    }

    #[test]
    fn test_redshift_backend_requires_cluster() {
        let file = write_config(
            ".toml",
            r#"
[s3]
log_data = "s3://bucket/log_data"
log_jsonpath = "s3://bucket/log_json_path.json"
song_data = "s3://bucket/song_data"

[iam_role]
arn = "arn:aws:iam::123456789012:role/dwhRole"
"#,
        );

        let err = Settings::new(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_missing_section_is_config_error() {
        let file = write_config(
            ".toml",
            r#"
[s3]
log_data = "s3://bucket/log_data"
log_jsonpath = "s3://bucket/log_json_path.json"
song_data = "s3://bucket/song_data"
"#,
        );

        let err = Settings::new(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_empty_location_rejected() {
        let file = write_config(
            ".toml",
            r#"
[warehouse]
backend = "sqlite"

[s3]
log_data = "''"
log_jsonpath = "data/log_json_path.json"
song_data = "data/song_data"

[iam_role]
arn = "unused"
"#,
        );

        let err = Settings::new(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(msg) if msg.contains("s3.log_data")));
    }

    #[test]
    fn test_debug_redacts_password() {
        let cluster = ClusterConfig {
            host: "h".to_string(),
            db_name: "d".to_string(),
            db_user: "u".to_string(),
            db_password: "hunter2".to_string(),
            db_port: 5439,
            connect_timeout_secs: 30,
        };
        assert!(!format!("{:?}", cluster).contains("hunter2"));
    }
}
