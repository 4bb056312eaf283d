use async_trait::async_trait;
use common::config::ClusterConfig;
use common::{Error, Result};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::{debug, error, info, warn};

use super::copy::CopyCommand;
use super::{Dialect, Warehouse};
use crate::models::Table;

/// One session against a Redshift cluster over the PostgreSQL wire protocol.
///
/// Statements go through the simple query protocol, so each one outside
/// `execute_unit` commits on its own, and COPY runs inside the warehouse.
pub struct RedshiftWarehouse {
    client: Client,
    connection: JoinHandle<()>,
}

impl RedshiftWarehouse {
    pub async fn connect(cluster: &ClusterConfig) -> Result<Self> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&cluster.host)
            .port(cluster.db_port)
            .dbname(&cluster.db_name)
            .user(&cluster.db_user)
            .password(&cluster.db_password)
            .connect_timeout(Duration::from_secs(cluster.connect_timeout_secs));

        let (client, connection) = config.connect(NoTls).await.map_err(|e| {
            Error::Connection(format!(
                "Failed to connect to Redshift at {}:{}/{}: {}",
                cluster.host, cluster.db_port, cluster.db_name, e
            ))
        })?;

        let handle = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Redshift connection error: {}", e);
            }
        });

        info!(
            host = %cluster.host,
            port = cluster.db_port,
            database = %cluster.db_name,
            "Connected to Redshift"
        );

        Ok(Self {
            client,
            connection: handle,
        })
    }

    async fn run(&self, sql: &str) -> Result<u64> {
        let messages = self.client.simple_query(sql).await?;
        Ok(affected_rows(&messages))
    }
}

fn affected_rows(messages: &[SimpleQueryMessage]) -> u64 {
    messages
        .iter()
        .map(|message| match message {
            SimpleQueryMessage::CommandComplete(rows) => *rows,
            _ => 0,
        })
        .sum()
}

#[async_trait]
impl Warehouse for RedshiftWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Redshift
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        self.run(sql).await
    }

    async fn execute_unit(&self, statements: &[String]) -> Result<Vec<u64>> {
        self.run("BEGIN").await?;

        let mut affected = Vec::with_capacity(statements.len());
        for statement in statements {
            match self.run(statement).await {
                Ok(rows) => affected.push(rows),
                Err(e) => {
                    if let Err(rollback) = self.run("ROLLBACK").await {
                        warn!("Rollback failed: {}", rollback);
                    }
                    return Err(e);
                }
            }
        }

        self.run("COMMIT").await?;
        Ok(affected)
    }

    async fn copy_into(&self, command: &CopyCommand) -> Result<u64> {
        let sql = command.to_redshift_sql();
        debug!(table = %command.table, source = %command.source, "Issuing COPY");

        self.run(&sql).await.map_err(|e| Error::Ingestion {
            table: command.table.to_string(),
            message: e.to_string(),
        })
    }

    async fn count_rows(&self, table: Table) -> Result<i64> {
        let messages = self
            .client
            .simple_query(&format!("SELECT COUNT(*) FROM {}", table))
            .await?;

        messages
            .iter()
            .find_map(|message| match message {
                SimpleQueryMessage::Row(row) => row.get(0).map(str::to_string),
                _ => None,
            })
            .ok_or_else(|| Error::Other(format!("COUNT(*) on {} returned no row", table)))?
            .parse::<i64>()
            .map_err(|e| Error::Other(format!("COUNT(*) on {} returned a non-integer: {}", table, e)))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let this = *self;
        drop(this.client);
        this.connection
            .await
            .map_err(|e| Error::Connection(format!("Redshift connection task failed: {}", e)))
    }
}
