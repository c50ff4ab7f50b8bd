//! PostgreSQL target connector

use super::ConnectionConfig;
use crate::error::{Side, TransferError};
use crate::etl::Connector;
use crate::rows::{PostgresRowLoader, TableName};
use sqlx::ConnectOptions;
use sqlx::postgres::PgConnectOptions;
use std::time::Duration;

/// Opens the target connection and hands it to a [`PostgresRowLoader`]
#[derive(Debug, Clone)]
pub struct PostgresTarget {
    config: ConnectionConfig,
    table: TableName,
    insert_deadline: Option<Duration>,
}

impl PostgresTarget {
    pub fn new(config: ConnectionConfig, table: TableName) -> Self {
        Self {
            config,
            table,
            insert_deadline: None,
        }
    }

    /// Have the server abort any insert that runs past `deadline`
    ///
    /// Sets the session's `statement_timeout` a little under `deadline`, so
    /// a slow insert is rolled back by the server rather than committed
    /// after the client stopped waiting. The pipeline deadline still acts
    /// as a backstop when the server is unreachable.
    pub fn with_insert_deadline(mut self, deadline: Duration) -> Self {
        self.insert_deadline = Some(deadline);
        self
    }

    fn options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.username)
            .database(&self.config.database);

        if !self.config.password.is_empty() {
            options = options.password(&self.config.password);
        }
        if let Some(deadline) = self.insert_deadline {
            options = options.options([("statement_timeout", statement_timeout_millis(deadline))]);
        }

        options.log_statements(log::LevelFilter::Debug)
    }
}

impl Connector for PostgresTarget {
    type Connection = PostgresRowLoader;

    fn describe(&self) -> String {
        format!("postgres://{}", self.config)
    }

    async fn connect(&self) -> Result<PostgresRowLoader, TransferError> {
        let conn = self.options().connect().await.map_err(|e| {
            let reason = super::explain(&e, &self.config);
            TransferError::connection(Side::Target, self.describe(), reason)
        })?;
        Ok(PostgresRowLoader::new(conn, self.describe(), &self.table))
    }
}

/// Server-side limit in milliseconds: 90% of the client deadline, never 0
///
/// PostgreSQL reads a `statement_timeout` of 0 as "no limit".
fn statement_timeout_millis(deadline: Duration) -> u128 {
    (deadline.as_millis() * 9 / 10).max(1)
}
