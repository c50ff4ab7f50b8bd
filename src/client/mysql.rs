//! MySQL source connector

use super::ConnectionConfig;
use crate::error::{Side, TransferError};
use crate::etl::Connector;
use crate::rows::{MySqlRowExtractor, TableName};
use sqlx::ConnectOptions;
use sqlx::mysql::MySqlConnectOptions;

/// Opens the source connection and hands it to a [`MySqlRowExtractor`]
#[derive(Debug, Clone)]
pub struct MySqlSource {
    config: ConnectionConfig,
    table: TableName,
}

impl MySqlSource {
    pub fn new(config: ConnectionConfig, table: TableName) -> Self {
        Self { config, table }
    }

    fn options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.username)
            .database(&self.config.database);

        if !self.config.password.is_empty() {
            options = options.password(&self.config.password);
        }

        options.log_statements(log::LevelFilter::Debug)
    }
}

impl Connector for MySqlSource {
    type Connection = MySqlRowExtractor;

    fn describe(&self) -> String {
        format!("mysql://{}", self.config)
    }

    async fn connect(&self) -> Result<MySqlRowExtractor, TransferError> {
        let conn = self.options().connect().await.map_err(|e| {
            let reason = super::explain(&e, &self.config);
            TransferError::connection(Side::Source, self.describe(), reason)
        })?;
        Ok(MySqlRowExtractor::new(conn, self.describe(), &self.table))
    }
}
