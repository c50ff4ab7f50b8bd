//! PostgreSQL row loader
//!
//! Inserts one [`MappedRow`] per statement. Every value is a bound
//! parameter, so quotes and backslashes in the data need no escaping.

use super::{MappedRow, TableName, insert_statement};
use crate::error::{Side, TransferError};
use crate::etl::Loader;
use async_trait::async_trait;
use sqlx::{Connection, PgConnection};

/// Loader over an open PostgreSQL connection
pub struct PostgresRowLoader {
    conn: PgConnection,
    endpoint: String,
    statement: String,
}

impl PostgresRowLoader {
    /// Wrap an already-open connection
    ///
    /// # Arguments
    /// * `conn` - Connection this loader takes exclusive ownership of
    /// * `endpoint` - Masked endpoint description, used in error messages
    /// * `table` - Target table to insert into
    pub fn new(conn: PgConnection, endpoint: impl Into<String>, table: &TableName) -> Self {
        Self {
            conn,
            endpoint: endpoint.into(),
            statement: insert_statement(table),
        }
    }
}

#[async_trait]
impl Loader for PostgresRowLoader {
    type Item = MappedRow;

    async fn load(&mut self, row: &MappedRow) -> Result<(), TransferError> {
        let done = sqlx::query(&self.statement)
            .bind(row.id)
            .bind(row.name.as_str())
            .bind(row.created_at.as_str())
            .execute(&mut self.conn)
            .await
            .map_err(|e| TransferError::Insert(e.to_string()))?;

        if done.rows_affected() != 1 {
            return Err(TransferError::Insert(format!(
                "expected 1 row affected, got {}",
                done.rows_affected()
            )));
        }

        Ok(())
    }

    async fn close(self) -> Result<(), TransferError> {
        let endpoint = self.endpoint;
        self.conn
            .close()
            .await
            .map_err(|e| TransferError::connection(Side::Target, endpoint, e))
    }
}
