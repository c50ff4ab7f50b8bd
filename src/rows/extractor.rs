//! MySQL row extractor
//!
//! Reads `(id, name, created_at)` from one table over a single connection,
//! streaming rows off the socket as they arrive.

use super::{RawRow, TableName, select_statement};
use crate::error::{Side, TransferError};
use crate::etl::{Extractor, RowStream};
use futures::StreamExt;
use sqlx::mysql::MySqlRow;
use sqlx::{Connection, Executor, MySqlConnection, Row};

/// Extractor over an open MySQL connection
///
/// The query runs through the text protocol, so every column arrives in its
/// textual form regardless of its SQL type. That is what lets [`RawRow`]
/// stay "nullable text" for integer and datetime columns alike.
pub struct MySqlRowExtractor {
    conn: MySqlConnection,
    endpoint: String,
    query: String,
}

impl MySqlRowExtractor {
    /// Wrap an already-open connection
    ///
    /// # Arguments
    /// * `conn` - Connection this extractor takes exclusive ownership of
    /// * `endpoint` - Masked endpoint description, used in error messages
    /// * `table` - Source table to read from
    pub fn new(conn: MySqlConnection, endpoint: impl Into<String>, table: &TableName) -> Self {
        Self {
            conn,
            endpoint: endpoint.into(),
            query: select_statement(table),
        }
    }
}

impl Extractor for MySqlRowExtractor {
    type Item = RawRow;

    async fn extract(&mut self) -> Result<RowStream<'_, RawRow>, TransferError> {
        let Self { conn, query, .. } = self;

        // Preparing first surfaces a missing table or privilege as a query
        // failure instead of an error on the first fetch.
        log::debug!("Preparing source query: {}", query);
        (&mut *conn)
            .prepare(query.as_str())
            .await
            .map_err(|e| TransferError::Query(e.to_string()))?;

        let rows = sqlx::raw_sql(query.as_str())
            .fetch(&mut *conn)
            .map(|row| {
                row.map_err(|e| TransferError::Stream(e.to_string()))
                    .and_then(|row| raw_row(&row))
            })
            .boxed();

        Ok(rows)
    }

    async fn close(self) -> Result<(), TransferError> {
        let endpoint = self.endpoint;
        self.conn
            .close()
            .await
            .map_err(|e| TransferError::connection(Side::Source, endpoint, e))
    }
}

fn raw_row(row: &MySqlRow) -> Result<RawRow, TransferError> {
    Ok(RawRow {
        id: text_column(row, 0)?,
        name: text_column(row, 1)?,
        created_at: text_column(row, 2)?,
    })
}

fn text_column(row: &MySqlRow, index: usize) -> Result<Option<String>, TransferError> {
    let bytes: Option<Vec<u8>> = row
        .try_get_unchecked(index)
        .map_err(|e| TransferError::Stream(format!("column {}: {}", index, e)))?;
    Ok(bytes.map(|b| String::from_utf8_lossy(&b).into_owned()))
}
