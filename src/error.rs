//! Error types for transfer runs
//!
//! [`TransferError`] covers everything that can go wrong while talking to
//! either database. Some variants end the run ([`TransferError::is_fatal`]),
//! the rest are isolated to a single row and only show up in the counters.
//! [`MappingError`] is the row mapper's own error and never leaves the
//! per-row step.

use std::time::Duration;
use thiserror::Error;

/// Which end of the pipeline an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Target => write!(f, "target"),
        }
    }
}

/// Errors raised by connectors, extractors and loaders
#[derive(Error, Debug)]
pub enum TransferError {
    /// Network, authentication or missing-database failure while connecting
    #[error("{side} connection to {endpoint} failed: {message}")]
    Connection {
        side: Side,
        endpoint: String,
        message: String,
    },

    /// The source query could not be issued
    #[error("Source query failed: {0}")]
    Query(String),

    /// A row fetch failed after the cursor was opened
    #[error("Source stream interrupted: {0}")]
    Stream(String),

    /// The target rejected a single row
    #[error("Insert failed: {0}")]
    Insert(String),

    /// A row fetch or insert exceeded the configured deadline
    #[error("{operation} timed out after {limit:?}")]
    Timeout { operation: String, limit: Duration },

    /// The run was cancelled before the stream was exhausted
    #[error("Transfer cancelled")]
    Cancelled,
}

impl TransferError {
    /// Build a connection error from any displayable driver error
    pub fn connection(
        side: Side,
        endpoint: impl Into<String>,
        error: impl std::fmt::Display,
    ) -> Self {
        Self::Connection {
            side,
            endpoint: endpoint.into(),
            message: error.to_string(),
        }
    }

    /// Fatal errors end the run; everything else is recorded per row
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Query(_) | Self::Cancelled
        )
    }
}

/// Errors produced while mapping a source row onto the target shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// The id column is absent, empty, non-numeric or not strictly positive
    #[error("invalid id {}", quoted_or_null(.0))]
    InvalidId(Option<String>),
}

fn quoted_or_null(value: &Option<String>) -> String {
    match value {
        Some(v) => format!("'{}'", v),
        None => "NULL".to_string(),
    }
}
