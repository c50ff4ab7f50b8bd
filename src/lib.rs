//! rowpipe
//!
//! Streams rows from a MySQL table into a PostgreSQL table, one row at a
//! time, with per-row failure isolation.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod etl;
pub mod rows;

// Re-exports for convenience
pub use client::{ConnectionConfig, MySqlSource, PostgresTarget};
pub use config::TransferConfig;
pub use error::{MappingError, Side, TransferError};
pub use etl::{
    Connector, Extractor, Loader, Pipeline, TransferObserver, TransferResult, Transformer,
};
pub use rows::{MappedRow, RawRow, RowMapper, TableName};
