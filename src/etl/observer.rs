//! Progress and error reporting for pipeline runs
//!
//! The pipeline never writes to stdout/stderr itself. Everything a user
//! might want to see goes through a [`TransferObserver`]; the binary uses
//! [`LogObserver`], tests plug in recorders.

use super::{PipelineState, TransferResult};
use crate::error::{Side, TransferError};
use owo_colors::OwoColorize;
use std::fmt::Display;

/// Receives pipeline events as they happen
///
/// All methods default to doing nothing.
pub trait TransferObserver: Send + Sync {
    fn state_changed(&self, _from: PipelineState, _to: PipelineState) {}

    /// About to connect to `endpoint` (credentials already masked)
    fn connecting(&self, _side: Side, _endpoint: &str) {}

    fn connected(&self, _side: Side, _endpoint: &str) {}

    /// A connection was released; `error` is set if the graceful close failed
    fn released(&self, _side: Side, _error: Option<&TransferError>) {}

    /// Row number `position` (1-based, in stream order) was rejected by the transformer
    fn row_skipped(&self, _position: u64, _reason: &dyn Display) {}

    fn insert_failed(&self, _row: &dyn Display, _error: &TransferError) {}

    fn stream_truncated(&self, _error: &TransferError) {}

    /// The run ended on a fatal error, after resources were released
    fn failed(&self, _error: &TransferError) {}

    fn finished(&self, _result: &TransferResult) {}
}

/// Observer that reports through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl TransferObserver for LogObserver {
    fn state_changed(&self, from: PipelineState, to: PipelineState) {
        log::debug!("Pipeline state {} -> {}", from, to);
    }

    fn connecting(&self, side: Side, endpoint: &str) {
        log::info!("Connecting to {} {}", side, endpoint.bright_black());
    }

    fn connected(&self, side: Side, endpoint: &str) {
        log::info!("✓ Connected to {} {}", side, endpoint.bright_black());
    }

    fn released(&self, side: Side, error: Option<&TransferError>) {
        match error {
            None => log::debug!("Released {} connection", side),
            Some(e) => log::warn!("Failed to close {} connection cleanly: {}", side, e),
        }
    }

    fn row_skipped(&self, position: u64, reason: &dyn Display) {
        log::warn!("Skipping row {}: {}", position, reason);
    }

    fn insert_failed(&self, row: &dyn Display, error: &TransferError) {
        log::error!("Insert failed for row {}: {}", row, error);
    }

    fn stream_truncated(&self, error: &TransferError) {
        log::error!("{}", error);
    }

    fn failed(&self, error: &TransferError) {
        log::error!("{}", error.red());
    }

    fn finished(&self, result: &TransferResult) {
        log::info!(
            "✓ Transfer finished: read {}, inserted {}, skipped {}, failed {} ({} ms)",
            result.rows_read.cyan(),
            result.rows_inserted.green(),
            result.rows_skipped.yellow(),
            result.rows_failed.red(),
            result.elapsed.as_millis()
        );
        if let Some(error) = &result.stream_error {
            log::warn!("Source stream was truncated: {}", error);
        }
    }
}
