//! Per-run counters

use std::time::Duration;

/// Aggregate outcome of one pipeline run
///
/// Every row read from the source ends up in exactly one of the
/// inserted, skipped or failed buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferResult {
    pub rows_read: u64,
    pub rows_inserted: u64,
    /// Rows rejected by the transformer, never sent to the target
    pub rows_skipped: u64,
    /// Rows the target rejected
    pub rows_failed: u64,
    /// Set when the source cursor broke before the end of the result set
    pub stream_error: Option<String>,
    pub elapsed: Duration,
}

impl TransferResult {
    /// Whether every read row was accounted for exactly once
    pub fn is_balanced(&self) -> bool {
        self.rows_read == self.rows_inserted + self.rows_skipped + self.rows_failed
    }

    /// False when the stream ended on a fetch failure instead of exhaustion
    pub fn is_complete(&self) -> bool {
        self.stream_error.is_none()
    }
}

impl std::fmt::Display for TransferResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "read {}, inserted {}, skipped {}, failed {} in {} ms",
            self.rows_read,
            self.rows_inserted,
            self.rows_skipped,
            self.rows_failed,
            self.elapsed.as_millis()
        )?;
        if let Some(error) = &self.stream_error {
            write!(f, " (truncated: {})", error)?;
        }
        Ok(())
    }
}
