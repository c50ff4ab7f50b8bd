//! CLI helper functions

use crate::{
    client::{MySqlSource, PostgresTarget},
    config::TransferConfig,
    error::TransferError,
    etl::{LogObserver, Pipeline, TransferResult},
    rows::RowMapper,
};
use eyre::{Context, Result};
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Process exit code for a completed run, per-row failures included
pub const EXIT_OK: i32 = 0;
/// Process exit code for a fatal connection or query failure
pub const EXIT_FATAL: i32 = 1;
/// Process exit code when the source stream broke mid-run
pub const EXIT_TRUNCATED: i32 = 2;
/// Process exit code when the run was interrupted
pub const EXIT_CANCELLED: i32 = 130;

/// Load the transfer configuration
///
/// Reads `config_file` when given, otherwise the process environment.
pub fn load_transfer_config(config_file: Option<&Path>) -> Result<TransferConfig> {
    match config_file {
        Some(path) => {
            log::debug!("Loading transfer config from {}", path.display());
            TransferConfig::read(path)
        }
        None => {
            log::debug!("Loading transfer config from environment");
            TransferConfig::from_env().context("Incomplete transfer configuration in environment")
        }
    }
}

/// Copy the configured source table into the configured target table
///
/// Pipeline: MySqlSource → RowMapper → PostgresTarget
pub async fn run_transfer(
    config: &TransferConfig,
    cancel: CancellationToken,
) -> Result<TransferResult, TransferError> {
    log::info!(
        "Transferring {} → {}",
        config.source_table,
        config.target_table
    );

    let source = MySqlSource::new(config.source.clone(), config.source_table.clone());
    let mut target = PostgresTarget::new(config.target.clone(), config.target_table.clone());
    if let Some(timeout) = config.timeout {
        target = target.with_insert_deadline(timeout);
    }

    let mut pipeline = Pipeline::new(source, RowMapper, target)
        .with_observer(LogObserver)
        .with_cancellation(cancel);
    if let Some(timeout) = config.timeout {
        log::debug!("Per-row deadline: {:?}", timeout);
        pipeline = pipeline.with_timeout(timeout);
    }

    pipeline.run().await
}

/// Map a run outcome onto the process exit code
pub fn exit_code(outcome: &Result<TransferResult, TransferError>) -> i32 {
    match outcome {
        Ok(result) if result.is_complete() => EXIT_OK,
        Ok(_) => EXIT_TRUNCATED,
        Err(TransferError::Cancelled) => EXIT_CANCELLED,
        Err(_) => EXIT_FATAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let complete = TransferResult {
            rows_read: 2,
            rows_inserted: 1,
            rows_failed: 1,
            ..Default::default()
        };
        assert_eq!(exit_code(&Ok(complete)), EXIT_OK);

        let truncated = TransferResult {
            stream_error: Some("reset".to_string()),
            ..Default::default()
        };
        assert_eq!(exit_code(&Ok(truncated)), EXIT_TRUNCATED);

        assert_eq!(exit_code(&Err(TransferError::Cancelled)), EXIT_CANCELLED);
        assert_eq!(
            exit_code(&Err(TransferError::Query("denied".to_string()))),
            EXIT_FATAL
        );
    }

    #[test]
    fn test_missing_config_file() {
        let err = load_transfer_config(Some(Path::new("/nonexistent/transfer.yml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read transfer config"));
    }
}
