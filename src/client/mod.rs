//! Database connection settings and connectors.
//!
//! [`ConnectionConfig`] describes one endpoint; [`MySqlSource`] and
//! [`PostgresTarget`] turn configs into live extractors and loaders.

mod config;
mod mysql;
mod postgres;

pub use config::{ConnectionConfig, SourceConnectionConfig, TargetConnectionConfig, UrlParts};
pub use mysql::MySqlSource;
pub use postgres::PostgresTarget;

/// Turn a driver connect error into a message with a hint where one helps
fn explain(error: &sqlx::Error, config: &ConnectionConfig) -> String {
    let message = error.to_string();
    let lower = message.to_lowercase();
    if lower.contains("os error 111") || lower.contains("connection refused") {
        format!(
            "Connection refused ({}). Check that the server is running on {}",
            message,
            config.address()
        )
    } else if lower.contains("timed out") {
        format!("Connection timed out: {} did not respond", config.address())
    } else {
        message
    }
}
