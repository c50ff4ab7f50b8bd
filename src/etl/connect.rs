//! Connector trait for opening source and target connections

use crate::error::TransferError;
use std::future::Future;

/// Something that knows how to open one connection
///
/// Connectors hold resolved configuration only; nothing touches the
/// network until [`Connector::connect`] is awaited.
pub trait Connector: Send + Sync {
    /// The live handle produced by a successful connect
    type Connection: Send;

    /// Credential-free description of the endpoint, e.g. `etl@db:3306/shop`
    fn describe(&self) -> String;

    /// Open the connection
    ///
    /// # Errors
    /// Returns [`TransferError::Connection`] when the endpoint is unreachable,
    /// rejects the credentials, or the database does not exist
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, TransferError>> + Send;
}
