//! Extractor trait for streaming rows out of a source

use crate::error::TransferError;
use futures::stream::BoxStream;
use std::future::Future;

/// A lazy, finite, single-pass sequence of extracted items
///
/// An `Err` item means the cursor broke mid-stream; nothing after it
/// should be polled.
pub type RowStream<'a, T> = BoxStream<'a, Result<T, TransferError>>;

/// Extractor trait for reading items from an open source connection
///
/// Implementors own their connection exclusively. `extract` may be called
/// once; the returned stream borrows the extractor until it is dropped,
/// after which `close` releases the connection.
///
/// # Example
/// ```no_run
/// use rowpipe::etl::{Extractor, RowStream};
/// use rowpipe::TransferError;
/// use futures::StreamExt;
///
/// struct Numbers(Vec<u32>);
///
/// impl Extractor for Numbers {
///     type Item = u32;
///
///     async fn extract(&mut self) -> Result<RowStream<'_, Self::Item>, TransferError> {
///         Ok(futures::stream::iter(self.0.clone().into_iter().map(Ok)).boxed())
///     }
///
///     async fn close(self) -> Result<(), TransferError> {
///         Ok(())
///     }
/// }
/// ```
pub trait Extractor: Send {
    /// The type of items extracted
    type Item: Send;

    /// Issue the read query and open a streaming cursor over its result
    ///
    /// # Errors
    /// Returns [`TransferError::Query`] if the query cannot be issued
    fn extract(
        &mut self,
    ) -> impl Future<Output = Result<RowStream<'_, Self::Item>, TransferError>> + Send;

    /// Release the underlying connection
    fn close(self) -> impl Future<Output = Result<(), TransferError>> + Send;
}
