//! Loader trait for writing items to a destination

use crate::error::TransferError;
use async_trait::async_trait;

/// Loader trait for writing one item at a time to an open target connection
///
/// A failed `load` is scoped to that item; the loader must stay usable
/// for the next one.
///
/// # Example
/// ```no_run
/// use rowpipe::etl::Loader;
/// use rowpipe::TransferError;
/// use async_trait::async_trait;
///
/// struct VecLoader(Vec<String>);
///
/// #[async_trait]
/// impl Loader for VecLoader {
///     type Item = String;
///
///     async fn load(&mut self, item: &Self::Item) -> Result<(), TransferError> {
///         self.0.push(item.clone());
///         Ok(())
///     }
///
///     async fn close(self) -> Result<(), TransferError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Loader: Send {
    /// The type of items to load
    type Item: Send + Sync;

    /// Persist a single item
    ///
    /// # Errors
    /// Returns [`TransferError::Insert`] if the destination rejects the item
    async fn load(&mut self, item: &Self::Item) -> Result<(), TransferError>;

    /// Release the underlying connection
    async fn close(self) -> Result<(), TransferError>;
}
