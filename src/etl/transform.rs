//! Transformer trait for per-item conversion

/// Transformer trait for converting one extracted item into one loadable item
///
/// Transformers are pure: the same input always gives the same output and
/// nothing outside the item is touched. A transform error means the item is
/// skipped, not that the run failed.
///
/// # Example
/// ```
/// use rowpipe::etl::Transformer;
///
/// struct Trim;
///
/// impl Transformer for Trim {
///     type Input = String;
///     type Output = String;
///     type Error = std::convert::Infallible;
///
///     fn transform(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
///         Ok(input.trim().to_string())
///     }
/// }
///
/// assert_eq!(Trim.transform("  a ".to_string()).unwrap(), "a");
/// ```
pub trait Transformer: Send + Sync {
    /// Input item type
    type Input: Send;

    /// Output item type after transformation
    type Output: Send;

    /// Why an item was rejected
    type Error: std::fmt::Display + Send;

    /// Transform a single item
    ///
    /// # Errors
    /// Returns an error if the item cannot be represented in the output shape
    fn transform(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;
}
