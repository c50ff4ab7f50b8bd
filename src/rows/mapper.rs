//! Source row → target row conversion

use super::{MappedRow, RawRow};
use crate::error::MappingError;
use crate::etl::Transformer;

/// Transformer from [`RawRow`] to [`MappedRow`]
///
/// # Example
/// ```
/// use rowpipe::etl::Transformer;
/// use rowpipe::rows::{RawRow, RowMapper};
///
/// let row = RawRow::new(Some("42"), Some("Alice"), None::<String>);
/// let mapped = RowMapper.transform(row).unwrap();
/// assert_eq!(mapped.id, 42);
/// assert_eq!(mapped.created_at, "");
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct RowMapper;

impl Transformer for RowMapper {
    type Input = RawRow;
    type Output = MappedRow;
    type Error = MappingError;

    fn transform(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        map_row(input)
    }
}

/// Map one source row onto the target shape
///
/// The id must parse as a strictly positive integer; surrounding whitespace
/// is ignored. Missing `name` and `created_at` become empty strings.
///
/// # Errors
/// Returns [`MappingError::InvalidId`] carrying the raw id value otherwise
pub fn map_row(row: RawRow) -> Result<MappedRow, MappingError> {
    let id = match row.id.as_deref().map(str::trim) {
        Some(text) => match text.parse::<i64>() {
            Ok(id) if id > 0 => id,
            _ => return Err(MappingError::InvalidId(row.id)),
        },
        None => return Err(MappingError::InvalidId(None)),
    };

    Ok(MappedRow {
        id,
        name: row.name.unwrap_or_default(),
        created_at: row.created_at.unwrap_or_default(),
    })
}
