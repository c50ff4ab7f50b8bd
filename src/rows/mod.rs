//! Row shapes and the concrete MySQL → PostgreSQL row transfer
//!
//! - [`RawRow`]: what the source cursor yields, every column nullable text
//! - [`MappedRow`]: what the target table receives
//! - [`RowMapper`]: the pure conversion between the two
//! - [`MySqlRowExtractor`] / [`PostgresRowLoader`]: the live ends

mod extractor;
mod loader;
mod mapper;
mod table;

pub use extractor::MySqlRowExtractor;
pub use loader::PostgresRowLoader;
pub use mapper::{RowMapper, map_row};
pub use table::{InvalidTableName, TableName, insert_statement, select_statement};

/// One row as read from the source: `(id, name, created_at)`, each nullable
///
/// Values are the textual form the source sends over the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub id: Option<String>,
    pub name: Option<String>,
    pub created_at: Option<String>,
}

impl RawRow {
    pub fn new(
        id: Option<impl Into<String>>,
        name: Option<impl Into<String>>,
        created_at: Option<impl Into<String>>,
    ) -> Self {
        Self {
            id: id.map(Into::into),
            name: name.map(Into::into),
            created_at: created_at.map(Into::into),
        }
    }
}

/// One row shaped for the target table
///
/// `id` is always strictly positive; rows that can't satisfy that never
/// get this far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRow {
    pub id: i64,
    pub name: String,
    /// Timestamp text as received, e.g. `2024-01-01 09:30:00`
    pub created_at: String,
}

impl std::fmt::Display for MappedRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "id={} name={:?}", self.id, self.name)
    }
}
