//! Table names and the SQL built around them
//!
//! Identifiers can't be bound as parameters, so table names are checked
//! against a conservative pattern and then quoted in each dialect before
//! they are spliced into SQL. Quoting keeps reserved words such as `table`
//! usable and makes PostgreSQL names case-sensitive.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]{0,62}(\.[A-Za-z_][A-Za-z0-9_$]{0,62})?$")
        .expect("identifier pattern is valid")
});

/// Columns read from the source and written to the target, in order
pub const COLUMNS: [&str; 3] = ["id", "name", "created_at"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid table name")]
pub struct InvalidTableName(pub String);

/// A plain or schema-qualified table name, e.g. `orders` or `public.orders`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    pub fn parse(name: impl Into<String>) -> Result<Self, InvalidTableName> {
        let name = name.into();
        let trimmed = name.trim();
        if IDENTIFIER.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(InvalidTableName(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Each dot-separated part in backticks, e.g. `` `shop`.`orders` ``
    pub fn quoted_mysql(&self) -> String {
        self.quoted_parts(|part| format!("`{}`", part.replace('`', "``")))
    }

    /// Each dot-separated part in double quotes, e.g. `"public"."Orders"`
    pub fn quoted_postgres(&self) -> String {
        self.quoted_parts(|part| format!("\"{}\"", part.replace('"', "\"\"")))
    }

    fn quoted_parts(&self, quote: impl Fn(&str) -> String) -> String {
        self.0.split('.').map(quote).collect::<Vec<_>>().join(".")
    }
}

impl TryFrom<String> for TableName {
    type Error = InvalidTableName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TableName> for String {
    fn from(value: TableName) -> Self {
        value.0
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `SELECT id, name, created_at FROM <table>` in MySQL quoting
///
/// No ORDER BY: rows arrive in whatever order the source returns them.
pub fn select_statement(table: &TableName) -> String {
    format!("SELECT {} FROM {}", COLUMNS.join(", "), table.quoted_mysql())
}

/// Parameterized single-row insert in PostgreSQL placeholder syntax
///
/// `created_at` is bound as text and cast server-side so it lands in
/// `timestamp` columns. A text column gets the normalized timestamp back,
/// not the source string.
pub fn insert_statement(table: &TableName) -> String {
    format!(
        "INSERT INTO {} ({}) VALUES ($1, $2, $3::timestamp)",
        table.quoted_postgres(),
        COLUMNS.join(", ")
    )
}
