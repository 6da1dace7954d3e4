//! Result types for sqlprompt.
//!
//! Defines the structures used to describe and carry statement results.

/// A row of already-stringified cells; `None` is SQL NULL.
pub type Row = Vec<Option<String>>;

/// Metadata about a column in a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,

    /// Whether the server type is character data (left-justified when shown).
    pub is_textual: bool,
}

impl ColumnDescriptor {
    /// Creates a new column descriptor.
    pub fn new(name: impl Into<String>, is_textual: bool) -> Self {
        Self {
            name: name.into(),
            is_textual,
        }
    }

    /// Creates a descriptor for a character column.
    pub fn textual(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    /// Creates a descriptor for a non-character column.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }
}

/// Returns true if a server type name denotes character data.
///
/// Matching is case-insensitive and ignores length modifiers such as `(255)`.
pub fn is_textual_type(type_name: &str) -> bool {
    let upper = type_name.trim().to_ascii_uppercase();
    let base = upper
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or("");

    matches!(
        base,
        "CHAR"
            | "CHARACTER"
            | "VARCHAR"
            | "BPCHAR"
            | "NCHAR"
            | "NVARCHAR"
            | "TEXT"
            | "TINYTEXT"
            | "MEDIUMTEXT"
            | "LONGTEXT"
            | "CLOB"
            | "NAME"
            | "CITEXT"
            | "ENUM"
            | "SET"
    )
}
