//! Row-level view of the project graph.
//!
//! [`Row`] is a lightweight handle (table, id, storage reference) with the
//! navigation and mutation operations; [`RowFolder`] and [`JoinFolder`] are
//! presentation placeholders for grouped children; the materializer turns a
//! parsed production into a rule's row subtree.

mod folder;
mod materialize;
mod row;

pub use folder::{JoinFolder, RowFolder};
pub use materialize::materialize_rule;
pub use row::{ChildOptions, Row, TreeItem};

use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("tables {first} and {second} are not declared joinable")]
    NotJoinable {
        first: &'static str,
        second: &'static str,
    },

    #[error("{child} is not a declared child of {parent}")]
    StructuralMismatch {
        parent: &'static str,
        child: &'static str,
    },

    #[error("column {column} on {table} is not editable")]
    NotEditable {
        table: &'static str,
        column: String,
    },

    #[error("value {value:?} does not fit the type of column {column}")]
    ColumnTypeMismatch { column: String, value: String },

    #[error("expected a {expected} row, got {found}")]
    WrongTable {
        expected: &'static str,
        found: &'static str,
    },
}

pub type GraphResult<T> = Result<T, GraphError>;
