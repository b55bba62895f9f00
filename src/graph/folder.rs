//! Presentation folders.
//!
//! Folders are placeholders an editor tree shows between a row and a group
//! of its children. They hold no state of their own; expanding one runs the
//! underlying query again.

use super::row::Row;
use super::GraphResult;
use crate::schema::Table;

/// Groups the structural children of one table under a parent row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFolder<'db> {
    parent: Row<'db>,
    table: Table,
}

impl<'db> RowFolder<'db> {
    pub(crate) fn new(parent: Row<'db>, table: Table) -> Self {
        RowFolder { parent, table }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    /// Display label, e.g. "Problem Spaces" for `problem_spaces`.
    pub fn label(&self) -> String {
        title_case(self.table.table_name())
    }

    pub fn items(&self) -> GraphResult<Vec<Row<'db>>> {
        self.parent.children_of_type(self.table)
    }
}

/// Groups the rows joined to a row from one table, undirected or directed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinFolder<'db> {
    row: Row<'db>,
    table: Table,
    directed: bool,
}

impl<'db> JoinFolder<'db> {
    pub(crate) fn new(row: Row<'db>, table: Table, directed: bool) -> Self {
        JoinFolder {
            row,
            table,
            directed,
        }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn label(&self) -> String {
        title_case(self.table.table_name())
    }

    pub fn items(&self) -> GraphResult<Vec<Row<'db>>> {
        if self.directed {
            self.row.directed_joined_children_of_type(self.table)
        } else {
            self.row.undirected_joined_rows(self.table)
        }
    }
}

fn title_case(table_name: &str) -> String {
    table_name
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
