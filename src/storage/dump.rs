//! Whole-graph serialization to replayable SQL.
//!
//! A dump is a sequence of semicolon-terminated INSERT statements covering
//! every entity table and every join table. Replaying the dump against a
//! freshly opened project reproduces the graph, ids included.

use std::fs;
use std::path::Path;

use rusqlite::types::Value as SqlValue;

use super::{Storage, StorageEvent, StorageResult};
use crate::schema::{directed_join_table_name, Table};

/// SQL string literal with embedded quotes doubled.
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(f) => f.to_string(),
        SqlValue::Text(s) => quote(s),
        // No blob columns exist in the schema; keep the dump total anyway.
        SqlValue::Blob(b) => format!(
            "X'{}'",
            b.iter().map(|byte| format!("{:02x}", byte)).collect::<String>()
        ),
    }
}

impl Storage {
    /// Serialize the whole graph to semicolon-terminated SQL statements.
    pub fn sql_dump(&self) -> StorageResult<String> {
        let mut out = String::new();
        for table in Table::ALL {
            let columns = self.registry().column_names(table);
            self.dump_table(table.table_name(), &columns, &mut out)?;
        }
        for &(first, second) in self.registry().join_pairs() {
            let name = self
                .registry()
                .join_table_name(first, second)
                .expect("declared join pair has a table name");
            self.dump_table(&name, &["first_id".into(), "second_id".into()], &mut out)?;
        }
        for &(parent, child) in self.registry().directed_join_pairs() {
            let name = directed_join_table_name(parent, child);
            self.dump_table(&name, &["parent_id".into(), "child_id".into()], &mut out)?;
        }
        Ok(out)
    }

    fn dump_table(
        &self,
        table_name: &str,
        columns: &[String],
        out: &mut String,
    ) -> StorageResult<()> {
        let sql = format!("SELECT {} FROM {}", columns.join(", "), table_name);
        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(literal(&row.get::<_, SqlValue>(i)?));
            }
            out.push_str(&format!(
                "INSERT INTO {} ({}) VALUES ({});\n",
                table_name,
                columns.join(", "),
                values.join(", ")
            ));
        }
        Ok(())
    }

    /// Replay a dump produced by [`Storage::sql_dump`] into this project.
    ///
    /// Events are suppressed during replay; exactly one
    /// [`StorageEvent::DatabasePathChanged`] fires at the end.
    pub fn restore_from_dump(&self, dump: &str) -> StorageResult<()> {
        let was_suppressed = self.set_suppress_events(true);
        let result = self.conn().execute_batch(dump);
        self.set_suppress_events(was_suppressed);
        result?;
        self.fire_event(StorageEvent::DatabasePathChanged);
        Ok(())
    }

    /// Read a dump file and replay it. A missing or unreadable file is a
    /// [`StorageError::Io`](super::StorageError::Io).
    pub fn restore_from_dump_file(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        let dump = fs::read_to_string(path)?;
        self.restore_from_dump(&dump)
    }
}
