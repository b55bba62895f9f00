//! The row handle: navigation and mutation over the project graph.
//!
//! A [`Row`] is a view, not an entity: (table, id, storage reference) plus a
//! cached display name. Two handles are equal when table and id match, so
//! rows can be freely re-created, collected into sets, and compared across
//! call sites.

use std::cell::RefCell;
use std::collections::HashSet;

use rusqlite::params;

use super::{materialize, GraphError, GraphResult, JoinFolder, RowFolder};
use crate::ast::ProductionAst;
use crate::schema::{directed_join_table_name, ColumnType, EditableColumn, Table};
use crate::storage::{Storage, StorageEvent, Value};

/// Flags controlling what [`Row::children`] returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChildOptions {
    /// Wrap folder-declared child tables in [`RowFolder`] placeholders.
    pub include_folders: bool,
    /// Inline the rows of folder-declared child tables instead of folders.
    pub include_children_in_folders: bool,
    /// Append a [`JoinFolder`] per undirected join partner table.
    pub include_joined: bool,
    /// Append a [`JoinFolder`] per directed join child table.
    pub include_directed_joined: bool,
    /// Include datamap node tables at all.
    pub include_datamap_nodes: bool,
}

impl ChildOptions {
    /// Structural child rows only, no placeholders, no datamap nodes.
    pub fn rows_only() -> ChildOptions {
        ChildOptions::default()
    }

    /// Everything an editor tree would show.
    pub fn full() -> ChildOptions {
        ChildOptions {
            include_folders: true,
            include_children_in_folders: false,
            include_joined: true,
            include_directed_joined: true,
            include_datamap_nodes: true,
        }
    }
}

/// One entry in a row's child listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeItem<'db> {
    Row(Row<'db>),
    Folder(RowFolder<'db>),
    JoinFolder(JoinFolder<'db>),
}

/// A handle to one record in the project graph.
#[derive(Clone)]
pub struct Row<'db> {
    table: Table,
    id: i64,
    store: &'db Storage,
    name: RefCell<Option<String>>,
}

impl std::fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Row")
            .field("table", &self.table)
            .field("id", &self.id)
            .finish()
    }
}

impl PartialEq for Row<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.id == other.id
    }
}

impl Eq for Row<'_> {}

impl std::hash::Hash for Row<'_> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.table.hash(state);
        self.id.hash(state);
    }
}

impl<'db> Row<'db> {
    pub fn new(table: Table, id: i64, store: &'db Storage) -> Row<'db> {
        Row {
            table,
            id,
            store,
            name: RefCell::new(None),
        }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn storage(&self) -> &'db Storage {
        self.store
    }

    /// Every row of one table, in id order.
    pub fn all_in_table(store: &'db Storage, table: Table) -> GraphResult<Vec<Row<'db>>> {
        let sql = format!("SELECT id FROM {} ORDER BY id", table.table_name());
        let mut stmt = store.conn().prepare(&sql)?;
        let mut result = stmt.query([])?;
        let mut rows = Vec::new();
        while let Some(record) = result.next()? {
            let id: i64 = record.get(0)?;
            rows.push(Row::new(table, id, store));
        }
        Ok(rows)
    }

    pub fn exists(&self) -> GraphResult<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE id = ?1", self.table.table_name());
        let mut stmt = self.store.conn().prepare(&sql)?;
        Ok(stmt.exists(params![self.id])?)
    }

    // ===== Name and columns =====

    /// The display name, cached after the first read.
    ///
    /// A missing record or a storage failure degrades to a placeholder
    /// instead of failing: navigation stays usable over a broken reference,
    /// and the warning in the log is the signal to investigate.
    pub fn name(&self) -> String {
        if let Some(name) = self.name.borrow().as_ref() {
            return name.clone();
        }
        let fetched = match self.column_string("name") {
            Ok(Some(name)) => name,
            Ok(None) => {
                log::warn!(
                    "no {} row with id {}",
                    self.table.table_name(),
                    self.id
                );
                format!("{}: NO ROW WITH ID {}", self.table.table_name(), self.id)
            }
            Err(e) => {
                log::warn!(
                    "reading name of {} id {}: {}",
                    self.table.table_name(),
                    self.id,
                    e
                );
                format!("{}: NO ROW WITH ID {}", self.table.table_name(), self.id)
            }
        };
        *self.name.borrow_mut() = Some(fetched.clone());
        fetched
    }

    pub fn set_name(&self, name: &str) -> GraphResult<()> {
        self.update_column("name", &Value::text(name))?;
        *self.name.borrow_mut() = Some(name.to_string());
        Ok(())
    }

    fn query_column<T: rusqlite::types::FromSql>(
        &self,
        column: &str,
    ) -> GraphResult<Option<T>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            column,
            self.table.table_name()
        );
        let mut stmt = self.store.conn().prepare(&sql)?;
        let mut rows = stmt.query(params![self.id])?;
        match rows.next()? {
            Some(row) => Ok(row.get::<_, Option<T>>(0)?),
            None => Ok(None),
        }
    }

    pub fn column_string(&self, column: &str) -> GraphResult<Option<String>> {
        self.query_column(column)
    }

    pub fn column_i64(&self, column: &str) -> GraphResult<Option<i64>> {
        self.query_column(column)
    }

    pub fn column_f64(&self, column: &str) -> GraphResult<Option<f64>> {
        self.query_column(column)
    }

    /// Integer column read as a boolean flag (`1` is true).
    pub fn column_flag(&self, column: &str) -> GraphResult<bool> {
        Ok(self.column_i64(column)?.unwrap_or(0) != 0)
    }

    pub fn update_column(&self, column: &str, value: &Value) -> GraphResult<()> {
        self.update_columns(&[(column, value.clone())])
    }

    /// One UPDATE statement covering several columns, all values bound by
    /// parameter. Fires a single change event.
    pub fn update_columns(&self, columns: &[(&str, Value)]) -> GraphResult<()> {
        if columns.is_empty() {
            return Ok(());
        }
        let sets: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, (name, _))| format!("{} = ?{}", name, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            self.table.table_name(),
            sets.join(", "),
            columns.len() + 1
        );
        let mut stmt = self.store.conn().prepare(&sql)?;
        let mut values: Vec<&dyn rusqlite::ToSql> =
            columns.iter().map(|(_, v)| v as &dyn rusqlite::ToSql).collect();
        values.push(&self.id);
        stmt.execute(values.as_slice())?;
        self.store.fire_event(StorageEvent::DatabaseChanged);
        Ok(())
    }

    // ===== Structural navigation =====

    /// One level of children, shaped by `options`.
    pub fn children(&self, options: ChildOptions) -> GraphResult<Vec<TreeItem<'db>>> {
        let registry = self.store.registry();
        let mut items = Vec::new();
        for &child in registry.children_of(self.table) {
            if child.is_datamap_node() && !options.include_datamap_nodes {
                continue;
            }
            let foldered = registry.folder_tables_of(self.table).contains(&child);
            if foldered && options.include_folders && !options.include_children_in_folders {
                items.push(TreeItem::Folder(RowFolder::new(self.clone(), child)));
            } else {
                for row in self.children_of_type(child)? {
                    items.push(TreeItem::Row(row));
                }
            }
        }
        if options.include_joined {
            for partner in registry.join_partners_of(self.table) {
                items.push(TreeItem::JoinFolder(JoinFolder::new(
                    self.clone(),
                    partner,
                    false,
                )));
            }
        }
        if options.include_directed_joined {
            for child in registry.directed_children_of(self.table) {
                if child.is_datamap_node() && !options.include_datamap_nodes {
                    continue;
                }
                items.push(TreeItem::JoinFolder(JoinFolder::new(
                    self.clone(),
                    child,
                    true,
                )));
            }
        }
        Ok(items)
    }

    /// Structural children from one table, in id order.
    pub fn children_of_type(&self, table: Table) -> GraphResult<Vec<Row<'db>>> {
        if !self.store.registry().children_of(self.table).contains(&table) {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id FROM {} WHERE {} = ?1 ORDER BY id",
            table.table_name(),
            self.table.id_column()
        );
        self.collect_rows(&sql, table)
    }

    pub fn has_children(&self) -> GraphResult<bool> {
        for &child in self.store.registry().children_of(self.table) {
            if self.has_children_of_type(child)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn has_children_of_type(&self, table: Table) -> GraphResult<bool> {
        if !self.store.registry().children_of(self.table).contains(&table) {
            return Ok(false);
        }
        let sql = format!(
            "SELECT 1 FROM {} WHERE {} = ?1",
            table.table_name(),
            self.table.id_column()
        );
        let mut stmt = self.store.conn().prepare(&sql)?;
        Ok(stmt.exists(params![self.id])?)
    }

    /// Structural parents: for each declared parent relation, the row the
    /// foreign key points at, if set.
    pub fn parent_rows(&self) -> GraphResult<Vec<Row<'db>>> {
        let mut parents = Vec::new();
        for &parent in self.store.registry().parents_of(self.table) {
            if let Some(id) = self.column_i64(&parent.id_column())? {
                parents.push(Row::new(parent, id, self.store));
            }
        }
        Ok(parents)
    }

    pub fn has_parent_rows(&self) -> GraphResult<bool> {
        Ok(!self.parent_rows()?.is_empty())
    }

    /// Climbs structural parents until a row with none remains.
    pub fn top_level_row(&self) -> GraphResult<Row<'db>> {
        let mut current = self.clone();
        let mut visited = HashSet::new();
        visited.insert((current.table, current.id));
        loop {
            let parents = current.parent_rows()?;
            match parents.into_iter().next() {
                Some(parent) if visited.insert((parent.table, parent.id)) => current = parent,
                _ => return Ok(current),
            }
        }
    }

    /// The nearest structural ancestor from `table`, breadth-first.
    pub fn ancestor_row(&self, table: Table) -> GraphResult<Option<Row<'db>>> {
        let mut visited = HashSet::new();
        let mut frontier = vec![self.clone()];
        visited.insert((self.table, self.id));
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for row in frontier {
                for parent in row.parent_rows()? {
                    if parent.table == table {
                        return Ok(Some(parent));
                    }
                    if visited.insert((parent.table, parent.id)) {
                        next.push(parent);
                    }
                }
            }
            frontier = next;
        }
        Ok(None)
    }

    /// Every descendant from `table`, traversing structural and directed
    /// children with an explicit visited set, so cyclic datamap graphs
    /// terminate.
    pub fn descendants_of_type(&self, table: Table) -> GraphResult<Vec<Row<'db>>> {
        let mut found = Vec::new();
        let mut visited = HashSet::new();
        visited.insert((self.table, self.id));
        let mut stack = vec![self.clone()];
        while let Some(row) = stack.pop() {
            let mut next = Vec::new();
            for &child in self.store.registry().children_of(row.table) {
                next.extend(row.children_of_type(child)?);
            }
            for child in self.store.registry().directed_children_of(row.table) {
                next.extend(row.directed_joined_children_of_type(child)?);
            }
            // Reverse so declaration order pops first.
            for child in next.into_iter().rev() {
                if visited.insert((child.table, child.id)) {
                    if child.table == table {
                        found.push(child.clone());
                    }
                    stack.push(child);
                }
            }
        }
        Ok(found)
    }

    // ===== Joins =====

    /// Rows joined to this one from `table`: undirected partners plus
    /// directed children.
    pub fn joined_rows_from_table(&self, table: Table) -> GraphResult<Vec<Row<'db>>> {
        let mut rows = self.undirected_joined_rows(table)?;
        rows.extend(self.directed_joined_children_of_type(table)?);
        Ok(rows)
    }

    pub fn has_joined_rows_from_table(&self, table: Table) -> GraphResult<bool> {
        Ok(!self.joined_rows_from_table(table)?.is_empty())
    }

    /// Undirected join partners from `table`, in edge insertion order.
    pub fn undirected_joined_rows(&self, table: Table) -> GraphResult<Vec<Row<'db>>> {
        let registry = self.store.registry();
        let (first, second) = match registry.ordered_join_pair(self.table, table) {
            Some(pair) => pair,
            None => return Ok(Vec::new()),
        };
        let join_table = registry
            .join_table_name(first, second)
            .unwrap_or_default();
        let mut rows = Vec::new();
        if first == second {
            // Self-join: the partner may sit in either column.
            let sql = format!(
                "SELECT first_id, second_id FROM {} WHERE first_id = ?1 OR second_id = ?1",
                join_table
            );
            let mut stmt = self.store.conn().prepare(&sql)?;
            let mut result = stmt.query(params![self.id])?;
            while let Some(edge) = result.next()? {
                let first_id: i64 = edge.get(0)?;
                let second_id: i64 = edge.get(1)?;
                let other = if first_id == self.id { second_id } else { first_id };
                rows.push(Row::new(table, other, self.store));
            }
        } else {
            let (own_column, other_column) = if first == self.table {
                ("first_id", "second_id")
            } else {
                ("second_id", "first_id")
            };
            let sql = format!(
                "SELECT {} FROM {} WHERE {} = ?1",
                other_column, join_table, own_column
            );
            rows = self.collect_rows_with_params(&sql, table, params![self.id])?;
        }
        Ok(rows)
    }

    /// Whether an undirected join record exists between the two rows.
    pub fn rows_are_joined(&self, other: &Row) -> GraphResult<bool> {
        let registry = self.store.registry();
        let (first, second) = match registry.ordered_join_pair(self.table, other.table) {
            Some(pair) => pair,
            None => return Ok(false),
        };
        let join_table = registry
            .join_table_name(first, second)
            .unwrap_or_default();
        let (first_id, second_id) = if first == self.table {
            (self.id, other.id)
        } else {
            (other.id, self.id)
        };
        let sql = if first == second {
            format!(
                "SELECT 1 FROM {} WHERE (first_id = ?1 AND second_id = ?2) \
                 OR (first_id = ?2 AND second_id = ?1)",
                join_table
            )
        } else {
            format!(
                "SELECT 1 FROM {} WHERE first_id = ?1 AND second_id = ?2",
                join_table
            )
        };
        let mut stmt = self.store.conn().prepare(&sql)?;
        Ok(stmt.exists(params![first_id, second_id])?)
    }

    /// Create an undirected join between the two rows. Fails fast when the
    /// tables were never declared joinable; joining twice is a no-op.
    pub fn join(&self, other: &Row) -> GraphResult<()> {
        let registry = self.store.registry();
        let (first, _) = registry
            .ordered_join_pair(self.table, other.table)
            .ok_or(GraphError::NotJoinable {
                first: self.table.table_name(),
                second: other.table.table_name(),
            })?;
        if self.rows_are_joined(other)? {
            return Ok(());
        }
        let join_table = registry
            .join_table_name(self.table, other.table)
            .unwrap_or_default();
        let (first_id, second_id) = if first == self.table {
            (self.id, other.id)
        } else {
            (other.id, self.id)
        };
        let sql = format!(
            "INSERT INTO {} (first_id, second_id) VALUES (?1, ?2)",
            join_table
        );
        self.store.conn().execute(&sql, params![first_id, second_id])?;
        self.store.fire_event(StorageEvent::DatabaseChanged);
        Ok(())
    }

    /// Remove the undirected join between the two rows. Removing a join that
    /// does not exist is a no-op.
    pub fn unjoin(&self, other: &Row) -> GraphResult<()> {
        let registry = self.store.registry();
        let (first, second) = registry
            .ordered_join_pair(self.table, other.table)
            .ok_or(GraphError::NotJoinable {
                first: self.table.table_name(),
                second: other.table.table_name(),
            })?;
        let join_table = registry
            .join_table_name(self.table, other.table)
            .unwrap_or_default();
        let (first_id, second_id) = if first == self.table {
            (self.id, other.id)
        } else {
            (other.id, self.id)
        };
        let sql = if first == second {
            format!(
                "DELETE FROM {} WHERE (first_id = ?1 AND second_id = ?2) \
                 OR (first_id = ?2 AND second_id = ?1)",
                join_table
            )
        } else {
            format!(
                "DELETE FROM {} WHERE first_id = ?1 AND second_id = ?2",
                join_table
            )
        };
        self.store.conn().execute(&sql, params![first_id, second_id])?;
        self.store.fire_event(StorageEvent::DatabaseChanged);
        Ok(())
    }

    /// Directed-join children from `table`, in edge insertion order.
    pub fn directed_joined_children_of_type(&self, table: Table) -> GraphResult<Vec<Row<'db>>> {
        if !self
            .store
            .registry()
            .tables_are_directed_joined(self.table, table)
        {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT child_id FROM {} WHERE parent_id = ?1",
            directed_join_table_name(self.table, table)
        );
        self.collect_rows_with_params(&sql, table, params![self.id])
    }

    /// Directed-join parents across every declared parent table.
    pub fn directed_parent_rows(&self) -> GraphResult<Vec<Row<'db>>> {
        let mut parents = Vec::new();
        for parent in self.store.registry().directed_parents_of(self.table) {
            let sql = format!(
                "SELECT parent_id FROM {} WHERE child_id = ?1",
                directed_join_table_name(parent, self.table)
            );
            parents.extend(self.collect_rows_with_params(&sql, parent, params![self.id])?);
        }
        Ok(parents)
    }

    pub fn has_directed_parent_rows(&self) -> GraphResult<bool> {
        Ok(!self.directed_parent_rows()?.is_empty())
    }

    /// Add a directed-join edge to `child`. A pair that was never declared
    /// directed-joinable is silently ignored; adding an existing edge is a
    /// no-op.
    pub fn directed_join_to(&self, child: &Row) -> GraphResult<()> {
        if !self
            .store
            .registry()
            .tables_are_directed_joined(self.table, child.table)
        {
            return Ok(());
        }
        let join_table = directed_join_table_name(self.table, child.table);
        let exists_sql = format!(
            "SELECT 1 FROM {} WHERE parent_id = ?1 AND child_id = ?2",
            join_table
        );
        let mut stmt = self.store.conn().prepare(&exists_sql)?;
        if stmt.exists(params![self.id, child.id])? {
            return Ok(());
        }
        let sql = format!(
            "INSERT INTO {} (parent_id, child_id) VALUES (?1, ?2)",
            join_table
        );
        self.store.conn().execute(&sql, params![self.id, child.id])?;
        self.store.fire_event(StorageEvent::DatabaseChanged);
        Ok(())
    }

    /// Remove the directed-join edge to `child`, if any.
    pub fn directed_unjoin_from(&self, child: &Row) -> GraphResult<()> {
        if !self
            .store
            .registry()
            .tables_are_directed_joined(self.table, child.table)
        {
            return Ok(());
        }
        self.remove_directed_edge(child)?;
        self.store.fire_event(StorageEvent::DatabaseChanged);
        Ok(())
    }

    fn remove_directed_edge(&self, child: &Row) -> GraphResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE parent_id = ?1 AND child_id = ?2",
            directed_join_table_name(self.table, child.table)
        );
        self.store.conn().execute(&sql, params![self.id, child.id])?;
        Ok(())
    }

    // ===== Creation =====

    /// Create a structural child row. The child table must be a declared
    /// child of this row's table. Declared automatic children are created
    /// recursively under the new row, named after it.
    pub fn create_child(&self, table: Table, name: &str) -> GraphResult<Row<'db>> {
        self.create_child_with_columns(table, &[("name", Value::text(name))])
    }

    /// Create a structural child with explicit column values (the parent
    /// foreign key is added here).
    pub fn create_child_with_columns(
        &self,
        table: Table,
        columns: &[(&str, Value)],
    ) -> GraphResult<Row<'db>> {
        if !self.store.registry().children_of(self.table).contains(&table) {
            return Err(GraphError::StructuralMismatch {
                parent: self.table.table_name(),
                child: table.table_name(),
            });
        }
        let fk = self.table.id_column();
        let mut all = columns.to_vec();
        all.push((fk.as_str(), Value::Integer(self.id)));
        let id = self.store.insert(table, &all)?;
        let row = Row::new(table, id, self.store);
        let name = row.column_string("name")?.unwrap_or_default();
        for &automatic in self.store.registry().automatic_children_of(table) {
            row.create_child(automatic, &name)?;
        }
        self.store.fire_event(StorageEvent::DatabaseChanged);
        Ok(row)
    }

    /// Create a row attached by a directed-join edge instead of a foreign
    /// key (datamap nodes). The pair must be declared directed-joinable.
    pub fn create_joined_child(&self, table: Table, name: &str) -> GraphResult<Row<'db>> {
        if !self
            .store
            .registry()
            .tables_are_directed_joined(self.table, table)
        {
            return Err(GraphError::NotJoinable {
                first: self.table.table_name(),
                second: table.table_name(),
            });
        }
        let id = self.store.insert(table, &[("name", Value::text(name))])?;
        let row = Row::new(table, id, self.store);
        self.directed_join_to(&row)?;
        self.store.fire_event(StorageEvent::DatabaseChanged);
        Ok(row)
    }

    // ===== Deletion =====

    /// Delete this row's subtree, and the row itself when `also_delete_self`.
    ///
    /// Structural children are deleted post-order. Directed-join edges are
    /// severed one by one; a directed child is deleted only if, after its
    /// edge is gone, no structural or directed parent still reaches it (the
    /// check is a live query, not a stored count). Every edge is consumed at
    /// most once, so the recursion terminates on cyclic datamap graphs.
    ///
    /// Fires exactly one change event.
    pub fn delete_all_children(&self, also_delete_self: bool) -> GraphResult<()> {
        let was = self.store.set_suppress_events(true);
        let result = self.delete_children_inner(also_delete_self);
        self.store.set_suppress_events(was);
        self.store.fire_event(StorageEvent::DatabaseChanged);
        result
    }

    fn delete_children_inner(&self, also_delete_self: bool) -> GraphResult<()> {
        for &child in self.store.registry().children_of(self.table) {
            for row in self.children_of_type(child)? {
                row.delete_children_inner(true)?;
            }
        }
        for child in self.store.registry().directed_children_of(self.table) {
            for row in self.directed_joined_children_of_type(child)? {
                self.remove_directed_edge(&row)?;
                if !row.has_parent_rows()? && !row.has_directed_parent_rows()? {
                    row.delete_children_inner(true)?;
                }
            }
        }
        if also_delete_self {
            self.delete_join_records()?;
            let sql = format!("DELETE FROM {} WHERE id = ?1", self.table.table_name());
            self.store.conn().execute(&sql, params![self.id])?;
        }
        Ok(())
    }

    /// Remove every undirected and directed join record referencing this
    /// row, in both directions.
    fn delete_join_records(&self) -> GraphResult<()> {
        let registry = self.store.registry();
        for &(first, second) in registry.join_pairs() {
            if first != self.table && second != self.table {
                continue;
            }
            let join_table = registry.join_table_name(first, second).unwrap_or_default();
            let sql = if first == second {
                format!(
                    "DELETE FROM {} WHERE first_id = ?1 OR second_id = ?1",
                    join_table
                )
            } else if first == self.table {
                format!("DELETE FROM {} WHERE first_id = ?1", join_table)
            } else {
                format!("DELETE FROM {} WHERE second_id = ?1", join_table)
            };
            self.store.conn().execute(&sql, params![self.id])?;
        }
        for &(parent, child) in registry.directed_join_pairs() {
            if parent == self.table {
                let sql = format!(
                    "DELETE FROM {} WHERE parent_id = ?1",
                    directed_join_table_name(parent, child)
                );
                self.store.conn().execute(&sql, params![self.id])?;
            }
            if child == self.table {
                let sql = format!(
                    "DELETE FROM {} WHERE child_id = ?1",
                    directed_join_table_name(parent, child)
                );
                self.store.conn().execute(&sql, params![self.id])?;
            }
        }
        Ok(())
    }

    // ===== Editable columns =====

    pub fn editable_columns(&self) -> &'db [EditableColumn] {
        self.store.registry().editable_columns_of(self.table)
    }

    fn editable_column(&self, column: &str) -> GraphResult<EditableColumn> {
        self.editable_columns()
            .iter()
            .copied()
            .find(|c| c.name == column)
            .ok_or_else(|| GraphError::NotEditable {
                table: self.table.table_name(),
                column: column.to_string(),
            })
    }

    /// The current value of a declared editable column, rendered as text
    /// (empty when unset).
    pub fn editable_column_value(&self, column: &str) -> GraphResult<String> {
        let declared = self.editable_column(column)?;
        let rendered = match declared.column_type {
            ColumnType::Integer => self.column_i64(column)?.map(|v| v.to_string()),
            ColumnType::Float => self.column_f64(column)?.map(|v| v.to_string()),
            ColumnType::Text => self.column_string(column)?,
        };
        Ok(rendered.unwrap_or_default())
    }

    /// Set a declared editable column from text, checked against the
    /// declared column type.
    pub fn edit_column_value(&self, column: &str, value: &str) -> GraphResult<()> {
        let declared = self.editable_column(column)?;
        let typed = match declared.column_type {
            ColumnType::Integer => Value::Integer(value.parse().map_err(|_| {
                GraphError::ColumnTypeMismatch {
                    column: column.to_string(),
                    value: value.to_string(),
                }
            })?),
            ColumnType::Float => Value::Real(value.parse().map_err(|_| {
                GraphError::ColumnTypeMismatch {
                    column: column.to_string(),
                    value: value.to_string(),
                }
            })?),
            ColumnType::Text => Value::text(value),
        };
        self.update_column(column, &typed)
    }

    // ===== Rules =====

    /// The stored rule text. Only rules carry `raw_text`.
    pub fn text(&self) -> GraphResult<Option<String>> {
        self.column_string("raw_text")
    }

    /// Replace the rule's text and regenerate its row subtree from the
    /// already-parsed production.
    ///
    /// The old subtree is deleted and the new one materialized with events
    /// suppressed; exactly one change event fires at the end.
    pub fn save_rule(&self, text: &str, ast: &ProductionAst) -> GraphResult<()> {
        if self.table != Table::Rules {
            return Err(GraphError::WrongTable {
                expected: Table::Rules.table_name(),
                found: self.table.table_name(),
            });
        }
        let was = self.store.set_suppress_events(true);
        let result = (|| -> GraphResult<()> {
            self.update_column("raw_text", &Value::text(text))?;
            self.set_name(&ast.name)?;
            self.delete_children_inner(false)?;
            materialize::materialize_rule(self, ast)?;
            Ok(())
        })();
        self.store.set_suppress_events(was);
        self.store.fire_event(StorageEvent::DatabaseChanged);
        result
    }

    // ===== Helpers =====

    fn collect_rows(&self, sql: &str, table: Table) -> GraphResult<Vec<Row<'db>>> {
        self.collect_rows_with_params(sql, table, params![self.id])
    }

    fn collect_rows_with_params(
        &self,
        sql: &str,
        table: Table,
        params: &[&dyn rusqlite::ToSql],
    ) -> GraphResult<Vec<Row<'db>>> {
        let mut stmt = self.store.conn().prepare(sql)?;
        let mut result = stmt.query(params)?;
        let mut rows = Vec::new();
        while let Some(record) = result.next()? {
            let id: i64 = record.get(0)?;
            rows.push(Row::new(table, id, self.store));
        }
        Ok(rows)
    }
}
