//! SQLite-backed project storage.
//!
//! [`Storage`] owns the connection to one project database, the
//! [`SchemaRegistry`] that describes it, and the change-event machinery.
//! Everything is single-threaded and synchronous: each graph operation issues
//! its storage calls on the calling thread and returns when they complete.
//!
//! # Events
//!
//! Mutations fire [`StorageEvent::DatabaseChanged`] so that an editor surface
//! can refresh. Callers performing bulk work (for example regenerating a
//! rule's subtree) suppress events for the duration and fire exactly one
//! event themselves afterwards:
//!
//! ```ignore
//! let was = storage.set_suppress_events(true);
//! // ... many mutations ...
//! storage.set_suppress_events(was);
//! storage.fire_event(StorageEvent::DatabaseChanged);
//! ```

mod dump;

use std::cell::{Cell, RefCell};
use std::path::Path;

use rusqlite::types::ToSqlOutput;
use rusqlite::{Connection, ToSql};

use crate::schema::{SchemaRegistry, Table};

/// Errors that can occur talking to the backing store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Change notifications emitted by the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEvent {
    /// Graph content changed (rows or edges added, edited or removed).
    DatabaseChanged,
    /// The storage handle now points at different backing data (open,
    /// save-as, restore).
    DatabasePathChanged,
}

/// A literal column value, bound by parameter in every statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn text(s: impl Into<String>) -> Value {
        Value::Text(s.into())
    }

    /// SQL boolean convention: 1 for true, 0 for false.
    pub fn flag(b: bool) -> Value {
        Value::Integer(if b { 1 } else { 0 })
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Value::Integer(i) => i.to_sql(),
            Value::Real(f) => f.to_sql(),
            Value::Text(s) => s.to_sql(),
            Value::Null => Ok(ToSqlOutput::from(rusqlite::types::Null)),
        }
    }
}

type Listener = Box<dyn Fn(StorageEvent)>;

/// Handle to one open project database.
pub struct Storage {
    conn: Connection,
    registry: SchemaRegistry,
    suppress_events: Cell<bool>,
    listeners: RefCell<Vec<Listener>>,
}

impl Storage {
    /// Open (or create) a project database with the standard Soar schema.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Storage> {
        Self::open_with_registry(path, SchemaRegistry::soar())
    }

    /// Open (or create) a project database with a caller-supplied registry.
    pub fn open_with_registry(
        path: impl AsRef<Path>,
        registry: SchemaRegistry,
    ) -> StorageResult<Storage> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, registry)
    }

    /// An in-memory project with the standard schema (used by tests).
    pub fn open_in_memory() -> StorageResult<Storage> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, SchemaRegistry::soar())
    }

    fn from_connection(conn: Connection, registry: SchemaRegistry) -> StorageResult<Storage> {
        let storage = Storage {
            conn,
            registry,
            suppress_events: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
        };
        storage.conn.execute_batch(&storage.registry.ddl())?;
        Ok(storage)
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The underlying connection, for modules that build their own
    /// parameterized statements.
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Insert a record and return its generated id.
    pub fn insert(&self, table: Table, columns: &[(&str, Value)]) -> StorageResult<i64> {
        if columns.is_empty() {
            let sql = format!("INSERT INTO {} DEFAULT VALUES", table.table_name());
            self.conn.execute(&sql, [])?;
        } else {
            let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
            let placeholders: Vec<String> =
                (1..=columns.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table.table_name(),
                names.join(", "),
                placeholders.join(", ")
            );
            let params = rusqlite::params_from_iter(columns.iter().map(|(_, v)| v));
            self.conn.execute(&sql, params)?;
        }
        Ok(self.conn.last_insert_rowid())
    }

    // ===== Events =====

    /// Register a change listener.
    pub fn add_listener(&self, listener: impl Fn(StorageEvent) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    /// Set event suppression, returning the previous value so callers can
    /// restore it after a bulk operation.
    pub fn set_suppress_events(&self, suppress: bool) -> bool {
        self.suppress_events.replace(suppress)
    }

    pub fn events_suppressed(&self) -> bool {
        self.suppress_events.get()
    }

    /// Notify listeners. Dropped entirely while suppression is active.
    pub fn fire_event(&self, event: StorageEvent) {
        if self.suppress_events.get() {
            return;
        }
        for listener in self.listeners.borrow().iter() {
            listener(event);
        }
    }
}
