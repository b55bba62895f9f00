//! # Soarbase
//!
//! A persisted relational graph engine for Soar rule-authoring projects.
//!
//! ## Architecture
//!
//! Everything a project contains lives as rows in one SQLite database,
//! related through a static schema registry:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Rule text (parsed externally)               │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [materializer]
//! ┌─────────────────────────────────────────────────────────┐
//! │          Row graph (rules, conditions, actions)          │
//! │   SchemaRegistry: parents / joins / directed joins       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [triple extraction]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Triples: (variable ^attribute value)              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [path growth]
//! ┌─────────────────────────────────────────────────────────┐
//! │    Terminal paths ──► corrections ──► datamap rows       │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod ast;
pub mod config;
pub mod datamap;
pub mod graph;
pub mod schema;
pub mod storage;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::datamap::{
        apply_corrections, propose_datamap_corrections, Correction, DatamapError, DatamapResult,
        NullProgress, Progress, TerminalPath, Triple, TripleSet, TripleValue,
    };
    pub use crate::graph::{ChildOptions, GraphError, GraphResult, Row, TreeItem};
    pub use crate::schema::{SchemaRegistry, Table};
    pub use crate::storage::{Storage, StorageError, StorageEvent, StorageResult, Value};
}
