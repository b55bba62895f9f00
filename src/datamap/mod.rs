//! Datamap inference.
//!
//! The pipeline: gather the rules in a problem space's scope, extract
//! their triples, grow terminal paths, then diff the paths against the
//! stored datamap and apply the resulting corrections.
//!
//! ```text
//! rules ──► TripleSet ──► terminal paths ──► corrections ──► datamap rows
//! ```

mod corrections;
mod paths;
mod triples;

pub use corrections::{propose_corrections, Correction};
pub use paths::{terminal_paths, TerminalPath};
pub use triples::{is_variable_name, triples_for_rule, Triple, TripleSet, TripleValue};

use std::collections::HashSet;

use crate::graph::{GraphError, GraphResult, Row};
use crate::schema::Table;

#[derive(Debug, thiserror::Error)]
pub enum DatamapError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("problem space {name} has no datamap root identifier")]
    MissingRoot { name: String },
}

pub type DatamapResult<T> = Result<T, DatamapError>;

/// Per-item progress reporting for the long-running operations. Drives a
/// UI progress surface; cancellation stays a caller concern.
pub trait Progress {
    fn begin(&mut self, _label: &str, _total: usize) {}
    fn item(&mut self, _label: &str) {}
    fn end(&mut self) {}
}

/// A [`Progress`] that reports nowhere.
pub struct NullProgress;

impl Progress for NullProgress {}

/// The rules contributing to a problem space's datamap: rules joined to
/// the space itself, plus rules joined to each operator joined to it.
pub fn rules_in_scope<'db>(problem_space: &Row<'db>) -> GraphResult<Vec<Row<'db>>> {
    let mut rules = problem_space.joined_rows_from_table(Table::Rules)?;
    for operator in problem_space.joined_rows_from_table(Table::Operators)? {
        rules.extend(operator.joined_rows_from_table(Table::Rules)?);
    }
    Ok(rules)
}

/// The problem space's datamap root identifier (created automatically with
/// the problem space).
pub fn datamap_root<'db>(problem_space: &Row<'db>) -> DatamapResult<Row<'db>> {
    problem_space
        .children_of_type(Table::DatamapIdentifiers)?
        .into_iter()
        .next()
        .ok_or_else(|| DatamapError::MissingRoot {
            name: problem_space.name(),
        })
}

/// Extract the triples of every rule in scope into one indexed set.
pub fn triples_for_problem_space(
    problem_space: &Row,
    progress: &mut dyn Progress,
) -> DatamapResult<TripleSet> {
    let rules = rules_in_scope(problem_space)?;
    progress.begin("extracting triples", rules.len());
    let mut all = Vec::new();
    for rule in &rules {
        progress.item(&rule.name());
        all.extend(triples_for_rule(rule)?);
    }
    progress.end();
    Ok(TripleSet::new(all))
}

/// Run the full inference pipeline and return the proposed corrections
/// together with the triple set they index into.
pub fn propose_datamap_corrections<'db>(
    problem_space: &Row<'db>,
    progress: &mut dyn Progress,
) -> DatamapResult<(TripleSet, Vec<Correction<'db>>)> {
    let set = triples_for_problem_space(problem_space, progress)?;
    let paths = terminal_paths(&set);
    let root = datamap_root(problem_space)?;
    let proposed = propose_corrections(&root, &set, &paths)?;
    Ok((set, proposed))
}

/// Apply a selected set of corrections: every `apply` first so all new
/// structure exists, then every `apply_links` over the finished datamap.
pub fn apply_corrections<'db>(
    problem_space: &Row<'db>,
    set: &TripleSet,
    corrections: &mut [Correction<'db>],
) -> DatamapResult<()> {
    let root = datamap_root(problem_space)?;
    for correction in corrections.iter_mut() {
        correction.apply(set)?;
    }
    for correction in corrections.iter() {
        correction.apply_links(set, &root)?;
    }
    Ok(())
}

/// Rules in scope whose triples mention `attribute`, deduplicated, in scan
/// order.
pub fn find_rules_using_attribute<'db>(
    problem_space: &Row<'db>,
    attribute: &str,
    progress: &mut dyn Progress,
) -> DatamapResult<Vec<Row<'db>>> {
    let rules = rules_in_scope(problem_space)?;
    progress.begin("searching rules", rules.len());
    let mut found = Vec::new();
    let mut seen = HashSet::new();
    for rule in rules {
        progress.item(&rule.name());
        let triples = triples_for_rule(&rule)?;
        if triples.iter().any(|t| t.attribute == attribute)
            && seen.insert((rule.table(), rule.id()))
        {
            found.push(rule);
        }
    }
    progress.end();
    Ok(found)
}
