//! Datamap diffing and repair.
//!
//! Each terminal path is walked down the existing datamap from the root
//! identifier, matching schema nodes by value kind and attribute name. The
//! first step with no matching child yields a [`Correction`]: the node the
//! walk stopped at plus the unmatched suffix of the path. Applying a
//! correction creates one schema node per remaining triple; applying its
//! links adds undirected joins where separate paths converge on the same
//! value.

use super::paths::TerminalPath;
use super::triples::{Triple, TripleSet, TripleValue};
use crate::graph::{GraphError, GraphResult, Row};
use crate::schema::Table;

/// A proposed datamap addition.
#[derive(Debug, Clone)]
pub struct Correction<'db> {
    /// The deepest datamap node the terminal path still matched.
    pub anchor: Row<'db>,
    /// Indices of the unmatched path suffix, in path order.
    pub addition: Vec<usize>,
    /// Link triples carried over from the terminal path.
    pub links: Vec<usize>,
    tail: Option<Row<'db>>,
}

impl<'db> Correction<'db> {
    /// Create the schema nodes for the unmatched suffix, reusing same-named
    /// nodes where they already exist. Remembers the tail node for
    /// [`Correction::apply_links`].
    pub fn apply(&mut self, set: &TripleSet) -> GraphResult<()> {
        let mut current = self.anchor.clone();
        for &idx in &self.addition {
            let triple = set.get(idx);
            current = match &triple.value {
                TripleValue::Variable(_) => {
                    joined_child_named(&current, Table::DatamapIdentifiers, &triple.attribute)?
                }
                TripleValue::Integer(_) => {
                    joined_child_named(&current, Table::DatamapIntegers, &triple.attribute)?
                }
                TripleValue::Float(_) => {
                    joined_child_named(&current, Table::DatamapFloats, &triple.attribute)?
                }
                TripleValue::String(literal) => {
                    let enumeration =
                        joined_child_named(&current, Table::DatamapEnumerations, &triple.attribute)?;
                    let known = enumeration
                        .children_of_type(Table::DatamapEnumerationValues)?
                        .iter()
                        .any(|value| value.name() == *literal);
                    if !known {
                        enumeration.create_child(Table::DatamapEnumerationValues, literal)?;
                    }
                    enumeration
                }
            };
        }
        self.tail = Some(current);
        Ok(())
    }

    /// Join the applied tail to every datamap node the link triples already
    /// reach. Must run after [`Correction::apply`] (and after every other
    /// correction's apply, so linked-to structure exists).
    pub fn apply_links(&self, set: &TripleSet, root: &Row<'db>) -> GraphResult<()> {
        let tail = match &self.tail {
            Some(tail) => tail,
            None => return Ok(()),
        };
        for &link in &self.links {
            for node in datamap_rows_for_triple(root, set, link)? {
                if node == *tail {
                    continue;
                }
                match node.join(tail) {
                    Ok(()) => {}
                    Err(GraphError::NotJoinable { first, second }) => {
                        // Only identifier pairs are linkable; other node
                        // kinds converging on a value stay separate.
                        log::debug!("not linking {} to {}", first, second);
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    /// The node created (or reused) for the last triple of the addition.
    /// `None` until [`Correction::apply`] runs.
    pub fn tail(&self) -> Option<&Row<'db>> {
        self.tail.as_ref()
    }

    /// Human-readable summary for selection lists and logs.
    pub fn describe(&self, set: &TripleSet) -> String {
        let mut out = format!("{}, add:", self.anchor.name());
        for &idx in &self.addition {
            out.push_str(&format!(" {}", set.get(idx)));
        }
        if !self.links.is_empty() {
            out.push_str(", link with:");
            for &idx in &self.links {
                out.push_str(&format!(" {}", set.get(idx)));
            }
        }
        out
    }
}

/// Diff every terminal path against the datamap under `root` and collect
/// the corrections that would make the datamap cover them all.
pub fn propose_corrections<'db>(
    root: &Row<'db>,
    set: &TripleSet,
    paths: &[TerminalPath],
) -> GraphResult<Vec<Correction<'db>>> {
    let mut corrections = Vec::new();
    for terminal_path in paths {
        let path = &terminal_path.path;
        let mut current = vec![root.clone()];
        for (i, &idx) in path.iter().enumerate() {
            let triple = set.get(idx);
            let mut children = Vec::new();
            for node in &current {
                children.extend(matching_children(node, triple)?);
            }
            if children.is_empty() {
                for leaf in &current {
                    corrections.push(Correction {
                        anchor: leaf.clone(),
                        addition: path[i..].to_vec(),
                        links: terminal_path.links.clone(),
                        tail: None,
                    });
                }
                break;
            }
            current = children;
        }
    }
    Ok(corrections)
}

/// The datamap children of `node` that match one triple: the node kind is
/// selected by the value (identifiers for variables, integer/float nodes
/// for numbers, enumerations containing the literal for strings; string
/// nodes always qualify), then filtered by attribute name.
fn matching_children<'db>(node: &Row<'db>, triple: &Triple) -> GraphResult<Vec<Row<'db>>> {
    let mut items = Vec::new();
    match &triple.value {
        TripleValue::Variable(_) => {
            items.extend(node.directed_joined_children_of_type(Table::DatamapIdentifiers)?);
        }
        TripleValue::Integer(_) => {
            items.extend(node.directed_joined_children_of_type(Table::DatamapIntegers)?);
        }
        TripleValue::Float(_) => {
            items.extend(node.directed_joined_children_of_type(Table::DatamapFloats)?);
        }
        TripleValue::String(literal) => {
            for enumeration in
                node.directed_joined_children_of_type(Table::DatamapEnumerations)?
            {
                let matches = enumeration
                    .children_of_type(Table::DatamapEnumerationValues)?
                    .iter()
                    .any(|value| value.name() == *literal);
                if matches {
                    items.push(enumeration);
                }
            }
        }
    }
    items.extend(node.directed_joined_children_of_type(Table::DatamapStrings)?);
    Ok(items
        .into_iter()
        .filter(|row| row.name() == triple.attribute)
        .collect())
}

fn joined_child_named<'db>(
    parent: &Row<'db>,
    table: Table,
    named: &str,
) -> GraphResult<Row<'db>> {
    for child in parent.directed_joined_children_of_type(table)? {
        if child.name() == named {
            return Ok(child);
        }
    }
    parent.create_joined_child(table, named)
}

/// Resolve a triple to the datamap nodes it corresponds to by walking each
/// of its state paths down the datamap from the root.
fn datamap_rows_for_triple<'db>(
    root: &Row<'db>,
    set: &TripleSet,
    idx: usize,
) -> GraphResult<Vec<Row<'db>>> {
    let mut found = Vec::new();
    for path in set.paths_from_state(idx) {
        let mut current = vec![root.clone()];
        for &step in &path {
            let triple = set.get(step);
            let mut children = Vec::new();
            for node in &current {
                children.extend(matching_children(node, triple)?);
            }
            current = children;
            if current.is_empty() {
                break;
            }
        }
        for node in current {
            if !found.contains(&node) {
                found.push(node);
            }
        }
    }
    Ok(found)
}
