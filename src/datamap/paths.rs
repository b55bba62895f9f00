//! Fixed-point growth of terminal paths.
//!
//! A terminal path is an attribute chain from the state that the datamap
//! must cover. Growth runs in passes over a working set of triples: a
//! triple's state paths are accepted when they end somewhere definite
//! (non-variable value, childless variable, a self-loop, or convergence
//! into an already-accepted path), and each accepted path retires its
//! triple. Passes repeat until nothing new is accepted, which bounds the
//! run because the accepted set only grows and the working set only
//! shrinks.

use std::collections::HashSet;

use super::triples::{TripleSet, TripleValue};

/// An accepted path, with the accepted-path triples it converges into.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalPath {
    /// Triple indices from a state-bound triple to the terminal triple.
    pub path: Vec<usize>,
    /// Indices of triples in previously accepted paths that share this
    /// path's terminal value. They become undirected links in the datamap.
    pub links: Vec<usize>,
}

/// Grow every terminal path out of a triple set.
///
/// Declaration order of the triples gives deterministic tie-breaking:
/// passes scan the working set in order and accepted paths are compared in
/// acceptance order.
pub fn terminal_paths(set: &TripleSet) -> Vec<TerminalPath> {
    let mut accepted: Vec<TerminalPath> = Vec::new();
    let mut working: Vec<usize> = (0..set.len()).collect();

    let mut grew = true;
    while grew {
        grew = false;
        let mut next = Vec::new();
        for &idx in &working {
            let triple = set.get(idx);
            let mut added = false;

            let terminal = !triple.value.is_variable() || set.children_of(idx).is_empty();

            for path in set.paths_from_state(idx) {
                // Self-loop: the value closes back onto a variable already
                // on the path, e.g.
                // (<s> ^a <v1>) (<v1> ^b <v2>) (<v2> ^c <v1>).
                let path_variables: HashSet<&str> = path
                    .iter()
                    .map(|&i| set.get(i).variable.as_str())
                    .collect();
                let loops = triple
                    .value
                    .as_variable()
                    .is_some_and(|v| path_variables.contains(v));

                // Convergence: the path's terminal value also appears as a
                // value inside an accepted path. Record every such triple;
                // they become links.
                let mut links = Vec::new();
                for terminal_path in &accepted {
                    if let Some(link) = path_loops_into_path(set, &path, &terminal_path.path) {
                        links.push(link);
                    }
                }
                let converges = !links.is_empty();

                if !(terminal || loops || converges) {
                    continue;
                }
                let collides = accepted
                    .iter()
                    .any(|tp| path_collides_with_path(set, &path, &tp.path));
                let duplicate = accepted.iter().any(|tp| {
                    paths_equal(set, &path, &tp.path) || paths_are_redundant(set, &path, &tp.path)
                });
                if collides || duplicate {
                    continue;
                }

                log::debug!(
                    "accepted path {} (terminal: {}, loops: {}, converges: {})",
                    describe_path(set, &path),
                    terminal,
                    loops,
                    converges
                );
                accepted.push(TerminalPath { path, links });
                grew = true;
                added = true;
            }

            if !added {
                next.push(idx);
            }
        }
        working = next;
    }

    accepted
}

fn triples_equal(set: &TripleSet, a: usize, b: usize) -> bool {
    set.get(a) == set.get(b)
}

fn paths_equal(set: &TripleSet, path: &[usize], other: &[usize]) -> bool {
    path.len() == other.len()
        && path
            .iter()
            .zip(other)
            .all(|(&a, &b)| triples_equal(set, a, b))
}

/// Two paths are redundant when one is a prefix of the other (compared
/// over the shorter length).
fn paths_are_redundant(set: &TripleSet, path: &[usize], other: &[usize]) -> bool {
    path.iter()
        .zip(other)
        .all(|(&a, &b)| triples_equal(set, a, b))
}

/// Whether `path` shares a prefix with an accepted path, diverges, and
/// then revisits a variable the accepted path binds. Such a path restates
/// covered structure and is dropped.
fn path_collides_with_path(set: &TripleSet, path: &[usize], accepted: &[usize]) -> bool {
    let mut index = 0;
    while index < path.len() - 1 {
        if index >= accepted.len() {
            return false;
        }
        if !triples_equal(set, path[index], accepted[index]) {
            break;
        }
        index += 1;
    }
    if index == path.len() - 1 {
        return false;
    }

    let accepted_variables: HashSet<&str> = accepted
        .iter()
        .map(|&i| set.get(i).variable.as_str())
        .collect();
    while index < path.len() - 1 {
        if let TripleValue::Variable(value) = &set.get(path[index]).value {
            if accepted_variables.contains(value.as_str()) {
                return true;
            }
        }
        index += 1;
    }
    false
}

/// If `path`'s terminal value reappears as a value in `accepted`, the
/// triple carrying it there (the link), excluding the terminal triple
/// itself.
fn path_loops_into_path(set: &TripleSet, path: &[usize], accepted: &[usize]) -> Option<usize> {
    let &last = path.last()?;
    let last_triple = set.get(last);
    last_triple.value.as_variable()?;
    for &idx in accepted {
        let candidate = set.get(idx);
        if candidate.value == last_triple.value && candidate != last_triple {
            return Some(idx);
        }
    }
    None
}

fn describe_path(set: &TripleSet, path: &[usize]) -> String {
    path.iter()
        .map(|&i| set.get(i).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
