//! Triple extraction from stored rule subtrees.
//!
//! A triple is the unit the datamap inference works on: one
//! `(variable ^attribute value)` statement recovered from a rule's
//! conditions or actions. Dotted attributes expand into chains threaded
//! through synthesized intermediate variables, so every triple has exactly
//! one attribute segment.

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::graph::{GraphResult, Row};
use crate::schema::Table;

static VARIABLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<.+>$").expect("variable regex"));

/// Whether a symbol has the `<name>` variable shape.
pub fn is_variable_name(text: &str) -> bool {
    VARIABLE_RE.is_match(text)
}

/// The value side of a triple.
#[derive(Debug, Clone, PartialEq)]
pub enum TripleValue {
    Variable(String),
    Integer(i64),
    Float(f64),
    String(String),
}

impl TripleValue {
    pub fn is_variable(&self) -> bool {
        matches!(self, TripleValue::Variable(_))
    }

    pub fn as_variable(&self) -> Option<&str> {
        match self {
            TripleValue::Variable(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for TripleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripleValue::Variable(v) => write!(f, "{}", v),
            TripleValue::Integer(i) => write!(f, "{}", i),
            TripleValue::Float(x) => write!(f, "{}", x),
            TripleValue::String(s) => write!(f, "{}", s),
        }
    }
}

/// One `(variable ^attribute value)` statement from a rule.
#[derive(Debug, Clone)]
pub struct Triple {
    /// Id of the rule row the triple came from. Variables are scoped per
    /// rule, so child links never cross rules.
    pub rule: i64,
    pub variable: String,
    pub attribute: String,
    pub value: TripleValue,
    /// Whether `variable` is bound to the state in its rule.
    pub has_state: bool,
}

/// Content equality: rule id and state flag are provenance, not identity.
impl PartialEq for Triple {
    fn eq(&self, other: &Self) -> bool {
        self.variable == other.variable
            && self.attribute == other.attribute
            && self.value == other.value
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} ^{} {})", self.variable, self.attribute, self.value)
    }
}

/// An indexed arena of triples with parent/child links precomputed.
///
/// Triple `c` is a child of triple `p` when both come from the same rule
/// and `p`'s value is the variable `c` hangs off.
#[derive(Debug, Default)]
pub struct TripleSet {
    triples: Vec<Triple>,
    children: Vec<Vec<usize>>,
    parents: Vec<Vec<usize>>,
}

impl TripleSet {
    pub fn new(triples: Vec<Triple>) -> TripleSet {
        let mut children = vec![Vec::new(); triples.len()];
        let mut parents = vec![Vec::new(); triples.len()];
        for (p, parent) in triples.iter().enumerate() {
            let value_var = match parent.value.as_variable() {
                Some(v) => v,
                None => continue,
            };
            for (c, child) in triples.iter().enumerate() {
                if c != p && child.rule == parent.rule && child.variable == value_var {
                    children[p].push(c);
                    parents[c].push(p);
                }
            }
        }
        TripleSet {
            triples,
            children,
            parents,
        }
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn get(&self, idx: usize) -> &Triple {
        &self.triples[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    pub fn children_of(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    /// Every chain of linked triples from a state-bound triple down to
    /// `idx`, as index lists. No index repeats within one chain.
    pub fn paths_from_state(&self, idx: usize) -> Vec<Vec<usize>> {
        let mut paths = Vec::new();
        let mut current = vec![idx];
        self.grow_back(idx, &mut current, &mut paths);
        paths
    }

    fn grow_back(&self, idx: usize, current: &mut Vec<usize>, paths: &mut Vec<Vec<usize>>) {
        if self.triples[idx].has_state {
            paths.push(current.iter().rev().copied().collect());
        }
        for &parent in &self.parents[idx] {
            if current.contains(&parent) {
                continue;
            }
            current.push(parent);
            self.grow_back(parent, current, paths);
            current.pop();
        }
    }
}

/// Extract every triple a stored rule states.
pub fn triples_for_rule(rule: &Row) -> GraphResult<Vec<Triple>> {
    let mut extractor = Extractor {
        rule: rule.id(),
        triples: Vec::new(),
        state_variables: HashSet::new(),
        synthetic: 0,
    };
    for ic in rule.descendants_of_type(Table::ConditionForOneIdentifiers)? {
        extractor.walk_identifier_condition(&ic)?;
    }
    for make in rule.descendants_of_type(Table::VarAttrValMakes)? {
        extractor.walk_var_attr_val_make(&make)?;
    }
    let Extractor {
        mut triples,
        state_variables,
        ..
    } = extractor;
    for triple in &mut triples {
        triple.has_state = state_variables.contains(&triple.variable);
    }
    Ok(triples)
}

struct Extractor {
    rule: i64,
    triples: Vec<Triple>,
    state_variables: HashSet<String>,
    synthetic: usize,
}

impl Extractor {
    fn walk_identifier_condition(&mut self, ic: &Row) -> GraphResult<()> {
        let variable = match ic.column_string("variable")? {
            Some(v) => v,
            None => return Ok(()),
        };
        if ic.column_flag("has_state")? {
            self.state_variables.insert(variable.clone());
        }
        for avt in ic.children_of_type(Table::AttributeValueTests)? {
            let mut segments = Vec::new();
            for at in avt.children_of_type(Table::AttributeTests)? {
                let mut names = Vec::new();
                for test in at.children_of_type(Table::Tests)? {
                    for atom in test_atoms(&test)? {
                        names.push(atom.to_string());
                    }
                }
                if !names.is_empty() {
                    segments.push(names);
                }
            }
            let mut values = Vec::new();
            for vt in avt.children_of_type(Table::ValueTests)? {
                for test in vt.children_of_type(Table::Tests)? {
                    values.extend(test_atoms(&test)?);
                }
            }
            self.emit_chain(&variable, &segments, &values);
        }
        Ok(())
    }

    fn walk_var_attr_val_make(&mut self, make: &Row) -> GraphResult<()> {
        let variable = match make.column_string("variable")? {
            Some(v) => v,
            None => return Ok(()),
        };
        for avm in make.children_of_type(Table::AttributeValueMakes)? {
            let mut segments = Vec::new();
            for rhs in avm.children_of_type(Table::RhsValues)? {
                if let Some(atom) = rhs_value_atom(&rhs)? {
                    segments.push(vec![atom.to_string()]);
                }
            }
            let mut values = Vec::new();
            for vm in avm.children_of_type(Table::ValueMakes)? {
                for rhs in vm.children_of_type(Table::RhsValues)? {
                    if let Some(atom) = rhs_value_atom(&rhs)? {
                        values.push(atom);
                    }
                }
            }
            self.emit_chain(&variable, &segments, &values);
        }
        Ok(())
    }

    /// Emit triples for one attribute chain. Every segment but the last
    /// binds a synthesized intermediate variable; the last pairs with each
    /// value (or a fresh unused variable when no value was stated).
    fn emit_chain(&mut self, variable: &str, segments: &[Vec<String>], values: &[TripleValue]) {
        let last = match segments.last() {
            Some(last) => last,
            None => return,
        };
        let mut current = variable.to_string();
        for segment in &segments[..segments.len() - 1] {
            let next = self.fresh_variable();
            for name in segment {
                self.push(&current, name, TripleValue::Variable(next.clone()));
            }
            current = next;
        }
        if values.is_empty() {
            let value = TripleValue::Variable(self.fresh_variable());
            for name in last {
                self.push(&current, name, value.clone());
            }
        } else {
            for name in last {
                for value in values {
                    self.push(&current, name, value.clone());
                }
            }
        }
    }

    fn push(&mut self, variable: &str, attribute: &str, value: TripleValue) {
        self.triples.push(Triple {
            rule: self.rule,
            variable: variable.to_string(),
            attribute: attribute.to_string(),
            value,
            has_state: false,
        });
    }

    fn fresh_variable(&mut self) -> String {
        self.synthetic += 1;
        format!("<~{}-{}>", self.rule, self.synthetic)
    }
}

/// All atoms a stored test binds: constants from disjunctions and
/// relational tests, variables from single tests.
fn test_atoms(test: &Row) -> GraphResult<Vec<TripleValue>> {
    let mut atoms = Vec::new();
    if test.column_flag("is_conjunctive_test")? {
        for ct in test.children_of_type(Table::ConjunctiveTests)? {
            for st in ct.children_of_type(Table::SimpleTests)? {
                simple_test_atoms(&st, &mut atoms)?;
            }
        }
    } else {
        for st in test.children_of_type(Table::SimpleTests)? {
            simple_test_atoms(&st, &mut atoms)?;
        }
    }
    Ok(atoms)
}

fn simple_test_atoms(st: &Row, out: &mut Vec<TripleValue>) -> GraphResult<()> {
    if st.column_flag("is_disjunction_test")? {
        for dt in st.children_of_type(Table::DisjunctionTests)? {
            for constant in dt.children_of_type(Table::Constants)? {
                out.push(constant_atom(&constant)?);
            }
        }
    } else {
        for rt in st.children_of_type(Table::RelationalTests)? {
            for single in rt.children_of_type(Table::SingleTests)? {
                if single.column_flag("is_constant")? {
                    for constant in single.children_of_type(Table::Constants)? {
                        out.push(constant_atom(&constant)?);
                    }
                } else if let Some(variable) = single.column_string("variable")? {
                    out.push(TripleValue::Variable(variable));
                }
            }
        }
    }
    Ok(())
}

fn constant_atom(constant: &Row) -> GraphResult<TripleValue> {
    Ok(match constant.column_i64("constant_type")?.unwrap_or(0) {
        1 => TripleValue::Integer(constant.column_i64("integer_const")?.unwrap_or(0)),
        2 => TripleValue::Float(constant.column_f64("floating_const")?.unwrap_or(0.0)),
        _ => {
            let symbol = constant.column_string("symbolic_const")?.unwrap_or_default();
            if is_variable_name(&symbol) {
                TripleValue::Variable(symbol)
            } else {
                TripleValue::String(symbol)
            }
        }
    })
}

/// The atom a stored RHS value states, if any. Function calls compute
/// values of unknowable type and contribute nothing to the datamap.
fn rhs_value_atom(rhs: &Row) -> GraphResult<Option<TripleValue>> {
    if rhs.column_flag("is_variable")? {
        return Ok(rhs.column_string("variable")?.map(TripleValue::Variable));
    }
    if rhs.column_flag("is_constant")? {
        if let Some(constant) = rhs.children_of_type(Table::Constants)?.into_iter().next() {
            return Ok(Some(constant_atom(&constant)?));
        }
    }
    Ok(None)
}
