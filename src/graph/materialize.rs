//! AST to row subtree.
//!
//! One structural child row per significant grammar node, carrying the
//! node's discriminator flags and literal columns. The production node
//! itself reuses the rule row, so materialization starts at the rule's
//! conditions and actions.
//!
//! Structural fit is a programming-time invariant: a node kind landing
//! under a row whose table was never declared its parent is a hard
//! [`GraphError::StructuralMismatch`](super::GraphError::StructuralMismatch)
//! out of [`Row::create_child_with_columns`].

use super::{GraphResult, Row};
use crate::ast::{
    Action, AttributeValueMake, AttributeValueTest, Condition, Constant, FunctionCall,
    PositiveCondition, PreferenceSpecifier, ProductionAst, RhsValue, SimpleTest, SingleTest,
    Test, ValueMake,
};
use crate::schema::Table;
use crate::storage::Value;

/// Create the row subtree for a parsed production under its rule row.
///
/// Callers are expected to have cleared the old subtree first; see
/// [`Row::save_rule`].
pub fn materialize_rule(rule: &Row, ast: &ProductionAst) -> GraphResult<()> {
    for condition in &ast.conditions {
        add_condition(rule, condition)?;
    }
    for action in &ast.actions {
        add_action(rule, action)?;
    }
    Ok(())
}

fn add_condition(parent: &Row, node: &Condition) -> GraphResult<()> {
    let name = if node.negated {
        "condition (negated)"
    } else {
        "condition"
    };
    let row = parent.create_child_with_columns(
        Table::Conditions,
        &[
            ("name", Value::text(name)),
            ("is_negated", Value::flag(node.negated)),
        ],
    )?;
    match &node.positive_condition {
        PositiveCondition::Conjunction(conditions) => {
            let pc = row.create_child_with_columns(
                Table::PositiveConditions,
                &[
                    ("name", Value::text("positive_condition (conjunction)")),
                    ("is_conjunction", Value::flag(true)),
                ],
            )?;
            for condition in conditions {
                add_condition(&pc, condition)?;
            }
        }
        PositiveCondition::IdentifierCondition(ic) => {
            let pc = row.create_child_with_columns(
                Table::PositiveConditions,
                &[
                    ("name", Value::text("positive_condition")),
                    ("is_conjunction", Value::flag(false)),
                ],
            )?;
            let label = if ic.has_state {
                format!("condition_for_one_identifier (state {})", ic.variable)
            } else {
                format!("condition_for_one_identifier ({})", ic.variable)
            };
            let ic_row = pc.create_child_with_columns(
                Table::ConditionForOneIdentifiers,
                &[
                    ("name", Value::text(label)),
                    ("has_state", Value::flag(ic.has_state)),
                    ("variable", Value::text(ic.variable.as_str())),
                ],
            )?;
            for avt in &ic.attribute_value_tests {
                add_attribute_value_test(&ic_row, avt)?;
            }
        }
    }
    Ok(())
}

fn add_attribute_value_test(parent: &Row, node: &AttributeValueTest) -> GraphResult<()> {
    let name = if node.negated {
        "attribute_value_test (negated)"
    } else {
        "attribute_value_test"
    };
    let row = parent.create_child_with_columns(
        Table::AttributeValueTests,
        &[
            ("name", Value::text(name)),
            ("is_negated", Value::flag(node.negated)),
        ],
    )?;
    for attribute_test in &node.attribute_tests {
        let at = row.create_child_with_columns(
            Table::AttributeTests,
            &[("name", Value::text("attribute_test"))],
        )?;
        add_test(&at, &attribute_test.test)?;
    }
    for value_test in &node.value_tests {
        let name = if value_test.acceptable_preference {
            "value_test (acceptable)"
        } else {
            "value_test"
        };
        let vt = row.create_child_with_columns(
            Table::ValueTests,
            &[
                ("name", Value::text(name)),
                (
                    "has_acceptable_preference",
                    Value::flag(value_test.acceptable_preference),
                ),
            ],
        )?;
        add_test(&vt, &value_test.test)?;
    }
    Ok(())
}

fn add_test(parent: &Row, node: &Test) -> GraphResult<()> {
    let conjunctive = matches!(node, Test::Conjunctive(_));
    let name = if conjunctive { "test (conjunctive)" } else { "test" };
    let row = parent.create_child_with_columns(
        Table::Tests,
        &[
            ("name", Value::text(name)),
            ("is_conjunctive_test", Value::flag(conjunctive)),
        ],
    )?;
    match node {
        Test::Conjunctive(ct) => {
            let ct_row = row.create_child_with_columns(
                Table::ConjunctiveTests,
                &[("name", Value::text("conjunctive_test"))],
            )?;
            for simple in &ct.simple_tests {
                add_simple_test(&ct_row, simple)?;
            }
        }
        Test::Simple(simple) => {
            add_simple_test(&row, simple)?;
        }
    }
    Ok(())
}

fn add_simple_test(parent: &Row, node: &SimpleTest) -> GraphResult<()> {
    let disjunction = matches!(node, SimpleTest::Disjunction(_));
    let name = if disjunction {
        "simple_test (disjunction)"
    } else {
        "simple_test"
    };
    let row = parent.create_child_with_columns(
        Table::SimpleTests,
        &[
            ("name", Value::text(name)),
            ("is_disjunction_test", Value::flag(disjunction)),
        ],
    )?;
    match node {
        SimpleTest::Disjunction(dt) => {
            let dt_row = row.create_child_with_columns(
                Table::DisjunctionTests,
                &[("name", Value::text("disjunction_test"))],
            )?;
            for constant in &dt.constants {
                add_constant(&dt_row, constant)?;
            }
        }
        SimpleTest::Relational(rt) => {
            let rt_row = row.create_child_with_columns(
                Table::RelationalTests,
                &[
                    (
                        "name",
                        Value::text(format!("relational_test ({})", rt.relation.symbol())),
                    ),
                    ("relation", Value::Integer(rt.relation.code())),
                ],
            )?;
            add_single_test(&rt_row, &rt.single_test)?;
        }
    }
    Ok(())
}

fn add_single_test(parent: &Row, node: &SingleTest) -> GraphResult<()> {
    match node {
        SingleTest::Variable(variable) => {
            parent.create_child_with_columns(
                Table::SingleTests,
                &[
                    (
                        "name",
                        Value::text(format!("single_test (variable: {})", variable)),
                    ),
                    ("is_constant", Value::flag(false)),
                    ("variable", Value::text(variable.as_str())),
                ],
            )?;
        }
        SingleTest::Constant(constant) => {
            let row = parent.create_child_with_columns(
                Table::SingleTests,
                &[
                    ("name", Value::text("single_test (constant)")),
                    ("is_constant", Value::flag(true)),
                ],
            )?;
            add_constant(&row, constant)?;
        }
    }
    Ok(())
}

fn add_constant(parent: &Row, node: &Constant) -> GraphResult<()> {
    let mut columns = vec![("constant_type", Value::Integer(node.type_code()))];
    let name = match node {
        Constant::Symbolic(s) => {
            columns.push(("symbolic_const", Value::text(s.as_str())));
            format!("constant ({})", s)
        }
        Constant::Integer(i) => {
            columns.push(("integer_const", Value::Integer(*i)));
            format!("constant ({})", i)
        }
        Constant::Float(f) => {
            columns.push(("floating_const", Value::Real(*f)));
            format!("constant ({})", f)
        }
    };
    columns.push(("name", Value::text(name)));
    parent.create_child_with_columns(Table::Constants, &columns)?;
    Ok(())
}

fn add_action(parent: &Row, node: &Action) -> GraphResult<()> {
    let var_attr_val_make = matches!(node, Action::VarAttrValMake(_));
    let row = parent.create_child_with_columns(
        Table::Actions,
        &[
            ("name", Value::text("action")),
            ("is_var_attr_val_make", Value::flag(var_attr_val_make)),
        ],
    )?;
    match node {
        Action::VarAttrValMake(make) => {
            let make_row = row.create_child_with_columns(
                Table::VarAttrValMakes,
                &[
                    (
                        "name",
                        Value::text(format!("var_attr_val_make ({})", make.variable)),
                    ),
                    ("variable", Value::text(make.variable.as_str())),
                ],
            )?;
            for avm in &make.attribute_value_makes {
                add_attribute_value_make(&make_row, avm)?;
            }
        }
        Action::FunctionCall(call) => {
            add_function_call(&row, call)?;
        }
    }
    Ok(())
}

fn add_attribute_value_make(parent: &Row, node: &AttributeValueMake) -> GraphResult<()> {
    let row = parent.create_child_with_columns(
        Table::AttributeValueMakes,
        &[("name", Value::text("attribute_value_make"))],
    )?;
    for rhs in &node.rhs_values {
        add_rhs_value(&row, rhs)?;
    }
    for value_make in &node.value_makes {
        add_value_make(&row, value_make)?;
    }
    Ok(())
}

fn add_value_make(parent: &Row, node: &ValueMake) -> GraphResult<()> {
    let row = parent.create_child_with_columns(
        Table::ValueMakes,
        &[("name", Value::text("value_make"))],
    )?;
    add_rhs_value(&row, &node.rhs_value)?;
    for specifier in &node.preference_specifiers {
        add_preference_specifier(&row, specifier)?;
    }
    Ok(())
}

fn add_rhs_value(parent: &Row, node: &RhsValue) -> GraphResult<()> {
    let mut columns = vec![
        (
            "is_constant",
            Value::flag(matches!(node, RhsValue::Constant(_))),
        ),
        (
            "is_function_call",
            Value::flag(matches!(node, RhsValue::FunctionCall(_))),
        ),
        (
            "is_variable",
            Value::flag(matches!(node, RhsValue::Variable(_))),
        ),
    ];
    let name = match node {
        RhsValue::Variable(variable) => {
            columns.push(("variable", Value::text(variable.as_str())));
            format!("rhs_value (variable: {})", variable)
        }
        RhsValue::Constant(_) => "rhs_value (constant)".to_string(),
        RhsValue::FunctionCall(_) => "rhs_value (function call)".to_string(),
    };
    columns.push(("name", Value::text(name)));
    let row = parent.create_child_with_columns(Table::RhsValues, &columns)?;
    match node {
        RhsValue::Constant(constant) => add_constant(&row, constant)?,
        RhsValue::FunctionCall(call) => add_function_call(&row, call)?,
        RhsValue::Variable(_) => {}
    }
    Ok(())
}

fn add_function_call(parent: &Row, node: &FunctionCall) -> GraphResult<()> {
    let row = parent.create_child_with_columns(
        Table::FunctionCalls,
        &[
            (
                "name",
                Value::text(format!("function_call ({})", node.function_name)),
            ),
            ("function_name", Value::text(node.function_name.as_str())),
        ],
    )?;
    for rhs in &node.rhs_values {
        add_rhs_value(&row, rhs)?;
    }
    Ok(())
}

fn add_preference_specifier(parent: &Row, node: &PreferenceSpecifier) -> GraphResult<()> {
    let row = parent.create_child_with_columns(
        Table::PreferenceSpecifiers,
        &[
            (
                "name",
                Value::text(format!("preference_specifier ({})", node.symbol())),
            ),
            ("is_unary_preference", Value::flag(node.is_unary())),
            ("preference_specifier_type", Value::Integer(node.type_code())),
        ],
    )?;
    if let PreferenceSpecifier::Binary { rhs, .. } = node {
        add_rhs_value(&row, rhs)?;
    }
    Ok(())
}
