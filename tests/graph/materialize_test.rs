//! Materializer tests: production ASTs become rule subtrees.

use std::cell::Cell;
use std::rc::Rc;

use soarbase::ast::*;
use soarbase::graph::{materialize_rule, GraphError, Row};
use soarbase::schema::Table;
use soarbase::storage::{Storage, StorageEvent, Value};

fn agent(storage: &Storage) -> Row<'_> {
    let id = storage
        .insert(Table::Agents, &[("name", Value::text("a"))])
        .unwrap();
    Row::new(Table::Agents, id, storage)
}

fn equality(single: SingleTest) -> Test {
    Test::Simple(SimpleTest::Relational(RelationalTest {
        relation: Relation::Equal,
        single_test: single,
    }))
}

fn attr_value_test(attribute: &str, value: SingleTest) -> AttributeValueTest {
    AttributeValueTest {
        negated: false,
        attribute_tests: vec![AttributeTest {
            test: equality(SingleTest::Constant(Constant::Symbolic(attribute.into()))),
        }],
        value_tests: vec![ValueTest {
            test: equality(value),
            acceptable_preference: false,
        }],
    }
}

fn state_condition(variable: &str, tests: Vec<AttributeValueTest>) -> Condition {
    Condition {
        negated: false,
        positive_condition: PositiveCondition::IdentifierCondition(IdentifierCondition {
            has_state: true,
            variable: variable.into(),
            attribute_value_tests: tests,
        }),
    }
}

fn make(variable: &str, attribute: &str, value: RhsValue) -> Action {
    Action::VarAttrValMake(VarAttrValMake {
        variable: variable.into(),
        attribute_value_makes: vec![AttributeValueMake {
            rhs_values: vec![RhsValue::Constant(Constant::Symbolic(attribute.into()))],
            value_makes: vec![ValueMake {
                rhs_value: value,
                preference_specifiers: vec![PreferenceSpecifier::NaturallyUnary(
                    NaturallyUnaryPreference::Acceptable,
                )],
            }],
        }],
    })
}

fn sample_production() -> ProductionAst {
    ProductionAst {
        name: "propose*init".to_string(),
        conditions: vec![state_condition(
            "<s>",
            vec![attr_value_test("foo", SingleTest::Variable("<v>".into()))],
        )],
        actions: vec![make(
            "<v>",
            "bar",
            RhsValue::Constant(Constant::Integer(5)),
        )],
    }
}

#[test]
fn test_save_rule_builds_the_subtree() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let rule = agent.create_child(Table::Rules, "unnamed").unwrap();

    let ast = sample_production();
    rule.save_rule("sp {propose*init ...}", &ast).unwrap();

    assert_eq!(rule.name(), "propose*init");
    assert_eq!(rule.text().unwrap().as_deref(), Some("sp {propose*init ...}"));

    let identifiers = rule
        .descendants_of_type(Table::ConditionForOneIdentifiers)
        .unwrap();
    assert_eq!(identifiers.len(), 1);
    assert!(identifiers[0].column_flag("has_state").unwrap());
    assert_eq!(
        identifiers[0].column_string("variable").unwrap().as_deref(),
        Some("<s>")
    );

    // The attribute constant and the made value constant.
    let constants = rule.descendants_of_type(Table::Constants).unwrap();
    assert_eq!(constants.len(), 3);
    let integer = constants
        .iter()
        .find(|c| c.column_i64("constant_type").unwrap() == Some(1))
        .expect("integer constant");
    assert_eq!(integer.column_i64("integer_const").unwrap(), Some(5));

    let preferences = rule
        .descendants_of_type(Table::PreferenceSpecifiers)
        .unwrap();
    assert_eq!(preferences.len(), 1);
    assert!(preferences[0].column_flag("is_unary_preference").unwrap());
}

#[test]
fn test_resave_replaces_the_subtree() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let rule = agent.create_child(Table::Rules, "unnamed").unwrap();

    let ast = sample_production();
    rule.save_rule("v1", &ast).unwrap();
    rule.save_rule("v2", &ast).unwrap();

    assert_eq!(rule.children_of_type(Table::Conditions).unwrap().len(), 1);
    assert_eq!(rule.children_of_type(Table::Actions).unwrap().len(), 1);
    assert_eq!(rule.text().unwrap().as_deref(), Some("v2"));
}

#[test]
fn test_save_rule_fires_exactly_one_event() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let rule = agent.create_child(Table::Rules, "unnamed").unwrap();

    let fired = Rc::new(Cell::new(0));
    let counter = fired.clone();
    storage.add_listener(move |event| {
        if event == StorageEvent::DatabaseChanged {
            counter.set(counter.get() + 1);
        }
    });

    rule.save_rule("text", &sample_production()).unwrap();
    assert_eq!(fired.get(), 1);
}

#[test]
fn test_save_rule_rejects_non_rule_rows() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let result = agent.save_rule("text", &sample_production());
    assert!(matches!(result, Err(GraphError::WrongTable { .. })));
}

#[test]
fn test_materializing_under_the_wrong_row_is_a_structural_mismatch() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let result = materialize_rule(&agent, &sample_production());
    assert!(matches!(result, Err(GraphError::StructuralMismatch { .. })));
}

#[test]
fn test_conjunction_nests_conditions() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let rule = agent.create_child(Table::Rules, "unnamed").unwrap();

    let inner = state_condition(
        "<s>",
        vec![attr_value_test("foo", SingleTest::Variable("<v>".into()))],
    );
    let ast = ProductionAst {
        name: "conj".to_string(),
        conditions: vec![Condition {
            negated: true,
            positive_condition: PositiveCondition::Conjunction(vec![inner]),
        }],
        actions: vec![],
    };
    rule.save_rule("text", &ast).unwrap();

    let top = rule.children_of_type(Table::Conditions).unwrap();
    assert_eq!(top.len(), 1);
    assert!(top[0].column_flag("is_negated").unwrap());
    let pc = top[0]
        .children_of_type(Table::PositiveConditions)
        .unwrap();
    assert!(pc[0].column_flag("is_conjunction").unwrap());
    let nested = pc[0].children_of_type(Table::Conditions).unwrap();
    assert_eq!(nested.len(), 1);
    assert!(!nested[0].column_flag("is_negated").unwrap());
}
