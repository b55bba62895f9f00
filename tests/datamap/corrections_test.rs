//! End-to-end datamap inference: stored rules to datamap rows.

use soarbase::ast::*;
use soarbase::datamap::{
    apply_corrections, propose_datamap_corrections, NullProgress,
};
use soarbase::graph::Row;
use soarbase::schema::Table;
use soarbase::storage::{Storage, Value};

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

fn add_rule<'db>(agent: &Row<'db>, space: &Row<'db>, ast: &ProductionAst) {
    let rule = agent.create_child(Table::Rules, "unnamed").unwrap();
    rule.join(space).unwrap();
    rule.save_rule("text", ast).unwrap();
}

fn named<'db>(rows: Vec<Row<'db>>, name: &str) -> Row<'db> {
    rows.into_iter()
        .find(|row| row.name() == name)
        .unwrap_or_else(|| panic!("no row named {}", name))
}

#[test]
fn test_missing_chain_is_proposed_and_applied() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();
    let root = space.children_of_type(Table::DatamapIdentifiers).unwrap()[0].clone();

    add_rule(
        &agent,
        &space,
        &ProductionAst {
            name: "r".to_string(),
            conditions: vec![state_condition(
                "<s>",
                vec![attr_value_test("foo", SingleTest::Variable("<v>".into()))],
            )],
            actions: vec![make("<v>", "bar", RhsValue::Constant(Constant::Integer(5)))],
        },
    );

    let (set, mut corrections) =
        propose_datamap_corrections(&space, &mut NullProgress).unwrap();
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0].anchor, root);
    assert_eq!(corrections[0].addition.len(), 2);

    apply_corrections(&space, &set, &mut corrections).unwrap();

    let foo = named(
        root.directed_joined_children_of_type(Table::DatamapIdentifiers)
            .unwrap(),
        "foo",
    );
    named(
        foo.directed_joined_children_of_type(Table::DatamapIntegers)
            .unwrap(),
        "bar",
    );

    // The datamap now covers every rule statement.
    let (_, corrections) = propose_datamap_corrections(&space, &mut NullProgress).unwrap();
    assert!(corrections.is_empty());
}

#[test]
fn test_string_literal_becomes_enumeration_value() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();
    let root = space.children_of_type(Table::DatamapIdentifiers).unwrap()[0].clone();

    add_rule(
        &agent,
        &space,
        &ProductionAst {
            name: "r".to_string(),
            conditions: vec![state_condition(
                "<s>",
                vec![attr_value_test(
                    "color",
                    SingleTest::Constant(Constant::Symbolic("red".into())),
                )],
            )],
            actions: vec![],
        },
    );

    let (set, mut corrections) =
        propose_datamap_corrections(&space, &mut NullProgress).unwrap();
    apply_corrections(&space, &set, &mut corrections).unwrap();

    let color = named(
        root.directed_joined_children_of_type(Table::DatamapEnumerations)
            .unwrap(),
        "color",
    );
    named(
        color.children_of_type(Table::DatamapEnumerationValues).unwrap(),
        "red",
    );

    let (_, corrections) = propose_datamap_corrections(&space, &mut NullProgress).unwrap();
    assert!(corrections.is_empty());
}

#[test]
fn test_converging_rules_link_their_identifiers() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();
    let root = space.children_of_type(Table::DatamapIdentifiers).unwrap()[0].clone();

    add_rule(
        &agent,
        &space,
        &ProductionAst {
            name: "r1".to_string(),
            conditions: vec![state_condition(
                "<s>",
                vec![attr_value_test("a", SingleTest::Variable("<v1>".into()))],
            )],
            actions: vec![make("<v1>", "n", RhsValue::Constant(Constant::Integer(1)))],
        },
    );
    // A second rule reaches the same identifier through another attribute.
    add_rule(
        &agent,
        &space,
        &ProductionAst {
            name: "r2".to_string(),
            conditions: vec![state_condition(
                "<s>",
                vec![attr_value_test("b", SingleTest::Variable("<v1>".into()))],
            )],
            actions: vec![],
        },
    );

    let (set, mut corrections) =
        propose_datamap_corrections(&space, &mut NullProgress).unwrap();
    apply_corrections(&space, &set, &mut corrections).unwrap();

    let identifiers = root
        .directed_joined_children_of_type(Table::DatamapIdentifiers)
        .unwrap();
    let a = named(identifiers.clone(), "a");
    let b = named(identifiers, "b");
    assert!(a.rows_are_joined(&b).unwrap());
}

#[test]
fn test_operator_rules_are_in_scope() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();
    let root = space.children_of_type(Table::DatamapIdentifiers).unwrap()[0].clone();
    let operator = agent.create_child(Table::Operators, "op").unwrap();
    operator.join(&space).unwrap();

    // Joined to the operator, not to the problem space directly.
    let rule = agent.create_child(Table::Rules, "unnamed").unwrap();
    rule.join(&operator).unwrap();
    rule.save_rule(
        "text",
        &ProductionAst {
            name: "apply*op".to_string(),
            conditions: vec![state_condition(
                "<s>",
                vec![attr_value_test("foo", SingleTest::Variable("<v>".into()))],
            )],
            actions: vec![],
        },
    )
    .unwrap();

    let (set, mut corrections) =
        propose_datamap_corrections(&space, &mut NullProgress).unwrap();
    assert_eq!(corrections.len(), 1);
    apply_corrections(&space, &set, &mut corrections).unwrap();
    named(
        root.directed_joined_children_of_type(Table::DatamapIdentifiers)
            .unwrap(),
        "foo",
    );
}
