//! Row navigation and mutation tests against an in-memory project.

use std::cell::Cell;
use std::rc::Rc;

use soarbase::graph::{ChildOptions, GraphError, Row, TreeItem};
use soarbase::schema::Table;
use soarbase::storage::{Storage, StorageEvent, Value};

fn agent(storage: &Storage) -> Row<'_> {
    let id = storage
        .insert(Table::Agents, &[("name", Value::text("test-agent"))])
        .unwrap();
    Row::new(Table::Agents, id, storage)
}

#[test]
fn test_create_child_sets_parent_link() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();

    assert_eq!(space.name(), "top");
    assert_eq!(space.parent_rows().unwrap(), vec![agent.clone()]);
    assert_eq!(agent.children_of_type(Table::ProblemSpaces).unwrap(), vec![space]);
}

#[test]
fn test_problem_space_gets_automatic_datamap_root() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();

    let roots = space.children_of_type(Table::DatamapIdentifiers).unwrap();
    assert_eq!(roots.len(), 1);
    // The root identifier is named after its problem space.
    assert_eq!(roots[0].name(), "top");
}

#[test]
fn test_top_level_and_ancestor() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();
    let root = space.children_of_type(Table::DatamapIdentifiers).unwrap()[0].clone();

    assert_eq!(root.top_level_row().unwrap(), agent);
    assert_eq!(
        root.ancestor_row(Table::ProblemSpaces).unwrap(),
        Some(space)
    );
    assert_eq!(root.ancestor_row(Table::Rules).unwrap(), None);
}

#[test]
fn test_join_is_idempotent_and_order_independent() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();
    let rule = agent.create_child(Table::Rules, "propose*init").unwrap();

    rule.join(&space).unwrap();
    rule.join(&space).unwrap();
    space.join(&rule).unwrap();

    assert_eq!(space.joined_rows_from_table(Table::Rules).unwrap().len(), 1);
    assert!(rule.rows_are_joined(&space).unwrap());
    assert!(space.rows_are_joined(&rule).unwrap());
}

#[test]
fn test_join_of_undeclared_pair_fails_fast() {
    let storage = Storage::open_in_memory().unwrap();
    let a = agent(&storage);
    let rule = a.create_child(Table::Rules, "r").unwrap();

    let result = a.join(&rule);
    assert!(matches!(result, Err(GraphError::NotJoinable { .. })));
}

#[test]
fn test_unjoin_of_non_joined_pair_is_noop() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();
    let rule = agent.create_child(Table::Rules, "r").unwrap();

    rule.unjoin(&space).unwrap();
    assert!(!rule.rows_are_joined(&space).unwrap());

    rule.join(&space).unwrap();
    rule.unjoin(&space).unwrap();
    assert!(!rule.rows_are_joined(&space).unwrap());
}

#[test]
fn test_directed_join_to_undeclared_pair_is_silent_noop() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();
    let root = space.children_of_type(Table::DatamapIdentifiers).unwrap()[0].clone();
    let rule = agent.create_child(Table::Rules, "r").unwrap();

    // datamap_identifiers -> rules was never declared.
    root.directed_join_to(&rule).unwrap();
    assert!(root
        .directed_joined_children_of_type(Table::Rules)
        .unwrap()
        .is_empty());
}

#[test]
fn test_create_joined_child_and_directed_parents() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();
    let root = space.children_of_type(Table::DatamapIdentifiers).unwrap()[0].clone();

    let count = root
        .create_joined_child(Table::DatamapIntegers, "count")
        .unwrap();
    assert_eq!(
        root.directed_joined_children_of_type(Table::DatamapIntegers)
            .unwrap(),
        vec![count.clone()]
    );
    assert_eq!(count.directed_parent_rows().unwrap(), vec![root.clone()]);

    // Joined children attach by edge, not foreign key.
    assert!(!count.has_parent_rows().unwrap());

    let result = root.create_joined_child(Table::Rules, "nope");
    assert!(matches!(result, Err(GraphError::NotJoinable { .. })));
}

#[test]
fn test_descendants_terminate_on_cyclic_datamap() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();
    let root = space.children_of_type(Table::DatamapIdentifiers).unwrap()[0].clone();

    let a = root
        .create_joined_child(Table::DatamapIdentifiers, "a")
        .unwrap();
    let b = a
        .create_joined_child(Table::DatamapIdentifiers, "b")
        .unwrap();
    b.directed_join_to(&a).unwrap();
    a.directed_join_to(&a).unwrap();

    let identifiers = space.descendants_of_type(Table::DatamapIdentifiers).unwrap();
    assert_eq!(identifiers.len(), 3); // root, a, b -- each once
}

#[test]
fn test_editable_columns_are_type_checked() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();
    let root = space.children_of_type(Table::DatamapIdentifiers).unwrap()[0].clone();
    let count = root
        .create_joined_child(Table::DatamapIntegers, "count")
        .unwrap();

    count.edit_column_value("min_value", "3").unwrap();
    assert_eq!(count.editable_column_value("min_value").unwrap(), "3");
    assert_eq!(count.editable_column_value("max_value").unwrap(), "");

    let result = count.edit_column_value("min_value", "not-a-number");
    assert!(matches!(result, Err(GraphError::ColumnTypeMismatch { .. })));

    let result = count.edit_column_value("name", "x");
    assert!(matches!(result, Err(GraphError::NotEditable { .. })));
}

#[test]
fn test_missing_row_name_degrades_to_placeholder() {
    let storage = Storage::open_in_memory().unwrap();
    let ghost = Row::new(Table::Rules, 4242, &storage);
    assert!(!ghost.exists().unwrap());
    assert_eq!(ghost.name(), "rules: NO ROW WITH ID 4242");
}

#[test]
fn test_set_name_refreshes_cache() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    assert_eq!(agent.name(), "test-agent");
    agent.set_name("renamed").unwrap();
    assert_eq!(agent.name(), "renamed");
}

#[test]
fn test_children_listing_shapes() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    agent.create_child(Table::ProblemSpaces, "top").unwrap();
    agent.create_child(Table::Rules, "r").unwrap();

    // Folders for the declared folder tables.
    let items = agent.children(ChildOptions::full()).unwrap();
    let folders = items
        .iter()
        .filter(|item| matches!(item, TreeItem::Folder(_)))
        .count();
    assert_eq!(folders, 3);

    // Plain rows otherwise.
    let items = agent.children(ChildOptions::rows_only()).unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| matches!(item, TreeItem::Row(_))));
}

#[test]
fn test_update_fires_one_event() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);

    let fired = Rc::new(Cell::new(0));
    let counter = fired.clone();
    storage.add_listener(move |event| {
        if event == StorageEvent::DatabaseChanged {
            counter.set(counter.get() + 1);
        }
    });

    agent
        .update_columns(&[("name", Value::text("x"))])
        .unwrap();
    assert_eq!(fired.get(), 1);
}
