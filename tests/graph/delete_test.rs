//! Deletion invariants: post-order structural delete, shared directed
//! children, join record cleanup.

use std::cell::Cell;
use std::rc::Rc;

use soarbase::graph::Row;
use soarbase::schema::Table;
use soarbase::storage::{Storage, StorageEvent, Value};

fn agent(storage: &Storage) -> Row<'_> {
    let id = storage
        .insert(Table::Agents, &[("name", Value::text("a"))])
        .unwrap();
    Row::new(Table::Agents, id, storage)
}

#[test]
fn test_shared_directed_child_survives_first_parent_deletion() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();
    let root = space.children_of_type(Table::DatamapIdentifiers).unwrap()[0].clone();

    let left = root
        .create_joined_child(Table::DatamapIdentifiers, "left")
        .unwrap();
    let right = root
        .create_joined_child(Table::DatamapIdentifiers, "right")
        .unwrap();
    let shared = left
        .create_joined_child(Table::DatamapIntegers, "shared")
        .unwrap();
    right.directed_join_to(&shared).unwrap();

    left.delete_all_children(true).unwrap();
    assert!(!left.exists().unwrap());
    // Still reachable through `right`.
    assert!(shared.exists().unwrap());
    assert_eq!(shared.directed_parent_rows().unwrap(), vec![right.clone()]);

    right.delete_all_children(true).unwrap();
    assert!(!right.exists().unwrap());
    assert!(!shared.exists().unwrap());
}

#[test]
fn test_deletion_terminates_on_directed_cycle() {
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

    // Terminates even though a and b reference each other. The cycle
    // nodes keep each other alive once detached: liveness is judged by
    // remaining parents, not reachability from the root.
    space.delete_all_children(true).unwrap();
    assert!(!space.exists().unwrap());
    assert!(!root.exists().unwrap());
    assert!(a.exists().unwrap());
    assert!(b.exists().unwrap());

    // Severing the cycle from inside collapses it.
    a.delete_all_children(true).unwrap();
    assert!(!a.exists().unwrap());
    assert!(!b.exists().unwrap());
}

#[test]
fn test_row_deletion_removes_join_records() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();
    let rule = agent.create_child(Table::Rules, "r").unwrap();
    rule.join(&space).unwrap();

    rule.delete_all_children(true).unwrap();
    assert!(!rule.exists().unwrap());
    assert!(space.joined_rows_from_table(Table::Rules).unwrap().is_empty());
}

#[test]
fn test_delete_without_self_keeps_the_row() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();
    let root = space.children_of_type(Table::DatamapIdentifiers).unwrap()[0].clone();
    root.create_joined_child(Table::DatamapStrings, "note")
        .unwrap();

    root.delete_all_children(false).unwrap();
    assert!(root.exists().unwrap());
    assert!(root
        .directed_joined_children_of_type(Table::DatamapStrings)
        .unwrap()
        .is_empty());
}

#[test]
fn test_delete_fires_exactly_one_event() {
    let storage = Storage::open_in_memory().unwrap();
    let agent = agent(&storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();

    let fired = Rc::new(Cell::new(0));
    let counter = fired.clone();
    storage.add_listener(move |event| {
        if event == StorageEvent::DatabaseChanged {
            counter.set(counter.get() + 1);
        }
    });

    space.delete_all_children(true).unwrap();
    assert_eq!(fired.get(), 1);
}
