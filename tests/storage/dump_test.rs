//! Dump and restore round trips.

use std::cell::Cell;
use std::rc::Rc;

use soarbase::graph::Row;
use soarbase::schema::Table;
use soarbase::storage::{Storage, StorageError, StorageEvent, Value};

#[test]
fn test_dump_of_single_agent() {
    let storage = Storage::open_in_memory().unwrap();
    storage
        .insert(Table::Agents, &[("name", Value::text("a1"))])
        .unwrap();

    insta::assert_snapshot!(
        storage.sql_dump().unwrap(),
        @"INSERT INTO agents (id, name) VALUES (1, 'a1');"
    );
}

#[test]
fn test_restore_reproduces_the_graph() {
    let storage = Storage::open_in_memory().unwrap();
    let id = storage
        .insert(Table::Agents, &[("name", Value::text("a1"))])
        .unwrap();
    let agent = Row::new(Table::Agents, id, &storage);
    let space = agent.create_child(Table::ProblemSpaces, "top").unwrap();
    let root = space.children_of_type(Table::DatamapIdentifiers).unwrap()[0].clone();
    let count = root
        .create_joined_child(Table::DatamapIntegers, "count")
        .unwrap();
    count.edit_column_value("min_value", "3").unwrap();
    let rule = agent.create_child(Table::Rules, "propose*init").unwrap();
    rule.join(&space).unwrap();

    let dump = storage.sql_dump().unwrap();

    let copy = Storage::open_in_memory().unwrap();
    copy.restore_from_dump(&dump).unwrap();

    // Same ids on the other side.
    let agent2 = Row::new(Table::Agents, agent.id(), &copy);
    assert_eq!(agent2.name(), "a1");
    let space2 = agent2.children_of_type(Table::ProblemSpaces).unwrap()[0].clone();
    assert_eq!(space2.id(), space.id());
    assert_eq!(space2.name(), "top");

    let rule2 = Row::new(Table::Rules, rule.id(), &copy);
    assert!(rule2.rows_are_joined(&space2).unwrap());

    let root2 = space2.children_of_type(Table::DatamapIdentifiers).unwrap()[0].clone();
    let integers = root2
        .directed_joined_children_of_type(Table::DatamapIntegers)
        .unwrap();
    assert_eq!(integers.len(), 1);
    assert_eq!(integers[0].name(), "count");
    assert_eq!(integers[0].editable_column_value("min_value").unwrap(), "3");
}

#[test]
fn test_restore_from_dump_file() {
    let storage = Storage::open_in_memory().unwrap();
    storage
        .insert(Table::Agents, &[("name", Value::text("a1"))])
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup.sql");
    std::fs::write(&path, storage.sql_dump().unwrap()).unwrap();

    let copy = Storage::open_in_memory().unwrap();
    copy.restore_from_dump_file(&path).unwrap();
    let agent = Row::new(Table::Agents, 1, &copy);
    assert_eq!(agent.name(), "a1");

    let result = copy.restore_from_dump_file(dir.path().join("missing.sql"));
    assert!(matches!(result, Err(StorageError::Io(_))));
}

#[test]
fn test_on_disk_project_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.soar");

    {
        let storage = Storage::open(&path).unwrap();
        let id = storage
            .insert(Table::Agents, &[("name", Value::text("a1"))])
            .unwrap();
        let agent = Row::new(Table::Agents, id, &storage);
        agent.create_child(Table::ProblemSpaces, "top").unwrap();
    }

    let storage = Storage::open(&path).unwrap();
    let agent = Row::new(Table::Agents, 1, &storage);
    assert_eq!(agent.name(), "a1");
    assert_eq!(agent.children_of_type(Table::ProblemSpaces).unwrap().len(), 1);
}

#[test]
fn test_restore_fires_one_path_changed_event() {
    let storage = Storage::open_in_memory().unwrap();
    storage
        .insert(Table::Agents, &[("name", Value::text("a1"))])
        .unwrap();
    let dump = storage.sql_dump().unwrap();

    let copy = Storage::open_in_memory().unwrap();
    let changed = Rc::new(Cell::new(0));
    let path_changed = Rc::new(Cell::new(0));
    let c = changed.clone();
    let p = path_changed.clone();
    copy.add_listener(move |event| match event {
        StorageEvent::DatabaseChanged => c.set(c.get() + 1),
        StorageEvent::DatabasePathChanged => p.set(p.get() + 1),
    });

    copy.restore_from_dump(&dump).unwrap();
    assert_eq!(changed.get(), 0);
    assert_eq!(path_changed.get(), 1);
}
