//! End-to-end query scenarios against a real engine on disk.

use common::KiteError;
use testsupport::prelude::*;
use types::Value;

#[test]
fn create_and_read_back() {
    let (mut engine, _dir) = temp_engine();
    engine
        .execute(r#"CREATE (a:Person {name: "Alice", age: 30})"#)
        .unwrap();

    let rows = engine
        .execute(r#"MATCH (n:Person) WHERE n.name = "Alice" RETURN n"#)
        .unwrap();
    assert_eq!(rows.len(), 1);

    let (id, labels, properties) = expect_node(&rows[0]);
    assert!(id >= 1);
    assert_eq!(labels, ["Person".to_string()]);
    assert_eq!(properties.get("name"), Some(&Value::Str("Alice".into())));
    assert_eq!(properties.get("age"), Some(&Value::Int(30)));
}

#[test]
fn update_merges_keys() {
    let (mut engine, _dir) = temp_engine();
    engine
        .execute(r#"CREATE (a:Person {name: "Alice", age: 30})"#)
        .unwrap();
    engine
        .execute(r#"MATCH (n:Person) WHERE n.name = "Alice" SET n.age = 31"#)
        .unwrap();

    let rows = engine.execute("MATCH (n:Person) RETURN n").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(node_property(&rows[0], "name"), &Value::Str("Alice".into()));
    assert_eq!(node_property(&rows[0], "age"), &Value::Int(31));
}

#[test]
fn relationship_creation_and_retrieval() {
    let (mut engine, _dir) = temp_engine();
    engine
        .execute(r#"CREATE (a:Person {name:"A"})-[r:KNOWS {since:2020}]->(b:Person {name:"B"})"#)
        .unwrap();

    let rows = engine.execute("MATCH ()-[r:KNOWS]->() RETURN r").unwrap();
    assert_eq!(rows.len(), 1);

    let (_, ty, source, target, properties) = expect_edge(&rows[0]);
    assert_eq!(ty, "KNOWS");
    assert_eq!(properties.get("since"), Some(&Value::Int(2020)));

    let people = engine.execute("MATCH (n:Person) RETURN n").unwrap();
    let ids = row_node_ids(&people);
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&source));
    assert!(ids.contains(&target));
}

#[test]
fn deleted_nodes_are_invisible() {
    let (mut engine, _dir) = temp_engine();
    engine.execute(r#"CREATE (a:Person {name:"A"})"#).unwrap();
    engine.execute("MATCH (n:Person) DELETE n").unwrap();

    let rows = engine.execute("MATCH (n:Person) RETURN n").unwrap();
    assert!(rows.is_empty());
}

#[test]
fn boolean_where_with_dotted_access() {
    let (mut engine, _dir) = temp_engine();
    engine
        .execute(r#"CREATE (a:User {name:"A", active:true})"#)
        .unwrap();
    engine
        .execute(r#"CREATE (a:User {name:"B", active:false})"#)
        .unwrap();

    let rows = engine
        .execute("MATCH (n:User) WHERE n.active = true RETURN n")
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(node_property(&rows[0], "name"), &Value::Str("A".into()));
}

#[test]
fn empty_query_is_a_parse_error() {
    let (mut engine, _dir) = temp_engine();
    let err = engine.execute("").unwrap_err();
    assert!(matches!(err, KiteError::Parse(_)), "got {err:?}");
}

#[test]
fn whole_query_pipeline_in_one_statement() {
    let (mut engine, _dir) = temp_engine();
    let rows = engine
        .execute(r#"CREATE (a:Task {title: "ship", done: false}) SET a.done = true RETURN a"#)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(node_property(&rows[0], "done"), &Value::Bool(true));
}

#[test]
fn rows_serialize_to_wire_json() {
    let (mut engine, _dir) = temp_engine();
    engine
        .execute(r#"CREATE (a:Person {name: "Alice", age: 30})"#)
        .unwrap();
    let rows = engine.execute("MATCH (n:Person) RETURN n").unwrap();

    let json = serde_json::to_value(&rows).unwrap();
    assert_eq!(json[0]["n"]["kind"], "node");
    assert_eq!(json[0]["n"]["properties"][0]["key"], "name");
    assert_eq!(json[0]["n"]["properties"][0]["value"], "Alice");
    assert_eq!(json[0]["n"]["properties"][1]["key"], "age");
    assert_eq!(json[0]["n"]["properties"][1]["value"], 30);
}

#[test]
fn partial_effects_survive_a_failed_query() {
    let (mut engine, _dir) = temp_engine();
    let err = engine
        .execute(r#"CREATE (a:Person {name: "A"}) RETURN ghost"#)
        .unwrap_err();
    assert!(matches!(err, KiteError::NotFound(_)), "got {err:?}");

    // No rollback: the created node is still there.
    assert_eq!(engine.node_count(), 1);
}
