//! Reopen behavior: the boot scan must bring back ids, labels, and edges.

use common::EngineConfig;
use engine::Engine;
use testsupport::prelude::*;
use types::Value;

#[test]
fn ids_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kite.db");

    let original_ids = {
        let mut engine = Engine::open(&path, EngineConfig::default()).unwrap();
        for name in ["A", "B", "C"] {
            engine
                .execute(&format!(r#"CREATE (a:Person {{name: "{name}"}})"#))
                .unwrap();
        }
        let rows = engine.execute("MATCH (n:Person) RETURN n").unwrap();
        engine.close().unwrap();
        row_node_ids(&rows)
    };

    let mut engine = Engine::open(&path, EngineConfig::default()).unwrap();
    let rows = engine.execute("MATCH (n:Person) RETURN n").unwrap();
    assert_eq!(row_node_ids(&rows), original_ids);
}

#[test]
fn full_graph_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kite.db");

    {
        let mut engine = Engine::open(&path, EngineConfig::default()).unwrap();
        engine
            .execute(r#"CREATE (a:Person {name:"A"})-[r:KNOWS {since:2020}]->(b:Person {name:"B"})"#)
            .unwrap();
        engine
            .execute(r#"MATCH (n:Person) WHERE n.name = "B" SET n.age = 40"#)
            .unwrap();
        engine.execute(r#"CREATE (c:Company {name:"K"})"#).unwrap();
        engine.execute("MATCH (c:Company) DELETE c").unwrap();
        engine.close().unwrap();
    }

    let mut engine = Engine::open(&path, EngineConfig::default()).unwrap();

    // Edge and both endpoints are back.
    let rows = engine.execute("MATCH ()-[r:KNOWS]->() RETURN r").unwrap();
    assert_eq!(rows.len(), 1);
    let (_, ty, _, _, properties) = expect_edge(&rows[0]);
    assert_eq!(ty, "KNOWS");
    assert_eq!(properties.get("since"), Some(&Value::Int(2020)));

    // The update survived, the deleted company did not.
    let rows = engine
        .execute(r#"MATCH (n:Person) WHERE n.name = "B" RETURN n"#)
        .unwrap();
    assert_eq!(node_property(&rows[0], "age"), &Value::Int(40));
    assert!(engine.execute("MATCH (c:Company) RETURN c").unwrap().is_empty());

    // Counters resume: a new node never reuses an id.
    engine.execute(r#"CREATE (d:Person {name:"D"})"#).unwrap();
    let rows = engine.execute("MATCH (n:Person) RETURN n").unwrap();
    let ids = row_node_ids(&rows);
    assert_eq!(ids.len(), 3);
    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn page_count_only_grows() {
    let (mut engine, _dir) = temp_engine();

    let mut last = engine.page_count();
    for i in 0..5 {
        engine
            .execute(&format!(r#"CREATE (a:Thing {{n: {i}}})"#))
            .unwrap();
        let now = engine.page_count();
        assert!(now > last);
        last = now;
    }

    // Updates and deletes also append rather than reuse.
    engine.execute("MATCH (n:Thing) SET n.seen = true").unwrap();
    assert!(engine.page_count() > last);
    last = engine.page_count();
    engine.execute("MATCH (n:Thing) DELETE n").unwrap();
    assert!(engine.page_count() > last);
}

#[test]
fn tiny_buffer_pool_behaves_like_a_big_one() {
    let config = EngineConfig::builder().buffer_pages(1).build();
    let (mut engine, _dir) = temp_engine_with(config);

    for i in 0..10 {
        engine
            .execute(&format!(r#"CREATE (a:Item {{n: {i}}})"#))
            .unwrap();
    }
    engine.execute("MATCH (n:Item) SET n.checked = true").unwrap();

    let rows = engine.execute("MATCH (n:Item) RETURN n").unwrap();
    assert_eq!(rows.len(), 10);
    for row in &rows {
        assert_eq!(node_property(row, "checked"), &Value::Bool(true));
    }
}

#[test]
fn admin_accessors_reflect_state() {
    let (mut engine, _dir) = temp_engine();
    engine
        .execute(r#"CREATE (a:Person {name:"A"})-[r:KNOWS]->(b:Person {name:"B"})"#)
        .unwrap();

    assert_eq!(engine.node_count(), 2);
    assert_eq!(engine.edge_count(), 1);
    assert_eq!(engine.labels(), vec!["Person".to_string()]);

    let nodes = engine.nodes().unwrap();
    assert_eq!(nodes.len(), 2);
    assert!(nodes[0].id < nodes[1].id);

    let edges = engine.edges().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].ty, "KNOWS");
}
