use crate::records::RecordStore;
use crate::GraphStore;
use buffer::BufferPool;
use common::{Edge, KiteError, Node, NodeId, Property};
use storage::PageFile;
use tempfile::tempdir;

const PAGE: usize = 512;

fn open_store(dir: &std::path::Path) -> GraphStore {
    let storage = PageFile::open(dir.join("kite.db"), PAGE).unwrap();
    let pool = BufferPool::new(storage, 8).unwrap();
    GraphStore::open(RecordStore::new(pool)).unwrap()
}

fn person(name: &str, age: i64) -> Node {
    Node::new(
        vec!["Person".into()],
        vec![Property::new("name", name), Property::new("age", age)],
    )
}

#[test]
fn add_assigns_monotonic_ids_from_one() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());

    let a = store.add_node(person("A", 1)).unwrap();
    let b = store.add_node(person("B", 2)).unwrap();
    assert_eq!(a, NodeId(1));
    assert_eq!(b, NodeId(2));

    let e1 = store
        .add_edge(Edge::new("KNOWS", a, b, vec![]))
        .unwrap();
    let e2 = store
        .add_edge(Edge::new("KNOWS", b, a, vec![]))
        .unwrap();
    assert_eq!(e1.0, 1);
    assert_eq!(e2.0, 2);
}

#[test]
fn get_returns_latest_write_with_active_set() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());

    let id = store.add_node(person("Alice", 30)).unwrap();
    let node = store.get_node(id).unwrap();
    assert!(node.active);
    assert_eq!(node.labels, vec!["Person".to_string()]);
    assert_eq!(node.properties[0], Property::new("name", "Alice"));
}

#[test]
fn get_missing_is_not_found() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());

    let err = store.get_node(NodeId(99)).unwrap_err();
    assert!(matches!(err, KiteError::NotFound(_)), "got {err:?}");
}

#[test]
fn update_merges_and_repoints() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());

    let id = store.add_node(person("Alice", 30)).unwrap();
    let pages_before = store.page_count();

    let merged = store
        .update_node(id, &[Property::new("age", 31i64)])
        .unwrap();
    assert_eq!(merged.properties[0], Property::new("name", "Alice"));
    assert_eq!(merged.properties[1], Property::new("age", 31i64));

    // Append-only: the update landed on a new page and the old one leaked.
    assert_eq!(store.page_count(), pages_before + 1);

    let reread = store.get_node(id).unwrap();
    assert_eq!(reread, merged);
}

#[test]
fn set_twice_is_idempotent() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());

    let id = store.add_node(person("Alice", 30)).unwrap();
    store.update_node(id, &[Property::new("age", 31i64)]).unwrap();
    let first = store.get_node(id).unwrap();
    store.update_node(id, &[Property::new("age", 31i64)]).unwrap();
    let second = store.get_node(id).unwrap();

    assert_eq!(first.properties, second.properties);
    assert_eq!(first.active, second.active);
}

#[test]
fn delete_makes_node_unreachable() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());

    let id = store.add_node(person("Alice", 30)).unwrap();
    assert_eq!(store.nodes_with_label("Person"), &[id]);

    store.delete_node(id).unwrap();

    let err = store.get_node(id).unwrap_err();
    assert!(matches!(err, KiteError::NotFound(_)), "got {err:?}");
    assert!(store.nodes_with_label("Person").is_empty());
    assert_eq!(store.node_count(), 0);

    let err = store.delete_node(id).unwrap_err();
    assert!(matches!(err, KiteError::NotFound(_)), "got {err:?}");
}

#[test]
fn deleting_node_leaves_incident_edges() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());

    let a = store.add_node(person("A", 1)).unwrap();
    let b = store.add_node(person("B", 2)).unwrap();
    let e = store.add_edge(Edge::new("KNOWS", a, b, vec![])).unwrap();

    store.delete_node(a).unwrap();

    // The edge dangles but stays visible.
    let edge = store.get_edge(e).unwrap();
    assert_eq!(edge.source, a);
}

#[test]
fn edge_requires_type_and_assigned_endpoints() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());
    let a = store.add_node(person("A", 1)).unwrap();

    let err = store
        .add_edge(Edge::new("", a, a, vec![]))
        .unwrap_err();
    assert!(matches!(err, KiteError::InvalidArgument(_)), "got {err:?}");

    let err = store
        .add_edge(Edge::new("KNOWS", a, NodeId(99), vec![]))
        .unwrap_err();
    assert!(matches!(err, KiteError::InvalidArgument(_)), "got {err:?}");

    // Self-loops are fine.
    store.add_edge(Edge::new("KNOWS", a, a, vec![])).unwrap();
}

#[test]
fn label_index_tracks_membership_in_insertion_order() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());

    let a = store.add_node(person("A", 1)).unwrap();
    let b = store
        .add_node(Node::new(vec!["Person".into(), "Admin".into()], vec![]))
        .unwrap();
    let c = store.add_node(person("C", 3)).unwrap();

    assert_eq!(store.nodes_with_label("Person"), &[a, b, c]);
    assert_eq!(store.nodes_with_label("Admin"), &[b]);
    assert_eq!(store.labels(), vec!["Admin".to_string(), "Person".to_string()]);

    store.delete_node(b).unwrap();
    assert_eq!(store.nodes_with_label("Person"), &[a, c]);
    assert!(store.nodes_with_label("Admin").is_empty());
}

#[test]
fn record_filling_the_page_fits_and_one_more_byte_does_not() {
    let dir = tempdir().unwrap();
    let mut store = open_store(dir.path());

    let node_with = |payload: String| {
        Node::new(vec![], vec![Property::new("blob", payload)])
    };
    let base = codec::encode_node(&node_with(String::new())).len();
    let headroom = PAGE - base;

    store.add_node(node_with("x".repeat(headroom))).unwrap();

    let err = store
        .add_node(node_with("x".repeat(headroom + 1)))
        .unwrap_err();
    assert!(matches!(err, KiteError::RecordTooLarge { .. }), "got {err:?}");
}

#[test]
fn reopen_rebuilds_indexes_and_counters() {
    let dir = tempdir().unwrap();

    let (a, b, c, e) = {
        let mut store = open_store(dir.path());
        let a = store.add_node(person("A", 1)).unwrap();
        let b = store.add_node(person("B", 2)).unwrap();
        let c = store.add_node(person("C", 3)).unwrap();
        let e = store
            .add_edge(Edge::new("KNOWS", a, b, vec![Property::new("since", 2020i64)]))
            .unwrap();
        store.update_node(b, &[Property::new("age", 20i64)]).unwrap();
        store.delete_node(c).unwrap();
        store.close().unwrap();
        (a, b, c, e)
    };

    let mut store = open_store(dir.path());

    // Live entities came back with their ids and latest values.
    assert_eq!(store.nodes_with_label("Person"), &[a, b]);
    assert_eq!(
        store.get_node(b).unwrap().properties[1],
        Property::new("age", 20i64)
    );
    let edge = store.get_edge(e).unwrap();
    assert_eq!((edge.source, edge.target), (a, b));
    assert_eq!(edge.properties[0], Property::new("since", 2020i64));

    // The deleted node stayed dead.
    assert!(matches!(
        store.get_node(c).unwrap_err(),
        KiteError::NotFound(_)
    ));

    // Counters resume past every id ever assigned, deleted ones included.
    let d = store.add_node(person("D", 4)).unwrap();
    assert_eq!(d, NodeId(4));
    let e2 = store.add_edge(Edge::new("KNOWS", a, d, vec![])).unwrap();
    assert_eq!(e2.0, 2);
}

#[test]
fn reopen_of_empty_store_is_empty() {
    let dir = tempdir().unwrap();
    {
        let store = open_store(dir.path());
        store.close().unwrap();
    }
    let mut store = open_store(dir.path());
    assert_eq!(store.node_count(), 0);
    assert_eq!(store.edge_count(), 0);
    let id = store.add_node(person("A", 1)).unwrap();
    assert_eq!(id, NodeId(1));
}
