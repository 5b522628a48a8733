use super::*;
use proptest::prelude::*;

fn sample_node() -> Node {
    Node {
        id: NodeId(7),
        active: true,
        labels: vec!["Person".into(), "Employee".into()],
        properties: vec![
            Property::new("name", "Alice"),
            Property::new("age", 30i64),
            Property::new("admin", false),
        ],
    }
}

fn sample_edge() -> Edge {
    Edge {
        id: EdgeId(3),
        active: true,
        ty: "KNOWS".into(),
        source: NodeId(1),
        target: NodeId(2),
        properties: vec![Property::new("since", 2020i64)],
    }
}

#[test]
fn node_round_trip() {
    let node = sample_node();
    let bytes = encode_node(&node);
    let (back, consumed) = decode_node(&bytes).unwrap();
    assert_eq!(back, node);
    assert_eq!(consumed, bytes.len());
}

#[test]
fn edge_round_trip() {
    let edge = sample_edge();
    let bytes = encode_edge(&edge);
    let (back, consumed) = decode_edge(&bytes).unwrap();
    assert_eq!(back, edge);
    assert_eq!(consumed, bytes.len());
}

#[test]
fn node_round_trip_empty_labels_and_properties() {
    let node = Node {
        id: NodeId(1),
        active: false,
        labels: vec![],
        properties: vec![],
    };
    let bytes = encode_node(&node);
    let (back, consumed) = decode_node(&bytes).unwrap();
    assert_eq!(back, node);
    assert_eq!(consumed, bytes.len());
}

#[test]
fn decode_ignores_trailing_padding() {
    let node = sample_node();
    let mut bytes = encode_node(&node);
    let record_len = bytes.len();
    bytes.resize(record_len + 512, 0);

    let (back, consumed) = decode_node(&bytes).unwrap();
    assert_eq!(back, node);
    assert_eq!(consumed, record_len);
}

#[test]
fn unknown_version_is_malformed() {
    let mut bytes = encode_node(&sample_node());
    bytes[0] = 2;
    let err = decode_node(&bytes).unwrap_err();
    assert!(matches!(err, KiteError::Malformed(_)), "got {err:?}");
}

#[test]
fn truncated_buffer_is_malformed() {
    let bytes = encode_node(&sample_node());
    for cut in [0, 1, 5, 9, 13, bytes.len() - 1] {
        let err = decode_node(&bytes[..cut]).unwrap_err();
        assert!(matches!(err, KiteError::Malformed(_)), "cut {cut}: {err:?}");
    }
}

#[test]
fn oversized_string_length_is_malformed() {
    // Claim a 1 MB label on a tiny buffer.
    let mut bytes = vec![FORMAT_VERSION];
    bytes.extend_from_slice(&1i64.to_le_bytes());
    bytes.push(1);
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&(1u32 << 20).to_le_bytes());
    bytes.extend_from_slice(b"abc");

    let err = decode_node(&bytes).unwrap_err();
    assert!(matches!(err, KiteError::Malformed(_)), "got {err:?}");
}

#[test]
fn unknown_property_tag_is_type_error() {
    let node = Node {
        id: NodeId(1),
        active: true,
        labels: vec![],
        properties: vec![Property::new("k", 0i64)],
    };
    let mut bytes = encode_node(&node);
    // Flip the tag byte of the only property (version + id + active +
    // label_count + prop_count + key length + "k").
    let tag_offset = 1 + 8 + 1 + 4 + 4 + 4 + 1;
    assert_eq!(bytes[tag_offset], 0);
    bytes[tag_offset] = 9;

    let err = decode_node(&bytes).unwrap_err();
    assert!(matches!(err, KiteError::Type(_)), "got {err:?}");
}

#[test]
fn invalid_utf8_is_malformed() {
    let node = Node {
        id: NodeId(1),
        active: true,
        labels: vec!["ab".into()],
        properties: vec![],
    };
    let mut bytes = encode_node(&node);
    // Corrupt the label payload (version + id + active + label_count + len).
    let label_offset = 1 + 8 + 1 + 4 + 4;
    bytes[label_offset] = 0xff;
    bytes[label_offset + 1] = 0xfe;

    let err = decode_node(&bytes).unwrap_err();
    assert!(matches!(err, KiteError::Malformed(_)), "got {err:?}");
}

#[test]
fn empty_edge_type_rejected() {
    let edge = Edge {
        id: EdgeId(1),
        active: true,
        ty: "X".into(),
        source: NodeId(1),
        target: NodeId(1),
        properties: vec![],
    };
    let mut bytes = encode_edge(&edge);
    // Zero out the type length (version + id + active).
    let len_offset = 1 + 8 + 1;
    bytes[len_offset..len_offset + 4].copy_from_slice(&0u32.to_le_bytes());
    // Splice out the type byte so the remainder still lines up.
    bytes.remove(len_offset + 4);

    let err = decode_edge(&bytes).unwrap_err();
    assert!(matches!(err, KiteError::Malformed(_)), "got {err:?}");
}

#[test]
fn node_bytes_do_not_decode_as_edge() {
    // Typical node records fail the edge decoder's structural checks, which
    // is what the boot scan relies on to classify pages.
    let bytes = encode_node(&sample_node());
    assert!(decode_edge(&bytes).is_err());
}

fn arb_value() -> impl Strategy<Value = types::Value> {
    prop_oneof![
        any::<i64>().prop_map(types::Value::Int),
        "[a-zA-Z0-9 _-]{0,24}".prop_map(types::Value::Str),
        any::<bool>().prop_map(types::Value::Bool),
    ]
}

fn arb_properties() -> impl Strategy<Value = Vec<Property>> {
    prop::collection::vec(
        ("[a-z][a-z0-9_]{0,12}", arb_value()).prop_map(|(key, value)| Property { key, value }),
        0..6,
    )
}

proptest! {
    #[test]
    fn node_round_trip_law(
        id in 1i64..i64::MAX,
        active in any::<bool>(),
        labels in prop::collection::vec("[A-Z][a-zA-Z]{0,12}", 0..4),
        properties in arb_properties(),
    ) {
        let node = Node { id: NodeId(id), active, labels, properties };
        let bytes = encode_node(&node);
        let (back, consumed) = decode_node(&bytes).unwrap();
        prop_assert_eq!(back, node);
        prop_assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn edge_round_trip_law(
        id in 1i64..i64::MAX,
        active in any::<bool>(),
        ty in "[A-Z_]{1,16}",
        source in 1i64..i64::MAX,
        target in 1i64..i64::MAX,
        properties in arb_properties(),
    ) {
        let edge = Edge {
            id: EdgeId(id),
            active,
            ty,
            source: NodeId(source),
            target: NodeId(target),
            properties,
        };
        let bytes = encode_edge(&edge);
        let (back, consumed) = decode_edge(&bytes).unwrap();
        prop_assert_eq!(back, edge);
        prop_assert_eq!(consumed, bytes.len());
    }
}
