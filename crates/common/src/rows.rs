//! Result-row shapes returned by `execute` and carried over the wire.

use crate::{Edge, Node, Property};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use types::Value;

/// Ordered property collection. Serializes as a JSON array of
/// `{"key": ..., "value": ...}` pairs rather than an object: duplicate
/// keys are legal on a freshly created entity (merges only collapse them
/// on update), and a JSON object would silently drop all but the last.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag(pub Vec<Property>);

impl PropertyBag {
    /// First value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|p| p.key == key).map(|p| &p.value)
    }
}

impl From<&[Property]> for PropertyBag {
    fn from(props: &[Property]) -> Self {
        PropertyBag(props.to_vec())
    }
}

/// A single entity in a result row, tagged by kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RowValue {
    Node {
        id: i64,
        labels: Vec<String>,
        properties: PropertyBag,
    },
    Edge {
        id: i64,
        #[serde(rename = "type")]
        ty: String,
        source: i64,
        target: i64,
        properties: PropertyBag,
    },
}

impl From<&Node> for RowValue {
    fn from(node: &Node) -> Self {
        RowValue::Node {
            id: node.id.0,
            labels: node.labels.clone(),
            properties: PropertyBag(node.properties.clone()),
        }
    }
}

impl From<&Edge> for RowValue {
    fn from(edge: &Edge) -> Self {
        RowValue::Edge {
            id: edge.id.0,
            ty: edge.ty.clone(),
            source: edge.source.0,
            target: edge.target.0,
            properties: PropertyBag(edge.properties.clone()),
        }
    }
}

/// One result row: the RETURN identifier it answers and the entity bound to
/// it. Serializes as a single-entry JSON object keyed by the identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultRow {
    pub variable: String,
    pub value: RowValue,
}

impl ResultRow {
    pub fn new(variable: impl Into<String>, value: RowValue) -> Self {
        Self {
            variable: variable.into(),
            value,
        }
    }
}

impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.variable, &self.value)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResultRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = ResultRow;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a single-entry map of variable to entity")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let (variable, value) = access
                    .next_entry::<String, RowValue>()?
                    .ok_or_else(|| serde::de::Error::custom("empty result row"))?;
                Ok(ResultRow { variable, value })
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}
