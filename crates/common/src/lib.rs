
pub mod pretty;
mod rows;

pub use rows::{PropertyBag, ResultRow, RowValue};

use serde::{Deserialize, Serialize};
use std::{fmt, io};
use thiserror::Error;
use types::Value;

/// Identifier of a fixed-size page in the database file. Page 0 is the file
/// header; records live on pages >= 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub u32);

/// Identifier of a node, assigned monotonically from 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub i64);

/// Identifier of an edge, assigned monotonically from 1 on a counter
/// separate from nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub i64);

/// Identifier of a transaction, assigned monotonically from 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxnId(pub u64);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A key-value pair attached to a node or edge. Keys are non-empty; the
/// format does not require them unique, but update merges collapse
/// duplicates with last-write-wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: Value,
}

impl Property {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A labelled node. `active` gates visibility: MATCH and lookups only see
/// active entities.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub active: bool,
    pub labels: Vec<String>,
    pub properties: Vec<Property>,
}

impl Node {
    /// A node awaiting id assignment by the graph manager.
    pub fn new(labels: Vec<String>, properties: Vec<Property>) -> Self {
        Self {
            id: NodeId(0),
            active: false,
            labels,
            properties,
        }
    }
}

/// A directed, typed edge between two nodes. Endpoints must be assigned
/// node ids but need not still be active; self-loops are allowed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeId,
    pub active: bool,
    pub ty: String,
    pub source: NodeId,
    pub target: NodeId,
    pub properties: Vec<Property>,
}

impl Edge {
    /// An edge awaiting id assignment by the graph manager.
    pub fn new(
        ty: impl Into<String>,
        source: NodeId,
        target: NodeId,
        properties: Vec<Property>,
    ) -> Self {
        Self {
            id: EdgeId(0),
            active: false,
            ty: ty.into(),
            source,
            target,
            properties,
        }
    }
}

/// Merge `patch` into `base` by key: patch values win, untouched keys are
/// preserved, and duplicate keys collapse to their last occurrence. The
/// first-seen key order is kept stable.
pub fn merge_properties(base: &[Property], patch: &[Property]) -> Vec<Property> {
    let mut merged: Vec<Property> = Vec::with_capacity(base.len() + patch.len());
    for prop in base.iter().chain(patch.iter()) {
        match merged.iter_mut().find(|existing| existing.key == prop.key) {
            Some(existing) => existing.value = prop.value.clone(),
            None => merged.push(prop.clone()),
        }
    }
    merged
}

/// Canonical error type shared across engine subsystems.
#[derive(Error, Debug)]
pub enum KiteError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not active: {0}")]
    NotActive(String),
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error("parse: {0}")]
    Parse(String),
    #[error("type: {0}")]
    Type(String),
    #[error("record too large: {len} bytes exceeds page size {page_size}")]
    RecordTooLarge { len: usize, page_size: usize },
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    #[error("unknown transaction: {0}")]
    UnknownTransaction(TxnId),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries a `KiteError`.
pub type KiteResult<T> = Result<T, KiteError>;

/// Construction-time settings for an engine instance.
///
/// # Example
/// ```
/// use common::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .page_size(8192)
///     .buffer_pages(64)
///     .build();
/// assert_eq!(config.page_size, 8192);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct EngineConfig {
    /// Fixed page size in bytes; chosen at open time and persisted in the
    /// file header.
    #[builder(default = 4096)]
    pub page_size: usize,
    /// Number of pages the buffer pool keeps resident.
    #[builder(default = 100)]
    pub buffer_pages: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: 4096,
            buffer_pages: 100,
        }
    }
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{
        Edge, EdgeId, EngineConfig, KiteError, KiteResult, Node, NodeId, PageId, Property,
        ResultRow, RowValue, TxnId, merge_properties,
    };
    pub use types::{Value, ValueKind};
}
