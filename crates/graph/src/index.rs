//! In-memory indexes: primary id-to-page maps and the label inverted index.
//!
//! Nothing here persists; the graph manager rebuilds these from a full page
//! scan at open time.

use ahash::RandomState;
use common::{EdgeId, KiteError, KiteResult, NodeId, PageId};
use hashbrown::HashMap;

type Map<K, V> = HashMap<K, V, RandomState>;

/// Primary maps from entity id to the page holding its current
/// serialization. Inserts and deletes are exact: inserting a present key or
/// deleting an absent one is an error.
#[derive(Debug, Default)]
pub struct PrimaryIndex {
    nodes: Map<NodeId, PageId>,
    edges: Map<EdgeId, PageId>,
}

impl PrimaryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node(&mut self, id: NodeId, page: PageId) -> KiteResult<()> {
        if self.nodes.contains_key(&id) {
            return Err(KiteError::DuplicateId(format!("node {id}")));
        }
        self.nodes.insert(id, page);
        Ok(())
    }

    pub fn insert_edge(&mut self, id: EdgeId, page: PageId) -> KiteResult<()> {
        if self.edges.contains_key(&id) {
            return Err(KiteError::DuplicateId(format!("edge {id}")));
        }
        self.edges.insert(id, page);
        Ok(())
    }

    pub fn node_page(&self, id: NodeId) -> Option<PageId> {
        self.nodes.get(&id).copied()
    }

    pub fn edge_page(&self, id: EdgeId) -> Option<PageId> {
        self.edges.get(&id).copied()
    }

    pub fn delete_node(&mut self, id: NodeId) -> KiteResult<()> {
        self.nodes
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| KiteError::NotFound(format!("node {id}")))
    }

    pub fn delete_edge(&mut self, id: EdgeId) -> KiteResult<()> {
        self.edges
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| KiteError::NotFound(format!("edge {id}")))
    }

    /// All node ids in ascending order, for deterministic scans.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// All edge ids in ascending order, for deterministic scans.
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        let mut ids: Vec<EdgeId> = self.edges.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Inverted index from label to the node ids carrying it, in insertion
/// order without duplicates. Empty buckets are dropped.
#[derive(Debug, Default)]
pub struct LabelIndex {
    buckets: Map<String, Vec<NodeId>>,
}

impl LabelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` to the label's bucket unless already present.
    pub fn add(&mut self, label: &str, id: NodeId) {
        let bucket = self.buckets.entry_ref(label).or_default();
        if !bucket.contains(&id) {
            bucket.push(id);
        }
    }

    /// Remove `id` from every bucket it appears in, dropping buckets that
    /// become empty.
    pub fn scrub(&mut self, id: NodeId) {
        self.buckets.retain(|_, bucket| {
            bucket.retain(|member| *member != id);
            !bucket.is_empty()
        });
    }

    /// Node ids carrying `label`, in insertion order. Unknown labels yield
    /// an empty slice.
    pub fn nodes_with(&self, label: &str) -> &[NodeId] {
        self.buckets.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All labels in sorted order.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.buckets.keys().cloned().collect();
        labels.sort_unstable();
        labels
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
