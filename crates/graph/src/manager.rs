use crate::index::{LabelIndex, PrimaryIndex};
use crate::records::RecordStore;
use common::{Edge, EdgeId, KiteError, KiteResult, Node, NodeId, PageId, Property, merge_properties};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Coordinates the record layer and the in-memory indexes, and owns id
/// assignment. Node and edge ids are separate counters, both monotonic
/// from 1; ids are never reused, even across reopen.
#[derive(Debug)]
pub struct GraphStore {
    records: RecordStore,
    primary: PrimaryIndex,
    labels: LabelIndex,
    next_node_id: i64,
    next_edge_id: i64,
}

enum Scanned {
    Node(Node),
    Edge(Edge),
}

impl GraphStore {
    /// Wrap a record store and rebuild the indexes by scanning every page.
    ///
    /// Records are not self-describing, so classification tries a node
    /// decode and then an edge decode, accepting a parse only when the
    /// record is well-formed and the rest of the page is zero padding.
    /// For any id the highest page wins (writes are append-only), inactive
    /// records drop out of the indexes, and the id counters resume past
    /// the highest id seen whether or not it is still live.
    pub fn open(mut records: RecordStore) -> KiteResult<Self> {
        let mut node_latest: BTreeMap<NodeId, Node> = BTreeMap::new();
        let mut edge_latest: BTreeMap<EdgeId, Edge> = BTreeMap::new();
        let mut node_pages: BTreeMap<NodeId, PageId> = BTreeMap::new();
        let mut edge_pages: BTreeMap<EdgeId, PageId> = BTreeMap::new();

        let page_count = records.page_count();
        for raw in 1..page_count {
            let page = PageId(raw);
            let data = records.page(page)?;
            if data.first() == Some(&0) {
                // Allocated but never written.
                continue;
            }
            match classify(&data) {
                Some(Scanned::Node(node)) => {
                    node_pages.insert(node.id, page);
                    node_latest.insert(node.id, node);
                }
                Some(Scanned::Edge(edge)) => {
                    edge_pages.insert(edge.id, page);
                    edge_latest.insert(edge.id, edge);
                }
                None => warn!(%page, "skipping undecodable page"),
            }
        }

        let next_node_id = node_latest.keys().last().map_or(1, |id| id.0 + 1);
        let next_edge_id = edge_latest.keys().last().map_or(1, |id| id.0 + 1);

        let mut primary = PrimaryIndex::new();
        let mut labels = LabelIndex::new();
        for (id, node) in &node_latest {
            if !node.active {
                continue;
            }
            primary.insert_node(*id, node_pages[id])?;
            for label in &node.labels {
                labels.add(label, *id);
            }
        }
        for (id, edge) in &edge_latest {
            if edge.active {
                primary.insert_edge(*id, edge_pages[id])?;
            }
        }

        debug!(
            pages = page_count,
            nodes = primary.node_count(),
            edges = primary.edge_count(),
            "rebuilt indexes"
        );

        Ok(Self {
            records,
            primary,
            labels,
            next_node_id,
            next_edge_id,
        })
    }

    /// Assign an id, mark active, persist, and index. Returns the id.
    pub fn add_node(&mut self, mut node: Node) -> KiteResult<NodeId> {
        node.id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        node.active = true;

        let page = self.records.write_node(&node)?;
        self.primary.insert_node(node.id, page)?;
        for label in &node.labels {
            self.labels.add(label, node.id);
        }
        Ok(node.id)
    }

    /// Assign an id, mark active, persist, and index. Endpoints must be
    /// ids this store has assigned; they need not still be active.
    pub fn add_edge(&mut self, mut edge: Edge) -> KiteResult<EdgeId> {
        if edge.ty.is_empty() {
            return Err(KiteError::InvalidArgument("edge type is required".into()));
        }
        for endpoint in [edge.source, edge.target] {
            if endpoint.0 < 1 || endpoint.0 >= self.next_node_id {
                return Err(KiteError::InvalidArgument(format!(
                    "edge endpoint {endpoint} was never assigned"
                )));
            }
        }

        edge.id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        edge.active = true;

        let page = self.records.write_edge(&edge)?;
        self.primary.insert_edge(edge.id, page)?;
        Ok(edge.id)
    }

    pub fn get_node(&mut self, id: NodeId) -> KiteResult<Node> {
        let page = self
            .primary
            .node_page(id)
            .ok_or_else(|| KiteError::NotFound(format!("node {id}")))?;
        let node = self.records.read_node(page)?;
        if node.id != id {
            return Err(KiteError::Malformed(format!(
                "page {page} holds node {} but the index expected {id}",
                node.id
            )));
        }
        if !node.active {
            return Err(KiteError::NotActive(format!("node {id}")));
        }
        Ok(node)
    }

    pub fn get_edge(&mut self, id: EdgeId) -> KiteResult<Edge> {
        let page = self
            .primary
            .edge_page(id)
            .ok_or_else(|| KiteError::NotFound(format!("edge {id}")))?;
        let edge = self.records.read_edge(page)?;
        if edge.id != id {
            return Err(KiteError::Malformed(format!(
                "page {page} holds edge {} but the index expected {id}",
                edge.id
            )));
        }
        if !edge.active {
            return Err(KiteError::NotActive(format!("edge {id}")));
        }
        Ok(edge)
    }

    /// Merge `patch` into the node's properties (patch wins by key), write
    /// the merged record to a new page, and repoint the index. Returns the
    /// merged node.
    pub fn update_node(&mut self, id: NodeId, patch: &[Property]) -> KiteResult<Node> {
        let mut node = self.get_node(id)?;
        node.properties = merge_properties(&node.properties, patch);

        let page = self.records.write_node(&node)?;
        self.primary.delete_node(id)?;
        self.primary.insert_node(id, page)?;
        Ok(node)
    }

    /// Edge analogue of [`update_node`](Self::update_node).
    pub fn update_edge(&mut self, id: EdgeId, patch: &[Property]) -> KiteResult<Edge> {
        let mut edge = self.get_edge(id)?;
        edge.properties = merge_properties(&edge.properties, patch);

        let page = self.records.write_edge(&edge)?;
        self.primary.delete_edge(id)?;
        self.primary.insert_edge(id, page)?;
        Ok(edge)
    }

    /// Write the node back inactive, then unindex it. The inactive record
    /// exists only so a later boot scan skips the id.
    pub fn delete_node(&mut self, id: NodeId) -> KiteResult<()> {
        let mut node = self.get_node(id)?;
        node.active = false;
        self.records.write_node(&node)?;

        self.primary.delete_node(id)?;
        self.labels.scrub(id);
        Ok(())
    }

    /// Edge analogue of [`delete_node`](Self::delete_node). Edges carry no
    /// label index entries.
    pub fn delete_edge(&mut self, id: EdgeId) -> KiteResult<()> {
        let mut edge = self.get_edge(id)?;
        edge.active = false;
        self.records.write_edge(&edge)?;

        self.primary.delete_edge(id)?;
        Ok(())
    }

    /// Node ids carrying `label`, in insertion order.
    pub fn nodes_with_label(&self, label: &str) -> &[NodeId] {
        self.labels.nodes_with(label)
    }

    /// All live node ids, ascending.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.primary.node_ids()
    }

    /// All live edge ids, ascending.
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.primary.edge_ids()
    }

    pub fn node_count(&self) -> usize {
        self.primary.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.primary.edge_count()
    }

    /// All labels with live nodes, sorted.
    pub fn labels(&self) -> Vec<String> {
        self.labels.labels()
    }

    pub fn page_count(&self) -> u32 {
        self.records.page_count()
    }

    pub fn sync(&mut self) -> KiteResult<()> {
        self.records.sync()
    }

    pub fn close(self) -> KiteResult<()> {
        self.records.close()
    }
}

fn classify(data: &[u8]) -> Option<Scanned> {
    if let Ok((node, used)) = codec::decode_node(data) {
        if data[used..].iter().all(|&b| b == 0) {
            return Some(Scanned::Node(node));
        }
    }
    if let Ok((edge, used)) = codec::decode_edge(data) {
        if data[used..].iter().all(|&b| b == 0) {
            return Some(Scanned::Edge(edge));
        }
    }
    None
}
