//! Embeddable engine facade: open a database file, execute queries, close.
//!
//! The engine is single-threaded and single-writer: no operation is
//! reentrant, and an embedder that shares an instance across threads must
//! serialize calls externally. A query runs as one transaction (begin →
//! execute → commit); errors propagate before commit and mutations already
//! applied are not undone.

use buffer::BufferPool;
use common::{Edge, EngineConfig, KiteResult, Node, ResultRow};
use executor::ExecutionContext;
use graph::{GraphStore, records::RecordStore};
use std::path::Path;
use storage::PageFile;
use tracing::info;
use wal::TxnManager;

/// An open graph database.
#[derive(Debug)]
pub struct Engine {
    graph: GraphStore,
    txns: TxnManager,
}

impl Engine {
    /// Open or create a database file. Opening an existing file rebuilds
    /// the in-memory indexes and id counters by scanning every page.
    pub fn open(path: impl AsRef<Path>, config: EngineConfig) -> KiteResult<Self> {
        let storage = PageFile::open(&path, config.page_size)?;
        let pool = BufferPool::new(storage, config.buffer_pages)?;
        let graph = GraphStore::open(RecordStore::new(pool))?;

        info!(
            path = %path.as_ref().display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "opened database"
        );
        Ok(Self {
            graph,
            txns: TxnManager::new(),
        })
    }

    /// Parse and run one query inside one transaction, returning its rows
    /// (empty for queries without RETURN).
    pub fn execute(&mut self, text: &str) -> KiteResult<Vec<ResultRow>> {
        let query = parser::parse(text)?;
        let txn = self.txns.begin();
        let mut ctx = ExecutionContext::new(&mut self.graph, &mut self.txns);
        let rows = executor::execute(&query, txn, &mut ctx)?;
        self.txns.commit(txn)?;
        Ok(rows)
    }

    /// All live nodes in ascending id order.
    pub fn nodes(&mut self) -> KiteResult<Vec<Node>> {
        let ids = self.graph.node_ids();
        let mut nodes = Vec::with_capacity(ids.len());
        for id in ids {
            nodes.push(self.graph.get_node(id)?);
        }
        Ok(nodes)
    }

    /// All live edges in ascending id order.
    pub fn edges(&mut self) -> KiteResult<Vec<Edge>> {
        let ids = self.graph.edge_ids();
        let mut edges = Vec::with_capacity(ids.len());
        for id in ids {
            edges.push(self.graph.get_edge(id)?);
        }
        Ok(edges)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Labels with live nodes, sorted.
    pub fn labels(&self) -> Vec<String> {
        self.graph.labels()
    }

    /// Pages in the underlying file, header included.
    pub fn page_count(&self) -> u32 {
        self.graph.page_count()
    }

    /// Flush file buffers to disk without closing.
    pub fn sync(&mut self) -> KiteResult<()> {
        self.graph.sync()
    }

    /// Flush and close the database file, consuming the engine.
    pub fn close(self) -> KiteResult<()> {
        info!("closing database");
        self.graph.close()
    }
}
