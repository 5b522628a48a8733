//! Record layer: one serialized node or edge per page.

use buffer::BufferPool;
use common::{Edge, KiteError, KiteResult, Node, PageId};

/// Reads and writes whole records through the buffer pool. Every write
/// allocates a new page; a record never spans pages.
#[derive(Debug)]
pub struct RecordStore {
    pool: BufferPool,
}

impl RecordStore {
    pub fn new(pool: BufferPool) -> Self {
        Self { pool }
    }

    /// Serialize a node onto a fresh page and return the page id.
    pub fn write_node(&mut self, node: &Node) -> KiteResult<PageId> {
        self.write_record(codec::encode_node(node))
    }

    /// Serialize an edge onto a fresh page and return the page id.
    pub fn write_edge(&mut self, edge: &Edge) -> KiteResult<PageId> {
        self.write_record(codec::encode_edge(edge))
    }

    pub fn read_node(&mut self, page: PageId) -> KiteResult<Node> {
        let data = self.pool.get_page(page)?;
        codec::decode_node(&data).map(|(node, _)| node)
    }

    pub fn read_edge(&mut self, page: PageId) -> KiteResult<Edge> {
        let data = self.pool.get_page(page)?;
        codec::decode_edge(&data).map(|(edge, _)| edge)
    }

    /// Raw page fetch, used by the boot scan.
    pub fn page(&mut self, id: PageId) -> KiteResult<Vec<u8>> {
        self.pool.get_page(id)
    }

    pub fn page_size(&self) -> usize {
        self.pool.page_size()
    }

    pub fn page_count(&self) -> u32 {
        self.pool.page_count()
    }

    pub fn sync(&mut self) -> KiteResult<()> {
        self.pool.sync()
    }

    pub fn close(self) -> KiteResult<()> {
        self.pool.close()
    }

    fn write_record(&mut self, mut bytes: Vec<u8>) -> KiteResult<PageId> {
        let page_size = self.pool.page_size();
        if bytes.len() > page_size {
            return Err(KiteError::RecordTooLarge {
                len: bytes.len(),
                page_size,
            });
        }
        bytes.resize(page_size, 0);

        let page = self.pool.allocate_page()?;
        self.pool.write_page(page, bytes)?;
        Ok(page)
    }
}
