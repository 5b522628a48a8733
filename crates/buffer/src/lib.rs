//! Write-through LRU buffer pool over paged storage.
//!
//! The pool caches recently touched pages and keeps storage authoritative:
//! every write goes to the file before the cache is updated, so there is no
//! dirty tracking and eviction never needs to flush. Reads hand out owned
//! copies; the pool's buffers never escape, which keeps eviction safe.


use common::{KiteError, KiteResult, PageId};
use lru::LruCache;
use std::num::NonZeroUsize;
use storage::PageFile;
use tracing::trace;

/// LRU page cache in front of a `PageFile`.
#[derive(Debug)]
pub struct BufferPool {
    storage: PageFile,
    cache: LruCache<PageId, Vec<u8>>,
}

impl BufferPool {
    /// Wrap storage with a cache of `capacity` pages. Capacity must be at
    /// least one.
    pub fn new(storage: PageFile, capacity: usize) -> KiteResult<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            KiteError::InvalidArgument("buffer pool capacity must be at least 1".into())
        })?;
        Ok(Self {
            storage,
            cache: LruCache::new(capacity),
        })
    }

    /// Fetch a page, from cache if resident (marking it most recently
    /// used), otherwise from storage, evicting the least recently used
    /// entry when full.
    pub fn get_page(&mut self, id: PageId) -> KiteResult<Vec<u8>> {
        if let Some(data) = self.cache.get(&id) {
            return Ok(data.clone());
        }

        let data = self.storage.read_page(id)?;
        if let Some((evicted, _)) = self.cache.push(id, data.clone()) {
            trace!(%evicted, loaded = %id, "evicted page");
        }
        Ok(data)
    }

    /// Write a page through to storage, then install it in the cache as
    /// most recently used.
    pub fn write_page(&mut self, id: PageId, data: Vec<u8>) -> KiteResult<()> {
        self.storage.write_page(id, &data)?;
        if let Some((evicted, _)) = self.cache.push(id, data) {
            if evicted != id {
                trace!(%evicted, wrote = %id, "evicted page");
            }
        }
        Ok(())
    }

    /// Extend the file by one page. The new page is not cached until it is
    /// read or written.
    pub fn allocate_page(&mut self) -> KiteResult<PageId> {
        self.storage.allocate_page()
    }

    pub fn page_size(&self) -> usize {
        self.storage.page_size()
    }

    pub fn page_count(&self) -> u32 {
        self.storage.page_count()
    }

    /// Number of pages currently resident in the cache.
    pub fn cached_pages(&self) -> usize {
        self.cache.len()
    }

    /// Whether a page is resident, without touching recency.
    pub fn contains(&self, id: PageId) -> bool {
        self.cache.contains(&id)
    }

    /// Flush storage buffers to disk.
    pub fn sync(&mut self) -> KiteResult<()> {
        self.storage.sync()
    }

    /// Drop all cached entries and close the underlying file. Storage holds
    /// the durable copy of every page, so nothing needs flushing.
    pub fn close(mut self) -> KiteResult<()> {
        self.cache.clear();
        self.storage.close()
    }
}
