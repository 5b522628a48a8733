//! Single-file paged storage.
//!
//! The database is one file of fixed-size pages. Page 0 is the header:
//! ASCII magic `GDB\0`, a little-endian `u32` page size, a little-endian
//! `u32` page count, zero-padded to the page size. User records live on
//! pages >= 1. The file length is always `page_count * page_size`.


use common::{KiteError, KiteResult, PageId};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::debug;

/// Magic bytes at the start of every database file.
pub const MAGIC: [u8; 4] = *b"GDB\0";

const HEADER_LEN: usize = 12;

/// Fixed-size page storage over a single file.
#[derive(Debug)]
pub struct PageFile {
    file: File,
    page_size: usize,
    page_count: u32,
}

impl PageFile {
    /// Open or create a database file with the given page size.
    ///
    /// An empty file is initialized with a header page (page count 1). An
    /// existing file must have a length that is a multiple of `page_size`
    /// and a header matching the magic and page size.
    pub fn open(path: impl AsRef<Path>, page_size: usize) -> KiteResult<Self> {
        if page_size < HEADER_LEN {
            return Err(KiteError::InvalidArgument(format!(
                "page size {page_size} is smaller than the {HEADER_LEN}-byte header"
            )));
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        let len = file.metadata()?.len();
        if len == 0 {
            let mut storage = Self {
                file,
                page_size,
                page_count: 1,
            };
            storage.write_header()?;
            debug!(path = %path.as_ref().display(), page_size, "initialized database file");
            return Ok(storage);
        }

        if len % page_size as u64 != 0 {
            return Err(KiteError::InvalidArgument(format!(
                "file length {len} is not a multiple of page size {page_size}"
            )));
        }

        let mut header = vec![0u8; HEADER_LEN];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut header)?;
        if header[0..4] != MAGIC {
            return Err(KiteError::Malformed("bad magic in file header".into()));
        }
        let stored_page_size = u32::from_le_bytes(header[4..8].try_into().unwrap()) as usize;
        if stored_page_size != page_size {
            return Err(KiteError::InvalidArgument(format!(
                "file was created with page size {stored_page_size}, opened with {page_size}"
            )));
        }

        // The file length is authoritative for the page count; the header
        // field is rewritten on the next allocation.
        let page_count = u32::try_from(len / page_size as u64).map_err(|_| {
            KiteError::InvalidArgument("file holds too many pages for a u32 count".into())
        })?;

        debug!(path = %path.as_ref().display(), page_size, page_count, "opened database file");
        Ok(Self {
            file,
            page_size,
            page_count,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Read a full page. The id must be below the current page count.
    pub fn read_page(&mut self, id: PageId) -> KiteResult<Vec<u8>> {
        self.check_bounds(id)?;
        let mut data = vec![0u8; self.page_size];
        self.file.seek(SeekFrom::Start(self.offset(id)))?;
        self.file.read_exact(&mut data)?;
        Ok(data)
    }

    /// Write a full page. The buffer must be exactly one page long.
    pub fn write_page(&mut self, id: PageId, data: &[u8]) -> KiteResult<()> {
        self.check_bounds(id)?;
        if data.len() != self.page_size {
            return Err(KiteError::InvalidArgument(format!(
                "page write of {} bytes, expected {}",
                data.len(),
                self.page_size
            )));
        }
        self.file.seek(SeekFrom::Start(self.offset(id)))?;
        self.file.write_all(data)?;
        Ok(())
    }

    /// Extend the file by one zero-filled page and return its id. The
    /// page-count field of the header is rewritten.
    pub fn allocate_page(&mut self) -> KiteResult<PageId> {
        let id = PageId(self.page_count);
        self.file.seek(SeekFrom::Start(self.offset(id)))?;
        self.file.write_all(&vec![0u8; self.page_size])?;
        self.page_count += 1;
        self.write_header()?;
        Ok(id)
    }

    /// Flush file buffers to durable storage.
    pub fn sync(&mut self) -> KiteResult<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Flush and close the file, consuming the handle.
    pub fn close(mut self) -> KiteResult<()> {
        self.sync()
    }

    fn offset(&self, id: PageId) -> u64 {
        id.0 as u64 * self.page_size as u64
    }

    fn check_bounds(&self, id: PageId) -> KiteResult<()> {
        if id.0 >= self.page_count {
            return Err(KiteError::InvalidArgument(format!(
                "page {id} out of range, file holds {} pages",
                self.page_count
            )));
        }
        Ok(())
    }

    fn write_header(&mut self) -> KiteResult<()> {
        let mut header = vec![0u8; self.page_size];
        header[0..4].copy_from_slice(&MAGIC);
        header[4..8].copy_from_slice(&(self.page_size as u32).to_le_bytes());
        header[8..12].copy_from_slice(&self.page_count.to_le_bytes());
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&header)?;
        Ok(())
    }
}
