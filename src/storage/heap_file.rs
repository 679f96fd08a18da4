//! Heap file implementation.
//!
//! A heap file is the on-disk form of one table: a plain concatenation of
//! fixed-size heap pages with no file header. The page count is derived
//! from the file length, so appending a page is just writing one more
//! block at the end.
//!
//! Page-level reads and writes go straight to disk. Tuple-level inserts,
//! deletes and scans fetch pages through the buffer pool so that cached
//! copies stay authoritative.

use crate::buffer::BufferPool;
use crate::error::{DbError, Result};
use crate::page::{HeapPage, PageLayout};
use crate::tuple::{Tuple, TupleDesc};
use crate::types::{PageId, Permissions, RecordId, TransactionId};
use log::debug;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A table stored as an unordered sequence of heap pages
#[derive(Debug)]
pub struct HeapFile {
    /// Canonical path of the backing file
    path: PathBuf,
    desc: Arc<TupleDesc>,
    table_id: u32,
    page_size: usize,
    /// Serializes appends so two inserters never write the same new page
    append_lock: Mutex<()>,
}

impl HeapFile {
    /// Open (creating if missing) the heap file at `path`.
    ///
    /// `page_size` must be the size the file was written with; reading a
    /// file with a different page size yields garbage pages.
    pub fn open(path: impl AsRef<Path>, desc: Arc<TupleDesc>, page_size: usize) -> Result<Self> {
        if PageLayout::new(page_size, &desc).slots == 0 {
            return Err(DbError::invalid_config(format!(
                "page size {} cannot hold a single {}-byte tuple",
                page_size,
                desc.byte_size()
            )));
        }

        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;
        let path = fs::canonicalize(path.as_ref())?;
        let table_id = Self::table_id_for(&path);

        Ok(Self {
            path,
            desc,
            table_id,
            page_size,
            append_lock: Mutex::new(()),
        })
    }

    /// Stable table id derived from a canonical path
    pub fn table_id_for(canonical: &Path) -> u32 {
        crc32fast::hash(canonical.to_string_lossy().as_bytes())
    }

    pub fn id(&self) -> u32 {
        self.table_id
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of complete pages currently in the file
    pub fn num_pages(&self) -> Result<u32> {
        let len = fs::metadata(&self.path)?.len();
        Ok((len / self.page_size as u64) as u32)
    }

    /// Read and parse one page from disk
    pub fn read_page(&self, page_id: PageId) -> Result<HeapPage> {
        let mut file = File::open(&self.path)?;
        let len = file.metadata()?.len();
        let end = page_id.file_offset(self.page_size) + self.page_size as u64;
        if end > len {
            return Err(DbError::PageNotFound(page_id));
        }

        let mut buf = vec![0u8; self.page_size];
        file.seek(SeekFrom::Start(page_id.file_offset(self.page_size)))?;
        file.read_exact(&mut buf)?;

        HeapPage::from_bytes(page_id, Arc::clone(&self.desc), self.page_size, &buf)
    }

    /// Write a page's full byte form at its position in the file.
    ///
    /// The page may sit at most one past the current end of the file.
    pub fn write_page(&self, page: &HeapPage) -> Result<()> {
        let page_id = page.page_id();
        if page_id.page_no() > self.num_pages()? {
            return Err(DbError::PageNotFound(page_id));
        }

        let data = page.to_bytes()?;
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(page_id.file_offset(self.page_size)))?;
        file.write_all(&data)?;
        Ok(())
    }

    /// Append one empty page unless the file has grown past `seen` pages.
    ///
    /// Concurrent inserters that all found the first `seen` pages full add
    /// only one page between them.
    fn append_empty_page(&self, seen: u32) -> Result<()> {
        let _append = self.append_lock.lock();
        if self.num_pages()? != seen {
            return Ok(());
        }
        let page_id = PageId::new(self.table_id, seen);
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(page_id.file_offset(self.page_size)))?;
        file.write_all(&HeapPage::empty_page_data(self.page_size))?;
        debug!("appended page {} to {}", page_id, self.path.display());
        Ok(())
    }

    /// Insert `tuple` into the first page with a free slot, appending a
    /// new page when every existing page is full.
    ///
    /// Each page is checked and filled through the buffer pool in one step,
    /// so the tuple always lands in the resident copy of its page.
    pub fn insert_tuple(&self, pool: &BufferPool, txn: TransactionId, tuple: Tuple) -> Result<RecordId> {
        if **tuple.desc() != *self.desc {
            return Err(DbError::schema_mismatch(&*self.desc, &**tuple.desc()));
        }

        let mut page_no = 0;
        loop {
            let num_pages = self.num_pages()?;
            while page_no < num_pages {
                let page_id = PageId::new(self.table_id, page_no);
                let inserted = pool.update_page(txn, page_id, |page| {
                    if page.empty_slot_count() == 0 {
                        return Ok(None);
                    }
                    page.insert_tuple(tuple.clone()).map(Some)
                })?;
                if let Some(record_id) = inserted {
                    return Ok(record_id);
                }
                page_no += 1;
            }
            self.append_empty_page(num_pages)?;
        }
    }

    /// Free the slot holding `tuple` in the resident copy of its page
    pub fn delete_tuple(&self, pool: &BufferPool, txn: TransactionId, tuple: &Tuple) -> Result<()> {
        let record_id = tuple
            .record_id()
            .ok_or_else(|| DbError::tuple_not_found("tuple has no record id"))?;
        let page_id = record_id.page_id;
        if page_id.table_id() != self.table_id || page_id.page_no() >= self.num_pages()? {
            return Err(DbError::tuple_not_found(format!(
                "record {} is not in table {}",
                record_id, self.table_id
            )));
        }

        pool.update_page(txn, page_id, |page| page.delete_tuple(tuple))
    }

    /// Cursor over every live tuple, in page then slot order
    pub fn iterator(self: &Arc<Self>, pool: Arc<BufferPool>, txn: TransactionId) -> HeapFileIterator {
        HeapFileIterator {
            file: Arc::clone(self),
            pool,
            txn,
            scan: None,
        }
    }
}

/// Position of an open scan
struct ScanState {
    /// Page count captured at open; pages appended later are not visited
    num_pages: u32,
    next_page: u32,
    buffered: VecDeque<Tuple>,
}

/// Lazy, rewindable cursor over the tuples of a heap file.
///
/// Pages are fetched read-only through the buffer pool one at a time.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    pool: Arc<BufferPool>,
    txn: TransactionId,
    scan: Option<ScanState>,
}

impl HeapFileIterator {
    pub fn open(&mut self) -> Result<()> {
        self.scan = Some(ScanState {
            num_pages: self.file.num_pages()?,
            next_page: 0,
            buffered: VecDeque::new(),
        });
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.scan.is_some()
    }

    /// Whether another tuple is available; always false when closed
    pub fn has_next(&mut self) -> Result<bool> {
        let Some(scan) = self.scan.as_mut() else {
            return Ok(false);
        };

        while scan.buffered.is_empty() {
            if scan.next_page >= scan.num_pages {
                return Ok(false);
            }
            let page_id = PageId::new(self.file.id(), scan.next_page);
            let page = self.pool.get_page(self.txn, page_id, Permissions::ReadOnly)?;
            scan.buffered.extend(page.read().tuples().cloned());
            scan.next_page += 1;
        }
        Ok(true)
    }

    pub fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        self.scan
            .as_mut()
            .and_then(|scan| scan.buffered.pop_front())
            .ok_or(DbError::NoSuchElement)
    }

    /// Restart from the first page
    pub fn rewind(&mut self) -> Result<()> {
        self.close();
        self.open()
    }

    pub fn close(&mut self) {
        self.scan = None;
    }
}
