//! Buffer pool implementation.
//!
//! The buffer pool holds at most `capacity` heap pages in memory, keyed by
//! page id. Lookups promote a page to most recently used; loading a page
//! into a full pool first evicts the least recently used one, writing it
//! back if it is dirty. A failed write-back aborts the eviction and leaves
//! the page cached.
//!
//! A single mutex guards the page map together with its recency list, so
//! lookups, evictions and flushes never interleave. Tuple inserts and
//! deletes mutate the resident copy of a page while holding that mutex;
//! the lock order is always pool mutex, then page lock.

use crate::buffer::lock::{LockGrant, LockManager, NoLockManager};
use crate::buffer::lru::LruCache;
use crate::error::{DbError, Result};
use crate::page::HeapPage;
use crate::storage::Catalog;
use crate::tuple::Tuple;
use crate::types::{PageId, Permissions, RecordId, TransactionId};
use log::{debug, trace, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// A cached page shared between the pool and its callers
pub type SharedPage = Arc<RwLock<HeapPage>>;

/// Bounded LRU cache of heap pages
pub struct BufferPool {
    catalog: Arc<Catalog>,
    lock_manager: Box<dyn LockManager>,
    /// Resident pages, most recently used first
    pages: Mutex<LruCache<PageId, SharedPage>>,
    /// Maximum number of resident pages
    capacity: usize,
}

impl BufferPool {
    /// Create a pool that grants every page lock
    pub fn new(catalog: Arc<Catalog>, capacity: usize) -> Self {
        Self::with_lock_manager(catalog, capacity, Box::new(NoLockManager))
    }

    /// Create a pool that consults `lock_manager` before handing out pages
    pub fn with_lock_manager(
        catalog: Arc<Catalog>,
        capacity: usize,
        lock_manager: Box<dyn LockManager>,
    ) -> Self {
        let capacity = capacity.max(1);
        Self {
            catalog,
            lock_manager,
            pages: Mutex::new(LruCache::new(capacity)),
            capacity,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pages currently cached
    pub fn resident_pages(&self) -> usize {
        self.pages.lock().len()
    }

    pub fn is_cached(&self, page_id: PageId) -> bool {
        self.pages.lock().contains(&page_id)
    }

    /// Cached page ids from most to least recently used
    pub fn recency_order(&self) -> Vec<PageId> {
        self.pages.lock().keys()
    }

    /// Fetch a page, reading it from its heap file on a miss.
    ///
    /// A hit promotes the page to most recently used. A miss into a full
    /// pool evicts the least recently used page first. The returned handle
    /// is a snapshot for reading; it may stop being the resident copy once
    /// the page is evicted, so mutations go through `update_page`.
    pub fn get_page(
        &self,
        txn: TransactionId,
        page_id: PageId,
        perm: Permissions,
    ) -> Result<SharedPage> {
        if self.lock_manager.acquire(txn, page_id, perm) == LockGrant::Blocked {
            return Err(DbError::LockDenied { txn, page_id });
        }

        let mut pages = self.pages.lock();
        self.fetch(&mut pages, page_id)
    }

    /// Apply `update` to the resident copy of a page and mark it dirty.
    ///
    /// The page is fetched, mutated and marked dirty without releasing the
    /// pool mutex, so no eviction or reload can come in between. A failed
    /// `update` does not mark the page dirty.
    pub(crate) fn update_page<T>(
        &self,
        txn: TransactionId,
        page_id: PageId,
        update: impl FnOnce(&mut HeapPage) -> Result<T>,
    ) -> Result<T> {
        if self.lock_manager.acquire(txn, page_id, Permissions::ReadWrite) == LockGrant::Blocked {
            return Err(DbError::LockDenied { txn, page_id });
        }

        let mut pages = self.pages.lock();
        let page = self.fetch(&mut pages, page_id)?;
        let mut guard = page.write();
        let out = update(&mut *guard)?;
        guard.mark_dirty(Some(txn));
        Ok(out)
    }

    /// Look up a page, loading it on a miss; the caller holds the pool mutex
    fn fetch(&self, pages: &mut LruCache<PageId, SharedPage>, page_id: PageId) -> Result<SharedPage> {
        if let Some(page) = pages.get(&page_id) {
            trace!("buffer hit for page {}", page_id);
            return Ok(Arc::clone(page));
        }

        let file = self.catalog.file(page_id.table_id())?;
        let page = Arc::new(RwLock::new(file.read_page(page_id)?));
        debug!("buffer miss for page {}, read from disk", page_id);

        while pages.len() >= self.capacity {
            self.evict_one(pages)?;
        }
        pages.insert(page_id, Arc::clone(&page));
        Ok(page)
    }

    /// Insert `tuple` into table `table_id` on behalf of `txn`
    pub fn insert_tuple(
        &self,
        txn: TransactionId,
        table_id: u32,
        tuple: Tuple,
    ) -> Result<RecordId> {
        let file = self.catalog.file(table_id)?;
        file.insert_tuple(self, txn, tuple)
    }

    /// Delete `tuple` from the table named by its record id
    pub fn delete_tuple(&self, txn: TransactionId, tuple: &Tuple) -> Result<()> {
        let record_id = tuple
            .record_id()
            .ok_or_else(|| DbError::tuple_not_found("tuple has no record id"))?;
        let file = self.catalog.file(record_id.page_id.table_id())?;
        file.delete_tuple(self, txn, tuple)
    }

    /// Evict the least recently used page, writing it back first
    fn evict_one(&self, pages: &mut LruCache<PageId, SharedPage>) -> Result<()> {
        let victim = pages.lru().ok_or(DbError::PoolExhausted)?;

        self.write_back(pages, victim)?;
        pages.remove(&victim);
        debug!("evicted page {}", victim);
        Ok(())
    }

    /// Write a cached page to disk if dirty and mark it clean
    fn write_back(&self, pages: &LruCache<PageId, SharedPage>, page_id: PageId) -> Result<()> {
        let Some(page) = pages.peek(&page_id) else {
            return Ok(());
        };
        let mut guard = page.write();
        if guard.is_dirty() {
            self.catalog.file(page_id.table_id())?.write_page(&guard)?;
            guard.mark_dirty(None);
        }
        Ok(())
    }

    /// Write one page back to disk if it is cached and dirty
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let pages = self.pages.lock();
        self.write_back(&pages, page_id)
    }

    /// Write back every dirty page, keeping them all cached.
    ///
    /// Every page is attempted; failures are collected and reported
    /// together.
    pub fn flush_all_pages(&self) -> Result<()> {
        let pages = self.pages.lock();
        self.flush_matching(&pages, |_| true)
    }

    /// Write back every page dirtied by `txn`
    pub fn flush_pages(&self, txn: TransactionId) -> Result<()> {
        let pages = self.pages.lock();
        self.flush_matching(&pages, |page| page.dirtied_by() == Some(txn))
    }

    fn flush_matching(
        &self,
        pages: &LruCache<PageId, SharedPage>,
        select: impl Fn(&HeapPage) -> bool,
    ) -> Result<()> {
        let targets: Vec<PageId> = pages
            .iter()
            .filter(|(_, page)| select(&page.read()))
            .map(|(&page_id, _)| page_id)
            .collect();

        let mut failures = Vec::new();
        for page_id in targets {
            if let Err(e) = self.write_back(pages, page_id) {
                warn!("failed to flush page {}: {}", page_id, e);
                failures.push((page_id, e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DbError::FlushFailed { failures })
        }
    }

    /// Flush a page if needed, then drop it from the cache
    pub fn discard_page(&self, page_id: PageId) -> Result<()> {
        let mut pages = self.pages.lock();
        self.write_back(&pages, page_id)?;
        pages.remove(&page_id);
        Ok(())
    }

    /// Write back and drop every cached page of `table_id`.
    ///
    /// Used before a table is unregistered, while its file can still be
    /// found. Pages that fail to write back stay cached.
    pub fn discard_table(&self, table_id: u32) -> Result<()> {
        let mut pages = self.pages.lock();
        let targets: Vec<PageId> = pages
            .iter()
            .map(|(&page_id, _)| page_id)
            .filter(|page_id| page_id.table_id() == table_id)
            .collect();

        for page_id in targets {
            self.write_back(&pages, page_id)?;
            pages.remove(&page_id);
        }
        debug!("discarded cached pages of table {}", table_id);
        Ok(())
    }

    /// Release every lock `txn` holds
    pub fn transaction_complete(&self, txn: TransactionId) {
        self.lock_manager.release_all(txn);
    }

    pub fn holds_lock(&self, txn: TransactionId, page_id: PageId) -> bool {
        self.lock_manager.holds_lock(txn, page_id)
    }
}
