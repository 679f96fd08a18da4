//! # heapdb
//!
//! A page-oriented heap-file storage engine with a pull-based query executor.
//!
//! ## Architecture
//!
//! The engine is composed of layered components:
//!
//! - **Tuple Layer** (`tuple`): Fixed-width schemas, rows and their byte codec
//! - **Page Layer** (`page`): Heap pages with a slot-occupancy bitmap
//! - **Storage Layer** (`storage`): Heap files, the table catalog and the bulk encoder
//! - **Buffer Pool** (`buffer`): LRU page cache with dirty write-back
//! - **Execution Layer** (`execution`): Scan, filter, join, insert, delete and aggregate operators
//!
//! Operators only reach pages through the buffer pool, and only heap files
//! touch the disk.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use heapdb::{Config, Database, Tuple, TupleDesc, Type, TransactionId};
//! use heapdb::execution::{OpIterator, SeqScan};
//!
//! let db = Database::open(Config::default())?;
//! let desc = TupleDesc::new([("id", Type::Int), ("name", Type::Text)]);
//! let table = db.add_table("people.dat", desc, "people")?;
//!
//! let txn = TransactionId::new();
//! let row = Tuple::new(db.catalog().tuple_desc(table)?, vec![1.into(), "ann".into()])?;
//! db.buffer_pool().insert_tuple(txn, table, row)?;
//!
//! let mut scan = db.scan(txn, table, "p")?;
//! scan.open()?;
//! while scan.has_next()? {
//!     println!("{}", scan.next()?);
//! }
//! db.flush()?;
//! ```

pub mod buffer;
pub mod error;
pub mod execution;
pub mod page;
pub mod storage;
pub mod tuple;
pub mod types;

pub use error::{DbError, Result};
pub use types::{
    CmpOp, Field, PageId, Permissions, RecordId, TransactionId, Type, DEFAULT_PAGE_SIZE,
    DEFAULT_POOL_PAGES, STRING_LEN,
};

// Re-export main public API
pub use buffer::{BufferPool, LockManager, NoLockManager};
pub use storage::{Catalog, HeapFile, HeapFileEncoder};
pub use tuple::{Tuple, TupleDesc};

use execution::{drain, OpIterator, SeqScan};
use page::PageLayout;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Size of every heap page in bytes (default: 4096).
    ///
    /// Every heap file must be read with the page size it was written
    /// with; nothing on disk records it.
    pub page_size: usize,
    /// Buffer pool capacity in pages (default: 50)
    pub buffer_pool_pages: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            buffer_pool_pages: DEFAULT_POOL_PAGES,
        }
    }
}

impl Config {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set page size
    pub fn page_size(mut self, bytes: usize) -> Self {
        self.page_size = bytes;
        self
    }

    /// Set buffer pool size
    pub fn buffer_pool_pages(mut self, pages: usize) -> Self {
        self.buffer_pool_pages = pages;
        self
    }

    /// Parse a configuration from JSON; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| DbError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_pool_pages == 0 {
            return Err(DbError::invalid_config("buffer_pool_pages must be at least 1"));
        }
        if self.page_size <= Type::Int.byte_len() {
            return Err(DbError::invalid_config(format!(
                "page_size {} cannot hold a single tuple",
                self.page_size
            )));
        }
        Ok(())
    }
}

/// Database handle tying together the catalog and the buffer pool
pub struct Database {
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
    config: Config,
}

impl Database {
    /// Create an empty database with no tables registered
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPool::new(
            Arc::clone(&catalog),
            config.buffer_pool_pages,
        ));

        Ok(Self {
            catalog,
            buffer_pool,
            config,
        })
    }

    /// Open (creating if needed) the heap file at `path` and register it
    /// under `name`.
    ///
    /// A table already registered under the same name or file is replaced;
    /// its cached pages are written back and dropped first.
    pub fn add_table(&self, path: impl AsRef<Path>, desc: TupleDesc, name: &str) -> Result<u32> {
        let file = Arc::new(HeapFile::open(path, Arc::new(desc), self.config.page_size)?);
        for table_id in self.catalog.displaced_by(file.id(), name) {
            self.buffer_pool.discard_table(table_id)?;
        }
        Ok(self.catalog.add_table(file, name))
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    /// Bulk encoder producing files readable by this database
    pub fn encoder(&self, desc: TupleDesc) -> Result<HeapFileEncoder> {
        HeapFileEncoder::new(Arc::new(desc), self.config.page_size)
    }

    /// Sequential scan over a registered table
    pub fn scan(&self, txn: TransactionId, table_id: u32, alias: &str) -> Result<SeqScan> {
        SeqScan::new(Arc::clone(&self.buffer_pool), txn, table_id, alias)
    }

    /// Flush all dirty pages to disk
    pub fn flush(&self) -> Result<()> {
        self.buffer_pool.flush_all_pages()
    }

    /// Get statistics about the database
    pub fn stats(&self) -> DbStats {
        DbStats {
            table_count: self.catalog.table_ids().len(),
            resident_pages: self.buffer_pool.resident_pages(),
            buffer_pool_size: self.buffer_pool.capacity(),
            page_size: self.config.page_size,
        }
    }

    /// Page and tuple counts for one table; counting tuples scans the table
    pub fn table_stats(&self, table_id: u32) -> Result<TableStats> {
        let file = self.catalog.file(table_id)?;
        let layout = PageLayout::new(self.config.page_size, file.desc());

        let mut scan = self.scan(TransactionId::new(), table_id, "stats")?;
        scan.open()?;
        let tuple_count = drain(&mut scan)?.len();
        scan.close();

        Ok(TableStats {
            table_id,
            name: self.catalog.table_name(table_id)?,
            page_count: file.num_pages()?,
            slots_per_page: layout.slots,
            tuple_count,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStats {
    /// Number of registered tables
    pub table_count: usize,
    /// Pages currently held by the buffer pool
    pub resident_pages: usize,
    /// Buffer pool capacity
    pub buffer_pool_size: usize,
    pub page_size: usize,
}

/// Per-table statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStats {
    pub table_id: u32,
    pub name: String,
    pub page_count: u32,
    pub slots_per_page: usize,
    pub tuple_count: usize,
}
