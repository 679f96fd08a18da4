//! Table registry.
//!
//! Maps table ids to their heap files and names. The buffer pool uses it to
//! find the file that owns a page.

use crate::error::{DbError, Result};
use crate::storage::HeapFile;
use crate::tuple::TupleDesc;
use log::info;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

struct TableEntry {
    file: Arc<HeapFile>,
    name: String,
}

/// In-memory registry of open tables
#[derive(Default)]
pub struct Catalog {
    tables: RwLock<HashMap<u32, TableEntry>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `file` under `name`, returning its table id.
    ///
    /// Any table previously registered with the same id or name is replaced.
    /// Pages of a replaced table still cached in a buffer pool can no longer
    /// be written back, so callers discard them first (see `displaced_by`).
    pub fn add_table(&self, file: Arc<HeapFile>, name: impl Into<String>) -> u32 {
        let name = name.into();
        let table_id = file.id();
        let mut tables = self.tables.write();
        tables.retain(|&id, entry| id != table_id && entry.name != name);
        info!("registered table {} ({}) at {}", name, table_id, file.path().display());
        tables.insert(table_id, TableEntry { file, name });
        table_id
    }

    /// Ids of registered tables that `add_table(file, name)` would replace
    pub fn displaced_by(&self, table_id: u32, name: &str) -> Vec<u32> {
        self.tables
            .read()
            .iter()
            .filter(|(&id, entry)| id == table_id || entry.name == name)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Heap file backing a table
    pub fn file(&self, table_id: u32) -> Result<Arc<HeapFile>> {
        self.tables
            .read()
            .get(&table_id)
            .map(|entry| Arc::clone(&entry.file))
            .ok_or(DbError::TableNotFound(table_id))
    }

    pub fn tuple_desc(&self, table_id: u32) -> Result<Arc<TupleDesc>> {
        Ok(Arc::clone(self.file(table_id)?.desc()))
    }

    pub fn table_name(&self, table_id: u32) -> Result<String> {
        self.tables
            .read()
            .get(&table_id)
            .map(|entry| entry.name.clone())
            .ok_or(DbError::TableNotFound(table_id))
    }

    /// Look up a table id by name
    pub fn table_id(&self, name: &str) -> Option<u32> {
        self.tables
            .read()
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(&id, _)| id)
    }

    pub fn table_ids(&self) -> Vec<u32> {
        self.tables.read().keys().copied().collect()
    }
}
