//! Sequential scan over a heap file.

use crate::buffer::BufferPool;
use crate::error::Result;
use crate::execution::{Cursor, OpIterator};
use crate::storage::HeapFileIterator;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::TransactionId;
use std::sync::Arc;

/// Sequential scan over one table.
///
/// Output columns are named `alias.field` so that a join over two tables
/// with overlapping column names stays unambiguous.
pub struct SeqScan {
    table_id: u32,
    alias: String,
    desc: Arc<TupleDesc>,
    iter: HeapFileIterator,
    cursor: Cursor,
}

impl SeqScan {
    pub fn new(
        pool: Arc<BufferPool>,
        txn: TransactionId,
        table_id: u32,
        alias: impl Into<String>,
    ) -> Result<Self> {
        let alias = alias.into();
        let file = pool.catalog().file(table_id)?;
        let desc = Arc::new(file.desc().with_prefix(&alias));
        let iter = file.iterator(pool, txn);
        Ok(Self {
            table_id,
            alias,
            desc,
            iter,
            cursor: Cursor::default(),
        })
    }

    pub fn table_id(&self) -> u32 {
        self.table_id
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl OpIterator for SeqScan {
    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    fn open(&mut self) -> Result<()> {
        self.iter.open()?;
        self.cursor.open();
        Ok(())
    }

    fn close(&mut self) {
        self.iter.close();
        self.cursor.close();
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor.ensure_open()?;
        self.iter.rewind()?;
        self.cursor.reset();
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        if !self.iter.has_next()? {
            return Ok(None);
        }
        let stored = self.iter.next()?;
        let record_id = stored.record_id();
        let mut tuple = Tuple::new(Arc::clone(&self.desc), stored.into_fields())?;
        tuple.set_record_id(record_id);
        Ok(Some(tuple))
    }

    fn cursor(&mut self) -> &mut Cursor {
        &mut self.cursor
    }
}
