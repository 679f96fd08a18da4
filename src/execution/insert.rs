//! Insert operator: writes its child's rows into a table.

use crate::buffer::BufferPool;
use crate::error::{DbError, Result};
use crate::execution::{Cursor, OpIterator};
use crate::tuple::{Tuple, TupleDesc};
use crate::types::{Field, TransactionId, Type};
use std::sync::Arc;

/// Single-column descriptor of the row count produced by Insert and Delete
pub(crate) fn count_desc() -> Arc<TupleDesc> {
    Arc::new(TupleDesc::new([("count", Type::Int)]))
}

pub(crate) fn count_tuple(desc: &Arc<TupleDesc>, count: usize) -> Result<Tuple> {
    let count = i32::try_from(count)
        .map_err(|_| DbError::Overflow(format!("row count {} exceeds INT range", count)))?;
    Tuple::new(Arc::clone(desc), vec![Field::Int(count)])
}

/// Inserts every child tuple into a table.
///
/// The first fetch drains the child and yields one tuple holding the
/// number of rows inserted; after that the stream is exhausted until
/// `rewind`.
pub struct Insert {
    pool: Arc<BufferPool>,
    txn: TransactionId,
    table_id: u32,
    child: Box<dyn OpIterator>,
    desc: Arc<TupleDesc>,
    done: bool,
    cursor: Cursor,
}

impl Insert {
    /// Fails if the child's schema differs from the table's
    pub fn new(
        pool: Arc<BufferPool>,
        txn: TransactionId,
        child: Box<dyn OpIterator>,
        table_id: u32,
    ) -> Result<Self> {
        let target = pool.catalog().tuple_desc(table_id)?;
        if **child.tuple_desc() != *target {
            return Err(DbError::schema_mismatch(&*target, &**child.tuple_desc()));
        }
        Ok(Self {
            pool,
            txn,
            table_id,
            child,
            desc: count_desc(),
            done: false,
            cursor: Cursor::default(),
        })
    }
}

impl OpIterator for Insert {
    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        self.done = false;
        self.cursor.open();
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.cursor.close();
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor.ensure_open()?;
        self.child.rewind()?;
        self.done = false;
        self.cursor.reset();
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;

        let mut count = 0;
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            self.pool.insert_tuple(self.txn, self.table_id, tuple)?;
            count += 1;
        }
        count_tuple(&self.desc, count).map(Some)
    }

    fn cursor(&mut self) -> &mut Cursor {
        &mut self.cursor
    }
}
