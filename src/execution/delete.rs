//! Delete operator: removes its child's rows from their tables.

use crate::buffer::BufferPool;
use crate::error::Result;
use crate::execution::insert::{count_desc, count_tuple};
use crate::execution::{Cursor, OpIterator};
use crate::tuple::{Tuple, TupleDesc};
use crate::types::TransactionId;
use std::sync::Arc;

/// Deletes every child tuple from the table it was read from.
///
/// Child tuples must carry record ids, which a [`SeqScan`](crate::execution::SeqScan)
/// preserves. Like Insert, yields one count tuple and then end of stream.
pub struct Delete {
    pool: Arc<BufferPool>,
    txn: TransactionId,
    child: Box<dyn OpIterator>,
    desc: Arc<TupleDesc>,
    done: bool,
    cursor: Cursor,
}

impl Delete {
    pub fn new(pool: Arc<BufferPool>, txn: TransactionId, child: Box<dyn OpIterator>) -> Self {
        Self {
            pool,
            txn,
            child,
            desc: count_desc(),
            done: false,
            cursor: Cursor::default(),
        }
    }
}

impl OpIterator for Delete {
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
            self.pool.delete_tuple(self.txn, &tuple)?;
            count += 1;
        }
        count_tuple(&self.desc, count).map(Some)
    }

    fn cursor(&mut self) -> &mut Cursor {
        &mut self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::execution::test_util::{int_desc, int_source, values};
    use crate::execution::{drain, Filter, Predicate, SeqScan};
    use crate::storage::{Catalog, HeapFile};
    use crate::types::{CmpOp, Field};
    use tempfile::tempdir;

    #[test]
    fn test_delete_matching_rows() -> Result<()> {
        let dir = tempdir().unwrap();
        let file = Arc::new(HeapFile::open(dir.path().join("t.dat"), int_desc(1), 4096)?);
        let catalog = Arc::new(Catalog::new());
        let table_id = catalog.add_table(file, "t");
        let pool = Arc::new(BufferPool::new(catalog, 8));
        let txn = TransactionId::new();

        for v in 0..5 {
            pool.insert_tuple(txn, table_id, Tuple::new(int_desc(1), vec![Field::Int(v)])?)?;
        }

        let scan = SeqScan::new(Arc::clone(&pool), txn, table_id, "t")?;
        let above_two = Filter::new(Predicate::new(0, CmpOp::GreaterThan, Field::Int(2)), Box::new(scan));
        let mut delete = Delete::new(Arc::clone(&pool), txn, Box::new(above_two));
        delete.open()?;
        assert_eq!(delete.next()?.fields(), &[Field::Int(2)]);
        assert!(!delete.has_next()?);

        let mut scan = SeqScan::new(pool, txn, table_id, "t")?;
        scan.open()?;
        assert_eq!(
            values(&drain(&mut scan)?),
            vec![vec![Field::Int(0)], vec![Field::Int(1)], vec![Field::Int(2)]]
        );
        Ok(())
    }

    #[test]
    fn test_delete_without_locations_fails() -> Result<()> {
        let pool = Arc::new(BufferPool::new(Arc::new(Catalog::new()), 2));
        let mut delete = Delete::new(pool, TransactionId::new(), int_source(&[&[1]]));
        delete.open()?;
        assert!(matches!(delete.next(), Err(DbError::TupleNotFound(_))));
        Ok(())
    }
}
