//! Operator over an in-memory list of tuples.

use crate::error::Result;
use crate::execution::{Cursor, OpIterator};
use crate::tuple::{Tuple, TupleDesc};
use std::sync::Arc;

/// Operator over a fixed, in-memory list of tuples
pub struct TupleIterator {
    desc: Arc<TupleDesc>,
    tuples: Vec<Tuple>,
    position: usize,
    cursor: Cursor,
}

impl TupleIterator {
    pub fn new(desc: Arc<TupleDesc>, tuples: Vec<Tuple>) -> Self {
        Self {
            desc,
            tuples,
            position: 0,
            cursor: Cursor::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

impl OpIterator for TupleIterator {
    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    fn open(&mut self) -> Result<()> {
        self.position = 0;
        self.cursor.open();
        Ok(())
    }

    fn close(&mut self) {
        self.cursor.close();
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor.ensure_open()?;
        self.position = 0;
        self.cursor.reset();
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        let next = self.tuples.get(self.position).cloned();
        if next.is_some() {
            self.position += 1;
        }
        Ok(next)
    }

    fn cursor(&mut self) -> &mut Cursor {
        &mut self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::execution::drain;
    use crate::execution::test_util::{int_source, values};
    use crate::types::Field;

    #[test]
    fn test_next_before_open_is_illegal() {
        let mut it = int_source(&[&[1]]);
        assert!(matches!(it.next(), Err(DbError::IllegalState(_))));
        assert!(matches!(it.has_next(), Err(DbError::IllegalState(_))));
        assert!(matches!(it.rewind(), Err(DbError::IllegalState(_))));
    }

    #[test]
    fn test_has_next_is_idempotent() -> Result<()> {
        let mut it = int_source(&[&[1], &[2]]);
        it.open()?;
        assert!(it.has_next()?);
        assert!(it.has_next()?);
        assert_eq!(it.next()?.fields(), &[Field::Int(1)]);
        assert!(it.has_next()?);
        assert_eq!(it.next()?.fields(), &[Field::Int(2)]);
        assert!(!it.has_next()?);
        assert!(!it.has_next()?);
        assert!(matches!(it.next(), Err(DbError::NoSuchElement)));
        Ok(())
    }

    #[test]
    fn test_rewind_and_close() -> Result<()> {
        let mut it = int_source(&[&[1], &[2]]);
        it.open()?;
        it.next()?;
        it.rewind()?;
        assert_eq!(values(&drain(it.as_mut())?), vec![vec![Field::Int(1)], vec![Field::Int(2)]]);

        it.close();
        assert!(matches!(it.has_next(), Err(DbError::IllegalState(_))));
        Ok(())
    }
}
