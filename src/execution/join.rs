//! Nested-loop join.

use crate::error::Result;
use crate::execution::{Cursor, OpIterator};
use crate::tuple::{Tuple, TupleDesc};
use crate::types::CmpOp;
use std::fmt;
use std::sync::Arc;

/// Compares a field of the left tuple with a field of the right tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinPredicate {
    left_field: usize,
    op: CmpOp,
    right_field: usize,
}

impl JoinPredicate {
    pub fn new(left_field: usize, op: CmpOp, right_field: usize) -> Self {
        Self {
            left_field,
            op,
            right_field,
        }
    }

    pub fn left_field(&self) -> usize {
        self.left_field
    }

    pub fn right_field(&self) -> usize {
        self.right_field
    }

    pub fn op(&self) -> CmpOp {
        self.op
    }

    pub fn matches(&self, left: &Tuple, right: &Tuple) -> bool {
        match (left.field(self.left_field), right.field(self.right_field)) {
            (Some(l), Some(r)) => l.compare(self.op, r),
            _ => false,
        }
    }
}

impl fmt::Display for JoinPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{} {} r{}", self.left_field, self.op, self.right_field)
    }
}

/// Nested-loop join.
///
/// For every left tuple the right child is rewound and scanned in full;
/// output tuples are the left fields followed by the right fields.
pub struct Join {
    predicate: JoinPredicate,
    left: Box<dyn OpIterator>,
    right: Box<dyn OpIterator>,
    desc: Arc<TupleDesc>,
    /// Left tuple currently being matched against the right side
    outer: Option<Tuple>,
    cursor: Cursor,
}

impl Join {
    pub fn new(predicate: JoinPredicate, left: Box<dyn OpIterator>, right: Box<dyn OpIterator>) -> Self {
        let desc = Arc::new(TupleDesc::merge(left.tuple_desc(), right.tuple_desc()));
        Self {
            predicate,
            left,
            right,
            desc,
            outer: None,
            cursor: Cursor::default(),
        }
    }

    pub fn predicate(&self) -> &JoinPredicate {
        &self.predicate
    }
}

impl OpIterator for Join {
    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    fn open(&mut self) -> Result<()> {
        self.left.open()?;
        self.right.open()?;
        self.outer = None;
        self.cursor.open();
        Ok(())
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
        self.outer = None;
        self.cursor.close();
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor.ensure_open()?;
        self.left.rewind()?;
        self.right.rewind()?;
        self.outer = None;
        self.cursor.reset();
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        loop {
            if self.outer.is_none() {
                if !self.left.has_next()? {
                    return Ok(None);
                }
                self.outer = Some(self.left.next()?);
                self.right.rewind()?;
            }

            if let Some(outer) = &self.outer {
                while self.right.has_next()? {
                    let inner = self.right.next()?;
                    if self.predicate.matches(outer, &inner) {
                        return Ok(Some(Tuple::join(Arc::clone(&self.desc), outer, &inner)));
                    }
                }
            }
            self.outer = None;
        }
    }

    fn cursor(&mut self) -> &mut Cursor {
        &mut self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::drain;
    use crate::execution::test_util::{int_source, values};
    use crate::types::Field;

    #[test]
    fn test_equi_join() -> Result<()> {
        let left = int_source(&[&[1, 100], &[2, 200], &[3, 300]]);
        let right = int_source(&[&[2], &[3], &[3], &[4]]);
        let mut join = Join::new(JoinPredicate::new(0, CmpOp::Equals, 0), left, right);
        assert_eq!(join.tuple_desc().num_fields(), 3);

        join.open()?;
        let rows = values(&drain(&mut join)?);
        let row = |a, b, c| vec![Field::Int(a), Field::Int(b), Field::Int(c)];
        assert_eq!(rows, vec![row(2, 200, 2), row(3, 300, 3), row(3, 300, 3)]);

        join.rewind()?;
        assert_eq!(drain(&mut join)?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_inequality_join_with_empty_side() -> Result<()> {
        let mut join = Join::new(
            JoinPredicate::new(0, CmpOp::LessThan, 0),
            int_source(&[&[1], &[2]]),
            int_source(&[&[2], &[3]]),
        );
        join.open()?;
        assert_eq!(drain(&mut join)?.len(), 3);

        let empty = Box::new(crate::execution::TupleIterator::new(
            crate::execution::test_util::int_desc(1),
            Vec::new(),
        ));
        let mut join = Join::new(JoinPredicate::new(0, CmpOp::Equals, 0), int_source(&[&[1]]), empty);
        join.open()?;
        assert!(!join.has_next()?);
        Ok(())
    }
}
