//! Single-field predicates and the filter operator.

use crate::error::Result;
use crate::execution::{Cursor, OpIterator};
use crate::tuple::{Tuple, TupleDesc};
use crate::types::{CmpOp, Field};
use std::fmt;
use std::sync::Arc;

/// Compares one field of a tuple against a constant
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    field: usize,
    op: CmpOp,
    operand: Field,
}

impl Predicate {
    pub fn new(field: usize, op: CmpOp, operand: Field) -> Self {
        Self { field, op, operand }
    }

    pub fn field(&self) -> usize {
        self.field
    }

    pub fn op(&self) -> CmpOp {
        self.op
    }

    pub fn operand(&self) -> &Field {
        &self.operand
    }

    /// Whether `tuple` satisfies `field <op> operand`
    pub fn matches(&self, tuple: &Tuple) -> bool {
        tuple
            .field(self.field)
            .is_some_and(|value| value.compare(self.op, &self.operand))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{} {} {}", self.field, self.op, self.operand)
    }
}

/// Passes through the child tuples that satisfy a predicate
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator>,
    cursor: Cursor,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator>) -> Self {
        Self {
            predicate,
            child,
            cursor: Cursor::default(),
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

impl OpIterator for Filter {
    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        self.child.tuple_desc()
    }

    fn open(&mut self) -> Result<()> {
        self.child.open()?;
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
        self.cursor.reset();
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            if self.predicate.matches(&tuple) {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
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

    #[test]
    fn test_filter_selects_matching_rows() -> Result<()> {
        let source = int_source(&[&[1, 10], &[2, 20], &[3, 30]]);
        let mut filter = Filter::new(Predicate::new(0, CmpOp::GreaterThanOrEq, Field::Int(2)), source);
        filter.open()?;
        assert_eq!(
            values(&drain(&mut filter)?),
            vec![vec![Field::Int(2), Field::Int(20)], vec![Field::Int(3), Field::Int(30)]]
        );

        filter.rewind()?;
        assert!(filter.has_next()?);
        assert_eq!(filter.next()?.field(0), Some(&Field::Int(2)));
        Ok(())
    }

    #[test]
    fn test_type_mismatch_only_satisfies_not_equals() -> Result<()> {
        let row = Tuple::new(crate::execution::test_util::int_desc(1), vec![Field::Int(1)])?;
        assert!(!Predicate::new(0, CmpOp::Equals, Field::from("1")).matches(&row));
        assert!(Predicate::new(0, CmpOp::NotEquals, Field::from("1")).matches(&row));
        assert!(!Predicate::new(5, CmpOp::NotEquals, Field::Int(1)).matches(&row));
        Ok(())
    }

    #[test]
    fn test_display() {
        let p = Predicate::new(1, CmpOp::Like, Field::from("ab"));
        assert_eq!(p.to_string(), "f1 LIKE ab");
    }
}
