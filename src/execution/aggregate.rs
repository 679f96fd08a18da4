//! Grouped aggregation operator.

use crate::error::Result;
use crate::execution::{AggOp, Aggregator, Cursor, OpIterator, TupleIterator};
use crate::tuple::{Tuple, TupleDesc};
use std::sync::Arc;

/// Aggregation operator.
///
/// `open` consumes the whole child before any result is produced. Rewinding
/// replays the computed groups without reading the child again.
pub struct Aggregate {
    child: Box<dyn OpIterator>,
    group_field: Option<usize>,
    agg_field: usize,
    op: AggOp,
    desc: Arc<TupleDesc>,
    results: Option<TupleIterator>,
    cursor: Cursor,
}

impl Aggregate {
    /// Fails if `op` is not defined over the aggregated field's type
    pub fn new(
        child: Box<dyn OpIterator>,
        agg_field: usize,
        group_field: Option<usize>,
        op: AggOp,
    ) -> Result<Self> {
        let desc = Arc::clone(Aggregator::new(child.tuple_desc(), group_field, agg_field, op)?.tuple_desc());
        Ok(Self {
            child,
            group_field,
            agg_field,
            op,
            desc,
            results: None,
            cursor: Cursor::default(),
        })
    }

    pub fn group_field(&self) -> Option<usize> {
        self.group_field
    }

    pub fn group_field_name(&self) -> Option<&str> {
        self.group_field
            .and_then(|g| self.child.tuple_desc().field_name(g))
    }

    pub fn agg_field(&self) -> usize {
        self.agg_field
    }

    pub fn agg_field_name(&self) -> Option<&str> {
        self.child.tuple_desc().field_name(self.agg_field)
    }

    pub fn op(&self) -> AggOp {
        self.op
    }
}

impl OpIterator for Aggregate {
    fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        let mut aggregator = Aggregator::new(self.child.tuple_desc(), self.group_field, self.agg_field, self.op)?;
        while self.child.has_next()? {
            aggregator.merge(&self.child.next()?)?;
        }

        let mut results = aggregator.iterator()?;
        results.open()?;
        self.results = Some(results);
        self.cursor.open();
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.results = None;
        self.cursor.close();
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor.ensure_open()?;
        if let Some(results) = self.results.as_mut() {
            results.rewind()?;
        }
        self.cursor.reset();
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        let Some(results) = self.results.as_mut() else {
            return Ok(None);
        };
        if results.has_next()? {
            results.next().map(Some)
        } else {
            Ok(None)
        }
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
    use crate::execution::test_util::int_source;
    use crate::types::{Field, Type};

    fn ints(tuples: &[Tuple]) -> Vec<Vec<i32>> {
        let mut rows: Vec<Vec<i32>> = tuples
            .iter()
            .map(|t| t.fields().iter().filter_map(Field::as_int).collect())
            .collect();
        rows.sort();
        rows
    }

    #[test]
    fn test_grouped_sum_through_operator() -> Result<()> {
        let source = int_source(&[&[1, 1], &[1, 3], &[2, 2]]);
        let mut agg = Aggregate::new(source, 1, Some(0), AggOp::Sum)?;
        assert_eq!(agg.group_field_name(), Some("c0"));
        assert_eq!(agg.agg_field_name(), Some("c1"));
        assert_eq!(agg.tuple_desc().field_name(1), Some("c1"));

        agg.open()?;
        assert_eq!(ints(&drain(&mut agg)?), vec![vec![1, 4], vec![2, 2]]);

        agg.rewind()?;
        assert_eq!(drain(&mut agg)?.len(), 2);
        agg.close();
        assert!(matches!(agg.next(), Err(DbError::IllegalState(_))));
        Ok(())
    }

    #[test]
    fn test_ungrouped_over_empty_input() -> Result<()> {
        let empty = Box::new(TupleIterator::new(
            Arc::new(TupleDesc::new([("v", Type::Int)])),
            Vec::new(),
        ));
        let mut agg = Aggregate::new(empty, 0, None, AggOp::Count)?;
        agg.open()?;
        assert!(!agg.has_next()?);
        Ok(())
    }

    #[test]
    fn test_rejects_sum_over_text() {
        let desc = Arc::new(TupleDesc::new([("name", Type::Text)]));
        let source = Box::new(TupleIterator::new(desc, Vec::new()));
        assert!(matches!(
            Aggregate::new(source, 0, None, AggOp::Avg),
            Err(DbError::UnsupportedOperator { .. })
        ));
    }
}
