//! Grouped aggregation.
//!
//! An [`Aggregator`] folds tuples into one accumulator per group key. Each
//! accumulator carries only the running state its operator needs; results
//! are computed from that state when read.

use crate::error::{DbError, Result};
use crate::execution::TupleIterator;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::{Field, Type};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Aggregate operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggOp {
    Count,
    Sum,
    Min,
    Max,
    /// Truncating integer mean
    Avg,
    /// Running sum and count as two columns
    SumCount,
}

impl fmt::Display for AggOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Avg => "AVG",
            Self::SumCount => "SUM_COUNT",
        };
        f.write_str(s)
    }
}

impl FromStr for AggOp {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "COUNT" => Ok(Self::Count),
            "SUM" => Ok(Self::Sum),
            "MIN" => Ok(Self::Min),
            "MAX" => Ok(Self::Max),
            "AVG" => Ok(Self::Avg),
            "SUM_COUNT" => Ok(Self::SumCount),
            other => Err(DbError::UnsupportedOperator {
                op: other.to_string(),
                field_type: "any".to_string(),
            }),
        }
    }
}

/// Running state for one group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accumulator {
    Count(i64),
    Sum(i64),
    Min(i32),
    Max(i32),
    Avg { sum: i64, count: i64 },
    SumCount { sum: i64, count: i64 },
}

impl Accumulator {
    fn new(op: AggOp) -> Self {
        match op {
            AggOp::Count => Self::Count(0),
            AggOp::Sum => Self::Sum(0),
            AggOp::Min => Self::Min(i32::MAX),
            AggOp::Max => Self::Max(i32::MIN),
            AggOp::Avg => Self::Avg { sum: 0, count: 0 },
            AggOp::SumCount => Self::SumCount { sum: 0, count: 0 },
        }
    }

    fn merge(&mut self, value: &Field) -> Result<()> {
        if let Self::Count(n) = self {
            *n += 1;
            return Ok(());
        }

        let v = value
            .as_int()
            .ok_or_else(|| DbError::schema_mismatch(Type::Int, value.field_type()))?;
        match self {
            Self::Count(_) => {}
            Self::Sum(sum) => *sum += i64::from(v),
            Self::Min(min) => *min = (*min).min(v),
            Self::Max(max) => *max = (*max).max(v),
            Self::Avg { sum, count } | Self::SumCount { sum, count } => {
                *sum += i64::from(v);
                *count += 1;
            }
        }
        Ok(())
    }

    /// Output columns for this group
    fn values(&self) -> Result<Vec<Field>> {
        let values = match *self {
            Self::Count(n) => vec![to_int(n)?],
            Self::Sum(sum) => vec![to_int(sum)?],
            Self::Min(v) | Self::Max(v) => vec![Field::Int(v)],
            Self::Avg { sum, count } => {
                let avg = sum
                    .checked_div(count)
                    .ok_or_else(|| DbError::illegal_state("average over an empty group"))?;
                vec![to_int(avg)?]
            }
            Self::SumCount { sum, count } => vec![to_int(sum)?, to_int(count)?],
        };
        Ok(values)
    }
}

fn to_int(v: i64) -> Result<Field> {
    i32::try_from(v)
        .map(Field::Int)
        .map_err(|_| DbError::Overflow(format!("aggregate value {} exceeds INT range", v)))
}

/// Computes one aggregate over a stream of tuples, optionally grouped by a
/// single field.
pub struct Aggregator {
    group_field: Option<usize>,
    agg_field: usize,
    op: AggOp,
    desc: Arc<TupleDesc>,
    /// `None` is the key of the single group when not grouping
    groups: HashMap<Option<Field>, Accumulator>,
}

impl Aggregator {
    /// Create an aggregator over tuples described by `input`.
    ///
    /// Text fields only support COUNT.
    pub fn new(input: &TupleDesc, group_field: Option<usize>, agg_field: usize, op: AggOp) -> Result<Self> {
        let agg_type = input
            .field_type(agg_field)
            .ok_or_else(|| DbError::NoSuchField(format!("index {} of {}", agg_field, input)))?;
        if agg_type == Type::Text && op != AggOp::Count {
            return Err(DbError::UnsupportedOperator {
                op: op.to_string(),
                field_type: agg_type.to_string(),
            });
        }

        let mut columns: Vec<(String, Type)> = Vec::with_capacity(3);
        if let Some(g) = group_field {
            let group_type = input
                .field_type(g)
                .ok_or_else(|| DbError::NoSuchField(format!("index {} of {}", g, input)))?;
            columns.push((column_name(input, g), group_type));
        }
        columns.push((column_name(input, agg_field), Type::Int));
        if op == AggOp::SumCount {
            columns.push(("COUNT".to_string(), Type::Int));
        }

        Ok(Self {
            group_field,
            agg_field,
            op,
            desc: Arc::new(TupleDesc::new(columns)),
            groups: HashMap::new(),
        })
    }

    pub fn op(&self) -> AggOp {
        self.op
    }

    pub fn group_field(&self) -> Option<usize> {
        self.group_field
    }

    pub fn agg_field(&self) -> usize {
        self.agg_field
    }

    /// Schema of the result tuples: `(group, value[, count])`
    pub fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    /// Fold one tuple into its group
    pub fn merge(&mut self, tuple: &Tuple) -> Result<()> {
        let key = match self.group_field {
            Some(g) => Some(
                tuple
                    .field(g)
                    .cloned()
                    .ok_or_else(|| DbError::NoSuchField(format!("group index {}", g)))?,
            ),
            None => None,
        };
        let value = tuple
            .field(self.agg_field)
            .ok_or_else(|| DbError::NoSuchField(format!("aggregate index {}", self.agg_field)))?;

        let op = self.op;
        self.groups
            .entry(key)
            .or_insert_with(|| Accumulator::new(op))
            .merge(value)
    }

    /// One result tuple per group, in no particular order
    pub fn results(&self) -> Result<Vec<Tuple>> {
        self.groups
            .iter()
            .map(|(key, acc)| {
                let mut fields: Vec<Field> = key.iter().cloned().collect();
                fields.extend(acc.values()?);
                Tuple::new(Arc::clone(&self.desc), fields)
            })
            .collect()
    }

    /// The results as an operator
    pub fn iterator(&self) -> Result<TupleIterator> {
        Ok(TupleIterator::new(Arc::clone(&self.desc), self.results()?))
    }
}

fn column_name(desc: &TupleDesc, index: usize) -> String {
    desc.field_name(index).unwrap_or("null").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grouped_desc() -> Arc<TupleDesc> {
        Arc::new(TupleDesc::new([("k", Type::Text), ("v", Type::Int)]))
    }

    fn feed(agg: &mut Aggregator, rows: &[(&str, i32)]) -> Result<()> {
        for &(k, v) in rows {
            agg.merge(&Tuple::new(grouped_desc(), vec![Field::from(k), Field::Int(v)])?)?;
        }
        Ok(())
    }

    fn by_group(agg: &Aggregator) -> Result<HashMap<String, Vec<i32>>> {
        Ok(agg
            .results()?
            .into_iter()
            .map(|t| {
                let key = t.field(0).and_then(Field::as_text).unwrap_or_default().to_string();
                let rest = t.fields()[1..].iter().filter_map(Field::as_int).collect();
                (key, rest)
            })
            .collect())
    }

    #[test]
    fn test_grouped_sum() -> Result<()> {
        let mut agg = Aggregator::new(&grouped_desc(), Some(0), 1, AggOp::Sum)?;
        feed(&mut agg, &[("A", 1), ("A", 3), ("B", 2)])?;
        let groups = by_group(&agg)?;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["A"], vec![4]);
        assert_eq!(groups["B"], vec![2]);
        Ok(())
    }

    #[test]
    fn test_ungrouped_count() -> Result<()> {
        let mut agg = Aggregator::new(&grouped_desc(), None, 1, AggOp::Count)?;
        feed(&mut agg, &[("A", 1), ("A", 3), ("B", 2)])?;
        let results = agg.results()?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].fields(), &[Field::Int(3)]);
        assert_eq!(agg.tuple_desc().num_fields(), 1);
        Ok(())
    }

    #[test]
    fn test_grouped_avg_truncates() -> Result<()> {
        let mut agg = Aggregator::new(&grouped_desc(), Some(0), 1, AggOp::Avg)?;
        feed(&mut agg, &[("A", 2), ("A", 5)])?;
        assert_eq!(by_group(&agg)?["A"], vec![3]);

        let mut agg = Aggregator::new(&grouped_desc(), None, 1, AggOp::Avg)?;
        feed(&mut agg, &[("A", -7), ("A", 0)])?;
        assert_eq!(agg.results()?[0].fields(), &[Field::Int(-3)]);
        Ok(())
    }

    #[test]
    fn test_min_max_and_sum_count() -> Result<()> {
        let rows = [("A", 5), ("A", -2), ("B", 9), ("A", 7)];

        let mut min = Aggregator::new(&grouped_desc(), Some(0), 1, AggOp::Min)?;
        feed(&mut min, &rows)?;
        assert_eq!(by_group(&min)?["A"], vec![-2]);

        let mut max = Aggregator::new(&grouped_desc(), Some(0), 1, AggOp::Max)?;
        feed(&mut max, &rows)?;
        assert_eq!(by_group(&max)?["A"], vec![7]);
        assert_eq!(by_group(&max)?["B"], vec![9]);

        let mut sc = Aggregator::new(&grouped_desc(), Some(0), 1, AggOp::SumCount)?;
        feed(&mut sc, &rows)?;
        assert_eq!(by_group(&sc)?["A"], vec![10, 3]);
        assert_eq!(sc.tuple_desc().field_name(2), Some("COUNT"));
        assert_eq!(sc.tuple_desc().num_fields(), 3);
        Ok(())
    }

    #[test]
    fn test_text_field_allows_only_count() -> Result<()> {
        let err = Aggregator::new(&grouped_desc(), None, 0, AggOp::Sum);
        assert!(matches!(err, Err(DbError::UnsupportedOperator { .. })));

        let mut count = Aggregator::new(&grouped_desc(), Some(1), 0, AggOp::Count)?;
        feed(&mut count, &[("x", 1), ("y", 1), ("z", 2)])?;
        let mut totals: Vec<(i32, i32)> = count
            .results()?
            .iter()
            .map(|t| (t.fields()[0].as_int().unwrap(), t.fields()[1].as_int().unwrap()))
            .collect();
        totals.sort();
        assert_eq!(totals, vec![(1, 2), (2, 1)]);
        assert_eq!(count.tuple_desc().field_type(1), Some(Type::Int));
        Ok(())
    }

    #[test]
    fn test_sum_overflow_reported_on_read() -> Result<()> {
        let mut agg = Aggregator::new(&grouped_desc(), None, 1, AggOp::Sum)?;
        feed(&mut agg, &[("A", i32::MAX), ("A", 1)])?;
        assert!(matches!(agg.results(), Err(DbError::Overflow(_))));
        Ok(())
    }

    #[test]
    fn test_bad_field_index() {
        assert!(matches!(
            Aggregator::new(&grouped_desc(), None, 5, AggOp::Count),
            Err(DbError::NoSuchField(_))
        ));
    }

    #[test]
    fn test_op_names() -> Result<()> {
        assert_eq!("sum_count".parse::<AggOp>()?, AggOp::SumCount);
        assert_eq!(AggOp::Avg.to_string(), "AVG");
        assert!("median".parse::<AggOp>().is_err());
        Ok(())
    }
}
