//! Pull-based query execution.
//!
//! Every operator implements [`OpIterator`]: it is constructed closed,
//! `open()` makes it ready to produce tuples, and `close()` returns it to
//! the closed state along with its children. Operators only implement
//! `fetch_next`, which yields `Ok(None)` at end of stream; the provided
//! `has_next`/`next` pair adds one tuple of lookahead on top of it so that
//! `has_next` can be called any number of times without consuming input.

mod aggregate;
mod aggregator;
mod delete;
mod filter;
mod insert;
mod join;
mod scan;
mod tuple_iter;

pub use aggregate::Aggregate;
pub use aggregator::{AggOp, Aggregator};
pub use delete::Delete;
pub use filter::{Filter, Predicate};
pub use insert::Insert;
pub use join::{Join, JoinPredicate};
pub use scan::SeqScan;
pub use tuple_iter::TupleIterator;

use crate::error::{DbError, Result};
use crate::tuple::{Tuple, TupleDesc};
use std::sync::Arc;

/// Open state and lookahead slot shared by every operator
#[derive(Debug, Default)]
pub struct Cursor {
    open: bool,
    peeked: Option<Tuple>,
}

impl Cursor {
    pub fn open(&mut self) {
        self.open = true;
        self.peeked = None;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.peeked = None;
    }

    /// Drop any lookahead so the next fetch starts from the new position
    pub fn reset(&mut self) {
        self.peeked = None;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(DbError::illegal_state("operator is not open"))
        }
    }
}

/// A pull-based operator producing a stream of tuples
pub trait OpIterator: Send {
    /// Schema of the tuples this operator produces
    fn tuple_desc(&self) -> &Arc<TupleDesc>;

    /// Prepare to produce tuples, opening children first
    fn open(&mut self) -> Result<()>;

    /// Release resources and close children
    fn close(&mut self);

    /// Restart from the beginning; only valid while open
    fn rewind(&mut self) -> Result<()>;

    /// Produce the next tuple, or `None` at end of stream.
    ///
    /// Only called while open.
    fn fetch_next(&mut self) -> Result<Option<Tuple>>;

    fn cursor(&mut self) -> &mut Cursor;

    /// Whether `next` will return a tuple
    fn has_next(&mut self) -> Result<bool> {
        self.cursor().ensure_open()?;
        if self.cursor().peeked.is_none() {
            let next = self.fetch_next()?;
            self.cursor().peeked = next;
        }
        Ok(self.cursor().peeked.is_some())
    }

    /// Return the next tuple; fails with `NoSuchElement` at end of stream
    fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        self.cursor().peeked.take().ok_or(DbError::NoSuchElement)
    }
}

/// Pull every remaining tuple from an open operator
pub fn drain(op: &mut dyn OpIterator) -> Result<Vec<Tuple>> {
    let mut tuples = Vec::new();
    while op.has_next()? {
        tuples.push(op.next()?);
    }
    Ok(tuples)
}
