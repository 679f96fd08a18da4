//! Error types for the storage engine and executor.

use thiserror::Error;
use crate::types::{PageId, TransactionId};

/// Result type alias for storage and execution operations
pub type Result<T> = std::result::Result<T, DbError>;

/// Errors that can occur in the storage engine or the executor
#[derive(Error, Debug)]
pub enum DbError {
    /// I/O error from the underlying file system
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page lies beyond the current extent of its file
    #[error("Page {0} not found")]
    PageNotFound(PageId),

    /// Page has no free slot for an insert
    #[error("Page {0} has no empty slot")]
    PageFull(PageId),

    /// Delete target has no valid record location
    #[error("Tuple not found: {0}")]
    TupleNotFound(String),

    /// No table is registered under the given id
    #[error("Table {0} not found")]
    TableNotFound(u32),

    /// A tuple or child schema does not match the required schema
    #[error("Schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },

    /// Field index or name does not exist in a descriptor
    #[error("Field not found: {0}")]
    NoSuchField(String),

    /// Aggregation operator not defined for the field type
    #[error("Unsupported aggregate operator {op} over {field_type} field")]
    UnsupportedOperator { op: String, field_type: String },

    /// Operator protocol misuse (e.g. `next()` on a closed operator)
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// `next()` called on an exhausted operator
    #[error("No more tuples")]
    NoSuchElement,

    /// On-disk bytes could not be parsed
    #[error("Corruption detected: {0}")]
    Corruption(String),

    /// Malformed bulk-encoder input
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The lock manager refused a page lock
    #[error("Transaction {txn} could not lock page {page_id}")]
    LockDenied { txn: TransactionId, page_id: PageId },

    /// Eviction was needed but the pool holds no page
    #[error("Buffer pool exhausted: no evictable page")]
    PoolExhausted,

    /// One or more pages failed to flush during a batch flush
    #[error("{} page(s) failed to flush", failures.len())]
    FlushFailed { failures: Vec<(PageId, DbError)> },

    /// Integer result does not fit the 4-byte field type
    #[error("Integer overflow: {0}")]
    Overflow(String),

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DbError {
    /// Create a tuple-not-found error with a message
    pub fn tuple_not_found(msg: impl Into<String>) -> Self {
        Self::TupleNotFound(msg.into())
    }

    /// Create an illegal-state error with a message
    pub fn illegal_state(msg: impl Into<String>) -> Self {
        Self::IllegalState(msg.into())
    }

    /// Create a corruption error with a message
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }

    /// Create a schema mismatch error from two displayable schemas
    pub fn schema_mismatch(expected: impl ToString, found: impl ToString) -> Self {
        Self::SchemaMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
