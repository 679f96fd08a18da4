//! Common types used throughout the storage engine.

mod field;
mod page_id;

pub use field::{CmpOp, Field};
pub use page_id::{PageId, RecordId};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default page size in bytes (4KB)
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default number of pages held by the buffer pool
pub const DEFAULT_POOL_PAGES: usize = 50;

/// Maximum number of bytes stored for a text field
pub const STRING_LEN: usize = 128;

/// Fixed-width field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    /// 4-byte signed integer
    Int,
    /// Length-prefixed text padded to `STRING_LEN` bytes
    Text,
}

impl Type {
    /// Number of bytes a field of this type occupies inside a tuple slot
    pub const fn byte_len(self) -> usize {
        match self {
            Self::Int => 4,
            Self::Text => 4 + STRING_LEN,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "INT"),
            Self::Text => write!(f, "TEXT"),
        }
    }
}

/// Requested access mode for a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permissions {
    ReadOnly,
    ReadWrite,
}

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque transaction token.
///
/// Carried through every mutating call and recorded on the pages a
/// transaction dirties. It does not enforce any isolation by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Issue a fresh, process-unique transaction id
    pub fn new() -> Self {
        Self(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_widths() {
        assert_eq!(Type::Int.byte_len(), 4);
        assert_eq!(Type::Text.byte_len(), 132);
    }

    #[test]
    fn test_transaction_ids_are_unique() {
        let a = TransactionId::new();
        let b = TransactionId::new();
        assert_ne!(a, b);
        assert!(b.value() > a.value());
    }
}
