//! Page lock manager seam.
//!
//! The buffer pool asks a [`LockManager`] for a page lock before handing a
//! page out. The default [`NoLockManager`] grants everything, which is
//! enough for single-threaded use; a real two-phase locking scheme plugs
//! in through the same trait.

use crate::types::{PageId, Permissions, TransactionId};

/// Outcome of a lock request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockGrant {
    Granted,
    Blocked,
}

/// Per-page lock bookkeeping for transactions
pub trait LockManager: Send + Sync {
    /// Request a shared (`ReadOnly`) or exclusive (`ReadWrite`) lock
    fn acquire(&self, txn: TransactionId, page_id: PageId, perm: Permissions) -> LockGrant;

    /// Drop every lock held by `txn`
    fn release_all(&self, txn: TransactionId);

    /// Whether `txn` currently holds any lock on `page_id`
    fn holds_lock(&self, txn: TransactionId, page_id: PageId) -> bool;
}

/// Lock manager that grants every request and tracks nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLockManager;

impl LockManager for NoLockManager {
    fn acquire(&self, _txn: TransactionId, _page_id: PageId, _perm: Permissions) -> LockGrant {
        LockGrant::Granted
    }

    fn release_all(&self, _txn: TransactionId) {}

    fn holds_lock(&self, _txn: TransactionId, _page_id: PageId) -> bool {
        false
    }
}
