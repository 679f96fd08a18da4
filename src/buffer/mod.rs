//! Buffer pool: in-memory page cache with LRU eviction.
//!
//! The buffer pool caches heap pages in memory to reduce disk I/O.
//! It uses a strict LRU (Least Recently Used) eviction policy and writes
//! dirty pages back before they leave the cache.

mod lock;
mod lru;
mod pool;

pub use lock::{LockGrant, LockManager, NoLockManager};
pub use lru::LruCache;
pub use pool::{BufferPool, SharedPage};
