//! Storage layer: heap files, bulk encoding and the table registry.
//!
//! This module is the only place that performs raw disk I/O. Everything
//! above it reads and writes pages through the buffer pool.

mod catalog;
mod encoder;
mod heap_file;

pub use catalog::Catalog;
pub use encoder::HeapFileEncoder;
pub use heap_file::{HeapFile, HeapFileIterator};
