//! Page and record identifiers.

use std::fmt;

/// Identifier of one page of one table.
///
/// Page numbers are 0-indexed; the heap file format has no header page,
/// so page `n` starts at byte `n * page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId {
    table_id: u32,
    page_no: u32,
}

impl PageId {
    /// Create a new page ID
    pub const fn new(table_id: u32, page_no: u32) -> Self {
        Self { table_id, page_no }
    }

    /// Table that owns this page
    pub const fn table_id(self) -> u32 {
        self.table_id
    }

    /// Position of this page within its file
    pub const fn page_no(self) -> u32 {
        self.page_no
    }

    /// Calculate the byte offset of this page in its file
    pub const fn file_offset(self, page_size: usize) -> u64 {
        self.page_no as u64 * page_size as u64
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table_id, self.page_no)
    }
}

/// Location of a persisted tuple: owning page and slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: usize,
}

impl RecordId {
    pub const fn new(page_id: PageId, slot: usize) -> Self {
        Self { page_id, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.page_id, self.slot)
    }
}
