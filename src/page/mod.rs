//! Page layer: fixed-slot heap page format.
//!
//! Every page of a heap file is a block of `page_size` bytes laid out as:
//! - A slot-occupancy bitmap of `ceil(slots / 8)` bytes
//! - `slots` fixed-width tuple slots
//! - Zero padding up to `page_size`
//!
//! The number of slots is chosen so that each tuple costs its own width
//! plus one header bit.

mod header;
mod heap_page;

pub use header::SlotBitmap;
pub use heap_page::HeapPage;

use crate::tuple::TupleDesc;

/// Geometry of a heap page for a given page size and schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    /// Total bytes per page
    pub page_size: usize,
    /// Bytes per tuple slot
    pub tuple_size: usize,
    /// Number of tuple slots per page
    pub slots: usize,
    /// Bytes of slot bitmap at the start of the page
    pub header_size: usize,
}

impl PageLayout {
    /// Compute the layout: `slots = floor(page_size*8 / (tuple_size*8 + 1))`
    pub fn new(page_size: usize, desc: &TupleDesc) -> Self {
        let tuple_size = desc.byte_size();
        let slots = (page_size * 8) / (tuple_size * 8 + 1);
        Self {
            page_size,
            tuple_size,
            slots,
            header_size: slots.div_ceil(8),
        }
    }

    /// Byte offset of a slot within the page
    pub fn slot_offset(&self, slot: usize) -> usize {
        self.header_size + slot * self.tuple_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Type, DEFAULT_PAGE_SIZE};

    #[test]
    fn test_layout_for_int_pairs() {
        let desc = TupleDesc::unnamed(&[Type::Int, Type::Int]);
        let layout = PageLayout::new(DEFAULT_PAGE_SIZE, &desc);
        // 4096*8 / (8*8 + 1) = 504
        assert_eq!(layout.slots, 504);
        assert_eq!(layout.header_size, 63);
        assert!(layout.slot_offset(layout.slots) <= DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_layout_rounds_header_up() {
        let desc = TupleDesc::unnamed(&[Type::Int, Type::Int, Type::Int]);
        let layout = PageLayout::new(DEFAULT_PAGE_SIZE, &desc);
        // 32768 / 97 = 337 slots, 43 header bytes
        assert_eq!(layout.slots, 337);
        assert_eq!(layout.header_size, 43);
    }

    #[test]
    fn test_layout_with_oversized_tuple() {
        let desc = TupleDesc::unnamed(&[Type::Text; 4]);
        let layout = PageLayout::new(64, &desc);
        assert_eq!(layout.slots, 0);
        assert_eq!(layout.header_size, 0);
    }
}
