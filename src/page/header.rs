//! Slot-occupancy bitmap stored at the start of each heap page.
//!
//! Bit order:
//! ```text
//! slot i  ->  byte i / 8, bit i % 8 (least significant bit first)
//! ```

/// Bitmap tracking which slots of a page hold live tuples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBitmap {
    bytes: Vec<u8>,
    slots: usize,
}

impl SlotBitmap {
    /// Create an all-empty bitmap for `slots` slots
    pub fn new(slots: usize) -> Self {
        Self {
            bytes: vec![0u8; slots.div_ceil(8)],
            slots,
        }
    }

    /// Read a bitmap from the start of a page
    pub fn read(bytes: &[u8], slots: usize) -> Self {
        let len = slots.div_ceil(8);
        Self {
            bytes: bytes[..len].to_vec(),
            slots,
        }
    }

    /// Write this bitmap to the start of `bytes`
    pub fn write(&self, bytes: &mut [u8]) {
        bytes[..self.bytes.len()].copy_from_slice(&self.bytes);
    }

    /// Whether slot `i` is occupied; out-of-range slots read as free
    pub fn is_set(&self, i: usize) -> bool {
        i < self.slots && self.bytes[i / 8] & (1 << (i % 8)) != 0
    }

    pub fn set(&mut self, i: usize, used: bool) {
        if used {
            self.bytes[i / 8] |= 1 << (i % 8);
        } else {
            self.bytes[i / 8] &= !(1 << (i % 8));
        }
    }

    /// Lowest free slot index
    pub fn first_clear(&self) -> Option<usize> {
        (0..self.slots).find(|&i| !self.is_set(i))
    }

    /// Number of free slots
    pub fn count_clear(&self) -> usize {
        (0..self.slots).filter(|&i| !self.is_set(i)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_order_is_lsb_first() {
        let mut bitmap = SlotBitmap::new(10);
        bitmap.set(0, true);
        bitmap.set(3, true);
        bitmap.set(9, true);

        let mut page = vec![0xFFu8; 4];
        bitmap.write(&mut page);
        assert_eq!(page, vec![0b0000_1001, 0b0000_0010, 0xFF, 0xFF]);
    }

    #[test]
    fn test_roundtrip_and_first_clear() {
        let mut bitmap = SlotBitmap::new(12);
        for i in 0..5 {
            bitmap.set(i, true);
        }
        bitmap.set(2, false);

        let mut page = vec![0u8; 16];
        bitmap.write(&mut page);
        let restored = SlotBitmap::read(&page, 12);
        assert_eq!(restored, bitmap);
        assert_eq!(restored.first_clear(), Some(2));
        assert_eq!(restored.count_clear(), 8);
        assert!(!restored.is_set(12));
    }

    #[test]
    fn test_full_bitmap() {
        let mut bitmap = SlotBitmap::new(3);
        for i in 0..3 {
            bitmap.set(i, true);
        }
        assert_eq!(bitmap.first_clear(), None);
        assert_eq!(bitmap.count_clear(), 0);
    }
}
