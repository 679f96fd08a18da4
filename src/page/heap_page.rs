//! Heap page implementation.
//!
//! A heap page uses the following layout:
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │  Slot bitmap: ceil(slots / 8) bytes                 │
//! ├────────────────────────────────────────────────────┤
//! │  [slot 0][slot 1][slot 2] ... [slot n-1]            │
//! │  each slot = one encoded tuple, zeros if free       │
//! ├────────────────────────────────────────────────────┤
//! │  Zero padding up to page_size                       │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! The in-memory form keeps the decoded tuples; the byte form is only
//! materialized when the page is written back.

use crate::error::{DbError, Result};
use crate::page::{PageLayout, SlotBitmap};
use crate::tuple::{codec, Tuple, TupleDesc};
use crate::types::{PageId, RecordId, TransactionId};
use std::sync::Arc;

/// Parsed, in-memory view of one heap file block
#[derive(Debug, Clone)]
pub struct HeapPage {
    page_id: PageId,
    desc: Arc<TupleDesc>,
    layout: PageLayout,
    header: SlotBitmap,
    slots: Vec<Option<Tuple>>,
    /// Transaction that last dirtied this page, cleared on flush
    dirtied_by: Option<TransactionId>,
}

impl HeapPage {
    /// Create an empty page with every slot free
    pub fn empty(page_id: PageId, desc: Arc<TupleDesc>, page_size: usize) -> Self {
        let layout = PageLayout::new(page_size, &desc);
        Self {
            page_id,
            header: SlotBitmap::new(layout.slots),
            slots: vec![None; layout.slots],
            desc,
            layout,
            dirtied_by: None,
        }
    }

    /// Bytes of a freshly allocated, empty page
    pub fn empty_page_data(page_size: usize) -> Vec<u8> {
        vec![0u8; page_size]
    }

    /// Parse a page from its on-disk bytes
    pub fn from_bytes(
        page_id: PageId,
        desc: Arc<TupleDesc>,
        page_size: usize,
        bytes: &[u8],
    ) -> Result<Self> {
        if bytes.len() != page_size {
            return Err(DbError::corruption(format!(
                "page {} is {} bytes, expected {}",
                page_id,
                bytes.len(),
                page_size
            )));
        }

        let layout = PageLayout::new(page_size, &desc);
        let header = SlotBitmap::read(bytes, layout.slots);
        let mut slots = Vec::with_capacity(layout.slots);
        for slot in 0..layout.slots {
            if !header.is_set(slot) {
                slots.push(None);
                continue;
            }
            let offset = layout.slot_offset(slot);
            let mut tuple = codec::decode_tuple(&desc, &bytes[offset..offset + layout.tuple_size])?;
            tuple.set_record_id(Some(RecordId::new(page_id, slot)));
            slots.push(Some(tuple));
        }

        Ok(Self {
            page_id,
            desc,
            layout,
            header,
            slots,
            dirtied_by: None,
        })
    }

    /// Serialize this page to exactly `page_size` bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut data = Self::empty_page_data(self.layout.page_size);
        self.header.write(&mut data);
        for (slot, tuple) in self.slots.iter().enumerate() {
            if let Some(tuple) = tuple {
                let offset = self.layout.slot_offset(slot);
                codec::encode_fields(
                    &self.desc,
                    tuple.fields(),
                    &mut data[offset..offset + self.layout.tuple_size],
                )?;
            }
        }
        Ok(data)
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    pub fn num_slots(&self) -> usize {
        self.layout.slots
    }

    pub fn empty_slot_count(&self) -> usize {
        self.header.count_clear()
    }

    pub fn is_slot_used(&self, slot: usize) -> bool {
        self.header.is_set(slot)
    }

    /// Store `tuple` in the lowest free slot.
    ///
    /// Returns the new record location.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> Result<RecordId> {
        if **tuple.desc() != *self.desc {
            return Err(DbError::schema_mismatch(&*self.desc, &**tuple.desc()));
        }
        let slot = self
            .header
            .first_clear()
            .ok_or(DbError::PageFull(self.page_id))?;

        let record_id = RecordId::new(self.page_id, slot);
        tuple.set_record_id(Some(record_id));
        self.slots[slot] = Some(tuple);
        self.header.set(slot, true);
        Ok(record_id)
    }

    /// Free the slot holding `tuple`
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> Result<()> {
        let record_id = tuple
            .record_id()
            .ok_or_else(|| DbError::tuple_not_found("tuple has no record id"))?;
        if record_id.page_id != self.page_id {
            return Err(DbError::tuple_not_found(format!(
                "record {} does not belong to page {}",
                record_id, self.page_id
            )));
        }
        if !self.header.is_set(record_id.slot) {
            return Err(DbError::tuple_not_found(format!(
                "slot {} of page {} is empty",
                record_id.slot, self.page_id
            )));
        }

        self.header.set(record_id.slot, false);
        self.slots[record_id.slot] = None;
        Ok(())
    }

    /// Tuple stored in `slot`, if occupied
    pub fn tuple(&self, slot: usize) -> Option<&Tuple> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Live tuples in slot order
    pub fn tuples(&self) -> impl Iterator<Item = &Tuple> {
        self.slots.iter().flatten()
    }

    /// Mark this page dirty on behalf of `txn`, or clean with `None`
    pub fn mark_dirty(&mut self, txn: Option<TransactionId>) {
        self.dirtied_by = txn;
    }

    /// Transaction that dirtied this page since the last flush
    pub fn dirtied_by(&self) -> Option<TransactionId> {
        self.dirtied_by
    }

    pub fn is_dirty(&self) -> bool {
        self.dirtied_by.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, Type};

    const PAGE_SIZE: usize = 256;

    fn desc() -> Arc<TupleDesc> {
        Arc::new(TupleDesc::new([("a", Type::Int), ("b", Type::Int)]))
    }

    fn row(a: i32, b: i32) -> Tuple {
        Tuple::new(desc(), vec![Field::Int(a), Field::Int(b)]).unwrap()
    }

    #[test]
    fn test_insert_uses_lowest_free_slot() -> Result<()> {
        let pid = PageId::new(1, 0);
        let mut page = HeapPage::empty(pid, desc(), PAGE_SIZE);
        // 256*8 / 65 = 31 slots
        assert_eq!(page.num_slots(), 31);

        let r0 = page.insert_tuple(row(1, 1))?;
        let r1 = page.insert_tuple(row(2, 2))?;
        assert_eq!((r0.slot, r1.slot), (0, 1));

        let first = page.tuple(0).unwrap().clone();
        page.delete_tuple(&first)?;
        assert!(!page.is_slot_used(0));
        assert_eq!(page.insert_tuple(row(3, 3))?.slot, 0);
        assert_eq!(page.empty_slot_count(), 29);
        Ok(())
    }

    #[test]
    fn test_bytes_roundtrip() -> Result<()> {
        let pid = PageId::new(1, 4);
        let mut page = HeapPage::empty(pid, desc(), PAGE_SIZE);
        page.insert_tuple(row(10, -10))?;
        page.insert_tuple(row(20, -20))?;

        let bytes = page.to_bytes()?;
        assert_eq!(bytes.len(), PAGE_SIZE);
        assert_eq!(bytes[0], 0b0000_0011);
        // slot 0 starts right after the 4-byte header
        assert_eq!(&bytes[4..8], &10i32.to_be_bytes());

        let parsed = HeapPage::from_bytes(pid, desc(), PAGE_SIZE, &bytes)?;
        let rows: Vec<_> = parsed.tuples().cloned().collect();
        assert_eq!(rows, vec![row(10, -10), row(20, -20)]);
        assert_eq!(rows[1].record_id(), Some(RecordId::new(pid, 1)));
        assert!(!parsed.is_dirty());
        Ok(())
    }

    #[test]
    fn test_full_page_rejects_insert() -> Result<()> {
        let pid = PageId::new(1, 0);
        let mut page = HeapPage::empty(pid, desc(), PAGE_SIZE);
        for i in 0..31 {
            page.insert_tuple(row(i, i))?;
        }
        assert!(matches!(page.insert_tuple(row(99, 99)), Err(DbError::PageFull(p)) if p == pid));
        Ok(())
    }

    #[test]
    fn test_delete_validates_location() -> Result<()> {
        let mut page = HeapPage::empty(PageId::new(1, 0), desc(), PAGE_SIZE);
        assert!(matches!(page.delete_tuple(&row(1, 1)), Err(DbError::TupleNotFound(_))));

        let mut elsewhere = row(1, 1);
        elsewhere.set_record_id(Some(RecordId::new(PageId::new(1, 9), 0)));
        assert!(matches!(page.delete_tuple(&elsewhere), Err(DbError::TupleNotFound(_))));

        let mut stale = row(1, 1);
        stale.set_record_id(Some(RecordId::new(PageId::new(1, 0), 5)));
        assert!(matches!(page.delete_tuple(&stale), Err(DbError::TupleNotFound(_))));
        Ok(())
    }

    #[test]
    fn test_schema_checked_on_insert() {
        let mut page = HeapPage::empty(PageId::new(1, 0), desc(), PAGE_SIZE);
        let other = Arc::new(TupleDesc::unnamed(&[Type::Text]));
        let t = Tuple::new(other, vec![Field::from("x")]).unwrap();
        assert!(matches!(page.insert_tuple(t), Err(DbError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_dirty_marker() {
        let mut page = HeapPage::empty(PageId::new(1, 0), desc(), PAGE_SIZE);
        let txn = TransactionId::new();
        page.mark_dirty(Some(txn));
        assert_eq!(page.dirtied_by(), Some(txn));
        page.mark_dirty(None);
        assert!(!page.is_dirty());
    }
}
