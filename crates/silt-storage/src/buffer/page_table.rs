//! Bidirectional page table.

use std::collections::HashMap;

use silt_common::{FrameId, PageId};

/// Maps resident pages to frames and back.
///
/// Both directions are always updated together; an entry present in one
/// direction but not the other indicates corrupted bookkeeping and asserts.
#[derive(Debug, Default)]
pub(crate) struct PageTable {
    page_to_frame: HashMap<PageId, FrameId>,
    frame_to_page: HashMap<FrameId, PageId>,
}

impl PageTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Installs the mapping for a newly resident page.
    pub(crate) fn insert(&mut self, page_id: PageId, frame_id: FrameId) {
        let prev = self.page_to_frame.insert(page_id, frame_id);
        assert!(prev.is_none(), "page {page_id} is already resident");
        let prev = self.frame_to_page.insert(frame_id, page_id);
        assert!(prev.is_none(), "frame {frame_id} already holds a page");
    }

    /// Removes the mapping for a page, returning its frame.
    pub(crate) fn remove(&mut self, page_id: PageId) -> Option<FrameId> {
        let frame_id = self.page_to_frame.remove(&page_id)?;
        let back = self.frame_to_page.remove(&frame_id);
        assert_eq!(
            back,
            Some(page_id),
            "page table divergence: frame {frame_id} maps to {back:?}, expected page {page_id}"
        );
        Some(frame_id)
    }

    pub(crate) fn frame_of(&self, page_id: PageId) -> Option<FrameId> {
        self.page_to_frame.get(&page_id).copied()
    }

    pub(crate) fn page_of(&self, frame_id: FrameId) -> Option<PageId> {
        self.frame_to_page.get(&frame_id).copied()
    }

    pub(crate) fn contains_page(&self, page_id: PageId) -> bool {
        self.page_to_frame.contains_key(&page_id)
    }

    /// Number of resident pages.
    pub(crate) fn len(&self) -> usize {
        debug_assert_eq!(self.page_to_frame.len(), self.frame_to_page.len());
        self.page_to_frame.len()
    }

    /// Iterates over the resident page ids.
    pub(crate) fn pages(&self) -> impl Iterator<Item = PageId> + '_ {
        self.page_to_frame.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut table = PageTable::new();
        table.insert(PageId::new(7), FrameId::new(2));

        assert_eq!(table.frame_of(PageId::new(7)), Some(FrameId::new(2)));
        assert_eq!(table.page_of(FrameId::new(2)), Some(PageId::new(7)));
        assert!(table.contains_page(PageId::new(7)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_clears_both_directions() {
        let mut table = PageTable::new();
        table.insert(PageId::new(7), FrameId::new(2));

        assert_eq!(table.remove(PageId::new(7)), Some(FrameId::new(2)));
        assert_eq!(table.frame_of(PageId::new(7)), None);
        assert_eq!(table.page_of(FrameId::new(2)), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_remove_missing_page() {
        let mut table = PageTable::new();
        assert_eq!(table.remove(PageId::new(1)), None);
    }

    #[test]
    #[should_panic(expected = "already resident")]
    fn test_duplicate_page_asserts() {
        let mut table = PageTable::new();
        table.insert(PageId::new(1), FrameId::new(0));
        table.insert(PageId::new(1), FrameId::new(1));
    }

    #[test]
    #[should_panic(expected = "already holds a page")]
    fn test_duplicate_frame_asserts() {
        let mut table = PageTable::new();
        table.insert(PageId::new(1), FrameId::new(0));
        table.insert(PageId::new(2), FrameId::new(0));
    }
}
