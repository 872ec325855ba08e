//! Page frame - a slot in the buffer pool that holds one page.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use silt_common::{FrameId, PageId, PAGE_SIZE};

/// Page-sized data buffer guarded by the per-frame latch.
pub type PageData = [u8; PAGE_SIZE];

/// A frame holds a single page in memory.
///
/// The data buffer sits behind a reader-writer latch that the guard layer
/// uses to coordinate content access on an already-pinned page. The
/// metadata fields (`page_id`, `pin_count`, `is_dirty`) are atomics so they
/// can be *read* without the pool latch; they are only mutated while the
/// pool latch is held.
pub struct PageFrame {
    /// Frame id (index in the pool's frame array).
    frame_id: FrameId,
    /// Page contents, behind the per-frame reader-writer latch.
    data: Arc<RwLock<PageData>>,
    /// Page id currently held, or `INVALID_PAGE_ID` for an empty frame.
    page_id: AtomicI32,
    /// Number of outstanding pins.
    pin_count: AtomicU32,
    /// Whether the contents differ from the on-disk copy.
    is_dirty: AtomicBool,
}

impl PageFrame {
    /// Creates a new empty frame.
    pub(crate) fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            data: Arc::new(RwLock::new([0u8; PAGE_SIZE])),
            page_id: AtomicI32::new(PageId::INVALID.as_i32()),
            pin_count: AtomicU32::new(0),
            is_dirty: AtomicBool::new(false),
        }
    }

    /// Returns the frame id.
    #[inline]
    #[must_use]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Returns the page id held by this frame.
    #[inline]
    #[must_use]
    pub fn page_id(&self) -> PageId {
        PageId::new(self.page_id.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn set_page_id(&self, page_id: PageId) {
        self.page_id.store(page_id.as_i32(), Ordering::Release);
    }

    /// Returns true if this frame holds no page.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.page_id().is_valid()
    }

    /// Returns the current pin count.
    #[inline]
    #[must_use]
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// Increments the pin count and returns the new value.
    #[inline]
    pub(crate) fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count and returns the new value.
    ///
    /// The caller must have checked that the count is non-zero.
    #[inline]
    pub(crate) fn unpin(&self) -> u32 {
        let old = self.pin_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(old > 0, "unpinned frame with pin_count = 0");
        old - 1
    }

    /// Returns true if the frame is pinned.
    #[inline]
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Returns true if the frame is dirty.
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn set_dirty(&self, dirty: bool) {
        self.is_dirty.store(dirty, Ordering::Release);
    }

    /// Borrows the page contents (shared latch held for the borrow).
    #[inline]
    pub fn data(&self) -> RwLockReadGuard<'_, PageData> {
        self.data.read()
    }

    /// Mutably borrows the page contents (exclusive latch held for the
    /// borrow).
    #[inline]
    pub fn data_mut(&self) -> RwLockWriteGuard<'_, PageData> {
        self.data.write()
    }

    /// Acquires the shared side of the frame latch with an owned guard.
    ///
    /// Blocks while a writer holds the latch.
    pub(crate) fn latch_read(&self) -> ArcRwLockReadGuard<RawRwLock, PageData> {
        self.data.read_arc()
    }

    /// Acquires the exclusive side of the frame latch with an owned guard.
    ///
    /// Blocks while any reader or writer holds the latch.
    pub(crate) fn latch_write(&self) -> ArcRwLockWriteGuard<RawRwLock, PageData> {
        self.data.write_arc()
    }

    /// Zeroes the data buffer.
    pub(crate) fn reset_memory(&self) {
        self.data.write().fill(0);
    }

    /// Clears the frame metadata back to the empty state.
    pub(crate) fn reset(&self) {
        self.page_id
            .store(PageId::INVALID.as_i32(), Ordering::Release);
        self.pin_count.store(0, Ordering::Release);
        self.is_dirty.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for PageFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFrame")
            .field("frame_id", &self.frame_id)
            .field("page_id", &self.page_id())
            .field("pin_count", &self.pin_count())
            .field("is_dirty", &self.is_dirty())
            .finish()
    }
}
