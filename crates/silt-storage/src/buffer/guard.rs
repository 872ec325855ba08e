//! Scoped page guards.
//!
//! A guard stands for exactly one pin on one frame. Dropping it releases
//! the pin (passing along the caller's dirty hint) exactly once; the
//! read/write variants additionally hold the frame's content latch and
//! release it before unpinning. Guards are move-only - they cannot be
//! cloned, and reassigning over one releases its previous contents first.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Weak};

use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::RawRwLock;

use silt_common::{AccessType, PageId};

use super::frame::{PageData, PageFrame};
use super::pool::BufferPoolManager;

/// Pin-holding handle for a page.
///
/// Holds a non-owning back-reference to the pool; on drop the guard unpins
/// the page, passing its dirty hint. Content access takes the frame latch
/// per call - the basic guard does not hold it across calls.
pub struct BasicPageGuard {
    pool: Weak<BufferPoolManager>,
    frame: Option<Arc<PageFrame>>,
    is_dirty: bool,
}

impl BasicPageGuard {
    pub(crate) fn new(pool: &Arc<BufferPoolManager>, frame: Arc<PageFrame>) -> Self {
        Self {
            pool: Arc::downgrade(pool),
            frame: Some(frame),
            is_dirty: false,
        }
    }

    /// Returns the id of the guarded page, or `PageId::INVALID` after
    /// release.
    #[must_use]
    pub fn page_id(&self) -> PageId {
        self.frame
            .as_ref()
            .map_or(PageId::INVALID, |frame| frame.page_id())
    }

    /// Borrows the page contents, holding the shared latch for the borrow.
    ///
    /// # Panics
    ///
    /// Panics if the guard has been released.
    pub fn data(&self) -> impl Deref<Target = PageData> + '_ {
        self.frame().data()
    }

    /// Mutably borrows the page contents, holding the exclusive latch for
    /// the borrow. Sets the dirty hint.
    ///
    /// # Panics
    ///
    /// Panics if the guard has been released.
    pub fn data_mut(&mut self) -> impl DerefMut<Target = PageData> + '_ {
        self.is_dirty = true;
        self.frame().data_mut()
    }

    /// Sets the dirty hint without touching the contents.
    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    /// Releases the pin now instead of at end of scope.
    ///
    /// Idempotent: after the first call the guard is empty and dropping it
    /// does nothing.
    pub fn release(&mut self) {
        let Some(frame) = self.frame.take() else {
            return;
        };
        if let Some(pool) = self.pool.upgrade() {
            pool.unpin_page(frame.page_id(), self.is_dirty, AccessType::Unknown);
        }
        self.is_dirty = false;
    }

    fn frame(&self) -> &Arc<PageFrame> {
        self.frame.as_ref().expect("page guard already released")
    }
}

impl Drop for BasicPageGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for BasicPageGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicPageGuard")
            .field("page_id", &self.page_id())
            .field("is_dirty", &self.is_dirty)
            .finish()
    }
}

/// Read guard: pins the page and holds the shared side of its frame latch.
///
/// Any number of read guards for a page coexist; a write guard blocks
/// until all of them are gone.
pub struct ReadPageGuard {
    // Declared before `guard` so the latch is released before the unpin.
    latch: Option<ArcRwLockReadGuard<RawRwLock, PageData>>,
    guard: BasicPageGuard,
}

impl ReadPageGuard {
    pub(crate) fn new(
        guard: BasicPageGuard,
        latch: ArcRwLockReadGuard<RawRwLock, PageData>,
    ) -> Self {
        Self {
            latch: Some(latch),
            guard,
        }
    }

    /// Returns the id of the guarded page, or `PageId::INVALID` after
    /// release.
    #[must_use]
    pub fn page_id(&self) -> PageId {
        self.guard.page_id()
    }

    /// Borrows the page contents through the held latch.
    ///
    /// # Panics
    ///
    /// Panics if the guard has been released.
    #[must_use]
    pub fn data(&self) -> &PageData {
        self.latch.as_ref().expect("page guard already released")
    }

    /// Releases the latch and the pin now. Idempotent.
    pub fn release(&mut self) {
        self.latch = None;
        self.guard.release();
    }
}

impl std::fmt::Debug for ReadPageGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadPageGuard")
            .field("page_id", &self.page_id())
            .finish()
    }
}

/// Write guard: pins the page and holds the exclusive side of its frame
/// latch.
///
/// Mutable access marks the page dirty, so the unpin on drop carries the
/// hint automatically.
pub struct WritePageGuard {
    // Declared before `guard` so the latch is released before the unpin.
    latch: Option<ArcRwLockWriteGuard<RawRwLock, PageData>>,
    guard: BasicPageGuard,
}

impl WritePageGuard {
    pub(crate) fn new(
        guard: BasicPageGuard,
        latch: ArcRwLockWriteGuard<RawRwLock, PageData>,
    ) -> Self {
        Self {
            latch: Some(latch),
            guard,
        }
    }

    /// Returns the id of the guarded page, or `PageId::INVALID` after
    /// release.
    #[must_use]
    pub fn page_id(&self) -> PageId {
        self.guard.page_id()
    }

    /// Borrows the page contents through the held latch.
    ///
    /// # Panics
    ///
    /// Panics if the guard has been released.
    #[must_use]
    pub fn data(&self) -> &PageData {
        self.latch.as_ref().expect("page guard already released")
    }

    /// Mutably borrows the page contents through the held latch. Sets the
    /// dirty hint.
    ///
    /// # Panics
    ///
    /// Panics if the guard has been released.
    pub fn data_mut(&mut self) -> &mut PageData {
        self.guard.mark_dirty();
        self.latch.as_mut().expect("page guard already released")
    }

    /// Releases the latch and the pin now. Idempotent.
    pub fn release(&mut self) {
        self.latch = None;
        self.guard.release();
    }
}

impl std::fmt::Debug for WritePageGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WritePageGuard")
            .field("page_id", &self.page_id())
            .finish()
    }
}
