//! Buffer pool manager.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use silt_common::{AccessType, FrameId, PageId};

use super::config::BufferPoolConfig;
use super::frame::PageFrame;
use super::guard::{BasicPageGuard, ReadPageGuard, WritePageGuard};
use super::page_table::PageTable;
use super::replacer::LruKReplacer;
use super::BufferPoolStats;
use crate::disk::DiskManager;
use crate::log::LogManager;

/// Bookkeeping protected by the pool latch.
///
/// The page table, free list, replacer, page-id counter, and every
/// pin/dirty transition are mutated only while this struct's mutex is held.
#[derive(Debug)]
struct PoolState {
    page_table: PageTable,
    free_list: VecDeque<FrameId>,
    replacer: LruKReplacer,
    next_page_id: i32,
    hits: u64,
    misses: u64,
    evictions: u64,
    flushes: u64,
}

/// Orchestrates frame allocation, page residency, and eviction.
///
/// A single mutex (the pool latch) serializes every public operation,
/// including the disk I/O performed on behalf of one. This trades
/// throughput for simplicity; content access on an already-pinned page
/// goes through the per-frame latch instead and does not contend here.
///
/// Operations that cannot make progress report it through their return
/// value (`None`/`false`); violations of internal invariants panic.
pub struct BufferPoolManager {
    frames: Vec<Arc<PageFrame>>,
    state: Mutex<PoolState>,
    disk_manager: Arc<DiskManager>,
    _log_manager: Option<Arc<LogManager>>,
}

impl BufferPoolManager {
    /// Creates a buffer pool from `config`, backed by `disk_manager`.
    ///
    /// All frames start on the free list.
    ///
    /// # Panics
    ///
    /// Panics if the configuration fails validation.
    pub fn new(
        config: BufferPoolConfig,
        disk_manager: Arc<DiskManager>,
        log_manager: Option<Arc<LogManager>>,
    ) -> Self {
        if let Err(msg) = config.validate() {
            panic!("invalid buffer pool configuration: {msg}");
        }

        let frames = (0..config.pool_size)
            .map(|i| Arc::new(PageFrame::new(FrameId::new(i as u32))))
            .collect();

        let state = PoolState {
            page_table: PageTable::new(),
            free_list: (0..config.pool_size as u32).map(FrameId::new).collect(),
            replacer: LruKReplacer::new(config.pool_size, config.replacer_k),
            next_page_id: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            flushes: 0,
        };

        Self {
            frames,
            state: Mutex::new(state),
            disk_manager,
            _log_manager: log_manager,
        }
    }

    /// Returns the number of frames in the pool.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.frames.len()
    }

    /// Allocates a fresh page, pinned once.
    ///
    /// Returns `None` when the free list is empty and no frame is
    /// evictable.
    pub fn new_page(&self) -> Option<Arc<PageFrame>> {
        let mut state = self.state.lock();

        let frame_id = self.acquire_frame(&mut state)?;
        let page_id = PageId::new(state.next_page_id);
        state.next_page_id += 1;

        state.page_table.insert(page_id, frame_id);
        let frame = &self.frames[frame_id.index()];
        frame.set_page_id(page_id);
        frame.reset_memory();
        // The disk manager zero-fills reads of never-written ids.
        self.read_from_disk(page_id, frame);
        frame.pin();
        state.replacer.record_access(frame_id);

        trace!(page = %page_id, frame = %frame_id, "created page");
        Some(Arc::clone(frame))
    }

    /// Pins the page with id `page_id`, reading it from disk if it is not
    /// resident.
    ///
    /// Returns `None` if the id is invalid, or if the page is not resident
    /// and no frame can be obtained.
    pub fn fetch_page(&self, page_id: PageId, _access_type: AccessType) -> Option<Arc<PageFrame>> {
        if !page_id.is_valid() {
            return None;
        }
        let mut state = self.state.lock();

        let frame_id = match state.page_table.frame_of(page_id) {
            Some(frame_id) => {
                state.hits += 1;
                frame_id
            }
            None => {
                state.misses += 1;
                let frame_id = self.acquire_frame(&mut state)?;
                state.page_table.insert(page_id, frame_id);
                let frame = &self.frames[frame_id.index()];
                // The released frame carries pin_count = 0, so the shared
                // pin below lands on exactly 1.
                frame.set_page_id(page_id);
                frame.reset_memory();
                self.read_from_disk(page_id, frame);
                frame_id
            }
        };

        let frame = &self.frames[frame_id.index()];
        frame.pin();
        state.replacer.record_access(frame_id);
        state
            .replacer
            .set_evictable(frame_id, frame.pin_count() == 0);
        Some(Arc::clone(frame))
    }

    /// Drops one pin on `page_id`, OR-ing in the caller's dirty hint.
    ///
    /// Returns `false` if the page is not resident or its pin count is
    /// already zero.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool, _access_type: AccessType) -> bool {
        let mut state = self.state.lock();

        let Some(frame_id) = state.page_table.frame_of(page_id) else {
            return false;
        };
        let frame = &self.frames[frame_id.index()];
        if frame.pin_count() == 0 {
            return false;
        }

        let remaining = frame.unpin();
        if is_dirty {
            frame.set_dirty(true);
        }
        state.replacer.set_evictable(frame_id, remaining == 0);
        true
    }

    /// Writes `page_id` back to disk if it is dirty.
    ///
    /// Returns `false` only if the page is not resident.
    pub fn flush_page(&self, page_id: PageId) -> bool {
        let mut state = self.state.lock();
        self.flush_locked(&mut state, page_id)
    }

    /// Writes every resident dirty page back to disk.
    pub fn flush_all_pages(&self) {
        let mut state = self.state.lock();
        let pages: Vec<PageId> = state.page_table.pages().collect();
        for page_id in pages {
            self.flush_locked(&mut state, page_id);
        }
    }

    /// Evicts `page_id` from the pool, flushing it first if dirty.
    ///
    /// Returns `true` if the page is not resident (nothing to do) and
    /// `false` if it is resident but pinned; state is unchanged in the
    /// latter case.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut state = self.state.lock();
        let released = self.release_page(&mut state, page_id);
        if released {
            debug!(page = %page_id, "deleted page");
        }
        released
    }

    // -------------------------------------------------------------------------
    // Guarded variants
    // -------------------------------------------------------------------------

    /// Allocates a fresh page wrapped in a [`BasicPageGuard`].
    pub fn new_page_guarded(self: &Arc<Self>) -> Option<BasicPageGuard> {
        let frame = self.new_page()?;
        Some(BasicPageGuard::new(self, frame))
    }

    /// Fetches `page_id` wrapped in a [`BasicPageGuard`].
    pub fn fetch_page_basic(self: &Arc<Self>, page_id: PageId) -> Option<BasicPageGuard> {
        let frame = self.fetch_page(page_id, AccessType::Unknown)?;
        Some(BasicPageGuard::new(self, frame))
    }

    /// Fetches `page_id` and acquires the shared side of its frame latch.
    ///
    /// Blocks while a writer holds the latch. The latch is acquired after
    /// pinning, so the frame cannot be evicted while this waits.
    pub fn fetch_page_read(self: &Arc<Self>, page_id: PageId) -> Option<ReadPageGuard> {
        let frame = self.fetch_page(page_id, AccessType::Unknown)?;
        let latch = frame.latch_read();
        Some(ReadPageGuard::new(BasicPageGuard::new(self, frame), latch))
    }

    /// Fetches `page_id` and acquires the exclusive side of its frame
    /// latch.
    ///
    /// Blocks while any reader or writer holds the latch.
    pub fn fetch_page_write(self: &Arc<Self>, page_id: PageId) -> Option<WritePageGuard> {
        let frame = self.fetch_page(page_id, AccessType::Unknown)?;
        let latch = frame.latch_write();
        Some(WritePageGuard::new(BasicPageGuard::new(self, frame), latch))
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    /// Returns true if `page_id` is resident.
    #[must_use]
    pub fn contains(&self, page_id: PageId) -> bool {
        self.state.lock().page_table.contains_page(page_id)
    }

    /// Returns the pin count of `page_id`, or `None` if it is not
    /// resident.
    #[must_use]
    pub fn pin_count_of(&self, page_id: PageId) -> Option<u32> {
        let state = self.state.lock();
        let frame_id = state.page_table.frame_of(page_id)?;
        Some(self.frames[frame_id.index()].pin_count())
    }

    /// Number of frames that could hold a new page right now: free frames
    /// plus evictable ones.
    #[must_use]
    pub fn free_frame_count(&self) -> usize {
        let state = self.state.lock();
        state.free_list.len() + state.replacer.size()
    }

    /// Returns a statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> BufferPoolStats {
        let state = self.state.lock();
        let mut pinned_frames = 0;
        let mut dirty_frames = 0;
        for frame in &self.frames {
            if frame.is_pinned() {
                pinned_frames += 1;
            }
            if frame.is_dirty() {
                dirty_frames += 1;
            }
        }
        BufferPoolStats {
            fetches: state.hits + state.misses,
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            flushes: state.flushes,
            pinned_frames,
            dirty_frames,
        }
    }

    // -------------------------------------------------------------------------
    // Private helpers (pool latch held)
    // -------------------------------------------------------------------------

    /// Pops a free frame, evicting a victim first if the free list is
    /// empty. Returns `None` when no frame is free and nothing is
    /// evictable.
    fn acquire_frame(&self, state: &mut PoolState) -> Option<FrameId> {
        if state.free_list.is_empty() {
            let victim = state.replacer.evict()?;
            let victim_page = state.page_table.page_of(victim).unwrap_or_else(|| {
                panic!("evicted frame {victim} has no page table entry");
            });
            debug!(frame = %victim, page = %victim_page, "evicting page");
            let released = self.release_page(state, victim_page);
            assert!(released, "evicted page {victim_page} is still pinned");
            state.evictions += 1;
        }
        state.free_list.pop_front()
    }

    /// Detaches a resident page from its frame: flush if dirty, clear the
    /// frame, drop it from the replacer and the page table, and return the
    /// frame to the free list.
    ///
    /// Returns `true` if the page was detached or was not resident, and
    /// `false` if it is pinned.
    fn release_page(&self, state: &mut PoolState, page_id: PageId) -> bool {
        let Some(frame_id) = state.page_table.frame_of(page_id) else {
            return true;
        };
        let frame = &self.frames[frame_id.index()];
        if frame.pin_count() > 0 {
            return false;
        }

        self.flush_frame(state, page_id, frame_id);
        frame.reset_memory();
        frame.reset();

        state.replacer.remove(frame_id);
        state.page_table.remove(page_id);
        state.free_list.push_back(frame_id);
        true
    }

    /// Flushes `page_id` if resident; returns whether it was resident.
    fn flush_locked(&self, state: &mut PoolState, page_id: PageId) -> bool {
        let Some(frame_id) = state.page_table.frame_of(page_id) else {
            return false;
        };
        self.flush_frame(state, page_id, frame_id);
        true
    }

    /// Writes a resident frame back if it is dirty.
    fn flush_frame(&self, state: &mut PoolState, page_id: PageId, frame_id: FrameId) {
        let frame = &self.frames[frame_id.index()];
        if !frame.is_dirty() {
            return;
        }
        {
            let data = frame.data();
            if let Err(e) = self.disk_manager.write_page(page_id, &data) {
                panic!("disk write failed for page {page_id}: {e}");
            }
        }
        frame.set_dirty(false);
        state.flushes += 1;
        trace!(page = %page_id, frame = %frame_id, "flushed page");
    }

    /// Reads `page_id` into the frame's buffer.
    fn read_from_disk(&self, page_id: PageId, frame: &PageFrame) {
        let mut data = frame.data_mut();
        if let Err(e) = self.disk_manager.read_page(page_id, &mut data) {
            panic!("disk read failed for page {page_id}: {e}");
        }
    }
}

impl std::fmt::Debug for BufferPoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BufferPoolManager")
            .field("pool_size", &self.frames.len())
            .field("resident_pages", &state.page_table.len())
            .field("free_frames", &state.free_list.len())
            .field("evictable_frames", &state.replacer.size())
            .finish()
    }
}
