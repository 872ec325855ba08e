//! LRU-K replacement policy.
//!
//! LRU-K keys eviction on the reuse distance of the K-th most recent
//! reference rather than the most recent one, which separates hot pages
//! from pages touched once in a burst. Frames with fewer than K recorded
//! accesses have an infinite K-distance and are preferred victims until
//! they prove themselves; ties are broken by the earliest recorded access.

use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};

use silt_common::FrameId;

/// K-distance of a frame with fewer than K recorded accesses.
const INF: u64 = u64::MAX;

/// Access history for one tracked frame.
#[derive(Debug)]
struct LruKNode {
    /// Up to K access timestamps, most recent first.
    history: VecDeque<u64>,
    is_evictable: bool,
}

impl LruKNode {
    fn new(timestamp: u64, k: usize) -> Self {
        let mut history = VecDeque::with_capacity(k);
        history.push_front(timestamp);
        Self {
            history,
            is_evictable: false,
        }
    }

    fn record_access(&mut self, timestamp: u64, k: usize) {
        self.history.push_front(timestamp);
        if self.history.len() > k {
            self.history.pop_back();
        }
    }

    /// Age of the K-th most recent access, or `INF` with fewer than K.
    fn k_distance(&self, now: u64, k: usize) -> u64 {
        if self.history.len() < k {
            INF
        } else {
            now - self.history[k - 1]
        }
    }

    /// Oldest recorded access; breaks K-distance ties.
    fn earliest_access(&self) -> u64 {
        *self.history.back().expect("replacer node has empty history")
    }
}

/// LRU-K replacer over the buffer pool's frames.
///
/// Tracks the access history and evictability of frames and selects the
/// next victim. A frame enters the replacer on its first recorded access
/// and leaves on eviction or removal.
#[derive(Debug)]
pub struct LruKReplacer {
    node_store: HashMap<FrameId, LruKNode>,
    current_timestamp: u64,
    evictable_count: usize,
    num_frames: usize,
    k: usize,
}

impl LruKReplacer {
    /// Creates a replacer for a pool of `num_frames` frames.
    #[must_use]
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k >= 1, "LRU-K requires k >= 1");
        Self {
            node_store: HashMap::with_capacity(num_frames),
            current_timestamp: 0,
            evictable_count: 0,
            num_frames,
            k,
        }
    }

    /// Records an access to `frame_id` at the next timestamp.
    ///
    /// Creates the tracking node on first access.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is out of range for the pool.
    pub fn record_access(&mut self, frame_id: FrameId) {
        assert!(
            frame_id.index() < self.num_frames,
            "frame {frame_id} out of range for pool of {} frames",
            self.num_frames
        );
        self.current_timestamp += 1;
        let timestamp = self.current_timestamp;
        let k = self.k;
        self.node_store
            .entry(frame_id)
            .and_modify(|node| node.record_access(timestamp, k))
            .or_insert_with(|| LruKNode::new(timestamp, k));
    }

    /// Marks `frame_id` as evictable or not.
    ///
    /// Idempotent; a no-op for untracked frames.
    pub fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        let Some(node) = self.node_store.get_mut(&frame_id) else {
            return;
        };
        if node.is_evictable != evictable {
            node.is_evictable = evictable;
            if evictable {
                self.evictable_count += 1;
            } else {
                self.evictable_count -= 1;
            }
        }
    }

    /// Drops `frame_id` from the replacer.
    ///
    /// A no-op for untracked frames.
    ///
    /// # Panics
    ///
    /// Panics if the frame is tracked but currently non-evictable.
    pub fn remove(&mut self, frame_id: FrameId) {
        let Some(node) = self.node_store.get(&frame_id) else {
            return;
        };
        assert!(
            node.is_evictable,
            "removing non-evictable frame {frame_id} from replacer"
        );
        self.node_store.remove(&frame_id);
        self.evictable_count -= 1;
    }

    /// Selects, removes, and returns the next victim.
    ///
    /// The victim is the evictable frame with the largest K-distance; ties
    /// (including multiple infinite distances) go to the frame whose oldest
    /// recorded access is earliest. Returns `None` if nothing is evictable.
    pub fn evict(&mut self) -> Option<FrameId> {
        let now = self.current_timestamp;
        let k = self.k;
        let victim = self
            .node_store
            .iter()
            .filter(|(_, node)| node.is_evictable)
            .max_by_key(|(_, node)| (node.k_distance(now, k), Reverse(node.earliest_access())))
            .map(|(&frame_id, _)| frame_id)?;

        self.node_store.remove(&victim);
        self.evictable_count -= 1;
        Some(victim)
    }

    /// Number of evictable frames.
    #[must_use]
    pub fn size(&self) -> usize {
        self.evictable_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fid(id: u32) -> FrameId {
        FrameId::new(id)
    }

    #[test]
    fn test_evict_empty() {
        let mut replacer = LruKReplacer::new(8, 2);
        assert_eq!(replacer.evict(), None);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_evict_respects_evictable_flag() {
        let mut replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(2));
        assert_eq!(replacer.evict(), None);

        replacer.set_evictable(fid(2), true);
        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_set_evictable_is_idempotent() {
        let mut replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(1), true);
        replacer.set_evictable(fid(1), true);
        assert_eq!(replacer.size(), 1);
        replacer.set_evictable(fid(1), false);
        replacer.set_evictable(fid(1), false);
        assert_eq!(replacer.size(), 0);
        // Untracked frames are ignored.
        replacer.set_evictable(fid(6), true);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_under_referenced_frame_evicted_first() {
        // Frames with fewer than K accesses have infinite K-distance and go
        // first, regardless of recency.
        let mut replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(1));
        replacer.record_access(fid(1));
        replacer.record_access(fid(2));
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(1), true);
        replacer.set_evictable(fid(2), true);

        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), Some(fid(1)));
    }

    #[test]
    fn test_single_infinite_distance_wins() {
        // Accesses: 1, 2, 3, 1, 2. Frames 1 and 2 have two accesses each,
        // frame 3 only one, so frame 3 is the sole infinite-distance victim.
        let mut replacer = LruKReplacer::new(8, 2);
        for id in [1, 2, 3, 1, 2] {
            replacer.record_access(fid(id));
        }
        for id in 1..=3 {
            replacer.set_evictable(fid(id), true);
        }
        assert_eq!(replacer.evict(), Some(fid(3)));
    }

    #[test]
    fn test_largest_k_distance_wins() {
        // Continuing the sequence 1, 2, 3, 1, 2 with an access to 3: all
        // three now have two accesses, and the victim is the frame whose
        // second-most-recent access is oldest (frame 1).
        let mut replacer = LruKReplacer::new(8, 2);
        for id in [1, 2, 3, 1, 2, 3] {
            replacer.record_access(fid(id));
        }
        for id in 1..=3 {
            replacer.set_evictable(fid(id), true);
        }
        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), Some(fid(3)));
    }

    #[test]
    fn test_infinite_distance_tie_breaks_on_earliest_access() {
        // Frames 4, 5, 6 each have a single access; the earliest arrival
        // goes first.
        let mut replacer = LruKReplacer::new(8, 3);
        for id in [5, 4, 6] {
            replacer.record_access(fid(id));
            replacer.set_evictable(fid(id), true);
        }
        assert_eq!(replacer.evict(), Some(fid(5)));
        assert_eq!(replacer.evict(), Some(fid(4)));
        assert_eq!(replacer.evict(), Some(fid(6)));
    }

    #[test]
    fn test_full_choreography() {
        let mut replacer = LruKReplacer::new(8, 2);

        // Six frames; frame 6 stays pinned.
        for id in 1..=6 {
            replacer.record_access(fid(id));
        }
        for id in 1..=5 {
            replacer.set_evictable(fid(id), true);
        }
        replacer.set_evictable(fid(6), false);
        assert_eq!(replacer.size(), 5);

        // A second access to frame 1 gives it a finite K-distance.
        replacer.record_access(fid(1));

        // The remaining single-access frames leave in arrival order.
        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), Some(fid(3)));
        assert_eq!(replacer.evict(), Some(fid(4)));
        assert_eq!(replacer.size(), 2);

        replacer.record_access(fid(3));
        replacer.record_access(fid(4));
        replacer.record_access(fid(5));
        replacer.record_access(fid(4));
        replacer.set_evictable(fid(3), true);
        replacer.set_evictable(fid(4), true);
        assert_eq!(replacer.size(), 4);

        // Frame 3 re-entered with one access; infinite distance again.
        assert_eq!(replacer.evict(), Some(fid(3)));
        assert_eq!(replacer.size(), 3);

        replacer.set_evictable(fid(6), true);
        assert_eq!(replacer.size(), 4);
        assert_eq!(replacer.evict(), Some(fid(6)));
        assert_eq!(replacer.size(), 3);

        replacer.set_evictable(fid(1), false);
        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.evict(), Some(fid(5)));
        assert_eq!(replacer.size(), 1);

        replacer.record_access(fid(1));
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(1), true);
        assert_eq!(replacer.size(), 2);

        assert_eq!(replacer.evict(), Some(fid(4)));
        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_remove_untracked_is_noop() {
        let mut replacer = LruKReplacer::new(8, 2);
        replacer.remove(fid(3));
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_remove_evictable_frame() {
        let mut replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(1));
        replacer.set_evictable(fid(1), true);
        replacer.remove(fid(1));
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    #[should_panic(expected = "non-evictable")]
    fn test_remove_non_evictable_frame_panics() {
        let mut replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(1));
        replacer.remove(fid(1));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_record_access_out_of_range_panics() {
        let mut replacer = LruKReplacer::new(8, 2);
        replacer.record_access(fid(8));
    }

    #[test]
    fn test_history_bounded_at_k() {
        // Many accesses to one frame keep only the K most recent; an old
        // burst does not shield the frame forever.
        let mut replacer = LruKReplacer::new(8, 2);
        for _ in 0..10 {
            replacer.record_access(fid(1));
        }
        replacer.record_access(fid(2));
        replacer.record_access(fid(2));
        replacer.set_evictable(fid(1), true);
        replacer.set_evictable(fid(2), true);

        // Frame 1's K-th most recent access is newer than frame 2's.
        assert_eq!(replacer.evict(), Some(fid(2)));
    }

    #[test]
    fn test_eviction_at_scale() {
        let pool = 1000;
        let mut replacer = LruKReplacer::new(pool, 3);
        for round in 0..4u32 {
            for id in (round * 250)..pool as u32 {
                replacer.record_access(fid(id));
                replacer.set_evictable(fid(id), true);
            }
        }
        assert_eq!(replacer.size(), pool);

        for id in 250..500 {
            replacer.set_evictable(fid(id), false);
        }
        assert_eq!(replacer.size(), 750);

        for id in 0..100 {
            replacer.remove(fid(id));
        }
        assert_eq!(replacer.size(), 650);

        // Frames 100..250 have fewer than 3 accesses left tracked in rounds
        // they joined late; eviction drains in earliest-access order within
        // each distance class.
        for id in 100..600 {
            if !(250..500).contains(&id) {
                assert_eq!(replacer.evict(), Some(fid(id)));
            }
        }
        assert_eq!(replacer.size(), 400);
    }
}
