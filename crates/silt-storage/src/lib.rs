//! # silt-storage
//!
//! Storage layer for SiltDB: a file-backed disk manager and a buffer pool
//! that caches fixed-size pages between the access methods and the disk.
//!
//! The buffer pool owns a bounded set of in-memory frames and provides:
//!
//! - Page caching with LRU-K replacement
//! - Pin/unpin reference counting that gates eviction
//! - Dirty tracking with write-back on eviction and on flush
//! - RAII page guards that release pins (and content latches) on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod disk;
pub mod log;
