//! Disk management and page I/O.
//!
//! The disk manager is a synchronous, file-backed page store. Pages live at
//! `page_id * PAGE_SIZE` in a single data file; reads past the current end
//! of the file zero-fill, so a page that has never been written reads back
//! as zeros.

mod manager;

pub use manager::{DiskError, DiskManager, DiskResult};
