//! # silt-common
//!
//! Common types and constants for SiltDB.
//!
//! This crate provides the foundational types shared by the storage layer:
//!
//! - **Types**: core identifiers (`PageId`, `FrameId`) and the `AccessType`
//!   hint carried by page accesses
//! - **Constants**: system-wide constants such as the page size
//!
//! ## Example
//!
//! ```rust
//! use silt_common::{PageId, PAGE_SIZE};
//!
//! let page = PageId::new(42);
//! assert!(page.is_valid());
//! assert_eq!(PAGE_SIZE, 4096);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod types;

pub use constants::{INVALID_PAGE_ID, PAGE_SIZE};
pub use types::{AccessType, FrameId, PageId};
