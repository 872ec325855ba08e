//! System-wide constants for SiltDB.

// =============================================================================
// Page Constants
// =============================================================================

/// Page size in bytes (4 KB).
///
/// Every frame buffer and every disk transfer is exactly this many bytes;
/// it matches the block size of the disk manager.
pub const PAGE_SIZE: usize = 4096;

/// Sentinel value for "no page".
///
/// A frame whose page id equals this value holds no page and must not appear
/// in the page table.
pub const INVALID_PAGE_ID: i32 = -1;
