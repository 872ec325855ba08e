//! Log manager handle.
//!
//! Recovery is out of scope for this layer; the buffer pool still accepts a
//! log manager so its constructor signature matches callers that wire one
//! in.

/// Opaque write-ahead log handle.
///
/// The buffer pool holds one but never calls into it.
#[derive(Debug, Default)]
pub struct LogManager {
    _private: (),
}

impl LogManager {
    /// Creates a new log manager handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
