//! File-backed disk manager.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::error;

use silt_common::{PageId, PAGE_SIZE};

/// Result type for disk operations.
pub type DiskResult<T> = Result<T, DiskError>;

/// Errors that can occur during disk operations.
#[derive(Debug, Error)]
pub enum DiskError {
    /// The disk manager has been shut down.
    #[error("disk manager is shut down")]
    Shutdown,

    /// Attempted I/O with an invalid page id.
    #[error("invalid page id: {page_id}")]
    InvalidPageId {
        /// The offending id.
        page_id: PageId,
    },

    /// Underlying file I/O failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying error.
        #[from]
        source: std::io::Error,
    },
}

/// Synchronous, file-backed page store.
///
/// All pages share one data file; a page's offset is `page_id * PAGE_SIZE`.
/// The file handle is serialized behind a mutex, so concurrent callers see
/// whole-page reads and writes.
#[derive(Debug)]
pub struct DiskManager {
    file: Mutex<File>,
    path: PathBuf,
    shut_down: AtomicBool,
}

impl DiskManager {
    /// Opens (or creates) the data file at `path`.
    pub fn new(path: impl AsRef<Path>) -> DiskResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        Ok(Self {
            file: Mutex::new(file),
            path,
            shut_down: AtomicBool::new(false),
        })
    }

    /// Reads the page with id `page_id` into `buf`.
    ///
    /// A read past the current end of the file zero-fills `buf`, so pages
    /// that were never written read back as zeros.
    pub fn read_page(&self, page_id: PageId, buf: &mut [u8; PAGE_SIZE]) -> DiskResult<()> {
        self.check_open()?;
        let offset = page_offset(page_id)?;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < PAGE_SIZE {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        buf[filled..].fill(0);
        Ok(())
    }

    /// Writes the page with id `page_id` from `buf` and flushes it.
    pub fn write_page(&self, page_id: PageId, buf: &[u8; PAGE_SIZE]) -> DiskResult<()> {
        self.check_open()?;
        let offset = page_offset(page_id)?;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        file.flush()?;
        Ok(())
    }

    /// Shuts the disk manager down.
    ///
    /// Idempotent; I/O attempted afterwards fails with
    /// [`DiskError::Shutdown`].
    pub fn shutdown(&self) {
        if !self.shut_down.swap(true, Ordering::AcqRel) {
            if let Err(e) = self.file.lock().sync_all() {
                error!(path = %self.path.display(), error = %e, "sync on shutdown failed");
            }
        }
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_open(&self) -> DiskResult<()> {
        if self.shut_down.load(Ordering::Acquire) {
            Err(DiskError::Shutdown)
        } else {
            Ok(())
        }
    }
}

fn page_offset(page_id: PageId) -> DiskResult<u64> {
    if !page_id.is_valid() {
        return Err(DiskError::InvalidPageId { page_id });
    }
    Ok(page_id.as_i32() as u64 * PAGE_SIZE as u64)
}
