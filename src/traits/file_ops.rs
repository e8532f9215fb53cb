//! The operation surface every backend implements.

use std::io::{Read, Write};
use std::time::SystemTime;

use crate::{DirEntry, FsError};

/// Operations on one addressed entry, implemented once per backend.
///
/// Queries never fail: a backend that cannot answer degrades to a
/// documented default (`false`, `0`, or [`fallback_modified`]) and logs the
/// cause through `tracing`. Mutations, stream opening and listing return
/// explicit errors.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Network, shell and cloud
/// backends block on I/O, so callers should run them off latency-sensitive
/// threads.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FileOps`.
///
/// [`fallback_modified`]: crate::fallback_modified
pub trait FileOps: Send + Sync {
    /// Last modification time, or the fallback timestamp when unknown.
    fn modified(&self) -> SystemTime;

    /// Size in bytes; 0 when unknown.
    fn size(&self) -> u64;

    /// Whether the entry is a directory.
    ///
    /// Remote backends answer with a metadata round trip. The answer is never
    /// guessed from the shape of the path, so it can disagree with a trailing
    /// `/` in an SMB URI.
    fn is_directory(&self) -> bool;

    /// Total size of everything below this directory; 0 on failure.
    fn directory_size(&self) -> u64;

    /// Free bytes on the volume, share or account; 0 when unknown.
    fn usable_space(&self) -> u64;

    /// Capacity of the volume, share or account; 0 when unknown.
    fn total_space(&self) -> u64;

    /// Push each child to `on_entry`, one at a time.
    ///
    /// Hidden entries (leading `.`) are skipped unless `include_hidden` is
    /// set. When enumeration fails part-way, entries already delivered stay
    /// delivered, enumeration stops, and the error is returned once.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the directory does not exist
    /// - [`FsError::Transport`] if the backend became unreachable
    fn for_each_child(
        &self,
        include_hidden: bool,
        on_entry: &mut dyn FnMut(DirEntry),
    ) -> Result<(), FsError>;

    /// Open the entry for reading.
    ///
    /// The returned stream owns every resource it needs; dropping it releases
    /// them.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the entry does not exist
    fn open_read(&self) -> Result<Box<dyn Read + Send>, FsError>;

    /// Open the entry for writing, creating it if needed.
    ///
    /// Some backends stage the data and commit it on `flush`, which reports
    /// a failed commit. Data still pending when the stream is dropped is
    /// committed then, and a failure there is only logged.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the parent does not exist
    /// - [`FsError::PermissionDenied`] if the entry is not writable
    fn open_write(&self) -> Result<Box<dyn Write + Send>, FsError>;

    /// Whether the entry exists. Backend failures collapse to `false`.
    fn exists(&self) -> bool;

    /// Create this entry as a directory.
    ///
    /// Backends check existence first where they can; this is best-effort,
    /// not transactional.
    fn create_directory(&self) -> Result<(), FsError>;

    /// Delete the entry and report whether it is gone afterwards.
    ///
    /// `use_privileged` lets the privileged backend go through the shell.
    /// Because [`exists`](Self::exists) can fail silently, callers that need
    /// certainty should check it themselves.
    fn delete(&self, use_privileged: bool) -> Result<bool, FsError>;

    /// Set the modification time. Returns `false` when unsupported or failed.
    fn set_modified(&self, time: SystemTime) -> bool;
}
