//! Handles that name no storage: the `"0"`..`"6"` pseudo-roots and
//! unresolved paths.

use std::io::{Read, Write};
use std::time::SystemTime;

use crate::{DirEntry, FileOps, FsError, OpenMode, fallback_modified};

/// A path with no backing storage.
///
/// Queries answer with their defaults; everything else is unsupported.
pub(crate) struct PseudoFile {
    mode: OpenMode,
}

impl PseudoFile {
    pub(crate) fn new(mode: OpenMode) -> Self {
        Self { mode }
    }

    fn unsupported(&self, operation: &'static str) -> FsError {
        FsError::NotSupported {
            operation,
            backend: self.mode.name(),
        }
    }
}

impl FileOps for PseudoFile {
    fn modified(&self) -> SystemTime {
        fallback_modified()
    }

    fn size(&self) -> u64 {
        0
    }

    fn is_directory(&self) -> bool {
        false
    }

    fn directory_size(&self) -> u64 {
        0
    }

    fn usable_space(&self) -> u64 {
        0
    }

    fn total_space(&self) -> u64 {
        0
    }

    fn for_each_child(&self, _: bool, _: &mut dyn FnMut(DirEntry)) -> Result<(), FsError> {
        Err(self.unsupported("for_each_child"))
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>, FsError> {
        Err(self.unsupported("open_read"))
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>, FsError> {
        Err(self.unsupported("open_write"))
    }

    fn exists(&self) -> bool {
        false
    }

    fn create_directory(&self) -> Result<(), FsError> {
        Err(self.unsupported("create_directory"))
    }

    fn delete(&self, _: bool) -> Result<bool, FsError> {
        Err(self.unsupported("delete"))
    }

    fn set_modified(&self, _: SystemTime) -> bool {
        false
    }
}
