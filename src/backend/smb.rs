//! SMB backend (`smb://` paths).
//!
//! SMB sessions address entries by full URI, and directories by a URI with
//! a trailing `/`. The share reports free space but not its capacity, so
//! [`total_space`](crate::FileOps::total_space) is always 0.

use super::remote::{Protocol, RemoteFile};
use crate::{FsError, OpenMode};

/// Marker for the SMB protocol.
pub(crate) struct Smb;

impl Protocol for Smb {
    const MODE: OpenMode = OpenMode::Smb;
    const REPORTS_TOTAL_SPACE: bool = false;

    fn remote_path(path: &str) -> Result<&str, FsError> {
        Ok(path)
    }
}

/// A path on an SMB share.
pub(crate) type SmbFile<'a> = RemoteFile<'a, Smb>;
