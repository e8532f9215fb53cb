//! Network session collaborators shared by the SFTP and SMB backends.

use std::io::{self, Read, Write};
use std::time::{Duration, SystemTime};

use crate::{FsError, Metadata, SpaceAllocation};

/// Which remote session to open.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionTarget {
    /// `scheme://[user[:password]@]host[:port]` of the server.
    pub key: String,
    /// Connection timeout to pass to the transport, if configured.
    pub timeout: Option<Duration>,
}

/// One child reported by a remote directory listing.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    /// Leaf name.
    pub name: String,
    /// Attributes as listed. Symlinks are reported as
    /// [`FileType::Symlink`](crate::FileType::Symlink) and resolved by the
    /// caller.
    pub metadata: Metadata,
}

/// Inner read handle of a remote file.
pub trait RemoteRead: Read + Send {
    /// Release the remote file handle.
    fn close(&mut self) -> io::Result<()>;
}

/// Inner write handle of a remote file.
pub trait RemoteWrite: Write + Send {
    /// Flush and release the remote file handle.
    fn close(&mut self) -> io::Result<()>;
}

/// An opened client session against one server.
///
/// Paths are whatever the protocol addresses entries by: the remote path for
/// SFTP, the full URI for SMB.
pub trait RemoteSession: Send {
    /// Attributes of `path`, following symlinks.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the server reports no such entry
    fn stat(&mut self, path: &str) -> Result<Metadata, FsError>;

    /// Children of the directory at `path`.
    fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry>, FsError>;

    /// Create a directory.
    fn mkdir(&mut self, path: &str) -> Result<(), FsError>;

    /// Remove a file.
    fn remove_file(&mut self, path: &str) -> Result<(), FsError>;

    /// Remove a directory.
    fn remove_dir(&mut self, path: &str) -> Result<(), FsError>;

    /// Open a file for reading.
    fn open_read(&mut self, path: &str) -> Result<Box<dyn RemoteRead>, FsError>;

    /// Open a file for writing, creating it when missing.
    fn open_write(&mut self, path: &str) -> Result<Box<dyn RemoteWrite>, FsError>;

    /// Set the modification time.
    fn set_modified(&mut self, path: &str, time: SystemTime) -> Result<(), FsError>;

    /// Space figures for the volume holding `path` (statvfs or equivalent).
    fn space(&mut self, path: &str) -> Result<SpaceAllocation, FsError>;

    /// Close the session.
    fn close(&mut self) -> Result<(), FsError>;
}

/// Opens sessions for one protocol.
pub trait SessionConnector: Send + Sync {
    /// Open a session to `target`.
    ///
    /// # Errors
    ///
    /// - [`FsError::Transport`] when the server cannot be reached
    /// - [`FsError::Timeout`] when the connection timeout expires
    fn connect(&self, target: &SessionTarget) -> Result<Box<dyn RemoteSession>, FsError>;
}
