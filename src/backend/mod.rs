//! # Backends
//!
//! One [`FileOps`] implementation per storage system, gathered in the closed
//! [`Backend`] enum.
//!
//! | Variant | Serves | Reaches storage through |
//! |---------|--------|-------------------------|
//! | `Local` | [`OpenMode::File`] | `std::fs`, `walkdir`, `fs2` |
//! | `Root` | [`OpenMode::Root`] | [`ShellRunner`](crate::ShellRunner) |
//! | `Sftp` | [`OpenMode::Sftp`] | [`SessionConnector`](crate::SessionConnector) |
//! | `Smb` | [`OpenMode::Smb`] | [`SessionConnector`](crate::SessionConnector) |
//! | `Document` | [`OpenMode::DocumentFile`], [`OpenMode::Otg`] | [`DocumentResolver`](crate::DocumentResolver) |
//! | `Cloud` | the four cloud modes | [`CloudStorage`](crate::CloudStorage) |
//! | `Pseudo` | [`OpenMode::Custom`], [`OpenMode::Unknown`] | nothing |
//!
//! Backends are cheap views over a path and a context. They are built per
//! call and hold no state of their own.

mod cloud;
mod document;
mod local;
mod pseudo;
mod remote;
mod root;
mod sftp;
mod smb;

use std::io::{Read, Write};
use std::time::SystemTime;

use crate::{DirEntry, FileOps, FsContext, FsError, OpenMode};

pub(crate) use cloud::CloudFile;
pub(crate) use document::DocumentFile;
pub(crate) use local::LocalFile;
pub(crate) use pseudo::PseudoFile;
pub(crate) use root::RootFile;
pub(crate) use sftp::SftpFile;
pub(crate) use smb::SmbFile;

/// The backend serving one path.
pub(crate) enum Backend<'a> {
    Local(LocalFile<'a>),
    Root(RootFile<'a>),
    Sftp(SftpFile<'a>),
    Smb(SmbFile<'a>),
    Document(DocumentFile<'a>),
    Cloud(CloudFile<'a>),
    Pseudo(PseudoFile),
}

impl<'a> Backend<'a> {
    /// Select the backend for `mode`.
    pub(crate) fn new(mode: OpenMode, path: &'a str, ctx: &'a FsContext) -> Self {
        match mode {
            OpenMode::File => Backend::Local(LocalFile::new(path)),
            OpenMode::Root => Backend::Root(RootFile::new(path, ctx)),
            OpenMode::Sftp => Backend::Sftp(SftpFile::new(path, ctx)),
            OpenMode::Smb => Backend::Smb(SmbFile::new(path, ctx)),
            OpenMode::DocumentFile | OpenMode::Otg => {
                Backend::Document(DocumentFile::new(mode, path, ctx))
            }
            OpenMode::Box | OpenMode::OneDrive | OpenMode::GDrive | OpenMode::Dropbox => {
                Backend::Cloud(CloudFile::new(mode, path, ctx))
            }
            OpenMode::Custom | OpenMode::Unknown => Backend::Pseudo(PseudoFile::new(mode)),
        }
    }

    fn ops(&self) -> &dyn FileOps {
        match self {
            Backend::Local(b) => b,
            Backend::Root(b) => b,
            Backend::Sftp(b) => b,
            Backend::Smb(b) => b,
            Backend::Document(b) => b,
            Backend::Cloud(b) => b,
            Backend::Pseudo(b) => b,
        }
    }
}

impl FileOps for Backend<'_> {
    fn modified(&self) -> SystemTime {
        self.ops().modified()
    }

    fn size(&self) -> u64 {
        self.ops().size()
    }

    fn is_directory(&self) -> bool {
        self.ops().is_directory()
    }

    fn directory_size(&self) -> u64 {
        self.ops().directory_size()
    }

    fn usable_space(&self) -> u64 {
        self.ops().usable_space()
    }

    fn total_space(&self) -> u64 {
        self.ops().total_space()
    }

    fn for_each_child(
        &self,
        include_hidden: bool,
        on_entry: &mut dyn FnMut(DirEntry),
    ) -> Result<(), FsError> {
        self.ops().for_each_child(include_hidden, on_entry)
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>, FsError> {
        self.ops().open_read()
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>, FsError> {
        self.ops().open_write()
    }

    fn exists(&self) -> bool {
        self.ops().exists()
    }

    fn create_directory(&self) -> Result<(), FsError> {
        self.ops().create_directory()
    }

    fn delete(&self, use_privileged: bool) -> Result<bool, FsError> {
        self.ops().delete(use_privileged)
    }

    fn set_modified(&self, time: SystemTime) -> bool {
        self.ops().set_modified(time)
    }
}

/// Collapse a failed query to `default`, logging the cause.
///
/// A missing entry is routine and logged at `debug`; anything else at
/// `warn`.
pub(crate) fn degrade<T>(
    result: Result<T, FsError>,
    operation: &'static str,
    path: &str,
    default: T,
) -> T {
    match result {
        Ok(value) => value,
        Err(FsError::NotFound { .. }) => {
            tracing::debug!(path, operation, "entry not found, using default");
            default
        }
        Err(e) => {
            tracing::warn!(path, operation, error = %e, "query failed, using default");
            default
        }
    }
}

/// Whether a listed child passes the hidden-entry filter.
#[inline]
pub(crate) fn visible(name: &str, include_hidden: bool) -> bool {
    include_hidden || !name.starts_with('.')
}
