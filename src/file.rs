//! # The facade
//!
//! [`VirtualFile`] is the one handle callers hold. It owns a path and a
//! backend tag, borrows the shared [`FsContext`], and forwards every
//! [`FileOps`] call to the backend selected by the tag.
//!
//! The tag is resolved lazily: a handle built with [`VirtualFile::new`]
//! runs [`detect`](crate::detect()) on first use. Backends are rebuilt per
//! call, so re-tagging with [`VirtualFile::set_mode`] carries no state over
//! from the previous backend.
//!
//! ```rust
//! use anyfs_hybrid::{FsContext, OpenMode, VirtualFile};
//! use std::sync::Arc;
//!
//! let ctx = Arc::new(FsContext::default());
//! let home = VirtualFile::new("ssh://me@host/home/me", ctx.clone());
//! assert_eq!(home.mode(), OpenMode::Sftp);
//!
//! let notes = home.child("notes.txt", false);
//! assert_eq!(notes.path(), "ssh://me@host/home/me/notes.txt");
//! assert_eq!(notes.readable_path(), "ssh://host/home/me/notes.txt");
//! ```

use std::io::{Read, Write};
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

use crate::backend::Backend;
use crate::{DirEntry, FileOps, FsContext, FsError, OpenMode, detect, path};

/// A file or directory on any backend.
///
/// # Thread Safety
///
/// `VirtualFile` is `Send + Sync` and holds no locks. Concurrent calls on
/// handles that address the same path are not coordinated.
#[derive(Debug, Clone)]
pub struct VirtualFile {
    path: String,
    name: Option<String>,
    mode: OnceLock<OpenMode>,
    ctx: Arc<FsContext>,
}

impl VirtualFile {
    /// A handle whose backend is detected from `path` on first use.
    pub fn new(path: impl Into<String>, ctx: Arc<FsContext>) -> Self {
        Self {
            path: path.into(),
            name: None,
            mode: OnceLock::new(),
            ctx,
        }
    }

    /// A handle with a known backend.
    pub fn with_mode(mode: OpenMode, path: impl Into<String>, ctx: Arc<FsContext>) -> Self {
        Self {
            path: path.into(),
            name: None,
            mode: OnceLock::from(mode),
            ctx,
        }
    }

    /// The child `name` of `parent`, addressed with the rules of `mode`.
    ///
    /// See [`path::join`] for how each backend builds the path.
    pub fn from_parent(
        mode: OpenMode,
        parent: &str,
        name: &str,
        is_directory: bool,
        ctx: Arc<FsContext>,
    ) -> Self {
        Self {
            path: path::join(mode, parent, name, is_directory),
            name: Some(name.to_string()),
            mode: OnceLock::from(mode),
            ctx,
        }
    }

    /// The child `name` of this handle, on the same backend.
    pub fn child(&self, name: &str, is_directory: bool) -> Self {
        Self::from_parent(self.mode(), &self.path, name, is_directory, self.ctx.clone())
    }

    /// The backend tag, detecting it first if needed.
    pub fn mode(&self) -> OpenMode {
        *self.mode.get_or_init(|| {
            let config = self.ctx.detect_config(&self.path);
            let mode = detect(&self.path, Some(&config));
            tracing::debug!(path = %self.path, %mode, "backend detected");
            mode
        })
    }

    /// Re-tag the handle. The path is kept; nothing from the previous
    /// backend survives.
    pub fn set_mode(&mut self, mode: OpenMode) {
        self.mode = OnceLock::from(mode);
    }

    /// Point the handle at another path on the same backend.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
        self.name = None;
    }

    /// Override the display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// The path as the backend addresses it.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The shared context.
    #[inline]
    pub fn context(&self) -> &Arc<FsContext> {
        &self.ctx
    }

    /// Display name: the explicit name if one was given, else the leaf of
    /// the path.
    pub fn name(&self) -> &str {
        self.name
            .as_deref()
            .unwrap_or_else(|| path::leaf_name(&self.path))
    }

    /// The path without credentials or port, for display.
    pub fn readable_path(&self) -> String {
        path::readable_path(&self.path)
    }

    /// Path of the containing directory, if the path has one.
    pub fn parent(&self) -> Option<&str> {
        path::parent_path(&self.path)
    }

    /// Leaf name of the containing directory.
    pub fn parent_name(&self) -> &str {
        path::parent_name(&self.path)
    }

    /// The name without its last extension.
    pub fn name_without_extension(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(idx) => &name[..idx],
            None => name,
        }
    }

    /// Whether the path is one of the pseudo-root tokens.
    pub fn is_custom_path(&self) -> bool {
        path::is_custom_path(&self.path)
    }

    /// Whether this is a regular file on the local disk (with or without
    /// privileges).
    ///
    /// Performs a directory check, so it may touch the backend.
    pub fn is_simple_file(&self) -> bool {
        self.mode().is_local_disk() && !self.is_custom_path() && !self.is_directory()
    }

    /// Served by the unprivileged local backend.
    pub fn is_local(&self) -> bool {
        self.mode() == OpenMode::File
    }

    /// Served through the privileged shell.
    pub fn is_root(&self) -> bool {
        self.mode() == OpenMode::Root
    }

    /// On an SFTP host.
    pub fn is_sftp(&self) -> bool {
        self.mode() == OpenMode::Sftp
    }

    /// On an SMB share.
    pub fn is_smb(&self) -> bool {
        self.mode() == OpenMode::Smb
    }

    /// On the USB volume.
    pub fn is_otg(&self) -> bool {
        self.mode() == OpenMode::Otg
    }

    /// A document-provider document.
    pub fn is_document(&self) -> bool {
        self.mode() == OpenMode::DocumentFile
    }

    /// In a cloud account.
    pub fn is_cloud(&self) -> bool {
        self.mode().is_cloud()
    }

    fn backend(&self) -> Backend<'_> {
        Backend::new(self.mode(), &self.path, &self.ctx)
    }
}

impl FileOps for VirtualFile {
    fn modified(&self) -> SystemTime {
        self.backend().modified()
    }

    fn size(&self) -> u64 {
        self.backend().size()
    }

    fn is_directory(&self) -> bool {
        self.backend().is_directory()
    }

    fn directory_size(&self) -> u64 {
        self.backend().directory_size()
    }

    fn usable_space(&self) -> u64 {
        self.backend().usable_space()
    }

    fn total_space(&self) -> u64 {
        self.backend().total_space()
    }

    fn for_each_child(
        &self,
        include_hidden: bool,
        on_entry: &mut dyn FnMut(DirEntry),
    ) -> Result<(), FsError> {
        self.backend().for_each_child(include_hidden, on_entry)
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>, FsError> {
        self.backend().open_read()
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>, FsError> {
        self.backend().open_write()
    }

    fn exists(&self) -> bool {
        self.backend().exists()
    }

    fn create_directory(&self) -> Result<(), FsError> {
        self.backend().create_directory()
    }

    fn delete(&self, use_privileged: bool) -> Result<bool, FsError> {
        self.backend().delete(use_privileged)
    }

    fn set_modified(&self, time: SystemTime) -> bool {
        self.backend().set_modified(time)
    }
}
