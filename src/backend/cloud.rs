//! Cloud backend for the `box://`, `onedrive://`, `gdrive://` and
//! `dropbox://` accounts.
//!
//! Accounts address entries by account path (`/Photos/2024`), so the
//! provider prefix is stripped before every call. Writes spool into the
//! scratch directory and are uploaded when the stream is flushed or
//! dropped.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::SystemTime;

use super::{degrade, visible};
use crate::stream::StagedWriter;
use crate::{
    CloudMetadata, CloudStorage, DirEntry, FileOps, FileType, FsContext, FsError, OpenMode,
    Permissions, fallback_modified, path,
};

/// An entry in a signed-in cloud account.
pub(crate) struct CloudFile<'a> {
    mode: OpenMode,
    path: &'a str,
    ctx: &'a FsContext,
}

impl<'a> CloudFile<'a> {
    pub(crate) fn new(mode: OpenMode, path: &'a str, ctx: &'a FsContext) -> Self {
        Self { mode, path, ctx }
    }

    fn account(&self) -> Result<&dyn CloudStorage, FsError> {
        self.ctx.cloud(self.mode)
    }

    fn account_path(&self) -> String {
        path::strip_cloud_prefix(self.mode, self.path)
    }

    fn metadata(&self) -> Result<CloudMetadata, FsError> {
        self.account()?.metadata(&self.account_path())
    }

    /// Facade path of an entry reported by the account.
    fn entry_path(&self, account_path: &str) -> String {
        let prefix = self.mode.prefix().unwrap_or_default();
        format!("{prefix}{}", account_path.trim_start_matches(path::SEPARATOR))
    }
}

fn folder_size(account: &dyn CloudStorage, folder: &str) -> Result<u64, FsError> {
    let mut children = Vec::new();
    account.for_each_child(folder, &mut |child| children.push(child))?;
    let mut total = 0;
    for child in children {
        total += if child.folder {
            folder_size(account, &child.path)?
        } else {
            child.size
        };
    }
    Ok(total)
}

impl FileOps for CloudFile<'_> {
    fn modified(&self) -> SystemTime {
        let result = self
            .metadata()
            .map(|meta| meta.modified.unwrap_or_else(fallback_modified));
        degrade(result, "modified", self.path, fallback_modified())
    }

    fn size(&self) -> u64 {
        let result = self
            .metadata()
            .map(|meta| if meta.folder { 0 } else { meta.size });
        degrade(result, "size", self.path, 0)
    }

    fn is_directory(&self) -> bool {
        degrade(
            self.metadata().map(|meta| meta.folder),
            "is_directory",
            self.path,
            false,
        )
    }

    fn directory_size(&self) -> u64 {
        let result = self
            .account()
            .and_then(|account| folder_size(account, &self.account_path()));
        degrade(result, "directory_size", self.path, 0)
    }

    fn usable_space(&self) -> u64 {
        let result = self
            .account()
            .and_then(|account| account.allocation())
            .map(|space| space.available());
        degrade(result, "usable_space", self.path, 0)
    }

    fn total_space(&self) -> u64 {
        let result = self
            .account()
            .and_then(|account| account.allocation())
            .map(|space| space.total);
        degrade(result, "total_space", self.path, 0)
    }

    fn for_each_child(
        &self,
        include_hidden: bool,
        on_entry: &mut dyn FnMut(DirEntry),
    ) -> Result<(), FsError> {
        self.account()?
            .for_each_child(&self.account_path(), &mut |child| {
                if !visible(&child.name, include_hidden) {
                    return;
                }
                let (file_type, permissions) = if child.folder {
                    (FileType::Directory, Permissions::default_dir())
                } else {
                    (FileType::File, Permissions::default_file())
                };
                on_entry(DirEntry {
                    path: self.entry_path(&child.path),
                    name: child.name,
                    file_type,
                    size: child.size,
                    modified: child.modified.unwrap_or_else(fallback_modified),
                    permissions,
                });
            })
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>, FsError> {
        self.account()?.download(&self.account_path())
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>, FsError> {
        let account = self.ctx.cloud_handle(self.mode)?;
        let target = self.account_path();
        let parent = path::parent_path(&target).unwrap_or("/");
        if !account.metadata(parent)?.folder {
            return Err(FsError::NotADirectory {
                path: parent.into(),
            });
        }
        let writer = StagedWriter::new(
            self.ctx.scratch_dir(),
            self.path,
            Box::new(move |staged: &Path| {
                let mut file = File::open(staged).map_err(|e| FsError::io("upload", staged, e))?;
                let size = file
                    .metadata()
                    .map_err(|e| FsError::io("upload", staged, e))?
                    .len();
                account.upload(&target, &mut file, size, true)
            }),
        )?;
        Ok(Box::new(writer))
    }

    fn exists(&self) -> bool {
        let result = self
            .account()
            .and_then(|account| account.exists(&self.account_path()));
        degrade(result, "exists", self.path, false)
    }

    fn create_directory(&self) -> Result<(), FsError> {
        let account = self.account()?;
        let target = self.account_path();
        if account.exists(&target)? {
            return Ok(());
        }
        account.create_folder(&target)
    }

    fn delete(&self, _use_privileged: bool) -> Result<bool, FsError> {
        self.account()?.delete(&self.account_path())?;
        Ok(!self.exists())
    }

    fn set_modified(&self, _time: SystemTime) -> bool {
        tracing::debug!(path = self.path, mode = %self.mode, "cloud accounts keep their own timestamps");
        false
    }
}
