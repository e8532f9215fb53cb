//! Local disk backend.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::time::SystemTime;

use filetime::FileTime;
use walkdir::WalkDir;

use super::{degrade, visible};
use crate::{
    DirEntry, FileOps, FileType, FsError, OpenMode, Permissions, fallback_modified, path,
};

/// A path on a locally mounted filesystem.
pub(crate) struct LocalFile<'a> {
    path: &'a str,
}

impl<'a> LocalFile<'a> {
    pub(crate) fn new(path: &'a str) -> Self {
        Self { path }
    }

    fn as_path(&self) -> &Path {
        Path::new(self.path)
    }

    fn metadata(&self, operation: &'static str) -> Result<fs::Metadata, FsError> {
        fs::metadata(self.as_path()).map_err(|e| FsError::io(operation, self.path, e))
    }
}

/// Sum the sizes of every regular file below `root`.
///
/// Unreadable entries are skipped.
pub(crate) fn tree_size(root: &Path) -> u64 {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(path = %root.display(), error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

/// Convert `std::fs` metadata into a listing entry.
pub(crate) fn dir_entry(name: String, path: String, meta: &fs::Metadata) -> DirEntry {
    let file_type = if meta.is_dir() {
        FileType::Directory
    } else if meta.file_type().is_symlink() {
        FileType::Symlink
    } else {
        FileType::File
    };
    DirEntry {
        name,
        path,
        file_type,
        size: if meta.is_dir() { 0 } else { meta.len() },
        modified: meta.modified().unwrap_or_else(|_| fallback_modified()),
        permissions: permissions(meta),
    }
}

#[cfg(unix)]
fn permissions(meta: &fs::Metadata) -> Permissions {
    use std::os::unix::fs::PermissionsExt;
    Permissions::from_mode(meta.permissions().mode())
}

#[cfg(not(unix))]
fn permissions(meta: &fs::Metadata) -> Permissions {
    if meta.permissions().readonly() {
        Permissions::from_mode(0o444)
    } else if meta.is_dir() {
        Permissions::default_dir()
    } else {
        Permissions::default_file()
    }
}

impl FileOps for LocalFile<'_> {
    fn modified(&self) -> SystemTime {
        let result = self.metadata("modified").and_then(|meta| {
            meta.modified()
                .map_err(|e| FsError::io("modified", self.path, e))
        });
        degrade(result, "modified", self.path, fallback_modified())
    }

    fn size(&self) -> u64 {
        let result = self
            .metadata("size")
            .map(|meta| if meta.is_dir() { 0 } else { meta.len() });
        degrade(result, "size", self.path, 0)
    }

    fn is_directory(&self) -> bool {
        let result = self.metadata("is_directory").map(|meta| meta.is_dir());
        degrade(result, "is_directory", self.path, false)
    }

    fn directory_size(&self) -> u64 {
        tree_size(self.as_path())
    }

    fn usable_space(&self) -> u64 {
        let result =
            fs2::available_space(self.as_path()).map_err(|e| FsError::io("usable_space", self.path, e));
        degrade(result, "usable_space", self.path, 0)
    }

    fn total_space(&self) -> u64 {
        let result =
            fs2::total_space(self.as_path()).map_err(|e| FsError::io("total_space", self.path, e));
        degrade(result, "total_space", self.path, 0)
    }

    fn for_each_child(
        &self,
        include_hidden: bool,
        on_entry: &mut dyn FnMut(DirEntry),
    ) -> Result<(), FsError> {
        let entries = fs::read_dir(self.as_path()).map_err(|e| FsError::io("read_dir", self.path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| FsError::io("read_dir", self.path, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !visible(&name, include_hidden) {
                continue;
            }
            // Follow symlinks; fall back to the link itself when it dangles.
            let meta = match fs::metadata(entry.path()) {
                Ok(meta) => meta,
                Err(_) => match entry.metadata() {
                    Ok(meta) => meta,
                    Err(e) => {
                        tracing::warn!(path = %entry.path().display(), error = %e, "skipping unreadable entry");
                        continue;
                    }
                },
            };
            let child = path::join(OpenMode::File, self.path, &name, meta.is_dir());
            on_entry(dir_entry(name, child, &meta));
        }
        Ok(())
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>, FsError> {
        let file = File::open(self.as_path()).map_err(|e| FsError::io("open_read", self.path, e))?;
        Ok(Box::new(file))
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>, FsError> {
        let file = File::create(self.as_path()).map_err(|e| FsError::io("open_write", self.path, e))?;
        Ok(Box::new(file))
    }

    fn exists(&self) -> bool {
        self.as_path().exists()
    }

    fn create_directory(&self) -> Result<(), FsError> {
        if self.exists() {
            return if self.is_directory() {
                Ok(())
            } else {
                Err(FsError::AlreadyExists {
                    path: self.path.into(),
                    operation: "create_directory",
                })
            };
        }
        fs::create_dir(self.as_path()).map_err(|e| FsError::io("create_directory", self.path, e))
    }

    fn delete(&self, _use_privileged: bool) -> Result<bool, FsError> {
        let meta = fs::symlink_metadata(self.as_path()).map_err(|e| FsError::io("delete", self.path, e))?;
        let result = if meta.is_dir() {
            fs::remove_dir_all(self.as_path())
        } else {
            fs::remove_file(self.as_path())
        };
        result.map_err(|e| FsError::io("delete", self.path, e))?;
        Ok(!self.exists())
    }

    fn set_modified(&self, time: SystemTime) -> bool {
        let result = filetime::set_file_mtime(self.as_path(), FileTime::from_system_time(time));
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path = self.path, error = %e, "failed to set modification time");
                false
            }
        }
    }
}
