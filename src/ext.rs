//! # Extension Traits
//!
//! Convenience methods on top of [`FileOps`].
//!
//! ## Overview
//!
//! [`FileOpsExt`] provides commonly-needed helpers that are not part of the
//! backend surface. They are default methods with a blanket
//! implementation, so every backend and every
//! [`VirtualFile`](crate::VirtualFile) gets them for free.
//!
//! ## Available Methods
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`is_file`](FileOpsExt::is_file) | Exists and is not a directory |
//! | [`collect_children`](FileOpsExt::collect_children) | Gather a listing into a `Vec` |
//! | [`read_bytes`](FileOpsExt::read_bytes) | Read the whole entry |
//! | [`write_bytes`](FileOpsExt::write_bytes) | Replace the entry's contents |
//!
//! ## JSON Support (Feature-Gated)
//!
//! With the `serde` feature enabled, [`FileOpsJson`] adds `read_json` and
//! `write_json`.
//!
//! ```toml
//! [dependencies]
//! anyfs-hybrid = { version = "0.1", features = ["serde"] }
//! ```

use std::io::{Read, Write};

use crate::{DirEntry, FileOps, FsError};

/// Extension methods for anything implementing [`FileOps`].
///
/// # Example
///
/// ```rust
/// use anyfs_hybrid::{FileOps, FileOpsExt, FsError};
///
/// fn visible_names<F: FileOps>(dir: &F) -> Result<Vec<String>, FsError> {
///     Ok(dir
///         .collect_children(false)?
///         .into_iter()
///         .map(|entry| entry.name)
///         .collect())
/// }
/// ```
pub trait FileOpsExt: FileOps {
    /// Whether the entry exists and is not a directory.
    ///
    /// Like every query this never fails; backend errors read as `false`.
    fn is_file(&self) -> bool {
        self.exists() && !self.is_directory()
    }

    /// Collect the children into a `Vec`.
    ///
    /// Prefer [`FileOps::for_each_child`] for large directories. When
    /// enumeration fails part-way the partial listing is discarded and the
    /// error returned.
    fn collect_children(&self, include_hidden: bool) -> Result<Vec<DirEntry>, FsError> {
        let mut children = Vec::new();
        self.for_each_child(include_hidden, &mut |entry| children.push(entry))?;
        Ok(children)
    }

    /// Read the entire contents.
    fn read_bytes(&self) -> Result<Vec<u8>, FsError> {
        let mut data = Vec::new();
        self.open_read()?
            .read_to_end(&mut data)
            .map_err(|e| FsError::io("read_bytes", "", e))?;
        Ok(data)
    }

    /// Replace the contents with `data`.
    ///
    /// The stream is flushed before it is dropped, so backends that stage
    /// writes have committed (or reported why they could not) by the time
    /// this returns.
    fn write_bytes(&self, data: &[u8]) -> Result<(), FsError> {
        let mut stream = self.open_write()?;
        stream
            .write_all(data)
            .and_then(|()| stream.flush())
            .map_err(|e| FsError::from_stream("write_bytes", "", e))
    }
}

// Blanket implementation - any FileOps gets FileOpsExt for free
impl<F: FileOps + ?Sized> FileOpsExt for F {}

// =============================================================================
// JSON Support (Feature-Gated)
// =============================================================================

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use serde::{Serialize, de::DeserializeOwned};

    /// JSON serialization extension methods.
    ///
    /// Available when the `serde` feature is enabled.
    pub trait FileOpsJson: FileOps {
        /// Read the entry and deserialize it as JSON.
        ///
        /// # Errors
        ///
        /// - Errors from [`FileOps::open_read`]
        /// - `FsError::Deserialization` if the content is not valid JSON for `T`
        fn read_json<T: DeserializeOwned>(&self) -> Result<T, FsError> {
            let reader = self.open_read()?;
            serde_json::from_reader(reader).map_err(|e| FsError::Deserialization(e.to_string()))
        }

        /// Serialize `value` as pretty-printed JSON and write it.
        ///
        /// # Errors
        ///
        /// - `FsError::Serialization` if `value` cannot be serialized
        /// - Errors from [`FileOps::open_write`]
        fn write_json<T: Serialize>(&self, value: &T) -> Result<(), FsError> {
            let json = serde_json::to_vec_pretty(value)
                .map_err(|e| FsError::Serialization(e.to_string()))?;
            self.write_bytes(&json)
        }
    }

    // Blanket implementation
    impl<F: FileOps + ?Sized> FileOpsJson for F {}
}

#[cfg(feature = "serde")]
pub use json::FileOpsJson;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileType, Permissions};
    use std::sync::Mutex;
    use std::time::SystemTime;

    /// Mock backend for testing
    struct MockFile {
        exists: bool,
        directory: bool,
        written: std::sync::Arc<Mutex<Vec<u8>>>,
    }

    struct SharedSink(std::sync::Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn entry(name: &str) -> DirEntry {
        DirEntry {
            name: name.into(),
            path: format!("/mock/{name}"),
            file_type: FileType::File,
            size: 1,
            modified: SystemTime::UNIX_EPOCH,
            permissions: Permissions::default_file(),
        }
    }

    impl FileOps for MockFile {
        fn modified(&self) -> SystemTime {
            SystemTime::UNIX_EPOCH
        }
        fn size(&self) -> u64 {
            0
        }
        fn is_directory(&self) -> bool {
            self.directory
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
        fn for_each_child(
            &self,
            include_hidden: bool,
            on_entry: &mut dyn FnMut(DirEntry),
        ) -> Result<(), FsError> {
            on_entry(entry("a"));
            if include_hidden {
                on_entry(entry(".b"));
            }
            Err(FsError::Transport {
                operation: "list",
                reason: "dropped".into(),
            })
        }
        fn open_read(&self) -> Result<Box<dyn Read + Send>, FsError> {
            Ok(Box::new(std::io::Cursor::new(b"{\"n\":1}".to_vec())))
        }
        fn open_write(&self) -> Result<Box<dyn Write + Send>, FsError> {
            Ok(Box::new(SharedSink(self.written.clone())))
        }
        fn exists(&self) -> bool {
            self.exists
        }
        fn create_directory(&self) -> Result<(), FsError> {
            Ok(())
        }
        fn delete(&self, _: bool) -> Result<bool, FsError> {
            Ok(true)
        }
        fn set_modified(&self, _: SystemTime) -> bool {
            false
        }
    }

    fn mock(exists: bool, directory: bool) -> MockFile {
        MockFile {
            exists,
            directory,
            written: Default::default(),
        }
    }

    #[test]
    fn is_file_requires_existence() {
        assert!(mock(true, false).is_file());
        assert!(!mock(true, true).is_file());
        assert!(!mock(false, false).is_file());
    }

    #[test]
    fn collect_children_surfaces_enumeration_error() {
        let result = mock(true, true).collect_children(true);
        assert!(matches!(result, Err(FsError::Transport { .. })));
    }

    #[test]
    fn read_and_write_bytes() {
        let file = mock(true, false);
        assert_eq!(file.read_bytes().unwrap(), b"{\"n\":1}");
        file.write_bytes(b"xyz").unwrap();
        assert_eq!(*file.written.lock().unwrap(), b"xyz");
    }

    #[test]
    fn works_through_trait_objects() {
        let file = mock(true, false);
        let dynamic: &dyn FileOps = &file;
        assert!(dynamic.is_file());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip() {
        #[derive(serde::Deserialize, serde::Serialize, PartialEq, Debug)]
        struct Doc {
            n: u32,
        }
        let file = mock(true, false);
        assert_eq!(file.read_json::<Doc>().unwrap(), Doc { n: 1 });
        file.write_json(&Doc { n: 2 }).unwrap();
        let written = file.written.lock().unwrap().clone();
        assert_eq!(serde_json::from_slice::<Doc>(&written).unwrap(), Doc { n: 2 });
    }
}
