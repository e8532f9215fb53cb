//! Cloud account collaborators.

use std::io::Read;
use std::time::SystemTime;

use crate::{FsError, SpaceAllocation};

/// Metadata returned by a cloud provider.
#[derive(Debug, Clone)]
pub struct CloudMetadata {
    /// Leaf name.
    pub name: String,
    /// Path inside the account, starting with `/`.
    pub path: String,
    /// Whether the entry is a folder.
    pub folder: bool,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, if the provider reports one.
    pub modified: Option<SystemTime>,
}

/// One signed-in cloud account.
///
/// Paths are account paths: the provider prefix already replaced by `/`.
pub trait CloudStorage: Send + Sync {
    /// Metadata of `path`.
    fn metadata(&self, path: &str) -> Result<CloudMetadata, FsError>;

    /// Push each child of the folder at `path` to `on_child`.
    fn for_each_child(
        &self,
        path: &str,
        on_child: &mut dyn FnMut(CloudMetadata),
    ) -> Result<(), FsError>;

    /// Whether `path` exists.
    fn exists(&self, path: &str) -> Result<bool, FsError>;

    /// Create a folder.
    fn create_folder(&self, path: &str) -> Result<(), FsError>;

    /// Delete a file or folder.
    fn delete(&self, path: &str) -> Result<(), FsError>;

    /// Download a file.
    fn download(&self, path: &str) -> Result<Box<dyn Read + Send>, FsError>;

    /// Upload `size` bytes from `data` to `path`.
    fn upload(
        &self,
        path: &str,
        data: &mut dyn Read,
        size: u64,
        overwrite: bool,
    ) -> Result<(), FsError>;

    /// Quota of the account.
    fn allocation(&self) -> Result<SpaceAllocation, FsError>;
}
