//! Document-provider collaborators, used by the Document and OTG backends.

use std::io::{Read, Write};
use std::time::SystemTime;

use crate::{FileType, FsError, SpaceAllocation};

/// A document resolved by the provider.
#[derive(Debug, Clone)]
pub struct DocumentNode {
    /// Provider URI of the document.
    pub uri: String,
    /// Display name.
    pub name: String,
    /// File or directory.
    pub file_type: FileType,
    /// Length in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
}

impl DocumentNode {
    /// Returns `true` if the document is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

/// Capability-scoped access to documents through a provider.
///
/// Every call is a round trip to the provider.
pub trait DocumentResolver: Send + Sync {
    /// Find the document for `path` under the granted `root`.
    ///
    /// With `create_if_missing`, missing intermediate directories and the
    /// final document are created. Returns `Ok(None)` when the document does
    /// not exist and was not created.
    fn resolve(
        &self,
        root: Option<&str>,
        path: &str,
        create_if_missing: bool,
    ) -> Result<Option<DocumentNode>, FsError>;

    /// Push each child of `node` to `on_child`.
    fn for_each_child(
        &self,
        node: &DocumentNode,
        on_child: &mut dyn FnMut(DocumentNode),
    ) -> Result<(), FsError>;

    /// Create a directory called `name` inside `parent`.
    fn create_directory(&self, parent: &DocumentNode, name: &str) -> Result<DocumentNode, FsError>;

    /// Delete a document.
    fn delete(&self, node: &DocumentNode) -> Result<(), FsError>;

    /// Open a document for reading.
    fn open_read(&self, node: &DocumentNode) -> Result<Box<dyn Read + Send>, FsError>;

    /// Open a document for writing.
    fn open_write(&self, node: &DocumentNode) -> Result<Box<dyn Write + Send>, FsError>;

    /// Space of the whole storage device behind the provider.
    fn device_space(&self) -> Result<SpaceAllocation, FsError>;
}
