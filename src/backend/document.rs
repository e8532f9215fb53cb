//! Document-provider backend, serving both `content://` documents and the
//! `otg://` USB volume.
//!
//! Nothing here touches a path directly: every operation first resolves
//! the path to a [`DocumentNode`] through the registered
//! [`DocumentResolver`](crate::DocumentResolver), under the provider root
//! granted for the mode.

use std::io::{Read, Write};
use std::time::SystemTime;

use super::{degrade, visible};
use crate::{
    DirEntry, DocumentNode, DocumentResolver, FileOps, FsContext, FsError, OpenMode,
    Permissions, fallback_modified, path,
};

/// A document reached through the provider.
pub(crate) struct DocumentFile<'a> {
    mode: OpenMode,
    path: &'a str,
    ctx: &'a FsContext,
}

impl<'a> DocumentFile<'a> {
    pub(crate) fn new(mode: OpenMode, path: &'a str, ctx: &'a FsContext) -> Self {
        Self { mode, path, ctx }
    }

    fn resolve(&self, path: &str, create: bool) -> Result<Option<DocumentNode>, FsError> {
        self.ctx
            .documents()?
            .resolve(self.ctx.document_root(self.mode), path, create)
    }

    fn node(&self, create: bool) -> Result<DocumentNode, FsError> {
        self.resolve(self.path, create)?
            .ok_or_else(|| FsError::NotFound {
                path: self.path.into(),
            })
    }
}

fn node_tree_size(resolver: &dyn DocumentResolver, node: &DocumentNode) -> Result<u64, FsError> {
    let mut children = Vec::new();
    resolver.for_each_child(node, &mut |child| children.push(child))?;
    let mut total = 0;
    for child in children {
        total += if child.is_dir() {
            node_tree_size(resolver, &child)?
        } else {
            child.size
        };
    }
    Ok(total)
}

impl FileOps for DocumentFile<'_> {
    fn modified(&self) -> SystemTime {
        degrade(
            self.node(false).map(|node| node.modified),
            "modified",
            self.path,
            fallback_modified(),
        )
    }

    fn size(&self) -> u64 {
        let result = self
            .node(false)
            .map(|node| if node.is_dir() { 0 } else { node.size });
        degrade(result, "size", self.path, 0)
    }

    fn is_directory(&self) -> bool {
        degrade(
            self.node(false).map(|node| node.is_dir()),
            "is_directory",
            self.path,
            false,
        )
    }

    fn directory_size(&self) -> u64 {
        let result = self
            .node(false)
            .and_then(|node| node_tree_size(self.ctx.documents()?, &node));
        degrade(result, "directory_size", self.path, 0)
    }

    fn usable_space(&self) -> u64 {
        if self.mode == OpenMode::Otg {
            return 0;
        }
        let result = self
            .ctx
            .documents()
            .and_then(|resolver| resolver.device_space())
            .map(|space| space.available());
        degrade(result, "usable_space", self.path, 0)
    }

    fn total_space(&self) -> u64 {
        if self.mode == OpenMode::Otg {
            return 0;
        }
        let result = self
            .ctx
            .documents()
            .and_then(|resolver| resolver.device_space())
            .map(|space| space.total);
        degrade(result, "total_space", self.path, 0)
    }

    fn for_each_child(
        &self,
        include_hidden: bool,
        on_entry: &mut dyn FnMut(DirEntry),
    ) -> Result<(), FsError> {
        let node = self.node(false)?;
        if !node.is_dir() {
            return Err(FsError::NotADirectory {
                path: self.path.into(),
            });
        }
        self.ctx.documents()?.for_each_child(&node, &mut |child| {
            if !visible(&child.name, include_hidden) {
                return;
            }
            let is_dir = child.is_dir();
            on_entry(DirEntry {
                path: path::join(self.mode, self.path, &child.name, is_dir),
                name: child.name,
                file_type: child.file_type,
                size: child.size,
                modified: child.modified,
                permissions: if is_dir {
                    Permissions::default_dir()
                } else {
                    Permissions::default_file()
                },
            });
        })
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>, FsError> {
        let node = self.node(false)?;
        self.ctx.documents()?.open_read(&node)
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>, FsError> {
        let node = self.node(true)?;
        self.ctx.documents()?.open_write(&node)
    }

    fn exists(&self) -> bool {
        degrade(
            self.resolve(self.path, false).map(|node| node.is_some()),
            "exists",
            self.path,
            false,
        )
    }

    fn create_directory(&self) -> Result<(), FsError> {
        if self.exists() {
            return Ok(());
        }
        let parent_path = path::parent_path(self.path).ok_or_else(|| FsError::InvalidPath {
            path: self.path.to_string(),
            reason: "no parent document".into(),
        })?;
        let parent = self
            .resolve(parent_path, true)?
            .ok_or_else(|| FsError::NotFound {
                path: parent_path.into(),
            })?;
        if !parent.is_dir() {
            return Err(FsError::NotADirectory {
                path: parent_path.into(),
            });
        }
        self.ctx
            .documents()?
            .create_directory(&parent, path::leaf_name(self.path))
            .map(|_| ())
    }

    fn delete(&self, _use_privileged: bool) -> Result<bool, FsError> {
        let node = self.node(false)?;
        self.ctx.documents()?.delete(&node)?;
        Ok(!self.exists())
    }

    fn set_modified(&self, _time: SystemTime) -> bool {
        tracing::debug!(path = self.path, mode = %self.mode, "provider documents keep their own timestamps");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileType, SpaceAllocation};
    use std::sync::Arc;

    /// A provider that only knows a fixed tree of documents.
    struct FixedTree;

    fn doc(path: &str, file_type: FileType, size: u64) -> DocumentNode {
        DocumentNode {
            uri: format!("uri:{path}"),
            name: path::leaf_name(path).to_string(),
            file_type,
            size,
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    impl DocumentResolver for FixedTree {
        fn resolve(
            &self,
            _root: Option<&str>,
            path: &str,
            _create: bool,
        ) -> Result<Option<DocumentNode>, FsError> {
            Ok(match path {
                "content://p/dir" | "otg://usb/dir" => Some(doc(path, FileType::Directory, 0)),
                "content://p/dir/sub" => Some(doc(path, FileType::Directory, 0)),
                _ => None,
            })
        }

        fn for_each_child(
            &self,
            node: &DocumentNode,
            on_child: &mut dyn FnMut(DocumentNode),
        ) -> Result<(), FsError> {
            match node.uri.as_str() {
                "uri:content://p/dir" | "uri:otg://usb/dir" => {
                    on_child(doc("content://p/dir/a.txt", FileType::File, 10));
                    on_child(doc("content://p/dir/.nomedia", FileType::File, 1));
                    on_child(doc("content://p/dir/sub", FileType::Directory, 0));
                }
                "uri:content://p/dir/sub" => on_child(doc("content://p/dir/sub/b", FileType::File, 5)),
                _ => {}
            }
            Ok(())
        }

        fn create_directory(&self, _: &DocumentNode, _: &str) -> Result<DocumentNode, FsError> {
            Err(FsError::Backend("read-only".into()))
        }

        fn delete(&self, _: &DocumentNode) -> Result<(), FsError> {
            Err(FsError::Backend("read-only".into()))
        }

        fn open_read(&self, _: &DocumentNode) -> Result<Box<dyn Read + Send>, FsError> {
            Ok(Box::new(std::io::empty()))
        }

        fn open_write(&self, _: &DocumentNode) -> Result<Box<dyn Write + Send>, FsError> {
            Ok(Box::new(std::io::sink()))
        }

        fn device_space(&self) -> Result<SpaceAllocation, FsError> {
            Ok(SpaceAllocation {
                total: 1000,
                used: 250,
            })
        }
    }

    fn ctx() -> FsContext {
        FsContext::builder().documents(Arc::new(FixedTree)).build()
    }

    #[test]
    fn directory_size_recurses() {
        let ctx = ctx();
        let dir = DocumentFile::new(OpenMode::DocumentFile, "content://p/dir", &ctx);
        assert!(dir.is_directory());
        assert_eq!(dir.directory_size(), 16);
    }

    #[test]
    fn listing_filters_hidden_and_joins_paths() {
        let ctx = ctx();
        let dir = DocumentFile::new(OpenMode::DocumentFile, "content://p/dir", &ctx);
        let mut entries = Vec::new();
        dir.for_each_child(false, &mut |e| entries.push(e)).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["content://p/dir/a.txt", "content://p/dir/sub"]);
    }

    #[test]
    fn device_space_only_for_documents() {
        let ctx = ctx();
        let doc = DocumentFile::new(OpenMode::DocumentFile, "content://p/dir", &ctx);
        assert_eq!(doc.usable_space(), 750);
        assert_eq!(doc.total_space(), 1000);

        let otg = DocumentFile::new(OpenMode::Otg, "otg://usb/dir", &ctx);
        assert_eq!(otg.usable_space(), 0);
        assert_eq!(otg.total_space(), 0);
    }

    #[test]
    fn missing_document_reports_not_found() {
        let ctx = ctx();
        let missing = DocumentFile::new(OpenMode::DocumentFile, "content://p/none", &ctx);
        assert!(!missing.exists());
        assert!(matches!(missing.open_read(), Err(FsError::NotFound { .. })));
        assert!(!missing.set_modified(SystemTime::now()));
    }
}
