//! Shared machinery for the session-based network backends (SFTP, SMB).
//!
//! Every operation is one unit of work against one freshly opened session:
//! connect, run, close. Streams keep their session open until dropped, see
//! [`SessionStream`].

use std::io::{Read, Write};
use std::marker::PhantomData;
use std::time::SystemTime;

use super::{degrade, visible};
use crate::stream::SessionStream;
use crate::{
    DirEntry, FileOps, FileType, FsContext, FsError, Metadata, OpenMode, RemoteRead,
    RemoteSession, RemoteWrite, fallback_modified, path,
};

/// How one protocol addresses entries on its sessions.
pub(crate) trait Protocol: Send + Sync {
    const MODE: OpenMode;

    /// Path handed to the session for `path`.
    fn remote_path(path: &str) -> Result<&str, FsError>;

    /// Whether the server reports the capacity of the volume.
    const REPORTS_TOTAL_SPACE: bool;
}

/// Session key (`scheme://userinfo@host:port`) of a remote path.
pub(crate) fn session_key(path: &str) -> Result<&str, FsError> {
    path::split_authority(path)
        .map(|(key, _)| key)
        .ok_or_else(|| FsError::InvalidPath {
            path: path.to_string(),
            reason: "missing scheme".into(),
        })
}

/// Connect, run `work`, close. The session is closed on every path.
pub(crate) fn with_session<T>(
    ctx: &FsContext,
    mode: OpenMode,
    path: &str,
    work: impl FnOnce(&mut dyn RemoteSession) -> Result<T, FsError>,
) -> Result<T, FsError> {
    let mut session = connect(ctx, mode, path)?;
    let result = work(session.as_mut());
    if let Err(e) = session.close() {
        tracing::warn!(path, error = %e, "error closing remote session");
    }
    result
}

/// Like [`with_session`], but a failed unit of work yields `None`.
pub(crate) fn execute<T>(
    ctx: &FsContext,
    mode: OpenMode,
    path: &str,
    operation: &'static str,
    work: impl FnOnce(&mut dyn RemoteSession) -> Result<T, FsError>,
) -> Option<T> {
    degrade(with_session(ctx, mode, path, work).map(Some), operation, path, None)
}

fn connect(ctx: &FsContext, mode: OpenMode, path: &str) -> Result<Box<dyn RemoteSession>, FsError> {
    let key = session_key(path)?;
    let target = ctx.session_target(mode, key);
    tracing::debug!(%mode, key, "opening remote session");
    ctx.connector(mode)?.connect(&target)
}

/// `stat`, with a missing entry mapped to `None`.
fn stat_opt(session: &mut dyn RemoteSession, path: &str) -> Result<Option<Metadata>, FsError> {
    match session.stat(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(FsError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// A path on a server reached through remote sessions.
pub(crate) struct RemoteFile<'a, P> {
    path: &'a str,
    ctx: &'a FsContext,
    _protocol: PhantomData<P>,
}

impl<'a, P: Protocol> RemoteFile<'a, P> {
    pub(crate) fn new(path: &'a str, ctx: &'a FsContext) -> Self {
        Self {
            path,
            ctx,
            _protocol: PhantomData,
        }
    }

    fn execute<T>(
        &self,
        operation: &'static str,
        work: impl FnOnce(&mut dyn RemoteSession, &str) -> Result<T, FsError>,
    ) -> Option<T> {
        execute(self.ctx, P::MODE, self.path, operation, |session| {
            work(session, P::remote_path(self.path)?)
        })
    }

    fn with_session<T>(
        &self,
        work: impl FnOnce(&mut dyn RemoteSession, &str) -> Result<T, FsError>,
    ) -> Result<T, FsError> {
        with_session(self.ctx, P::MODE, self.path, |session| {
            work(session, P::remote_path(self.path)?)
        })
    }

    fn child_path(&self, name: &str, is_dir: bool) -> String {
        path::join(P::MODE, self.path, name, is_dir)
    }
}

/// Resolve a listed entry, following symlinks.
///
/// Returns `None` (and logs) for links whose target cannot be read.
fn resolve_entry(
    session: &mut dyn RemoteSession,
    parent: &str,
    entry: crate::RemoteEntry,
    join: &dyn Fn(&str, &str, bool) -> String,
) -> Option<(String, Metadata)> {
    if entry.metadata.file_type != FileType::Symlink {
        return Some((entry.name, entry.metadata));
    }
    let target = join(parent, &entry.name, false);
    match session.stat(&target) {
        Ok(meta) => Some((entry.name, meta)),
        Err(e) => {
            tracing::warn!(path = %target, error = %e, "skipping unresolvable link");
            None
        }
    }
}

fn remote_join<P: Protocol>(parent: &str, name: &str, is_dir: bool) -> String {
    path::join(P::MODE, parent, name, is_dir)
}

/// Total size of the files below `dir`, recursing through subdirectories.
///
/// Links to files count their target's size. Links to directories are not
/// descended, so a link back to an ancestor cannot recurse.
fn tree_size<P: Protocol>(session: &mut dyn RemoteSession, dir: &str) -> Result<u64, FsError> {
    let mut total = 0;
    for entry in session.list(dir)? {
        total += match entry.metadata.file_type {
            FileType::Directory => {
                let child = remote_join::<P>(dir, &entry.name, true);
                tree_size::<P>(session, &child)?
            }
            FileType::Symlink => match resolve_entry(session, dir, entry, &remote_join::<P>) {
                Some((_, target)) if !target.is_dir() => target.size,
                _ => 0,
            },
            _ => entry.metadata.size,
        };
    }
    Ok(total)
}

/// Remove `target` and, for directories, everything below it.
fn remove_tree<P: Protocol>(
    session: &mut dyn RemoteSession,
    target: &str,
    meta: &Metadata,
) -> Result<(), FsError> {
    if !meta.is_dir() {
        return session.remove_file(target);
    }
    for entry in session.list(target)? {
        let is_dir = entry.metadata.is_dir();
        let child = remote_join::<P>(target, &entry.name, is_dir);
        remove_tree::<P>(session, &child, &entry.metadata)?;
    }
    session.remove_dir(target)
}

impl<P: Protocol> FileOps for RemoteFile<'_, P> {
    fn modified(&self) -> SystemTime {
        self.execute("modified", |s, p| s.stat(p).map(|meta| meta.modified))
            .unwrap_or_else(fallback_modified)
    }

    fn size(&self) -> u64 {
        self.execute("size", |s, p| {
            s.stat(p).map(|meta| if meta.is_dir() { 0 } else { meta.size })
        })
        .unwrap_or(0)
    }

    fn is_directory(&self) -> bool {
        self.execute("is_directory", |s, p| s.stat(p).map(|meta| meta.is_dir()))
            .unwrap_or(false)
    }

    fn directory_size(&self) -> u64 {
        self.execute("directory_size", |s, p| tree_size::<P>(s, p))
            .unwrap_or(0)
    }

    fn usable_space(&self) -> u64 {
        self.execute("usable_space", |s, p| s.space(p).map(|space| space.available()))
            .unwrap_or(0)
    }

    fn total_space(&self) -> u64 {
        if !P::REPORTS_TOTAL_SPACE {
            return 0;
        }
        self.execute("total_space", |s, p| s.space(p).map(|space| space.total))
            .unwrap_or(0)
    }

    fn for_each_child(
        &self,
        include_hidden: bool,
        on_entry: &mut dyn FnMut(DirEntry),
    ) -> Result<(), FsError> {
        self.with_session(|session, remote| {
            for entry in session.list(remote)? {
                if !visible(&entry.name, include_hidden) {
                    continue;
                }
                let Some((name, meta)) = resolve_entry(session, remote, entry, &remote_join::<P>)
                else {
                    continue;
                };
                on_entry(DirEntry {
                    path: self.child_path(&name, meta.is_dir()),
                    name,
                    file_type: meta.file_type,
                    size: meta.size,
                    modified: meta.modified,
                    permissions: meta.permissions,
                });
            }
            Ok(())
        })
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>, FsError> {
        let remote = P::remote_path(self.path)?;
        let session = connect(self.ctx, P::MODE, self.path)?;
        let stream = SessionStream::<dyn RemoteRead>::open(session, remote, |s, p| s.open_read(p))?;
        Ok(Box::new(stream))
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>, FsError> {
        let remote = P::remote_path(self.path)?;
        let session = connect(self.ctx, P::MODE, self.path)?;
        let stream =
            SessionStream::<dyn RemoteWrite>::open(session, remote, |s, p| s.open_write(p))?;
        Ok(Box::new(stream))
    }

    fn exists(&self) -> bool {
        self.execute("exists", |s, p| stat_opt(s, p).map(|meta| meta.is_some()))
            .unwrap_or(false)
    }

    fn create_directory(&self) -> Result<(), FsError> {
        self.with_session(|session, remote| match stat_opt(session, remote)? {
            Some(meta) if meta.is_dir() => Ok(()),
            Some(_) => Err(FsError::AlreadyExists {
                path: self.path.into(),
                operation: "create_directory",
            }),
            None => session.mkdir(remote),
        })
    }

    fn delete(&self, _use_privileged: bool) -> Result<bool, FsError> {
        self.with_session(|session, remote| {
            let meta = session.stat(remote)?;
            remove_tree::<P>(session, remote, &meta)?;
            Ok(stat_opt(session, remote)?.is_none())
        })
    }

    fn set_modified(&self, time: SystemTime) -> bool {
        self.execute("set_modified", |s, p| s.set_modified(p, time))
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_keeps_userinfo_and_port() {
        assert_eq!(
            session_key("ssh://me:pw@host:2222/home/me").unwrap(),
            "ssh://me:pw@host:2222"
        );
        assert_eq!(session_key("smb://nas/share/").unwrap(), "smb://nas");
    }

    use crate::{Permissions, RemoteEntry, SessionConnector, SessionTarget, SpaceAllocation};
    use std::sync::Arc;

    fn meta(file_type: FileType, size: u64) -> Metadata {
        Metadata {
            file_type,
            size,
            modified: fallback_modified(),
            permissions: Permissions::default_file(),
        }
    }

    /// `/home/d` holds a file, a link to a file and a link to itself.
    struct LinkedTree;

    impl RemoteSession for LinkedTree {
        fn stat(&mut self, path: &str) -> Result<Metadata, FsError> {
            match path {
                "/home/d" | "/home/d/self" => Ok(meta(FileType::Directory, 0)),
                "/home/d/file" => Ok(meta(FileType::File, 5)),
                "/home/d/file-link" => Ok(meta(FileType::File, 7)),
                _ => Err(FsError::NotFound { path: path.into() }),
            }
        }
        fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry>, FsError> {
            let entry = |name: &str, file_type, size| RemoteEntry {
                name: name.into(),
                metadata: meta(file_type, size),
            };
            match path {
                "/home/d" => Ok(vec![
                    entry("file", FileType::File, 5),
                    entry("file-link", FileType::Symlink, 9),
                    entry("self", FileType::Symlink, 1),
                ]),
                _ => Ok(vec![entry("self", FileType::Symlink, 1)]),
            }
        }
        fn mkdir(&mut self, _: &str) -> Result<(), FsError> {
            Ok(())
        }
        fn remove_file(&mut self, _: &str) -> Result<(), FsError> {
            Ok(())
        }
        fn remove_dir(&mut self, _: &str) -> Result<(), FsError> {
            Ok(())
        }
        fn open_read(&mut self, path: &str) -> Result<Box<dyn RemoteRead>, FsError> {
            Err(FsError::NotFound { path: path.into() })
        }
        fn open_write(&mut self, path: &str) -> Result<Box<dyn RemoteWrite>, FsError> {
            Err(FsError::NotFound { path: path.into() })
        }
        fn set_modified(&mut self, _: &str, _: SystemTime) -> Result<(), FsError> {
            Ok(())
        }
        fn space(&mut self, _: &str) -> Result<SpaceAllocation, FsError> {
            Ok(SpaceAllocation::default())
        }
        fn close(&mut self) -> Result<(), FsError> {
            Ok(())
        }
    }

    struct LinkedTreeConnector;

    impl SessionConnector for LinkedTreeConnector {
        fn connect(&self, _: &SessionTarget) -> Result<Box<dyn RemoteSession>, FsError> {
            Ok(Box::new(LinkedTree))
        }
    }

    #[test]
    fn directory_size_does_not_follow_directory_links() {
        let ctx = FsContext::builder()
            .sftp(Arc::new(LinkedTreeConnector))
            .build();
        let dir = crate::backend::SftpFile::new("ssh://h/home/d", &ctx);
        assert_eq!(dir.directory_size(), 5 + 7);

        let mut names = Vec::new();
        dir.for_each_child(true, &mut |e| names.push((e.name, e.file_type)))
            .unwrap();
        assert!(names.contains(&("self".to_string(), FileType::Directory)));
    }

    #[test]
    fn session_key_requires_scheme() {
        assert!(matches!(
            session_key("/plain/path"),
            Err(FsError::InvalidPath { .. })
        ));
    }
}
