//! Scoped byte streams returned by `open_read` / `open_write`.
//!
//! Two shapes exist:
//!
//! - [`SessionStream`]: an inner remote file handle layered on an outer
//!   session. Acquisition is outer-then-inner; release is always
//!   inner-then-outer, on every exit path, including failed opens.
//! - [`StagedWriter`] / [`StagedReader`]: a local scratch file standing in
//!   for a target only a collaborator can touch (privileged shell, cloud
//!   upload). Writers commit on `flush`, and on drop if anything is left.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use tempfile::{NamedTempFile, TempPath};

use crate::{FsError, RemoteRead, RemoteSession, RemoteWrite};

/// Inner handles that can be released before their session.
pub(crate) trait InnerHandle: Send {
    fn close_inner(&mut self) -> io::Result<()>;
}

impl InnerHandle for dyn RemoteRead {
    fn close_inner(&mut self) -> io::Result<()> {
        self.close()
    }
}

impl InnerHandle for dyn RemoteWrite {
    fn close_inner(&mut self) -> io::Result<()> {
        self.close()
    }
}

/// A remote file handle together with the session that owns it.
pub(crate) struct SessionStream<H: ?Sized + InnerHandle> {
    handle: Option<Box<H>>,
    session: Option<Box<dyn RemoteSession>>,
    path: String,
}

impl<H: ?Sized + InnerHandle> SessionStream<H> {
    /// Open the inner handle on an already connected session.
    ///
    /// On failure the session is closed before the error is returned.
    pub(crate) fn open(
        mut session: Box<dyn RemoteSession>,
        path: &str,
        open: impl FnOnce(&mut dyn RemoteSession, &str) -> Result<Box<H>, FsError>,
    ) -> Result<Self, FsError> {
        match open(session.as_mut(), path) {
            Ok(handle) => Ok(Self {
                handle: Some(handle),
                session: Some(session),
                path: path.to_string(),
            }),
            Err(e) => {
                if let Err(close_err) = session.close() {
                    tracing::warn!(path, error = %close_err, "closing session after failed open");
                }
                Err(e)
            }
        }
    }

    fn release(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(e) = handle.close_inner() {
                tracing::warn!(path = %self.path, error = %e, "error closing remote file");
            }
        }
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.close() {
                tracing::warn!(path = %self.path, error = %e, "error closing remote session");
            }
        }
    }
}

impl Read for SessionStream<dyn RemoteRead> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.handle.as_mut() {
            Some(handle) => handle.read(buf),
            None => Ok(0),
        }
    }
}

impl Write for SessionStream<dyn RemoteWrite> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.handle.as_mut() {
            Some(handle) => handle.write(buf),
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream closed")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.handle.as_mut() {
            Some(handle) => handle.flush(),
            None => Ok(()),
        }
    }
}

impl<H: ?Sized + InnerHandle> Drop for SessionStream<H> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Publishes the staged scratch file to its target.
///
/// May run more than once: every commit copies the whole scratch file.
pub(crate) type Commit = Box<dyn FnMut(&Path) -> Result<(), FsError> + Send>;

/// Create an empty scratch file in `dir`.
pub(crate) fn scratch_file(dir: &Path) -> Result<NamedTempFile, FsError> {
    tempfile::Builder::new()
        .prefix("anyfs-")
        .tempfile_in(dir)
        .map_err(|e| FsError::io("scratch_file", dir, e))
}

/// Writes to a scratch file and hands it to `commit`.
///
/// `flush` commits and reports failures as an `io::Error` carrying the
/// [`FsError`]. Data not yet committed is committed on drop, where a
/// failure can only be logged.
pub(crate) struct StagedWriter {
    file: NamedTempFile,
    commit: Commit,
    target: String,
    pending: bool,
}

impl StagedWriter {
    pub(crate) fn new(scratch_dir: &Path, target: &str, commit: Commit) -> Result<Self, FsError> {
        Ok(Self {
            file: scratch_file(scratch_dir)?,
            commit,
            target: target.to_string(),
            // Opening for write truncates: even an empty stream is committed.
            pending: true,
        })
    }

    /// Flush the scratch file and publish it.
    pub(crate) fn commit(&mut self) -> Result<(), FsError> {
        self.file
            .flush()
            .map_err(|e| FsError::io("commit", self.file.path(), e))?;
        (self.commit)(self.file.path())?;
        self.pending = false;
        tracing::debug!(target_path = %self.target, "staged data committed");
        Ok(())
    }
}

impl Write for StagedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending = true;
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending {
            return self.file.flush();
        }
        self.commit().map_err(io::Error::other)
    }
}

impl Drop for StagedWriter {
    fn drop(&mut self) {
        if !self.pending {
            return;
        }
        if let Err(e) = self.commit() {
            tracing::error!(target_path = %self.target, error = %e, "committing staged data");
        }
    }
}

/// Reads a scratch copy and deletes it when dropped.
pub(crate) struct StagedReader {
    file: File,
    _scratch: TempPath,
}

impl StagedReader {
    /// Open a scratch file that has already been filled.
    pub(crate) fn open(scratch: NamedTempFile) -> Result<Self, FsError> {
        let scratch = scratch.into_temp_path();
        let file = File::open(&scratch).map_err(|e| FsError::io("open_read", &*scratch, e))?;
        Ok(Self {
            file,
            _scratch: scratch,
        })
    }
}

impl Read for StagedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Metadata, SpaceAllocation};
    use std::sync::{Arc, Mutex};
    use std::time::SystemTime;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    struct Handle(Log);

    impl Read for Handle {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    impl RemoteRead for Handle {
        fn close(&mut self) -> io::Result<()> {
            self.0.lock().unwrap().push("inner");
            Ok(())
        }
    }

    struct Session {
        log: Log,
        fail_open: bool,
    }

    impl RemoteSession for Session {
        fn stat(&mut self, _: &str) -> Result<Metadata, FsError> {
            Ok(Metadata::default())
        }
        fn list(&mut self, _: &str) -> Result<Vec<crate::RemoteEntry>, FsError> {
            Ok(vec![])
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
            if self.fail_open {
                return Err(FsError::NotFound { path: path.into() });
            }
            Ok(Box::new(Handle(self.log.clone())))
        }
        fn open_write(&mut self, _: &str) -> Result<Box<dyn RemoteWrite>, FsError> {
            unimplemented!()
        }
        fn set_modified(&mut self, _: &str, _: SystemTime) -> Result<(), FsError> {
            Ok(())
        }
        fn space(&mut self, _: &str) -> Result<SpaceAllocation, FsError> {
            Ok(SpaceAllocation::default())
        }
        fn close(&mut self) -> Result<(), FsError> {
            self.log.lock().unwrap().push("session");
            Ok(())
        }
    }

    #[test]
    fn inner_handle_closes_before_session() {
        let log = Log::default();
        let session = Box::new(Session {
            log: log.clone(),
            fail_open: false,
        });
        let stream = SessionStream::<dyn RemoteRead>::open(session, "/f", |s, p| s.open_read(p))
            .unwrap();
        drop(stream);
        assert_eq!(*log.lock().unwrap(), vec!["inner", "session"]);
    }

    #[test]
    fn failed_open_still_closes_session() {
        let log = Log::default();
        let session = Box::new(Session {
            log: log.clone(),
            fail_open: true,
        });
        let result = SessionStream::<dyn RemoteRead>::open(session, "/f", |s, p| s.open_read(p));
        assert!(matches!(result, Err(FsError::NotFound { .. })));
        assert_eq!(*log.lock().unwrap(), vec!["session"]);
    }

    #[test]
    fn staged_writer_commits_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut writer = StagedWriter::new(
            dir.path(),
            "/target",
            Box::new(move |staged: &Path| {
                *sink.lock().unwrap() = std::fs::read(staged).map_err(FsError::from)?;
                Ok(())
            }),
        )
        .unwrap();
        writer.write_all(b"payload").unwrap();
        assert!(seen.lock().unwrap().is_empty());
        drop(writer);
        assert_eq!(*seen.lock().unwrap(), b"payload");
    }

    #[test]
    fn staged_writer_flush_reports_commit_failure() {
        let dir = tempfile::tempdir().unwrap();
        let attempts = Arc::new(Mutex::new(0));
        let counter = attempts.clone();
        let mut writer = StagedWriter::new(
            dir.path(),
            "/readonly/target",
            Box::new(move |_: &Path| {
                *counter.lock().unwrap() += 1;
                Err(FsError::PermissionDenied {
                    path: "/readonly/target".into(),
                    operation: "open_write",
                })
            }),
        )
        .unwrap();
        writer.write_all(b"lost?").unwrap();

        let err = writer.flush().unwrap_err();
        assert!(matches!(
            FsError::from_stream("flush", "/readonly/target", err),
            FsError::PermissionDenied { .. }
        ));
        // Still pending, so drop retries once more.
        drop(writer);
        assert_eq!(*attempts.lock().unwrap(), 2);
    }

    #[test]
    fn committed_writer_does_not_commit_again_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let attempts = Arc::new(Mutex::new(0));
        let counter = attempts.clone();
        let mut writer = StagedWriter::new(
            dir.path(),
            "/target",
            Box::new(move |_: &Path| {
                *counter.lock().unwrap() += 1;
                Ok(())
            }),
        )
        .unwrap();
        writer.write_all(b"once").unwrap();
        writer.flush().unwrap();
        drop(writer);
        assert_eq!(*attempts.lock().unwrap(), 1);
    }

    #[test]
    fn staged_reader_removes_scratch_copy() {
        let dir = tempfile::tempdir().unwrap();
        let mut scratch = scratch_file(dir.path()).unwrap();
        scratch.write_all(b"copied").unwrap();
        let scratch_path = scratch.path().to_path_buf();

        let mut reader = StagedReader::open(scratch).unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "copied");
        drop(reader);
        assert!(!scratch_path.exists());
    }
}
