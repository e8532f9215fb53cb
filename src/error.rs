//! Error types for the hybrid file facade.

use std::path::PathBuf;

/// Filesystem error type shared by every backend.
///
/// Variants carry the path and the operation that failed where that makes
/// sense. Uses `#[non_exhaustive]` for forward compatibility.
///
/// Queries (existence, directory checks, sizes, space, modification time)
/// never return this type; they degrade to a default value and log the
/// failure instead. Only mutating operations, stream opening and listing
/// surface an `FsError`.
///
/// # Examples
///
/// ```rust
/// use anyfs_hybrid::FsError;
/// use std::path::PathBuf;
///
/// let err = FsError::NotFound { path: PathBuf::from("/missing") };
/// assert!(err.to_string().contains("/missing"));
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// Path does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Path already exists when it shouldn't.
    #[error("{operation}: already exists: {path}")]
    AlreadyExists {
        /// The path that already exists.
        path: PathBuf,
        /// The operation that failed.
        operation: &'static str,
    },

    /// Expected a directory but found something else.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The path that is not a directory.
        path: PathBuf,
    },

    /// Permission denied for operation.
    #[error("{operation}: permission denied: {path}")]
    PermissionDenied {
        /// The path where permission was denied.
        path: PathBuf,
        /// The operation that was denied.
        operation: &'static str,
    },

    /// The operation has no meaning for this backend.
    #[error("operation not supported: {operation} ({backend})")]
    NotSupported {
        /// The unsupported operation.
        operation: &'static str,
        /// Name of the backend that rejected it.
        backend: &'static str,
    },

    /// A network session, provider or account could not be reached.
    #[error("{operation}: transport failure: {reason}")]
    Transport {
        /// The operation that failed.
        operation: &'static str,
        /// Human-readable cause reported by the transport.
        reason: String,
    },

    /// The privileged shell is not running or could not be started.
    #[error("privileged shell unavailable: {reason}")]
    ShellUnavailable {
        /// Why the shell could not be used.
        reason: String,
    },

    /// The underlying transport gave up waiting.
    #[error("{operation}: timed out")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
    },

    /// A path string could not be interpreted by the backend.
    #[error("invalid path: {path} ({reason})")]
    InvalidPath {
        /// The offending path string.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Generic backend error.
    #[error("backend error: {0}")]
    Backend(String),

    /// I/O error with context.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The path involved in the operation.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Returns `true` if the failure came from an unreachable collaborator
    /// (network session, shell, provider) rather than from the target itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FsError::Transport { .. } | FsError::ShellUnavailable { .. } | FsError::Timeout { .. }
        )
    }

    /// Wrap an I/O error, keeping the operation and path for context.
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound { path },
            std::io::ErrorKind::PermissionDenied => FsError::PermissionDenied { path, operation },
            std::io::ErrorKind::AlreadyExists => FsError::AlreadyExists { path, operation },
            std::io::ErrorKind::TimedOut => FsError::Timeout { operation },
            _ => FsError::Io {
                operation,
                path,
                source,
            },
        }
    }

    /// Like [`FsError::io`], but an `FsError` carried inside the I/O error
    /// (as stream commits report theirs) is returned unchanged.
    pub(crate) fn from_stream(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        if !source.get_ref().is_some_and(|inner| inner.is::<FsError>()) {
            return FsError::io(operation, path, source);
        }
        match source.into_inner().map(|inner| inner.downcast::<FsError>()) {
            Some(Ok(err)) => *err,
            _ => FsError::Backend(format!("{operation}: stream failed")),
        }
    }
}

impl From<std::io::Error> for FsError {
    fn from(error: std::io::Error) -> Self {
        FsError::io("io", PathBuf::new(), error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_error_not_found_display() {
        let err = FsError::NotFound {
            path: PathBuf::from("/missing"),
        };
        assert_eq!(err.to_string(), "not found: /missing");
    }

    #[test]
    fn fs_error_not_supported_display() {
        let err = FsError::NotSupported {
            operation: "set_modified",
            backend: "cloud",
        };
        assert_eq!(
            err.to_string(),
            "operation not supported: set_modified (cloud)"
        );
    }

    #[test]
    fn fs_error_transport_display() {
        let err = FsError::Transport {
            operation: "stat",
            reason: "connection reset".into(),
        };
        assert_eq!(err.to_string(), "stat: transport failure: connection reset");
    }

    #[test]
    fn transport_classification() {
        assert!(FsError::Timeout { operation: "ls" }.is_transport());
        assert!(FsError::ShellUnavailable {
            reason: "no su".into()
        }
        .is_transport());
        assert!(!FsError::NotFound {
            path: PathBuf::from("/x")
        }
        .is_transport());
    }

    #[test]
    fn fs_error_from_io_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let fs_err = FsError::from(io_err);
        assert!(matches!(fs_err, FsError::NotFound { .. }));
    }

    #[test]
    fn fs_error_from_io_permission_denied() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let fs_err = FsError::from(io_err);
        assert!(matches!(fs_err, FsError::PermissionDenied { .. }));
    }

    #[test]
    fn fs_error_from_io_timed_out() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "test");
        assert!(matches!(FsError::from(io_err), FsError::Timeout { .. }));
    }

    #[test]
    fn fs_error_io_keeps_context() {
        let io_err = std::io::Error::other("disk on fire");
        let fs_err = FsError::io("create_directory", "/data/x", io_err);
        match fs_err {
            FsError::Io {
                operation, path, ..
            } => {
                assert_eq!(operation, "create_directory");
                assert_eq!(path, PathBuf::from("/data/x"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn from_stream_recovers_carried_error() {
        let carried = std::io::Error::other(FsError::NotFound {
            path: PathBuf::from("/data/gone/x"),
        });
        let fs_err = FsError::from_stream("write_bytes", "/data/gone/x", carried);
        assert!(matches!(fs_err, FsError::NotFound { .. }));

        let plain = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "ro");
        let fs_err = FsError::from_stream("write_bytes", "/ro", plain);
        assert!(matches!(fs_err, FsError::PermissionDenied { .. }));
    }
}
