//! SFTP backend (`ssh://` paths).
//!
//! Sessions are addressed by the server-side path, so
//! `ssh://me@host:22/home/me/notes` is stat'ed as `/home/me/notes` on the
//! session keyed `ssh://me@host:22`.

use super::remote::{Protocol, RemoteFile};
use crate::{FsError, OpenMode, path};

/// Marker for the SFTP protocol.
pub(crate) struct Sftp;

impl Protocol for Sftp {
    const MODE: OpenMode = OpenMode::Sftp;
    const REPORTS_TOTAL_SPACE: bool = true;

    fn remote_path(path: &str) -> Result<&str, FsError> {
        path::split_authority(path)
            .map(|(_, remote)| remote)
            .ok_or_else(|| FsError::InvalidPath {
                path: path.to_string(),
                reason: "not an ssh:// URI".into(),
            })
    }
}

/// A path on an SFTP server.
pub(crate) type SftpFile<'a> = RemoteFile<'a, Sftp>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_path_drops_authority() {
        assert_eq!(
            Sftp::remote_path("ssh://me@host:22/home/me/notes").unwrap(),
            "/home/me/notes"
        );
        assert_eq!(Sftp::remote_path("ssh://host").unwrap(), "/");
    }

    #[test]
    fn remote_path_rejects_bare_paths() {
        assert!(Sftp::remote_path("/home/me").is_err());
    }
}
