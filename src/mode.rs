//! The closed set of storage backends a path can belong to.

use std::fmt;

/// URI prefix of SMB shares.
pub const SMB_PREFIX: &str = "smb://";
/// URI prefix of SFTP hosts.
pub const SFTP_PREFIX: &str = "ssh://";
/// URI prefix of removable USB volumes.
pub const OTG_PREFIX: &str = "otg://";
/// URI prefix of document-provider content.
pub const DOCUMENT_PREFIX: &str = "content://";
/// URI prefix of Box accounts.
pub const BOX_PREFIX: &str = "box://";
/// URI prefix of OneDrive accounts.
pub const ONEDRIVE_PREFIX: &str = "onedrive://";
/// URI prefix of Google Drive accounts.
pub const GDRIVE_PREFIX: &str = "gdrive://";
/// URI prefix of Dropbox accounts.
pub const DROPBOX_PREFIX: &str = "dropbox://";

/// Which backend serves a path.
///
/// A handle carries exactly one `OpenMode`. It is fixed once resolved and
/// only changes through an explicit re-tag
/// ([`VirtualFile::set_mode`](crate::VirtualFile::set_mode)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpenMode {
    /// Not resolved yet.
    #[default]
    Unknown,
    /// One of the pseudo-root tokens `"0"`..`"6"`.
    Custom,
    /// Plain local filesystem access.
    File,
    /// Local filesystem through the privileged shell.
    Root,
    /// SMB share.
    Smb,
    /// SFTP host.
    Sftp,
    /// Removable USB volume behind the document resolver.
    Otg,
    /// Document-provider content.
    DocumentFile,
    /// Box account.
    Box,
    /// OneDrive account.
    OneDrive,
    /// Google Drive account.
    GDrive,
    /// Dropbox account.
    Dropbox,
}

impl OpenMode {
    /// Cloud providers in the order detection checks them.
    pub const CLOUD: [OpenMode; 4] = [
        OpenMode::Box,
        OpenMode::OneDrive,
        OpenMode::GDrive,
        OpenMode::Dropbox,
    ];

    /// The URI prefix that identifies this backend, if it has one.
    pub const fn prefix(self) -> Option<&'static str> {
        match self {
            OpenMode::Smb => Some(SMB_PREFIX),
            OpenMode::Sftp => Some(SFTP_PREFIX),
            OpenMode::Otg => Some(OTG_PREFIX),
            OpenMode::DocumentFile => Some(DOCUMENT_PREFIX),
            OpenMode::Box => Some(BOX_PREFIX),
            OpenMode::OneDrive => Some(ONEDRIVE_PREFIX),
            OpenMode::GDrive => Some(GDRIVE_PREFIX),
            OpenMode::Dropbox => Some(DROPBOX_PREFIX),
            OpenMode::Unknown | OpenMode::Custom | OpenMode::File | OpenMode::Root => None,
        }
    }

    /// Returns `true` for the cloud providers.
    #[inline]
    pub const fn is_cloud(self) -> bool {
        matches!(
            self,
            OpenMode::Box | OpenMode::OneDrive | OpenMode::GDrive | OpenMode::Dropbox
        )
    }

    /// Returns `true` for backends whose paths are URIs.
    #[inline]
    pub const fn is_uri(self) -> bool {
        self.prefix().is_some()
    }

    /// Returns `true` for the local disk, with or without privileges.
    #[inline]
    pub const fn is_local_disk(self) -> bool {
        matches!(self, OpenMode::File | OpenMode::Root)
    }

    /// Short lowercase name, used in logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            OpenMode::Unknown => "unknown",
            OpenMode::Custom => "custom",
            OpenMode::File => "file",
            OpenMode::Root => "root",
            OpenMode::Smb => "smb",
            OpenMode::Sftp => "sftp",
            OpenMode::Otg => "otg",
            OpenMode::DocumentFile => "document",
            OpenMode::Box => "box",
            OpenMode::OneDrive => "onedrive",
            OpenMode::GDrive => "gdrive",
            OpenMode::Dropbox => "dropbox",
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unknown() {
        assert_eq!(OpenMode::default(), OpenMode::Unknown);
    }

    #[test]
    fn cloud_modes_have_prefixes() {
        for mode in OpenMode::CLOUD {
            assert!(mode.is_cloud());
            assert!(mode.prefix().is_some_and(|p| p.ends_with("://")));
        }
    }

    #[test]
    fn local_modes_have_no_prefix() {
        assert!(OpenMode::File.prefix().is_none());
        assert!(OpenMode::Root.prefix().is_none());
        assert!(OpenMode::File.is_local_disk());
        assert!(!OpenMode::Sftp.is_local_disk());
    }

    #[test]
    fn display_uses_short_name() {
        assert_eq!(OpenMode::DocumentFile.to_string(), "document");
        assert_eq!(OpenMode::GDrive.to_string(), "gdrive");
    }
}
