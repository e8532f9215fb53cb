//! # Backend detection
//!
//! Maps a raw path string to the [`OpenMode`] that serves it. Detection is
//! total: every path resolves to exactly one mode, with the local disk as
//! the fallback.
//!
//! ## Order
//!
//! First match wins, because prefixes can overlap lexically with ordinary
//! names:
//!
//! 1. `smb://` -> [`OpenMode::Smb`]
//! 2. `ssh://` -> [`OpenMode::Sftp`]
//! 3. `otg://` -> [`OpenMode::Otg`]
//! 4. `content://` -> [`OpenMode::DocumentFile`]
//! 5. exactly `"0"`..`"6"` -> [`OpenMode::Custom`]
//! 6. `box://`, `onedrive://`, `gdrive://`, `dropbox://` -> the cloud mode
//! 7. no ambient config -> [`OpenMode::File`]
//! 8. removable volume -> `File`; privileged mode and unreadable -> `Root`;
//!    otherwise `File`
//!
//! A path that reaches step 8 is never left as `Custom` or `Unknown`.

use std::fs;
use std::path::Path;

use crate::OpenMode;
use crate::mode::{DOCUMENT_PREFIX, OTG_PREFIX, SFTP_PREFIX, SMB_PREFIX};
use crate::path::is_custom_path;

/// Ambient inputs for the fallback step of detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectConfig {
    /// Privileged mode is enabled.
    pub root_mode: bool,
    /// The path lives on a removable or external volume, where the
    /// privileged shell has no business.
    pub on_removable_storage: bool,
}

/// Resolve the backend for `path`.
///
/// `config` only matters when no prefix matches.
///
/// # Example
///
/// ```rust
/// use anyfs_hybrid::{DetectConfig, OpenMode, detect};
///
/// assert_eq!(detect("ssh://host/home", None), OpenMode::Sftp);
/// assert_eq!(detect("3", None), OpenMode::Custom);
/// assert_eq!(detect("7abc", Some(&DetectConfig::default())), OpenMode::File);
/// ```
pub fn detect(path: &str, config: Option<&DetectConfig>) -> OpenMode {
    if let Some(mode) = detect_by_prefix(path) {
        return mode;
    }

    let Some(config) = config else {
        return OpenMode::File;
    };

    let mode = if config.on_removable_storage {
        OpenMode::File
    } else if config.root_mode && !is_readable(Path::new(path)) {
        OpenMode::Root
    } else {
        OpenMode::File
    };
    force_local(mode)
}

/// The mode named by the shape of `path` alone, if any.
pub fn detect_by_prefix(path: &str) -> Option<OpenMode> {
    if path.starts_with(SMB_PREFIX) {
        Some(OpenMode::Smb)
    } else if path.starts_with(SFTP_PREFIX) {
        Some(OpenMode::Sftp)
    } else if path.starts_with(OTG_PREFIX) {
        Some(OpenMode::Otg)
    } else if path.starts_with(DOCUMENT_PREFIX) {
        Some(OpenMode::DocumentFile)
    } else if is_custom_path(path) {
        Some(OpenMode::Custom)
    } else {
        OpenMode::CLOUD
            .into_iter()
            .find(|mode| mode.prefix().is_some_and(|prefix| path.starts_with(prefix)))
    }
}

// A bare path must never stay tagged Custom or Unknown.
fn force_local(mode: OpenMode) -> OpenMode {
    match mode {
        OpenMode::Unknown | OpenMode::Custom => OpenMode::File,
        other => other,
    }
}

/// Whether the current process can read `path` without privileges.
///
/// Missing paths are unreadable.
fn is_readable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => fs::read_dir(path).is_ok(),
        Ok(_) => fs::File::open(path).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT_ON: DetectConfig = DetectConfig {
        root_mode: true,
        on_removable_storage: false,
    };

    #[test]
    fn prefixes_resolve_regardless_of_config() {
        let cases = [
            ("smb://nas/share", OpenMode::Smb),
            ("ssh://me@host/home", OpenMode::Sftp),
            ("otg://usb/DCIM", OpenMode::Otg),
            ("content://provider/doc", OpenMode::DocumentFile),
            ("box://Work", OpenMode::Box),
            ("onedrive://Docs", OpenMode::OneDrive),
            ("gdrive://Drive", OpenMode::GDrive),
            ("dropbox://Photos", OpenMode::Dropbox),
            ("0", OpenMode::Custom),
            ("6", OpenMode::Custom),
        ];
        let configs = [
            None,
            Some(DetectConfig::default()),
            Some(ROOT_ON),
            Some(DetectConfig {
                root_mode: true,
                on_removable_storage: true,
            }),
        ];
        for (path, expected) in cases {
            for config in &configs {
                assert_eq!(detect(path, config.as_ref()), expected, "{path}");
            }
        }
    }

    #[test]
    fn no_config_falls_back_to_local() {
        assert_eq!(detect("/data/data", None), OpenMode::File);
    }

    #[test]
    fn non_token_numeric_path_is_local() {
        assert_eq!(detect("7abc", Some(&DetectConfig::default())), OpenMode::File);
        assert_eq!(detect("7", None), OpenMode::File);
        assert_eq!(detect("01", Some(&DetectConfig::default())), OpenMode::File);
    }

    #[test]
    fn unreadable_path_with_root_mode_is_root() {
        assert_eq!(
            detect("/definitely/not/here/anyfs-hybrid", Some(&ROOT_ON)),
            OpenMode::Root
        );
    }

    #[test]
    fn readable_path_with_root_mode_is_local() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        assert_eq!(detect(path, Some(&ROOT_ON)), OpenMode::File);
    }

    #[test]
    fn removable_storage_is_never_root() {
        let config = DetectConfig {
            root_mode: true,
            on_removable_storage: true,
        };
        assert_eq!(
            detect("/definitely/not/here/anyfs-hybrid", Some(&config)),
            OpenMode::File
        );
    }

    #[test]
    fn root_mode_off_is_local() {
        assert_eq!(
            detect(
                "/definitely/not/here/anyfs-hybrid",
                Some(&DetectConfig::default())
            ),
            OpenMode::File
        );
    }

    #[test]
    fn force_local_rewrites_placeholders() {
        assert_eq!(force_local(OpenMode::Custom), OpenMode::File);
        assert_eq!(force_local(OpenMode::Unknown), OpenMode::File);
        assert_eq!(force_local(OpenMode::Root), OpenMode::Root);
    }
}
