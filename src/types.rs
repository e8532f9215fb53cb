//! Core data types shared by every backend.

use std::path::Path;
use std::time::SystemTime;

/// Type of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
}

/// Unix-style permissions stored as a mode bitmask.
///
/// Uses the standard Unix permission bits (rwxrwxrwx) plus the
/// setuid/setgid/sticky bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permissions(u32);

impl Permissions {
    /// Create permissions from a Unix mode (e.g., 0o755).
    #[inline]
    pub const fn from_mode(mode: u32) -> Self {
        Self(mode & 0o7777)
    }

    /// Parse the symbolic form printed by `ls -l`, e.g. `drwxr-xr-x`.
    ///
    /// The leading type character is optional. Returns `None` when the
    /// string is not nine (or ten) permission characters.
    pub fn from_symbolic(symbolic: &str) -> Option<Self> {
        let chars: Vec<char> = symbolic.chars().collect();
        let bits = match chars.len() {
            10 => &chars[1..],
            9 => &chars[..],
            _ => return None,
        };

        let mut mode = 0u32;
        for (i, c) in bits.iter().enumerate() {
            let shift = 8 - i as u32;
            match (i % 3, c) {
                (_, '-') => {}
                (0, 'r') | (1, 'w') | (2, 'x') => mode |= 1 << shift,
                (2, 's') | (2, 't') => mode |= (1 << shift) | special_bit(i),
                (2, 'S') | (2, 'T') => mode |= special_bit(i),
                _ => return None,
            }
        }
        Some(Self(mode))
    }

    /// Get the raw mode value.
    #[inline]
    pub const fn mode(&self) -> u32 {
        self.0
    }

    /// Returns `true` if these permissions deny writing.
    #[inline]
    pub const fn readonly(&self) -> bool {
        (self.0 & 0o222) == 0
    }

    /// Default permissions for a new file (0o644 = rw-r--r--).
    #[inline]
    pub const fn default_file() -> Self {
        Self(0o644)
    }

    /// Default permissions for a new directory (0o755 = rwxr-xr-x).
    #[inline]
    pub const fn default_dir() -> Self {
        Self(0o755)
    }
}

// setuid for the user triad, setgid for group, sticky for other
fn special_bit(index: usize) -> u32 {
    match index / 3 {
        0 => 0o4000,
        1 => 0o2000,
        _ => 0o1000,
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::default_file()
    }
}

/// Metadata for a single entry, as reported by a backend round trip.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    /// Type of the entry.
    pub file_type: FileType,
    /// Size in bytes (0 for directories on most backends).
    pub size: u64,
    /// Last modification time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub modified: SystemTime,
    /// Permissions, when the backend reports them.
    pub permissions: Permissions,
}

impl Metadata {
    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            file_type: FileType::File,
            size: 0,
            modified: SystemTime::UNIX_EPOCH,
            permissions: Permissions::default_file(),
        }
    }
}

/// One child discovered while listing a directory.
///
/// Entries are pushed to the caller one at a time, see
/// [`FileOps::for_each_child`](crate::FileOps::for_each_child).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirEntry {
    /// Name of the entry (leaf only).
    pub name: String,
    /// Full path of the entry, addressed the way its backend expects.
    pub path: String,
    /// Type of the entry.
    pub file_type: FileType,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub modified: SystemTime,
    /// Permissions, when known.
    pub permissions: Permissions,
}

impl DirEntry {
    /// Returns `true` if this entry is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    /// Returns `true` if the leaf name starts with a dot.
    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// Quota figures reported by a volume, share or cloud account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpaceAllocation {
    /// Total capacity in bytes.
    pub total: u64,
    /// Bytes in use.
    pub used: u64,
}

impl SpaceAllocation {
    /// Bytes still available (never underflows).
    #[inline]
    pub fn available(&self) -> u64 {
        self.total.saturating_sub(self.used)
    }
}

/// Modification time reported when a backend cannot answer.
///
/// This is the modification time of the local filesystem root, or the Unix
/// epoch if even that is unavailable.
pub fn fallback_modified() -> SystemTime {
    std::fs::metadata(Path::new("/"))
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Serde support for SystemTime (when serde feature is enabled).
#[cfg(feature = "serde")]
mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        (duration.as_secs(), duration.subsec_nanos()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (secs, nanos): (u64, u32) = Deserialize::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::new(secs, nanos))
    }
}
