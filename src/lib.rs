//! # anyfs-hybrid
//!
//! One file handle over **local disk, a privileged shell, SFTP, SMB,
//! document providers, a USB volume and cloud accounts**.
//!
//! Callers hold a [`VirtualFile`] built from a path string and never branch
//! on where the path lives. The backend is chosen from the shape of the
//! path, and every operation is forwarded to it.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use anyfs_hybrid::{FileOps, FileOpsExt, FsContext, FsError, VirtualFile};
//! use std::sync::Arc;
//!
//! fn largest_child(dir: &VirtualFile) -> Result<Option<String>, FsError> {
//!     let mut best: Option<(u64, String)> = None;
//!     dir.for_each_child(false, &mut |entry| {
//!         if best.as_ref().is_none_or(|(size, _)| entry.size > *size) {
//!             best = Some((entry.size, entry.name));
//!         }
//!     })?;
//!     Ok(best.map(|(_, name)| name))
//! }
//!
//! let ctx = Arc::new(FsContext::default());
//! let tmp = VirtualFile::new(std::env::temp_dir().to_string_lossy(), ctx);
//! assert!(tmp.is_directory());
//! let _ = largest_child(&tmp);
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`VirtualFile`] | The facade: a path, a backend tag and the shared context |
//! | [`FileOps`] | The operation surface every backend implements |
//! | [`OpenMode`] | Closed set of backend tags |
//! | [`FsContext`] | Configuration and collaborator registry |
//! | [`FsError`] | Error type with path and operation context |
//! | [`DirEntry`] | One child pushed by [`FileOps::for_each_child`] |
//! | [`Metadata`] | Attributes reported by a remote session |
//!
//! ---
//!
//! ## Backends
//!
//! | Path | Backend | Reached through |
//! |------|---------|-----------------|
//! | `smb://...` | SMB share | [`SessionConnector`] |
//! | `ssh://...` | SFTP host | [`SessionConnector`] |
//! | `otg://...` | USB volume | [`DocumentResolver`] |
//! | `content://...` | Document provider | [`DocumentResolver`] |
//! | `"0"`..`"6"` | Pseudo-roots | nothing |
//! | `box://`, `onedrive://`, `gdrive://`, `dropbox://` | Cloud accounts | [`CloudStorage`] |
//! | anything else | Local disk, or the root shell for unreadable paths in root mode | `std::fs` / [`ShellRunner`] |
//!
//! Protocol clients, the root shell, document providers and cloud SDKs are
//! collaborators: this crate defines the traits, the caller registers
//! implementations in the [`FsContext`].
//!
//! ---
//!
//! ## Error Handling
//!
//! Queries never fail. [`exists`](FileOps::exists),
//! [`is_directory`](FileOps::is_directory), sizes, space and modification
//! time degrade to `false`, `0` or [`fallback_modified`] and log the cause
//! through `tracing`. Mutations, stream opening and listing return
//! `Result<T, FsError>`:
//!
//! ```rust
//! use anyfs_hybrid::FsError;
//! use std::path::PathBuf;
//!
//! let err = FsError::PermissionDenied {
//!     path: PathBuf::from("/data/system"),
//!     operation: "open_write",
//! };
//! assert_eq!(err.to_string(), "open_write: permission denied: /data/system");
//! ```
//!
//! ---
//!
//! ## Thread Safety
//!
//! [`VirtualFile`], [`FsContext`] and every collaborator trait except
//! [`RemoteSession`] are `Send + Sync`. Network, shell, provider and cloud
//! calls block; run them on a worker pool, not a latency-sensitive thread.
//! Nothing here locks: handles addressing the same path are not
//! coordinated.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`OpenMode`], [`Metadata`], [`DirEntry`], [`Permissions`], etc., plus `FileOpsJson` |

// Private modules
mod backend;
mod context;
mod detect;
mod error;
mod ext;
mod file;
mod mode;
mod stream;
mod traits;
mod types;

pub mod path;

// Public re-exports - error types
pub use error::FsError;

// Public re-exports - core types
pub use types::{
    DirEntry, FileType, Metadata, Permissions, SpaceAllocation, fallback_modified,
};

// Public re-exports - backend tags and detection
pub use detect::{DetectConfig, detect, detect_by_prefix};
pub use mode::{
    BOX_PREFIX, DOCUMENT_PREFIX, DROPBOX_PREFIX, GDRIVE_PREFIX, ONEDRIVE_PREFIX, OTG_PREFIX,
    OpenMode, SFTP_PREFIX, SMB_PREFIX,
};

// Public re-exports - the facade and its configuration
pub use context::{FsContext, FsContextBuilder};
pub use file::VirtualFile;

// Public re-exports - traits
pub use traits::{
    CloudMetadata, CloudStorage, DocumentNode, DocumentResolver, FileOps, RemoteEntry,
    RemoteRead, RemoteSession, RemoteWrite, SessionConnector, SessionTarget, ShellRunner,
    shell_quote,
};

// Public re-exports - infrastructure
pub use ext::FileOpsExt;

// Conditional re-exports
#[cfg(feature = "serde")]
pub use ext::FileOpsJson;
