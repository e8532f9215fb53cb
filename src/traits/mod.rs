//! # Traits
//!
//! The seams of the crate: one trait every backend implements, and the
//! collaborator traits backends consume.
//!
//! ## Quick Reference
//!
//! | Trait | Implemented by | Purpose |
//! |-------|----------------|---------|
//! | [`FileOps`] | every backend, [`VirtualFile`](crate::VirtualFile) | The uniform operation surface |
//! | [`ShellRunner`] | caller | Privileged shell commands |
//! | [`SessionConnector`] / [`RemoteSession`] | caller | SFTP and SMB sessions |
//! | [`DocumentResolver`] | caller | Document-provider and OTG access |
//! | [`CloudStorage`] | caller | One cloud account |
//!
//! ## Thread Safety
//!
//! Every trait except [`RemoteSession`] requires `Send + Sync`. A session is
//! owned by one unit of work at a time and only needs `Send`.
//!
//! ## Object Safety
//!
//! All traits are object-safe. Collaborators are stored as `Arc<dyn _>` in
//! [`FsContext`](crate::FsContext).

mod cloud;
mod document;
mod file_ops;
mod remote;
mod shell;

pub use cloud::{CloudMetadata, CloudStorage};
pub use document::{DocumentNode, DocumentResolver};
pub use file_ops::FileOps;
pub use remote::{RemoteEntry, RemoteRead, RemoteSession, RemoteWrite, SessionConnector, SessionTarget};
pub use shell::{ShellRunner, shell_quote};
