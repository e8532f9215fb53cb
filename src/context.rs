//! # Context
//!
//! [`FsContext`] is the explicit registry every backend reads from: ambient
//! configuration (privileged mode, removable volumes, timeouts, scratch
//! space) and the collaborators that reach shells, servers, providers and
//! cloud accounts.
//!
//! A context is built once, wrapped in an `Arc`, and shared read-only by
//! every [`VirtualFile`](crate::VirtualFile). Nothing in this crate mutates
//! it.
//!
//! ```rust
//! use anyfs_hybrid::FsContext;
//! use std::time::Duration;
//!
//! let ctx = FsContext::builder()
//!     .root_mode(true)
//!     .removable_root("/storage/1A2B-3C4D")
//!     .smb_timeout(Duration::from_secs(5))
//!     .build();
//! assert!(ctx.root_mode());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::detect::DetectConfig;
use crate::{
    CloudStorage, DocumentResolver, FsError, OpenMode, SessionConnector, SessionTarget,
    ShellRunner,
};

/// Shared configuration and collaborator registry.
#[derive(Clone)]
pub struct FsContext {
    root_mode: bool,
    removable_roots: Vec<PathBuf>,
    smb_timeout: Option<Duration>,
    scratch_dir: PathBuf,
    document_root: Option<String>,
    otg_root: Option<String>,
    shell: Option<Arc<dyn ShellRunner>>,
    sftp: Option<Arc<dyn SessionConnector>>,
    smb: Option<Arc<dyn SessionConnector>>,
    documents: Option<Arc<dyn DocumentResolver>>,
    clouds: HashMap<OpenMode, Arc<dyn CloudStorage>>,
}

impl FsContext {
    /// Start building a context.
    pub fn builder() -> FsContextBuilder {
        FsContextBuilder::default()
    }

    /// Whether privileged mode is enabled.
    #[inline]
    pub fn root_mode(&self) -> bool {
        self.root_mode
    }

    /// Connection timeout handed to SMB sessions.
    #[inline]
    pub fn smb_timeout(&self) -> Option<Duration> {
        self.smb_timeout
    }

    /// Directory for staged privileged transfers and cloud uploads.
    #[inline]
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Whether `path` lives on a volume registered as removable.
    pub fn is_on_removable_storage(&self, path: &str) -> bool {
        let path = Path::new(path);
        self.removable_roots.iter().any(|root| path.starts_with(root))
    }

    /// Detection input for `path`.
    pub fn detect_config(&self, path: &str) -> DetectConfig {
        DetectConfig {
            root_mode: self.root_mode,
            on_removable_storage: self.is_on_removable_storage(path),
        }
    }

    /// Granted provider root for the document-backed modes.
    pub fn document_root(&self, mode: OpenMode) -> Option<&str> {
        match mode {
            OpenMode::Otg => self.otg_root.as_deref(),
            _ => self.document_root.as_deref(),
        }
    }

    /// The privileged shell.
    ///
    /// # Errors
    ///
    /// [`FsError::ShellUnavailable`] when none is registered.
    pub fn shell(&self) -> Result<&dyn ShellRunner, FsError> {
        self.shell
            .as_deref()
            .ok_or_else(|| FsError::ShellUnavailable {
                reason: "no shell runner registered".into(),
            })
    }

    /// Owned handle to the privileged shell, for work that outlives the call.
    pub(crate) fn shell_handle(&self) -> Result<Arc<dyn ShellRunner>, FsError> {
        self.shell.clone().ok_or_else(|| FsError::ShellUnavailable {
            reason: "no shell runner registered".into(),
        })
    }

    /// The session connector for a remote protocol (`Sftp` or `Smb`).
    ///
    /// # Errors
    ///
    /// [`FsError::Transport`] when none is registered for `mode`.
    pub fn connector(&self, mode: OpenMode) -> Result<&dyn SessionConnector, FsError> {
        let connector = match mode {
            OpenMode::Sftp => self.sftp.as_deref(),
            OpenMode::Smb => self.smb.as_deref(),
            _ => None,
        };
        connector.ok_or_else(|| FsError::Transport {
            operation: "connect",
            reason: format!("no session connector registered for {mode}"),
        })
    }

    /// Session target for a remote path.
    pub(crate) fn session_target(&self, mode: OpenMode, key: &str) -> SessionTarget {
        SessionTarget {
            key: key.to_string(),
            timeout: match mode {
                OpenMode::Smb => self.smb_timeout,
                _ => None,
            },
        }
    }

    /// The document resolver.
    ///
    /// # Errors
    ///
    /// [`FsError::Transport`] when none is registered.
    pub fn documents(&self) -> Result<&dyn DocumentResolver, FsError> {
        self.documents
            .as_deref()
            .ok_or_else(|| FsError::Transport {
                operation: "resolve",
                reason: "no document resolver registered".into(),
            })
    }

    /// The signed-in account for a cloud mode.
    ///
    /// # Errors
    ///
    /// [`FsError::Transport`] when no account is registered for `mode`.
    pub fn cloud(&self, mode: OpenMode) -> Result<&dyn CloudStorage, FsError> {
        self.clouds
            .get(&mode)
            .map(|account| account.as_ref())
            .ok_or_else(|| FsError::Transport {
                operation: "account",
                reason: format!("no account registered for {mode}"),
            })
    }

    /// Owned handle to a cloud account, for work that outlives the call.
    pub(crate) fn cloud_handle(&self, mode: OpenMode) -> Result<Arc<dyn CloudStorage>, FsError> {
        self.clouds.get(&mode).cloned().ok_or_else(|| FsError::Transport {
            operation: "account",
            reason: format!("no account registered for {mode}"),
        })
    }
}

impl Default for FsContext {
    fn default() -> Self {
        FsContextBuilder::default().build()
    }
}

impl fmt::Debug for FsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsContext")
            .field("root_mode", &self.root_mode)
            .field("removable_roots", &self.removable_roots)
            .field("smb_timeout", &self.smb_timeout)
            .field("scratch_dir", &self.scratch_dir)
            .field("shell", &self.shell.is_some())
            .field("sftp", &self.sftp.is_some())
            .field("smb", &self.smb.is_some())
            .field("documents", &self.documents.is_some())
            .field("clouds", &self.clouds.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`FsContext`].
#[derive(Default)]
pub struct FsContextBuilder {
    root_mode: bool,
    removable_roots: Vec<PathBuf>,
    smb_timeout: Option<Duration>,
    scratch_dir: Option<PathBuf>,
    document_root: Option<String>,
    otg_root: Option<String>,
    shell: Option<Arc<dyn ShellRunner>>,
    sftp: Option<Arc<dyn SessionConnector>>,
    smb: Option<Arc<dyn SessionConnector>>,
    documents: Option<Arc<dyn DocumentResolver>>,
    clouds: HashMap<OpenMode, Arc<dyn CloudStorage>>,
}

impl FsContextBuilder {
    /// Enable or disable privileged mode.
    pub fn root_mode(mut self, enabled: bool) -> Self {
        self.root_mode = enabled;
        self
    }

    /// Register the mount point of a removable or external volume.
    pub fn removable_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.removable_roots.push(root.into());
        self
    }

    /// Connection timeout for SMB sessions.
    pub fn smb_timeout(mut self, timeout: Duration) -> Self {
        self.smb_timeout = Some(timeout);
        self
    }

    /// Directory for staged transfers. Defaults to the system temp dir.
    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Provider root granted for `content://` documents.
    pub fn document_root(mut self, root: impl Into<String>) -> Self {
        self.document_root = Some(root.into());
        self
    }

    /// Provider root of the attached USB volume.
    pub fn otg_root(mut self, root: impl Into<String>) -> Self {
        self.otg_root = Some(root.into());
        self
    }

    /// Privileged shell runner.
    pub fn shell(mut self, shell: Arc<dyn ShellRunner>) -> Self {
        self.shell = Some(shell);
        self
    }

    /// SFTP session connector.
    pub fn sftp(mut self, connector: Arc<dyn SessionConnector>) -> Self {
        self.sftp = Some(connector);
        self
    }

    /// SMB session connector.
    pub fn smb(mut self, connector: Arc<dyn SessionConnector>) -> Self {
        self.smb = Some(connector);
        self
    }

    /// Document resolver for `content://` and `otg://` paths.
    pub fn documents(mut self, resolver: Arc<dyn DocumentResolver>) -> Self {
        self.documents = Some(resolver);
        self
    }

    /// Signed-in account for a cloud mode. Non-cloud modes are ignored.
    pub fn cloud(mut self, mode: OpenMode, account: Arc<dyn CloudStorage>) -> Self {
        if mode.is_cloud() {
            self.clouds.insert(mode, account);
        } else {
            tracing::warn!(%mode, "ignoring cloud account registered for a non-cloud mode");
        }
        self
    }

    /// Finish building.
    pub fn build(self) -> FsContext {
        FsContext {
            root_mode: self.root_mode,
            removable_roots: self.removable_roots,
            smb_timeout: self.smb_timeout,
            scratch_dir: self.scratch_dir.unwrap_or_else(std::env::temp_dir),
            document_root: self.document_root,
            otg_root: self.otg_root,
            shell: self.shell,
            sftp: self.sftp,
            smb: self.smb,
            documents: self.documents,
            clouds: self.clouds,
        }
    }
}
