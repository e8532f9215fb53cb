//! Privileged command execution.

use crate::FsError;

/// Runs commands in a privileged ("root") shell.
///
/// # Errors
///
/// Implementations return [`FsError::ShellUnavailable`] when no privileged
/// shell can be obtained. A command that runs but exits non-zero should
/// still return its output; callers interpret it.
pub trait ShellRunner: Send + Sync {
    /// Run `command` and return its standard output, one entry per line.
    fn run(&self, command: &str) -> Result<Vec<String>, FsError>;
}

/// Quote `arg` for a POSIX shell.
///
/// ```rust
/// use anyfs_hybrid::shell_quote;
///
/// assert_eq!(shell_quote("/data/it's here"), r"'/data/it'\''s here'");
/// ```
pub fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_paths() {
        assert_eq!(shell_quote("/system/bin"), "'/system/bin'");
    }

    #[test]
    fn shell_runner_is_object_safe() {
        fn _check(_: &dyn ShellRunner) {}
    }
}
