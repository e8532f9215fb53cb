//! Privileged backend: local paths the app cannot read directly, reached
//! through the root shell.
//!
//! Every query is a shell round trip. Reads copy the target into the
//! scratch directory and stream the copy; writes spool into the scratch
//! directory and are copied into place when the stream is flushed or
//! dropped.

use std::io::{Read, Write};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::local::LocalFile;
use super::{degrade, visible};
use crate::stream::{StagedReader, StagedWriter, scratch_file};
use crate::{
    DirEntry, FileOps, FileType, FsContext, FsError, OpenMode, Permissions, ShellRunner,
    fallback_modified, path, shell_quote,
};

/// Printed after a command chain succeeds.
const OK_MARKER: &str = "anyfs-ok";

/// `ls` invocation whose output [`parse_ls_line`] understands.
const LS: &str = "ls -la --time-style=+%s";

/// Run `command` and fail unless it exits zero.
fn run_checked(
    shell: &dyn ShellRunner,
    operation: &'static str,
    command: &str,
) -> Result<Vec<String>, FsError> {
    let mut lines = shell.run(&format!("{command} && echo {OK_MARKER}"))?;
    if lines.last().map(|line| line.trim()) == Some(OK_MARKER) {
        lines.pop();
        Ok(lines)
    } else {
        Err(FsError::Backend(format!("{operation}: command failed: {command}")))
    }
}

/// One line of `ls -la --time-style=+%s` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LsEntry {
    pub(crate) name: String,
    pub(crate) file_type: FileType,
    pub(crate) size: u64,
    pub(crate) modified: SystemTime,
    pub(crate) permissions: Permissions,
}

/// Parse one listing line.
///
/// Layout: `perms links owner group size epoch name`, where `name` may
/// contain spaces and symlinks end in ` -> target`. Device nodes print
/// `major, minor` in place of the size. The `total` header and malformed
/// lines yield `None`.
pub(crate) fn parse_ls_line(line: &str) -> Option<LsEntry> {
    let mut rest = line.trim_end();
    let mut next_field = || {
        let trimmed = rest.trim_start();
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let (field, tail) = trimmed.split_at(end);
        rest = tail;
        (!field.is_empty()).then_some(field)
    };

    let perms = next_field()?;
    let file_type = match perms.chars().next()? {
        'd' => FileType::Directory,
        'l' => FileType::Symlink,
        '-' | 'c' | 'b' | 'p' | 's' => FileType::File,
        _ => return None,
    };
    // ACL (`+`), SELinux (`.`) and xattr (`@`) markers follow the mode.
    let mode = perms.strip_suffix(&['+', '.', '@'][..]).unwrap_or(perms);
    let permissions = Permissions::from_symbolic(mode)?;
    let _links = next_field()?;
    let _owner = next_field()?;
    let _group = next_field()?;
    let size_field = next_field()?;
    let size = if size_field.ends_with(',') {
        // device node: "major, minor"
        next_field()?;
        0
    } else {
        size_field.parse().ok()?
    };
    let epoch: u64 = next_field()?.parse().ok()?;

    let raw_name = rest.strip_prefix(' ').unwrap_or(rest);
    let name = match file_type {
        FileType::Symlink => raw_name.split(" -> ").next().unwrap_or(raw_name),
        _ => raw_name,
    };
    if name.is_empty() {
        return None;
    }

    Some(LsEntry {
        name: name.to_string(),
        file_type,
        size,
        modified: UNIX_EPOCH + Duration::from_secs(epoch),
        permissions,
    })
}

/// A local path served through the privileged shell.
pub(crate) struct RootFile<'a> {
    path: &'a str,
    ctx: &'a FsContext,
}

impl<'a> RootFile<'a> {
    pub(crate) fn new(path: &'a str, ctx: &'a FsContext) -> Self {
        Self { path, ctx }
    }

    fn quoted(&self) -> String {
        shell_quote(self.path)
    }

    /// `test -<flag>` against the path.
    fn test(&self, flag: char) -> Result<bool, FsError> {
        let command = format!("test -{flag} {} && echo 1 || echo 0", self.quoted());
        let lines = self.ctx.shell()?.run(&command)?;
        Ok(lines.first().map(|line| line.trim()) == Some("1"))
    }

    /// The listing line of the entry itself.
    fn stat(&self) -> Result<LsEntry, FsError> {
        if !self.test('e')? {
            return Err(FsError::NotFound {
                path: self.path.into(),
            });
        }
        let command = format!("{LS} -d {}", self.quoted());
        self.ctx
            .shell()?
            .run(&command)?
            .iter()
            .find_map(|line| parse_ls_line(line))
            .ok_or_else(|| FsError::Backend(format!("unparseable listing for {}", self.path)))
    }
}

impl FileOps for RootFile<'_> {
    fn modified(&self) -> SystemTime {
        degrade(
            self.stat().map(|entry| entry.modified),
            "modified",
            self.path,
            fallback_modified(),
        )
    }

    fn size(&self) -> u64 {
        let result = self.stat().map(|entry| match entry.file_type {
            FileType::Directory => 0,
            _ => entry.size,
        });
        degrade(result, "size", self.path, 0)
    }

    fn is_directory(&self) -> bool {
        degrade(self.test('d'), "is_directory", self.path, false)
    }

    fn directory_size(&self) -> u64 {
        let result = self
            .ctx
            .shell()
            .and_then(|shell| shell.run(&format!("du -sk {}", self.quoted())))
            .and_then(|lines| {
                lines
                    .first()
                    .and_then(|line| line.split_whitespace().next())
                    .and_then(|kib| kib.parse::<u64>().ok())
                    .map(|kib| kib * 1024)
                    .ok_or_else(|| FsError::Backend(format!("unparseable du output for {}", self.path)))
            });
        degrade(result, "directory_size", self.path, 0)
    }

    fn usable_space(&self) -> u64 {
        let result = fs2::available_space(Path::new(self.path))
            .map_err(|e| FsError::io("usable_space", self.path, e));
        degrade(result, "usable_space", self.path, 0)
    }

    fn total_space(&self) -> u64 {
        let result = fs2::total_space(Path::new(self.path))
            .map_err(|e| FsError::io("total_space", self.path, e));
        degrade(result, "total_space", self.path, 0)
    }

    fn for_each_child(
        &self,
        include_hidden: bool,
        on_entry: &mut dyn FnMut(DirEntry),
    ) -> Result<(), FsError> {
        if !self.test('d')? {
            return Err(if self.test('e')? {
                FsError::NotADirectory {
                    path: self.path.into(),
                }
            } else {
                FsError::NotFound {
                    path: self.path.into(),
                }
            });
        }

        let shell = self.ctx.shell()?;
        let lines = run_checked(shell, "read_dir", &format!("{LS} {}", self.quoted()))?;
        for line in &lines {
            if line.trim().is_empty() || line.starts_with("total ") {
                continue;
            }
            let Some(entry) = parse_ls_line(line) else {
                tracing::warn!(path = self.path, line = %line, "skipping unparseable listing line");
                continue;
            };
            if entry.name == "." || entry.name == ".." || !visible(&entry.name, include_hidden) {
                continue;
            }
            let mut file_type = entry.file_type;
            let mut child = path::join(OpenMode::Root, self.path, &entry.name, false);
            if file_type == FileType::Symlink && RootFile::new(&child, self.ctx).is_directory() {
                file_type = FileType::Directory;
            }
            if file_type == FileType::Directory {
                child = path::join(OpenMode::Root, self.path, &entry.name, true);
            }
            on_entry(DirEntry {
                name: entry.name,
                path: child,
                file_type,
                size: entry.size,
                modified: entry.modified,
                permissions: entry.permissions,
            });
        }
        Ok(())
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>, FsError> {
        if !self.test('e')? {
            return Err(FsError::NotFound {
                path: self.path.into(),
            });
        }
        let scratch = scratch_file(self.ctx.scratch_dir())?;
        let command = format!(
            "cat {} > {}",
            self.quoted(),
            shell_quote(&scratch.path().to_string_lossy())
        );
        run_checked(self.ctx.shell()?, "open_read", &command)?;
        Ok(Box::new(StagedReader::open(scratch)?))
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>, FsError> {
        let shell = self.ctx.shell_handle()?;
        let parent = path::parent_path(self.path).unwrap_or(".");
        if !RootFile::new(parent, self.ctx).test('d')? {
            return Err(FsError::NotFound {
                path: parent.into(),
            });
        }
        // Creating the target up front proves the shell can write it.
        run_checked(shell.as_ref(), "open_write", &format!("touch {}", self.quoted())).map_err(
            |e| match e {
                FsError::Backend(_) => FsError::PermissionDenied {
                    path: self.path.into(),
                    operation: "open_write",
                },
                other => other,
            },
        )?;

        let target = self.path.to_string();
        let writer = StagedWriter::new(
            self.ctx.scratch_dir(),
            self.path,
            Box::new(move |staged: &Path| {
                let command = format!(
                    "cat {} > {}",
                    shell_quote(&staged.to_string_lossy()),
                    shell_quote(&target)
                );
                run_checked(shell.as_ref(), "open_write", &command).map(|_| ())
            }),
        )?;
        Ok(Box::new(writer))
    }

    fn exists(&self) -> bool {
        degrade(self.test('e'), "exists", self.path, false)
    }

    fn create_directory(&self) -> Result<(), FsError> {
        if self.test('e')? {
            return if self.test('d')? {
                Ok(())
            } else {
                Err(FsError::AlreadyExists {
                    path: self.path.into(),
                    operation: "create_directory",
                })
            };
        }
        run_checked(
            self.ctx.shell()?,
            "create_directory",
            &format!("mkdir {}", self.quoted()),
        )
        .map(|_| ())
    }

    fn delete(&self, use_privileged: bool) -> Result<bool, FsError> {
        if use_privileged {
            run_checked(self.ctx.shell()?, "delete", &format!("rm -rf {}", self.quoted()))?;
        } else {
            LocalFile::new(self.path).delete(false)?;
        }
        Ok(!self.exists())
    }

    fn set_modified(&self, time: SystemTime) -> bool {
        let Ok(since_epoch) = time.duration_since(UNIX_EPOCH) else {
            tracing::warn!(path = self.path, "modification time before the epoch");
            return false;
        };
        let result = self.ctx.shell().and_then(|shell| {
            let command = format!("touch -d @{} {}", since_epoch.as_secs(), self.quoted());
            run_checked(shell, "set_modified", &command)
        });
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(path = self.path, error = %e, "failed to set modification time");
                false
            }
        }
    }
}
