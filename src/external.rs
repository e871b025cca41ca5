use crate::command::{CommandFactory, ExecutableCommand, ExitCode, OutputStream};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::Result;
use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

/// Command that is not a builtin.
pub struct ExternalCommand {
    name: String,
    path: PathBuf,
    args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(name: impl Into<String>, path: PathBuf, args: Vec<OsString>) -> Self {
        Self {
            name: name.into(),
            path,
            args,
        }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        let search_paths = env.search_path().unwrap_or_default();
        let executable =
            find_command_path(OsStr::new(&search_paths), &env.current_dir, Path::new(name))?;
        tracing::debug!(name, path = %executable.display(), "resolved external command");
        Some(Box::new(ExternalCommand::new(
            name,
            executable,
            args.iter().map(OsString::from).collect(),
        )))
    }

    fn known_names(&self, env: &Environment) -> Vec<String> {
        match env.search_path() {
            Some(paths) => executables_on_path(OsStr::new(&paths)).into_iter().collect(),
            None => Vec::new(),
        }
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn OutputStream,
        stderr: &mut dyn OutputStream,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        // anything we buffered must reach the terminal before the child writes to it
        stdout.flush()?;
        stderr.flush()?;

        let child = std::process::Command::new(&self.path)
            .args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(stdout.stdio()?)
            .stderr(stderr.stdio()?)
            .env_clear()
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir)
            .spawn()?;

        // Only piped streams (in-memory writers) collect anything here.
        let output = child.wait_with_output()?;
        stdout.write_all(&output.stdout)?;
        stderr.write_all(&output.stderr)?;

        let code = match output.status.code() {
            Some(x) => x,
            None => terminated_by_signal(output.status),
        };
        if code != 0 {
            write!(stderr, "{}: exit status {}\r\n", self.name, code)?;
        }
        Ok(code)
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it names a regular file.
/// - Relative with multiple components (e.g., `bin/sh`): resolved against `cwd`.
/// - `./foo` on Unix or any relative path on other platforms: resolved against `cwd`.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   in order and return the first regular file with that name.
/// - Empty path: returns `None`.
pub fn find_command_path(search_paths: &OsStr, cwd: &Path, path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return find_by_path(path);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir {
        if let Some(found) = find_by_path(&cwd.join(path)) {
            return Some(found);
        }
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        // Empty path -> not found
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()),
        _ => find_by_path(&cwd.join(path)),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths).find_map(|dir| find_by_path(&dir.join(cmd)))
}

fn find_by_path(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        Some(path.to_path_buf())
    } else {
        None
    }
}

/// Names of all executable regular files in the directories of `search_paths`.
///
/// Unreadable or missing directories are skipped.
pub fn executables_on_path(search_paths: &OsStr) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for dir in std::env::split_paths(search_paths) {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), "skipping search path entry: {e}");
                continue;
            }
        };
        for entry in entries.flatten() {
            let Ok(metadata) = fs::metadata(entry.path()) else {
                continue;
            };
            if !metadata.is_file() || !is_executable(&metadata) {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.insert(name.to_string());
            }
        }
    }
    names
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}
