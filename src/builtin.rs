use crate::command::{CommandFactory, ExecutableCommand, ExitCode, OutputStream};
use crate::env::Environment;
use crate::external::find_command_path;
use crate::interpreter::Factory;
use anyhow::{Context, Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Names of every command implemented inside the shell.
pub const BUILTIN_NAMES: [&str; 5] = ["exit", "echo", "type", "pwd", "cd"];

/// Whether `name` is handled by the shell itself.
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Executes the command using provided output streams and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    /// Lines end in CRLF since the terminal is in raw mode while commands run.
    fn execute(
        self,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn OutputStream,
        stderr: &mut dyn OutputStream,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let result = <T as BuiltinCommand>::execute(*self, &mut *stdout, &mut *stderr, env);
        stdout.flush()?;
        match result {
            Ok(x) => Ok(x),
            Err(e) => {
                write!(stderr, "{e:#}\r\n")?;
                stderr.flush()?;
                Ok(1)
            }
        }
    }
}

/// Usage or parse error produced by `argh` instead of a command.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn OutputStream,
        stderr: &mut dyn OutputStream,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        let text = to_crlf(&self.output);
        if self.is_error {
            stderr.write_all(text.as_bytes())?;
            Ok(1)
        } else {
            stdout.write_all(text.as_bytes())?;
            Ok(0)
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }

    fn known_names(&self, _env: &Environment) -> Vec<String> {
        vec![T::name().to_string()]
    }
}

fn to_crlf(text: &str) -> String {
    let mut out = text.replace('\n', "\r\n");
    if !out.ends_with("\r\n") {
        out.push_str("\r\n");
    }
    out
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        write!(stdout, "{}\r\n", env.current_dir.to_string_lossy())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// `~` stands for the directory in the HOME environment variable, which is also used
/// when no target is given.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute, relative to the current directory, or starting with `~`.
    pub target: Option<String>,
}

impl Cd {
    fn resolve_target(&self, env: &Environment) -> Result<PathBuf> {
        let home = || env.home_dir().ok_or_else(|| anyhow!("cd: HOME not set"));
        let target = match self.target.as_deref() {
            None | Some("") | Some("~") => home()?,
            Some(t) => match t.strip_prefix("~/") {
                Some(rest) => home()?.join(rest),
                None => PathBuf::from(t),
            },
        };
        Ok(env.current_dir.join(target))
    }
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let new_dir = self.resolve_target(env)?;
        let shown = self.target.as_deref().unwrap_or("~");

        let canonical = fs::canonicalize(&new_dir)
            .ok()
            .filter(|dir| dir.is_dir())
            .ok_or_else(|| anyhow!("cd: {shown}: No such file or directory"))?;

        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Exit the shell with the given status (0 when omitted).
pub struct Exit {
    #[argh(positional)]
    /// exit status to terminate the shell with.
    pub code: Option<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let code = match self.code {
            None => 0,
            Some(raw) => raw
                .parse::<ExitCode>()
                .map_err(|_| anyhow!("invalid exit code value: {raw}"))?,
        };
        env.request_exit(code);
        Ok(code)
    }
}

/// Write the arguments to standard output, separated by single spaces and followed by CRLF.
///
/// Arguments are taken verbatim, flags and `--help` included.
pub struct Echo {
    pub args: Vec<String>,
}

impl FromArgs for Echo {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Echo {
            args: args.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        write!(stdout, "{}\r\n", self.args.join(" "))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Tell how each name would be interpreted if used as a command.
pub struct Type {
    #[argh(positional, greedy)]
    /// command names to look up.
    pub names: Vec<String>,
}

impl BuiltinCommand for Type {
    fn name() -> &'static str {
        "type"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        if self.names.is_empty() {
            write!(stderr, "type: usage: type name [name ...]\r\n")?;
            return Ok(1);
        }

        let search_paths = env.search_path().unwrap_or_default();
        let mut code = 0;
        for name in &self.names {
            if is_builtin(name) {
                write!(stdout, "{name} is a shell builtin\r\n")?;
                continue;
            }
            let resolved =
                find_command_path(OsStr::new(&search_paths), &env.current_dir, Path::new(name));
            match resolved {
                Some(path) => write!(stdout, "{name} is {}\r\n", path.display())?,
                None => {
                    write!(stdout, "{name}: not found\r\n")?;
                    code = 1;
                }
            }
        }
        Ok(code)
    }
}

/// Serializes tests that change the process working directory.
#[cfg(test)]
pub(crate) fn lock_current_dir() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
