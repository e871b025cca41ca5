use crate::env::Environment;
use crate::lexer;
use anyhow::Result;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::process::Stdio;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// One submitted line after tokenization: `tokens[0]` and `tokens[1..]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub arguments: Vec<String>,
}

impl Command {
    /// Split tokens into a command. Returns `None` for a line without tokens.
    pub fn from_tokens(tokens: Vec<String>) -> Option<Self> {
        let mut tokens = tokens.into_iter();
        let name = tokens.next()?;
        Some(Self {
            name,
            arguments: tokens.collect(),
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", lexer::quote(&self.name))?;
        for arg in &self.arguments {
            write!(f, " {}", lexer::quote(arg))?;
        }
        Ok(())
    }
}

/// Abstraction over a writable output stream that can also hand out a [`Stdio`]
/// handle for spawning external processes.
///
/// Builtins write through the [`Write`] half; external commands get the stream
/// attached directly via [`OutputStream::stdio`].
pub trait OutputStream: Write {
    /// Produce a handle a child process can use for this stream.
    fn stdio(&self) -> io::Result<Stdio>;
}

impl OutputStream for io::Stdout {
    fn stdio(&self) -> io::Result<Stdio> {
        Ok(Stdio::inherit())
    }
}

impl OutputStream for io::Stderr {
    fn stdio(&self) -> io::Result<Stdio> {
        Ok(Stdio::inherit())
    }
}

impl OutputStream for File {
    fn stdio(&self) -> io::Result<Stdio> {
        Ok(Stdio::from(self.try_clone()?))
    }
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command with the resolved output and error streams.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn OutputStream,
        stderr: &mut dyn OutputStream,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
/// Implementations can use the environment to resolve executables (e.g., using PATH).
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;

    /// Names this factory can create, offered as completion candidates.
    fn known_names(&self, env: &Environment) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_command_from_tokens() {
        let cmd = Command::from_tokens(strings(&["echo", "a b", "c"])).unwrap();
        assert_eq!(cmd.name, "echo");
        assert_eq!(cmd.arguments, strings(&["a b", "c"]));

        let cmd = Command::from_tokens(strings(&["pwd"])).unwrap();
        assert!(cmd.arguments.is_empty());

        assert_eq!(Command::from_tokens(Vec::new()), None);
    }

    #[test]
    fn test_command_display_requotes_tokens() {
        let cmd = Command::from_tokens(strings(&["echo", "it's here"])).unwrap();
        let shown = cmd.to_string();
        assert_eq!(shown, r"'echo' 'it'\''s here'");
        assert_eq!(lexer::tokenize(&shown).unwrap(), strings(&["echo", "it's here"]));
    }
}
