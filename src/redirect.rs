use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use thiserror::Error;

/// Stream a redirection operator applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStream {
    Stdout,
    Stderr,
}

/// Whether the target file is truncated or appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    Truncate,
    Append,
}

/// One `op target` pair taken out of a command's arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub target_stream: TargetStream,
    pub mode: RedirectMode,
    pub path: String,
}

#[derive(Debug, Error)]
pub enum RedirectionError {
    #[error("redirect specified but no target file given after '{operator}'")]
    MissingTarget { operator: String },
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
}

fn parse_operator(token: &str) -> Option<(TargetStream, RedirectMode)> {
    match token {
        ">" | "1>" => Some((TargetStream::Stdout, RedirectMode::Truncate)),
        ">>" | "1>>" => Some((TargetStream::Stdout, RedirectMode::Append)),
        "2>" => Some((TargetStream::Stderr, RedirectMode::Truncate)),
        "2>>" => Some((TargetStream::Stderr, RedirectMode::Append)),
        _ => None,
    }
}

/// Split a command's arguments into plain arguments and redirections.
///
/// Operators must be whole tokens; `echo a>b` passes `a>b` through untouched.
/// The token after an operator is its target and is never an argument.
pub fn extract_redirections(
    args: &[String],
) -> Result<(Vec<String>, Vec<Redirection>), RedirectionError> {
    let mut plain = Vec::with_capacity(args.len());
    let mut redirections = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let Some((target_stream, mode)) = parse_operator(arg) else {
            plain.push(arg.clone());
            continue;
        };
        let path = iter.next().ok_or_else(|| RedirectionError::MissingTarget {
            operator: arg.clone(),
        })?;
        redirections.push(Redirection {
            target_stream,
            mode,
            path: path.clone(),
        });
    }
    Ok((plain, redirections))
}

impl Redirection {
    /// Open the target, resolving a relative path against `cwd`.
    pub fn open(&self, cwd: &Path) -> Result<File, RedirectionError> {
        let mut options = OpenOptions::new();
        match self.mode {
            RedirectMode::Truncate => options.write(true).create(true).truncate(true),
            RedirectMode::Append => options.append(true).create(true),
        };
        options
            .open(cwd.join(&self.path))
            .map_err(|source| RedirectionError::Open {
                path: self.path.clone(),
                source,
            })
    }
}

/// Files opened for one command. Dropping the value closes them.
#[derive(Debug, Default)]
pub struct RedirectedStreams {
    pub stdout: Option<File>,
    pub stderr: Option<File>,
}

impl RedirectedStreams {
    /// Open the final target of each stream.
    ///
    /// A later operator for the same stream overrides an earlier one, and the
    /// overridden targets are not created.
    pub fn open(redirections: &[Redirection], cwd: &Path) -> Result<Self, RedirectionError> {
        let last_for = |stream: TargetStream| {
            redirections
                .iter()
                .rev()
                .find(|r| r.target_stream == stream)
        };
        let stdout = last_for(TargetStream::Stdout)
            .map(|r| r.open(cwd))
            .transpose()?;
        let stderr = last_for(TargetStream::Stderr)
            .map(|r| r.open(cwd))
            .transpose()?;
        tracing::debug!(
            stdout = stdout.is_some(),
            stderr = stderr.is_some(),
            "opened redirections"
        );
        Ok(Self { stdout, stderr })
    }
}
