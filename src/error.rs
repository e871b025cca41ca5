use crate::editor::EditorError;
use crate::lexer::LexingError;
use crate::redirect::RedirectionError;
use std::io;
use thiserror::Error;

/// Everything that can go wrong while turning a line into a finished command.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The line could not be tokenized.
    #[error("invalid command: {0}")]
    Syntax(#[from] LexingError),
    /// A redirection had no target or its target could not be opened.
    #[error("failed redirecting: {0}")]
    Redirection(#[from] RedirectionError),
    /// Neither a builtin nor an executable on the search path.
    #[error("{0}: command not found")]
    NotFound(String),
    /// Reading keystrokes failed.
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The command was found but could not be run to completion.
    #[error("{name}: {message}")]
    Process { name: String, message: String },
}

impl ShellError {
    /// Status a line finishing with this error reports.
    pub fn exit_code(&self) -> i32 {
        match self {
            ShellError::NotFound(_) => 127,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ShellError::from(LexingError::UnterminatedQuote { quote: '\'' });
        assert_eq!(
            err.to_string(),
            "invalid command: unterminated quote: missing closing '"
        );

        let err = ShellError::NotFound("nope".to_string());
        assert_eq!(err.to_string(), "nope: command not found");
        assert_eq!(err.exit_code(), 127);

        let err = ShellError::Process {
            name: "ls".to_string(),
            message: "Permission denied (os error 13)".to_string(),
        };
        assert_eq!(err.to_string(), "ls: Permission denied (os error 13)");
        assert_eq!(err.exit_code(), 1);
    }
}
