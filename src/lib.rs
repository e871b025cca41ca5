//! A small interactive shell with POSIX-style quoting and command-name completion.
//!
//! A submitted line is split into tokens by the [`lexer`], its output redirections
//! (`>`, `1>`, `2>`, `>>`, `1>>`, `2>>`) are applied, and the first token is run as a
//! builtin (`exit`, `echo`, `type`, `pwd`, `cd`) or as an executable found on `PATH`.
//!
//! Interactive sessions put the terminal in raw mode and read keystrokes through the
//! [`editor`], which completes command names on TAB: a unique match is filled in, an
//! ambiguous one rings the bell and a second TAB lists the candidates.
//!
//! The main entry point is [`Interpreter`]. The public modules [`command`] and
//! [`env`] expose traits and types for implementing your own commands and for
//! interacting with the shell environment.

mod builtin;
pub mod command;
pub mod completion;
pub mod config;
pub mod editor;
pub mod env;
pub mod error;
mod external;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod redirect;
mod terminal;

pub use config::{CliArgs, ShellConfig};
pub use error::ShellError;
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
