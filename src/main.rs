use std::process::ExitCode;

use tabshell::{CliArgs, Interpreter, ShellConfig};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> ExitCode {
    // Diagnostics go to stderr and stay quiet unless RUST_LOG asks for them.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let config = ShellConfig::from(argh::from_env::<CliArgs>());
    let mut shell = Interpreter::default();
    let result = match config.command.as_deref() {
        Some(line) => shell.execute_line(line),
        None => shell.repl(&config),
    };

    match result {
        // statuses outside 0..=255 wrap the way they do for a POSIX parent
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprint!("{e}\r\n");
            ExitCode::FAILURE
        }
    }
}
