use crate::command::{Command, CommandFactory, ExitCode, OutputStream};
use crate::completion::CandidateSource;
use crate::config::ShellConfig;
use crate::editor::{LineEditor, ReadOutcome};
use crate::env::Environment;
use crate::error::ShellError;
use crate::lexer;
use crate::redirect::{self, RedirectedStreams};
use crate::terminal::{self, RawMode};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: builtins and `ExternalCommand`.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Shell that tokenizes lines, applies redirections and runs builtin or external commands.
///
/// The interpreter maintains an [`Environment`] and a list of [`CommandFactory`] objects
/// that are queried in order to create commands by name. See [`Default`] for the
/// factories included out of the box.
///
/// Example
/// ```
/// use tabshell::Interpreter;
/// use tabshell::io_adapters::MemWriter;
///
/// let mut sh = Interpreter::default();
/// let (mut out, buf) = MemWriter::with_handle();
/// let mut err = MemWriter::new();
/// let code = sh
///     .execute_line_with_output("echo 'hello   world'", &mut out, &mut err)
///     .unwrap();
/// assert_eq!(code, 0);
/// assert_eq!(buf.borrow().as_slice(), b"hello   world\r\n");
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            commands,
        }
    }

    /// Replace the environment captured from the process.
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Run one line with the process's standard streams.
    pub fn execute_line(&mut self, line: &str) -> Result<ExitCode, ShellError> {
        let mut stdout = io::stdout();
        let mut stderr = io::stderr();
        self.execute_line_with_output(line, &mut stdout, &mut stderr)
    }

    /// Run one line, writing to `stdout`/`stderr` unless it redirects them.
    ///
    /// Lookup and process failures are reported on the command's (possibly
    /// redirected) stderr and turned into a status. Tokenization and redirection
    /// failures are returned before anything runs.
    pub fn execute_line_with_output(
        &mut self,
        line: &str,
        stdout: &mut dyn OutputStream,
        stderr: &mut dyn OutputStream,
    ) -> Result<ExitCode, ShellError> {
        let tokens = lexer::tokenize(line)?;
        tracing::debug!(?tokens, "tokenized line");
        let Some(command) = Command::from_tokens(tokens) else {
            return Ok(0);
        };
        self.dispatch(&command, stdout, stderr)
    }

    fn dispatch(
        &mut self,
        command: &Command,
        stdout: &mut dyn OutputStream,
        stderr: &mut dyn OutputStream,
    ) -> Result<ExitCode, ShellError> {
        let (args, redirections) = redirect::extract_redirections(&command.arguments)?;
        // the files stay open until the command finishes and close on drop, on every path
        let mut streams = RedirectedStreams::open(&redirections, &self.env.current_dir)?;
        let stdout: &mut dyn OutputStream = match streams.stdout.as_mut() {
            Some(file) => file,
            None => stdout,
        };
        let stderr: &mut dyn OutputStream = match streams.stderr.as_mut() {
            Some(file) => file,
            None => stderr,
        };

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        tracing::debug!(%command, "dispatching");
        match self.run_with_streams(&command.name, &args, stdout, stderr) {
            Ok(code) => Ok(code),
            Err(e @ (ShellError::NotFound(_) | ShellError::Process { .. })) => {
                write!(stderr, "{e}\r\n")?;
                stderr.flush()?;
                Ok(e.exit_code())
            }
            Err(e) => Err(e),
        }
    }

    fn run_with_streams(
        &mut self,
        name: &str,
        args: &[&str],
        stdout: &mut dyn OutputStream,
        stderr: &mut dyn OutputStream,
    ) -> Result<ExitCode, ShellError> {
        let cmd = self
            .commands
            .iter()
            .find_map(|factory| factory.try_create(&self.env, name, args))
            .ok_or_else(|| ShellError::NotFound(name.to_string()))?;
        cmd.execute(stdout, stderr, &mut self.env)
            .map_err(|e| ShellError::Process {
                name: name.to_string(),
                message: format!("{e:#}"),
            })
    }

    /// Read-eval loop over the process's stdin.
    ///
    /// Raw mode is entered only when configured and stdin is a terminal. It is held
    /// for the whole session and released before returning. Returns the status
    /// requested by `exit`, or 0 when the session ends on interrupt or end of input.
    pub fn repl(&mut self, config: &ShellConfig) -> Result<ExitCode, ShellError> {
        let interactive = config.raw_mode && io::stdin().is_terminal();
        let _raw_mode = if interactive {
            Some(RawMode::enable(&io::stdin())?)
        } else {
            None
        };
        tracing::debug!(interactive, "starting session");
        // unbuffered, so a child inheriting stdin reads the lines after its own
        let stdin = terminal::unbuffered_stdin()?;
        let mut editor = LineEditor::new(stdin, io::stdout()).with_echo(interactive);

        while !self.env.should_exit {
            if let Err(e) = editor.write_prompt(&config.prompt) {
                report(format_args!("could not write prompt: {e}"));
            }
            let line = match editor.read_line(&config.prompt, &*self)? {
                ReadOutcome::Line(line) => line,
                ReadOutcome::SessionEnd => break,
            };
            if let Err(e) = self.execute_line(&line) {
                report(e);
            }
        }
        Ok(self.env.exit_code)
    }
}

fn report(err: impl Display) {
    let mut stderr = io::stderr();
    if let Err(e) = write!(stderr, "{err}\r\n").and_then(|()| stderr.flush()) {
        tracing::warn!("could not report error: {e}");
    }
}

impl CandidateSource for Interpreter {
    fn known_names(&self) -> BTreeSet<String> {
        self.commands
            .iter()
            .flat_map(|factory| factory.known_names(&self.env))
            .collect()
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - built-ins: `exit`, `echo`, `type`, `pwd`, `cd`
    /// - external command launcher
    fn default() -> Self {
        use crate::builtin::*;
        use crate::external::ExternalCommand;
        Self::new(vec![
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Echo>::default()),
            Box::new(Factory::<Type>::default()),
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ])
    }
}
