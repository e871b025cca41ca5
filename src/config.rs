use argh::FromArgs;

/// Prompt written before every line unless overridden.
pub const DEFAULT_PROMPT: &str = "$ ";

#[derive(FromArgs, Debug)]
/// Interactive shell with quoting, redirection and command-name completion.
pub struct CliArgs {
    /// run a single command line and exit with its status
    #[argh(option, short = 'c')]
    pub command: Option<String>,

    /// read whole lines without switching the terminal to raw mode
    #[argh(switch)]
    pub no_raw: bool,

    /// text written before each line (default "$ ")
    #[argh(option)]
    pub prompt: Option<String>,
}

/// Runtime settings of one shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub prompt: String,
    /// Put the terminal in raw mode when stdin is one.
    pub raw_mode: bool,
    /// Line to run instead of starting the interactive loop.
    pub command: Option<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            raw_mode: true,
            command: None,
        }
    }
}

impl From<CliArgs> for ShellConfig {
    fn from(args: CliArgs) -> Self {
        let defaults = Self::default();
        Self {
            prompt: args.prompt.unwrap_or(defaults.prompt),
            raw_mode: !args.no_raw,
            command: args.command,
        }
    }
}
