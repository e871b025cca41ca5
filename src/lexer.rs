//! Lexical analysis (tokenization) of a single command line.
//!
//! The lexer is a small finite state machine over the characters of the line. It
//! understands POSIX-style single quotes, double quotes and backslash escaping and
//! produces plain string tokens; it never performs any I/O.

use thiserror::Error;

/// Errors that can occur during lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexingError {
    /// The line ended while a quoted segment was still open.
    #[error("unterminated quote: missing closing {quote}")]
    UnterminatedQuote {
        /// The quote character that was never closed.
        quote: char,
    },
}

/// The lexical state the tokenizer is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Unquoted,
    SingleQuoted,
    DoubleQuoted,
}

/// Characters that keep their backslash escape meaning inside double quotes.
const DOUBLE_QUOTE_ESCAPES: [char; 5] = ['$', '`', '"', '\\', '\n'];

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    mode: ParseMode,
    buffer: String,
    // set once a quote opens inside the pending word, so `''` still yields a token
    quoted: bool,
}

impl LexingFSM {
    /// Creates a new instance of the lexical analysis Finite State Machine.
    ///
    /// # Arguments
    /// * `line` - The input string to be lexed.
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            mode: ParseMode::Unquoted,
            buffer: String::new(),
            quoted: false,
        }
    }

    /// Performs lexical analysis on the input and returns the tokens in order.
    ///
    /// Quote characters are never part of a token. Adjacent quoted and unquoted
    /// segments concatenate into a single token because the pending buffer is only
    /// flushed on unquoted whitespace and at the end of input.
    ///
    /// # Returns
    /// A `Result<Vec<String>, LexingError>`: the tokens on success, or
    /// `LexingError::UnterminatedQuote` if the line ends inside a quoted segment.
    fn make_tokens(&mut self) -> Result<Vec<String>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.mode {
                ParseMode::Unquoted => self.handle_unquoted(ch, &mut out),
                ParseMode::SingleQuoted => self.handle_single_quote(ch),
                ParseMode::DoubleQuoted => self.handle_double_quote(ch),
            }
        }

        match self.mode {
            ParseMode::SingleQuoted => return Err(LexingError::UnterminatedQuote { quote: '\'' }),
            ParseMode::DoubleQuoted => return Err(LexingError::UnterminatedQuote { quote: '"' }),
            ParseMode::Unquoted => {}
        }

        self.flush(&mut out);
        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn handle_unquoted(&mut self, ch: char, out: &mut Vec<String>) {
        match ch {
            '"' => self.open_quote(ParseMode::DoubleQuoted),
            '\'' => self.open_quote(ParseMode::SingleQuoted),
            '\\' => {
                // a trailing backslash has nothing to escape and is dropped
                if let Some(escaped) = self.read_char() {
                    self.buffer.push(escaped);
                }
            }
            c if c.is_whitespace() => self.flush(out),
            c => self.buffer.push(c),
        }
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.mode = ParseMode::Unquoted,
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.mode = ParseMode::Unquoted,
            '\\' => match self.peek_char() {
                Some(next) if DOUBLE_QUOTE_ESCAPES.contains(&next) => {
                    self.read_char();
                    self.buffer.push(next);
                }
                // Backslash stays literal; the next character is lexed on its own.
                Some(_) => self.buffer.push('\\'),
                None => {}
            },
            c => self.buffer.push(c),
        }
    }

    fn open_quote(&mut self, mode: ParseMode) {
        self.quoted = true;
        self.mode = mode;
    }

    /// Moves the pending word into `out`. Whitespace runs never produce empty tokens.
    fn flush(&mut self, out: &mut Vec<String>) {
        if self.buffer.is_empty() && !self.quoted {
            return;
        }
        out.push(std::mem::take(&mut self.buffer));
        self.quoted = false;
    }
}

/// The main entry point function to perform lexical analysis.
///
/// Creates and runs the finite state machine to tokenize the input line.
///
/// # Arguments
/// * `line` - The string to be tokenized.
///
/// # Returns
/// `Result<Vec<String>, LexingError>`: the ordered tokens on success. No tokens are
/// returned at all when a quote is left open.
pub fn tokenize(line: &str) -> Result<Vec<String>, LexingError> {
    let mut lexer = LexingFSM::new(line);
    lexer.make_tokens()
}

/// Quotes `token` with single quotes so that [`tokenize`] reads it back verbatim.
///
/// Embedded single quotes are closed, escaped with a backslash and reopened.
pub fn quote(token: &str) -> String {
    let mut quoted = String::with_capacity(token.len() + 2);
    quoted.push('\'');
    for ch in token.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}
