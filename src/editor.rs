//! Keystroke-at-a-time line editor with command-name completion.
//!
//! The editor reads raw bytes one keystroke at a time, echoes what it accepts (the
//! terminal does not, since it is in raw mode) and hands a finished line back to the
//! caller. TAB completes command names:
//!
//! - exactly one candidate: the rest of the name plus a space is appended;
//! - no candidate: the terminal bell rings;
//! - several candidates: the bell rings, and a second TAB on the same buffer lists
//!   them all before redrawing the prompt.

use crate::completion::{self, CandidateSource};
use std::io::{self, Read, Write};
use std::iter;
use thiserror::Error;

const ETX: u8 = 0x03;
const EOT: u8 = 0x04;
const BS: u8 = 0x08;
const DEL: u8 = 0x7f;

const BELL: &str = "\x07";
const CRLF: &str = "\r\n";
const ERASE_CHAR: &str = "\x08 \x08";

/// Errors that end an interactive read session.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The underlying reader or writer failed.
    #[error("could not read character: {0}")]
    Io(#[from] io::Error),
    /// The input was not valid UTF-8 (or decoded to the replacement character).
    #[error("invalid character input")]
    InvalidInput,
}

/// How a call to [`LineEditor::read_line`] finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The user submitted a line.
    Line(String),
    /// Interrupt / end-of-transmission was typed, or the input ran out.
    SessionEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Interrupt,
    Enter,
    Tab,
    Backspace,
    Char(char),
    Eof,
}

/// Line editor over a byte source and an echo sink.
pub struct LineEditor<R, W> {
    input: R,
    output: W,
    echo: bool,
    buffer: String,
    pending_second_tab: bool,
}

impl<R: Read, W: Write> LineEditor<R, W> {
    /// Create an editor that echoes keystroke feedback to `output`.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            echo: true,
            buffer: String::new(),
            pending_second_tab: false,
        }
    }

    /// Enable or disable keystroke feedback (echo, bells and listings).
    ///
    /// Feedback is turned off for non-interactive input, where the terminal is not
    /// in raw mode and nobody is watching the keystrokes.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Write `prompt` to the output stream.
    pub fn write_prompt(&mut self, prompt: &str) -> io::Result<()> {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()
    }

    /// Read keystrokes until a line is submitted or the session ends.
    ///
    /// `prompt` is only used to redraw the line after listing completions; it is
    /// not written up front (see [`LineEditor::write_prompt`]).
    pub fn read_line(
        &mut self,
        prompt: &str,
        names: &dyn CandidateSource,
    ) -> Result<ReadOutcome, EditorError> {
        self.buffer.clear();
        self.pending_second_tab = false;

        loop {
            match self.read_key()? {
                Key::Interrupt => return Ok(ReadOutcome::SessionEnd),
                Key::Eof if self.buffer.is_empty() => return Ok(ReadOutcome::SessionEnd),
                Key::Eof => return Ok(ReadOutcome::Line(std::mem::take(&mut self.buffer))),
                Key::Enter => {
                    self.emit(CRLF)?;
                    return Ok(ReadOutcome::Line(std::mem::take(&mut self.buffer)));
                }
                Key::Tab => self.complete(prompt, names)?,
                Key::Backspace => self.erase()?,
                Key::Char(ch) => self.insert(ch)?,
            }
        }
    }

    fn complete(&mut self, prompt: &str, names: &dyn CandidateSource) -> io::Result<()> {
        let known = names.known_names();
        let candidates = completion::complete(&self.buffer, &known);
        tracing::trace!(partial = %self.buffer, count = candidates.len(), "completion");

        if self.pending_second_tab {
            self.pending_second_tab = false;
            let listing = format!("{CRLF}{}{CRLF}{prompt}{}", candidates.join(" "), self.buffer);
            return self.emit(&listing);
        }

        if completion::has_common_prefix(&candidates) {
            let suffix = candidates[0][self.buffer.len()..].to_string();
            for ch in suffix.chars().chain(iter::once(' ')) {
                self.insert(ch)?;
            }
        } else {
            self.pending_second_tab = candidates.len() > 1;
            self.emit(BELL)?;
        }
        Ok(())
    }

    fn insert(&mut self, ch: char) -> io::Result<()> {
        self.buffer.push(ch);
        self.pending_second_tab = false;
        let mut utf8 = [0u8; 4];
        self.emit(ch.encode_utf8(&mut utf8))
    }

    fn erase(&mut self) -> io::Result<()> {
        self.pending_second_tab = false;
        match self.buffer.pop() {
            Some(_) => self.emit(ERASE_CHAR),
            None => Ok(()),
        }
    }

    fn emit(&mut self, text: &str) -> io::Result<()> {
        if !self.echo {
            return Ok(());
        }
        self.output.write_all(text.as_bytes())?;
        self.output.flush()
    }

    fn read_key(&mut self) -> Result<Key, EditorError> {
        let Some(lead) = self.read_byte()? else {
            return Ok(Key::Eof);
        };
        let key = match lead {
            ETX | EOT => Key::Interrupt,
            b'\r' | b'\n' => Key::Enter,
            b'\t' => Key::Tab,
            BS | DEL => Key::Backspace,
            b if b.is_ascii() => Key::Char(char::from(b)),
            b => Key::Char(self.read_multibyte(b)?),
        };
        Ok(key)
    }

    fn read_multibyte(&mut self, lead: u8) -> Result<char, EditorError> {
        let width = match lead {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return Err(EditorError::InvalidInput),
        };
        let mut bytes = [lead, 0, 0, 0];
        for slot in bytes.iter_mut().take(width).skip(1) {
            *slot = self.read_byte()?.ok_or(EditorError::InvalidInput)?;
        }
        std::str::from_utf8(&bytes[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .filter(|&ch| ch != char::REPLACEMENT_CHARACTER)
            .ok_or(EditorError::InvalidInput)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.input.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}
