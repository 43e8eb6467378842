//! Reading user input lines for the top-level prompt and the action menu.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};

/// One read from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Ctrl-C: abandon the current line.
    Interrupted,
    /// Ctrl-D or end of input.
    Eof,
}

pub trait Prompter {
    fn read(&mut self, label: &str) -> Result<Input>;
}

/// Line editor with history, used when stdin is a terminal.
pub struct LinePrompter {
    editor: Reedline,
}

impl LinePrompter {
    pub fn new() -> Self {
        Self {
            editor: Reedline::create(),
        }
    }
}

impl Default for LinePrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for LinePrompter {
    fn read(&mut self, label: &str) -> Result<Input> {
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(label.to_owned()),
            DefaultPromptSegment::Empty,
        );
        let signal = self
            .editor
            .read_line(&prompt)
            .context("failed to read from terminal")?;
        Ok(match signal {
            Signal::Success(line) => Input::Line(line),
            Signal::CtrlC => Input::Interrupted,
            Signal::CtrlD => Input::Eof,
        })
    }
}

/// Plain line reader for piped input.
pub struct StreamPrompter<R> {
    reader: R,
}

impl<R: BufRead> StreamPrompter<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Prompter for StreamPrompter<R> {
    fn read(&mut self, label: &str) -> Result<Input> {
        let mut stderr = io::stderr();
        write!(stderr, "{label}> ").context("failed to write prompt")?;
        stderr.flush().context("failed to write prompt")?;

        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .context("failed to read input")?;
        if read == 0 {
            return Ok(Input::Eof);
        }
        Ok(Input::Line(line.trim_end_matches(['\r', '\n']).to_owned()))
    }
}

/// Line editor for interactive terminals, plain reads otherwise.
pub fn for_stdin() -> Box<dyn Prompter> {
    if io::stdin().is_terminal() {
        Box::new(LinePrompter::new())
    } else {
        Box::new(StreamPrompter::new(io::stdin().lock()))
    }
}
