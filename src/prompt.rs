//! Interactive questions asked before a command goes ahead.
//!
//! Commands never read the terminal directly. They ask a [`Prompter`] and get
//! back a typed answer, which keeps them testable and lets `--yes` skip the
//! confirmation step.

use std::io::{BufRead, Write};

use crate::db::parse_minutes;
use crate::{Error, Result};

/// Source of answers for confirmations and duration entry.
pub trait Prompter {
    /// Ask a yes/no question. Anything but an explicit yes is a no.
    fn confirm(&mut self, question: &str) -> Result<bool>;

    /// Ask for a duration in minutes. `None` means the user cancelled.
    fn ask_minutes(&mut self, question: &str) -> Result<Option<u32>>;
}

/// Prompter reading answers line by line, writing questions to `output`.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question} ")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{question} [y/N]"))?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }

    fn ask_minutes(&mut self, question: &str) -> Result<Option<u32>> {
        let answer = self.ask(question)?;
        if answer.is_empty() {
            return Ok(None);
        }
        parse_minutes(&answer)
            .map(Some)
            .ok_or_else(|| Error::InvalidInput(format!("unrecognised duration '{answer}'")))
    }
}

/// Prompter on the process's stdin and stderr, keeping stdout for results.
pub fn terminal() -> LinePrompter<std::io::StdinLock<'static>, std::io::Stderr> {
    LinePrompter::new(std::io::stdin().lock(), std::io::stderr())
}

/// Prompter for non-interactive runs: confirms everything, cannot supply durations.
pub struct AssumeYes;

impl Prompter for AssumeYes {
    fn confirm(&mut self, _question: &str) -> Result<bool> {
        Ok(true)
    }

    fn ask_minutes(&mut self, _question: &str) -> Result<Option<u32>> {
        Err(Error::InvalidInput(
            "actual duration required; pass --actual".into(),
        ))
    }
}
