//! Terminal implementations of the [`Prompter`] port.

use std::io::{self, BufRead, IsTerminal, Write};

use azkit_core::{
    application::Prompter,
    error::{AzkitError, AzkitResult},
};
use console::Term;

/// Pick the prompter for this process: rich line editing on a terminal,
/// plain line reads when stdin is piped.
pub fn terminal_prompter() -> Box<dyn Prompter> {
    rich_prompter().unwrap_or_else(|| Box::new(StdinPrompter::new()))
}

#[cfg(feature = "interactive")]
fn rich_prompter() -> Option<Box<dyn Prompter>> {
    io::stdin()
        .is_terminal()
        .then(|| Box::new(DialoguerPrompter::new()) as Box<dyn Prompter>)
}

#[cfg(not(feature = "interactive"))]
fn rich_prompter() -> Option<Box<dyn Prompter>> {
    None
}

/// Reads answers line by line from stdin. End of input yields `None`.
pub struct StdinPrompter {
    term: Term,
}

impl StdinPrompter {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }
}

impl Default for StdinPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for StdinPrompter {
    fn message(&self, text: &str) -> AzkitResult<()> {
        self.term.write_line(text).map_err(io_error)
    }

    fn read_line(&self, prompt: &str) -> AzkitResult<Option<String>> {
        let mut out = io::stdout().lock();
        write!(out, "{prompt} ").and_then(|()| out.flush()).map_err(io_error)?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line).map_err(io_error)?;
        if read == 0 {
            return Ok(None);
        }
        if !io::stdin().is_terminal() {
            // Echo piped answers so transcripts stay readable.
            writeln!(out, "{}", line.trim_end()).map_err(io_error)?;
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

#[cfg(feature = "interactive")]
pub struct DialoguerPrompter {
    term: Term,
}

#[cfg(feature = "interactive")]
impl DialoguerPrompter {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }
}

#[cfg(feature = "interactive")]
impl Prompter for DialoguerPrompter {
    fn message(&self, text: &str) -> AzkitResult<()> {
        self.term.write_line(text).map_err(io_error)
    }

    fn read_line(&self, prompt: &str) -> AzkitResult<Option<String>> {
        let answer = dialoguer::Input::<String>::new()
            .with_prompt(prompt.trim_end_matches(':').trim())
            .allow_empty(true)
            .interact_text_on(&self.term);
        match answer {
            Ok(text) => Ok(Some(text)),
            Err(dialoguer::Error::IO(e))
                if matches!(
                    e.kind(),
                    io::ErrorKind::UnexpectedEof | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(dialoguer::Error::IO(e)) => Err(io_error(e)),
        }
    }
}

fn io_error(err: io::Error) -> AzkitError {
    AzkitError::Internal {
        message: format!("terminal I/O failed: {err}"),
    }
}
