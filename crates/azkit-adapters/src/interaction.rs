//! Prompter and messager doubles for tests and non-interactive embedding.

use std::collections::VecDeque;

use azkit_core::{
    application::ports::{MessageLevel, Messager, Prompter},
    error::AzkitResult,
};
use parking_lot::Mutex;

/// Answers prompts from a fixed script, then reports closed input.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    transcript: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            transcript: Mutex::default(),
        }
    }

    /// Every message and prompt shown so far, in order.
    pub fn transcript(&self) -> Vec<String> {
        self.transcript.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().len()
    }
}

impl Prompter for ScriptedPrompter {
    fn message(&self, text: &str) -> AzkitResult<()> {
        self.transcript.lock().push(text.to_string());
        Ok(())
    }

    fn read_line(&self, prompt: &str) -> AzkitResult<Option<String>> {
        self.transcript.lock().push(prompt.to_string());
        Ok(self.answers.lock().pop_front())
    }
}

/// Keeps every message it is shown.
#[derive(Debug, Default)]
pub struct RecordingMessager {
    messages: Mutex<Vec<(MessageLevel, String)>>,
}

impl RecordingMessager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(MessageLevel, String)> {
        self.messages.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.messages.lock().iter().any(|(_, m)| m.contains(text))
    }
}

impl Messager for RecordingMessager {
    fn show(&self, level: MessageLevel, message: &str) {
        self.messages.lock().push((level, message.to_string()));
    }
}
