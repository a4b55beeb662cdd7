//! Batch and interactive collection of template parameters.
//!
//! Batch mode never prompts: a value is either valid, or replaced by an empty
//! string when optional, or fatal when required. Interactive mode keeps
//! asking until it gets a valid value or an empty answer with a default.

use regex::Regex;
use tracing::{debug, info};

use crate::{
    application::{
        ApplicationError,
        ports::{Messager, Prompter},
    },
    domain::{DomainError, DomainValidator},
    error::AzkitResult,
};

pub const FOUND_VALID_VALUE: &str = "Found valid value. Skip user input.";
pub const DEFAULT_INPUT_ERROR: &str = "Invalid input, please check and try again.";
const INVALID_INDEX: &str = "Invalid index.";

/// How parameters are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Values come only from the request; nothing is prompted.
    Batch,
    #[default]
    Interactive,
}

/// Predicate a collected value must satisfy. Empty values never pass.
#[derive(Debug, Clone)]
pub enum Rule {
    NonEmpty,
    FunctionName,
    PackageName,
    Pattern(Regex),
}

impl Rule {
    /// A pattern rule, or [`Rule::NonEmpty`] when `pattern` is absent or not a
    /// valid expression.
    pub fn from_pattern(pattern: Option<&str>) -> Self {
        match pattern.map(|p| Regex::new(&anchored(p))) {
            Some(Ok(regex)) => Self::Pattern(regex),
            Some(Err(e)) => {
                debug!(error = %e, "Ignoring unusable setting pattern");
                Self::NonEmpty
            }
            None => Self::NonEmpty,
        }
    }

    pub fn check(&self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        match self {
            Self::NonEmpty => true,
            Self::FunctionName => DomainValidator::is_function_name(value),
            Self::PackageName => DomainValidator::is_package_name(value),
            Self::Pattern(regex) => regex.is_match(value),
        }
    }
}

// Setting patterns are written as whole-value matches.
fn anchored(pattern: &str) -> String {
    let start = if pattern.starts_with('^') { "" } else { "^" };
    let end = if pattern.ends_with('$') { "" } else { "$" };
    format!("{start}(?:{}){end}", pattern.trim_start_matches('^').trim_end_matches('$'))
}

/// A free-text value to collect interactively.
#[derive(Debug, Clone)]
pub struct TextInput<'a> {
    pub prompt: String,
    pub initial: Option<&'a str>,
    pub rule: Rule,
    pub default: Option<&'a str>,
    pub error_message: &'a str,
}

/// Format of a free-text prompt for `attribute`.
pub fn prompt_for(attribute: &str, default: Option<&str>) -> String {
    match default.filter(|d| !d.trim().is_empty()) {
        Some(default) => format!("Enter value for {attribute}(Default: {default}): "),
        None => format!("Enter value for {attribute}: "),
    }
}

/// Collects values through a [`Prompter`], reporting through a [`Messager`].
pub struct ParameterCollector<'a> {
    mode: InputMode,
    prompter: &'a dyn Prompter,
    messager: &'a dyn Messager,
}

impl<'a> ParameterCollector<'a> {
    pub fn new(mode: InputMode, prompter: &'a dyn Prompter, messager: &'a dyn Messager) -> Self {
        Self {
            mode,
            prompter,
            messager,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Accept `input` as-is when valid. Otherwise fail if `required`, or fall
    /// back to an empty string.
    pub fn batch(&self, input: Option<&str>, rule: &Rule, required: bool) -> AzkitResult<String> {
        match input {
            Some(value) if rule.check(value) => {
                info!("{FOUND_VALID_VALUE}");
                Ok(value.to_string())
            }
            _ if required => Err(DomainError::InvalidInput {
                input: input.unwrap_or("null").to_string(),
            }
            .into()),
            _ => {
                self.messager
                    .warning("The input is invalid. Use empty string.");
                Ok(String::new())
            }
        }
    }

    /// Prompt until a valid value is entered, or an empty answer selects a
    /// non-empty default.
    pub fn text(&self, input: &TextInput<'_>) -> AzkitResult<String> {
        if let Some(initial) = input.initial.filter(|v| input.rule.check(v)) {
            info!("{FOUND_VALID_VALUE}");
            return Ok(initial.to_string());
        }

        let default = input.default.filter(|d| !d.is_empty());
        loop {
            let answer = self.read(&input.prompt)?;
            if input.rule.check(&answer) {
                return Ok(answer);
            }
            if let (Some(default), true) = (default, answer.is_empty()) {
                return Ok(default.to_string());
            }
            self.messager.warning(input.error_message);
        }
    }

    /// Pick one of `options` from a numbered menu.
    ///
    /// An `initial` value matching an option (ignoring case) is taken without
    /// showing the menu.
    pub fn choose(
        &self,
        description: &str,
        initial: Option<&str>,
        options: &[String],
    ) -> AzkitResult<String> {
        if let Some(found) = find_option(options, initial) {
            info!("{FOUND_VALID_VALUE}");
            return Ok(found.to_string());
        }

        self.prompter
            .message(&format!("Choose from below options as {description}"))?;
        for (index, option) in options.iter().enumerate() {
            self.prompter.message(&format!("{index}. {option}"))?;
        }

        loop {
            let answer = self.read("Enter index to use: ")?;
            match answer.trim().parse::<usize>() {
                Ok(index) if index < options.len() => return Ok(options[index].clone()),
                _ => self.messager.warning(INVALID_INDEX),
            }
        }
    }

    fn read(&self, prompt: &str) -> AzkitResult<String> {
        self.prompter
            .read_line(prompt)?
            .map(|line| line.trim_end_matches(['\r', '\n']).to_string())
            .ok_or_else(|| {
                ApplicationError::InputClosed {
                    field: prompt.trim().trim_end_matches(':').to_string(),
                }
                .into()
            })
    }
}

/// Case-insensitive lookup of `item` among `options`.
pub fn find_option<'o>(options: &'o [String], item: Option<&str>) -> Option<&'o str> {
    let item = item?;
    options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(item))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Mutex};

    use super::*;
    use crate::application::ports::MessageLevel;

    #[derive(Default)]
    struct Script {
        answers: Mutex<VecDeque<String>>,
        shown: Mutex<Vec<String>>,
    }

    impl Script {
        fn with(answers: &[&str]) -> Self {
            Self {
                answers: Mutex::new(answers.iter().map(|s| s.to_string()).collect()),
                shown: Mutex::default(),
            }
        }

        fn shown(&self) -> Vec<String> {
            self.shown.lock().unwrap().clone()
        }
    }

    impl Prompter for Script {
        fn message(&self, text: &str) -> AzkitResult<()> {
            self.shown.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn read_line(&self, prompt: &str) -> AzkitResult<Option<String>> {
            self.shown.lock().unwrap().push(prompt.to_string());
            Ok(self.answers.lock().unwrap().pop_front())
        }
    }

    impl Messager for Script {
        fn show(&self, level: MessageLevel, message: &str) {
            self.shown
                .lock()
                .unwrap()
                .push(format!("{level:?}: {message}"));
        }
    }

    #[test]
    fn batch_accepts_valid_function_name() {
        let script = Script::default();
        let collector = ParameterCollector::new(InputMode::Batch, &script, &script);
        let value = collector
            .batch(Some("My-Function"), &Rule::FunctionName, true)
            .unwrap();
        assert_eq!(value, "My-Function");
    }

    #[test]
    fn batch_rejects_invalid_required_value() {
        let script = Script::default();
        let collector = ParameterCollector::new(InputMode::Batch, &script, &script);
        let err = collector
            .batch(Some("123bad"), &Rule::FunctionName, true)
            .unwrap_err();
        assert!(err.to_string().contains("invalid input: 123bad"));
    }

    #[test]
    fn batch_replaces_invalid_optional_value_with_empty() {
        let script = Script::default();
        let collector = ParameterCollector::new(InputMode::Batch, &script, &script);
        let value = collector.batch(None, &Rule::NonEmpty, false).unwrap();
        assert_eq!(value, "");
        assert!(
            script
                .shown()
                .iter()
                .any(|s| s.contains("The input is invalid. Use empty string."))
        );
    }

    #[test]
    fn interactive_reprompts_until_valid() {
        let script = Script::with(&["1abc", "Good"]);
        let collector = ParameterCollector::new(InputMode::Interactive, &script, &script);
        let input = TextInput {
            prompt: "Enter value for Function Name: ".into(),
            initial: None,
            rule: Rule::FunctionName,
            default: None,
            error_message: "bad name",
        };
        assert_eq!(collector.text(&input).unwrap(), "Good");
        assert_eq!(
            script
                .shown()
                .iter()
                .filter(|s| s.as_str() == "Warning: bad name")
                .count(),
            1
        );
    }

    #[test]
    fn interactive_empty_answer_takes_default() {
        let script = Script::with(&[""]);
        let collector = ParameterCollector::new(InputMode::Interactive, &script, &script);
        let input = TextInput {
            prompt: prompt_for("schedule", Some("0 */5 * * * *")),
            initial: None,
            rule: Rule::NonEmpty,
            default: Some("0 */5 * * * *"),
            error_message: DEFAULT_INPUT_ERROR,
        };
        assert_eq!(collector.text(&input).unwrap(), "0 */5 * * * *");
        assert_eq!(
            script.shown()[0],
            "Enter value for schedule(Default: 0 */5 * * * *): "
        );
    }

    #[test]
    fn interactive_closed_input_is_an_error() {
        let script = Script::default();
        let collector = ParameterCollector::new(InputMode::Interactive, &script, &script);
        let input = TextInput {
            prompt: prompt_for("connection", None),
            initial: None,
            rule: Rule::NonEmpty,
            default: None,
            error_message: DEFAULT_INPUT_ERROR,
        };
        assert!(collector.text(&input).is_err());
    }

    #[test]
    fn menu_selects_by_index_after_bad_answers() {
        let script = Script::with(&["x", "7", "1"]);
        let collector = ParameterCollector::new(InputMode::Interactive, &script, &script);
        let options: Vec<String> = ["ANONYMOUS", "FUNCTION", "ADMIN"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let chosen = collector
            .choose("the value for authlevel: ", None, &options)
            .unwrap();
        assert_eq!(chosen, "FUNCTION");
        let shown = script.shown();
        assert!(shown.contains(&"0. ANONYMOUS".to_string()));
        assert_eq!(
            shown.iter().filter(|s| s.ends_with("Invalid index.")).count(),
            2
        );
    }

    #[test]
    fn menu_matches_initial_ignoring_case() {
        let script = Script::default();
        let collector = ParameterCollector::new(InputMode::Interactive, &script, &script);
        let options = vec!["true".to_string(), "false".to_string()];
        assert_eq!(
            collector.choose("x", Some("FALSE"), &options).unwrap(),
            "false"
        );
        assert!(script.shown().is_empty());
    }

    #[test]
    fn pattern_rules_match_whole_value() {
        let rule = Rule::from_pattern(Some("[a-z]+"));
        assert!(rule.check("abc"));
        assert!(!rule.check("abc1"));
        assert!(matches!(Rule::from_pattern(None), Rule::NonEmpty));
    }
}
