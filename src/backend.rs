use crate::answer::{Answer, AnswerSet};
use crate::utils::{Error, Result};

/// Asks one question of each supported type.
///
/// Implementations own input validation: an interactive backend re-prompts on
/// an out-of-range number, a non-interactive one returns an error.
pub trait Prompter {
    fn confirm(&mut self, key: &str, title: &str, default: bool) -> Result<bool>;

    fn range(&mut self, key: &str, title: &str, default: i64, bounds: (i64, i64)) -> Result<i64>;

    fn text(&mut self, key: &str, title: &str, default: &str) -> Result<String>;

    fn select(
        &mut self,
        key: &str,
        title: &str,
        options: &[String],
        default: Option<&str>,
    ) -> Result<String>;
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn confirm(&mut self, key: &str, title: &str, default: bool) -> Result<bool> {
        (**self).confirm(key, title, default)
    }

    fn range(&mut self, key: &str, title: &str, default: i64, bounds: (i64, i64)) -> Result<i64> {
        (**self).range(key, title, default, bounds)
    }

    fn text(&mut self, key: &str, title: &str, default: &str) -> Result<String> {
        (**self).text(key, title, default)
    }

    fn select(
        &mut self,
        key: &str,
        title: &str,
        options: &[String],
        default: Option<&str>,
    ) -> Result<String> {
        (**self).select(key, title, options, default)
    }
}

/// Answers from a fixed script, falling back to each question's default.
///
/// With an empty script every question takes its default (the first option for
/// selects without one).
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    responses: AnswerSet,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, key: impl Into<String>, answer: impl Into<Answer>) -> Self {
        self.responses.insert(key, answer);
        self
    }

    /// Keys in the order they were asked.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    fn response(&mut self, key: &str) -> Option<&Answer> {
        self.asked.push(key.to_string());
        self.responses.get(key)
    }
}

fn mismatched(key: &str, expected: &'static str) -> Error {
    Error::MismatchedAnswer {
        key: key.to_string(),
        expected,
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, key: &str, _title: &str, default: bool) -> Result<bool> {
        match self.response(key) {
            None => Ok(default),
            Some(answer) => answer.as_bool().ok_or_else(|| mismatched(key, "boolean")),
        }
    }

    fn range(&mut self, key: &str, _title: &str, default: i64, bounds: (i64, i64)) -> Result<i64> {
        let value = match self.response(key) {
            None => default,
            Some(answer) => answer.as_number().ok_or_else(|| mismatched(key, "number"))?,
        };
        let (min, max) = bounds;
        if value < min || value > max {
            return Err(Error::OutOfRange {
                key: key.to_string(),
                min,
                max,
                value,
            });
        }
        Ok(value)
    }

    fn text(&mut self, key: &str, _title: &str, default: &str) -> Result<String> {
        match self.response(key) {
            None => Ok(default.to_string()),
            Some(answer) => answer
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| mismatched(key, "string")),
        }
    }

    fn select(
        &mut self,
        key: &str,
        _title: &str,
        options: &[String],
        default: Option<&str>,
    ) -> Result<String> {
        let choice = match self.response(key) {
            Some(answer) => answer.as_str().ok_or_else(|| mismatched(key, "string"))?,
            None => match default.or_else(|| options.first().map(String::as_str)) {
                Some(choice) => choice,
                None => return Err(mismatched(key, "one of the options")),
            },
        };
        if !options.iter().any(|option| option == choice) {
            return Err(Error::MissingOption {
                key: key.to_string(),
                value: choice.to_string(),
            });
        }
        Ok(choice.to_string())
    }
}
