use std::fmt::Display;

use indexmap::IndexMap;
use serde::Serialize;
use toml::Value;

use crate::utils::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl Answer {
    /// Anything but `false` gates subquestions, including `0` and `""`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Bool(false))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool(a), Value::Boolean(b)) => a == b,
            (Self::Number(a), Value::Integer(b)) => a == b,
            (Self::Text(a), Value::String(b)) => a == b,
            _ => false,
        }
    }

    pub(crate) fn try_from_toml(key: &str, value: Value) -> Result<Self> {
        match value {
            Value::Boolean(value) => Ok(Self::Bool(value)),
            Value::Integer(value) => Ok(Self::Number(value)),
            Value::String(value) => Ok(Self::Text(value)),
            other => Err(Error::UnsupportedAnswer {
                key: key.to_string(),
                type_str: other.type_str(),
            }),
        }
    }
}

impl From<Answer> for Value {
    fn from(answer: Answer) -> Self {
        match answer {
            Answer::Bool(value) => Value::Boolean(value),
            Answer::Number(value) => Value::Integer(value),
            Answer::Text(value) => Value::String(value),
        }
    }
}

impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Answer {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for Answer {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(value) => value.fmt(f),
            Self::Number(value) => value.fmt(f),
            Self::Text(value) => value.fmt(f),
        }
    }
}

/// Flat, insertion-ordered answers keyed by question key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnswerSet(IndexMap<String, Answer>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins; a re-recorded key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, answer: impl Into<Answer>) {
        self.0.insert(key.into(), answer.into());
    }

    pub fn get(&self, key: &str) -> Option<&Answer> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Answer> {
        self.0.shift_remove(key)
    }

    /// Removes `key` and reports whether it held a truthy answer.
    pub fn take_flag(&mut self, key: &str) -> bool {
        self.remove(key).is_some_and(|answer| answer.is_truthy())
    }

    /// `true` only when `key` was answered with `true`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(Answer::as_bool).unwrap_or(false)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Answer::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Answer)> {
        self.0.iter().map(|(key, answer)| (key.as_str(), answer))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, A: Into<Answer>> FromIterator<(K, A)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, A)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, answer)| (key.into(), answer.into()))
                .collect(),
        )
    }
}

impl IntoIterator for AnswerSet {
    type Item = (String, Answer);
    type IntoIter = indexmap::map::IntoIter<String, Answer>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
