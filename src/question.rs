use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use toml::{Table, Value};

use crate::condition::Condition;
use crate::utils::{Error, InvalidQuestionError, Result};

const EMBEDDED_QUESTIONS: &str = include_str!("../config/questions.toml");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawQuestion {
    title: String,
    #[serde(rename = "type")]
    type_str: String,
    default: Option<Value>,
    options: Option<Vec<String>>,
    range: Option<(i64, i64)>, // inclusive
    condition: Option<Condition>,
    subquestions: Option<Table>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    Boolean { default: bool },
    Range { default: i64, min: i64, max: i64 },
    Text { default: String },
    Select { options: Vec<String>, default: Option<String> },
}

impl QuestionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Boolean { .. } => "boolean",
            Self::Range { .. } => "range",
            Self::Text { .. } => "text",
            Self::Select { .. } => "select",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub key: String,
    pub title: String,
    pub kind: QuestionKind,
    pub condition: Option<Condition>,
    /// Asked only when this question's answer is truthy.
    pub subquestions: Vec<Question>,
}

impl Question {
    fn from_toml(key: String, value: Value) -> Result<Self> {
        let raw = value.try_into::<RawQuestion>()?;
        let invalid = |source| Error::InvalidQuestion {
            key: key.clone(),
            source,
        };
        let kind =
            build_kind(raw.type_str, raw.default, raw.options, raw.range).map_err(invalid)?;
        let subquestions = match raw.subquestions {
            Some(table) => parse_level(table)?,
            None => Vec::new(),
        };
        Ok(Self {
            key,
            title: raw.title,
            kind,
            condition: raw.condition,
            subquestions,
        })
    }
}

fn build_kind(
    type_str: String,
    default: Option<Value>,
    options: Option<Vec<String>>,
    range: Option<(i64, i64)>,
) -> Result<QuestionKind, InvalidQuestionError> {
    let illegal_default =
        |kind: &'static str, default: &Value| InvalidQuestionError::IllegalDefault {
            kind,
            type_str: default.type_str(),
        };
    if type_str != "select" && options.is_some() {
        return Err(InvalidQuestionError::IllegalField {
            field: "options",
            kind: "non-select",
        });
    }
    if type_str != "range" && range.is_some() {
        return Err(InvalidQuestionError::IllegalField {
            field: "range",
            kind: "non-range",
        });
    }
    let kind = match type_str.as_str() {
        "boolean" => QuestionKind::Boolean {
            default: match default {
                None => false,
                Some(Value::Boolean(default)) => default,
                Some(other) => return Err(illegal_default("boolean", &other)),
            },
        },
        "range" => {
            let (min, max) = range.ok_or(InvalidQuestionError::MissingField { field: "range" })?;
            let default = match default {
                None => min,
                Some(Value::Integer(default)) => default,
                Some(other) => return Err(illegal_default("range", &other)),
            };
            if min >= max || default < min || default > max {
                return Err(InvalidQuestionError::UnreasonableRange);
            }
            QuestionKind::Range { default, min, max }
        }
        "text" => QuestionKind::Text {
            default: match default {
                None => String::new(),
                Some(Value::String(default)) => default,
                Some(other) => return Err(illegal_default("text", &other)),
            },
        },
        "select" => {
            let options = options.ok_or(InvalidQuestionError::MissingField { field: "options" })?;
            if options.is_empty() {
                return Err(InvalidQuestionError::EmptyOptions);
            }
            let default = match default {
                None => None,
                Some(Value::String(default)) => {
                    if !options.contains(&default) {
                        return Err(InvalidQuestionError::DefaultOutsideOptions);
                    }
                    Some(default)
                }
                Some(other) => return Err(illegal_default("select", &other)),
            };
            QuestionKind::Select { options, default }
        }
        _ => return Err(InvalidQuestionError::UnsupportedType { type_str }),
    };
    Ok(kind)
}

fn parse_level(table: Table) -> Result<Vec<Question>> {
    let mut questions = Vec::new();
    for (key, value) in table {
        if !(key.starts_with("__") && key.ends_with("__")) {
            questions.push(Question::from_toml(key, value)?);
        }
    }
    Ok(questions)
}

/// Declarative, ordered question tree.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionTree {
    pub questions: Vec<Question>,
}

impl QuestionTree {
    /// The tree shipped with the binary.
    pub fn embedded() -> Result<Self> {
        Self::parse(EMBEDDED_QUESTIONS)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let table = contents.parse::<Table>()?;
        let tree = Self {
            questions: parse_level(table)?,
        };
        tree.check_references()?;
        Ok(tree)
    }

    /// Conditions may only read keys declared earlier in pre-order.
    fn check_references(&self) -> Result<()> {
        fn walk(questions: &[Question], declared: &mut HashSet<String>) -> Result<()> {
            for question in questions {
                if let Some(condition) = &question.condition {
                    if let Some(key) = condition
                        .references()
                        .into_iter()
                        .find(|key| !declared.contains(*key))
                    {
                        return Err(Error::InvalidQuestion {
                            key: question.key.clone(),
                            source: InvalidQuestionError::UndefinedReference {
                                key: key.to_string(),
                            },
                        });
                    }
                }
                if !declared.insert(question.key.clone()) {
                    tracing::warn!(key = %question.key, "duplicate question key, later answer wins");
                }
                walk(&question.subquestions, declared)?;
            }
            Ok(())
        }
        walk(&self.questions, &mut HashSet::new())
    }

    /// All keys in pre-order, subquestions included.
    pub fn keys(&self) -> Vec<&str> {
        fn walk<'a>(questions: &'a [Question], keys: &mut Vec<&'a str>) {
            for question in questions {
                keys.push(&question.key);
                walk(&question.subquestions, keys);
            }
        }
        let mut keys = Vec::new();
        walk(&self.questions, &mut keys);
        keys
    }
}
