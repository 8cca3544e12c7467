use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use crate::answer::{Answer, AnswerSet};
use crate::utils::Result;

/// Run information written next to the answers under reserved keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = "__version__")]
    pub version: String,
    #[serde(rename = "__arguments__", default)]
    pub arguments: String,
    #[serde(rename = "__generated_at__", default)]
    pub generated_at: Option<String>,
}

impl Metadata {
    pub fn new(arguments: impl Into<String>) -> Self {
        Self {
            version: crate::VERSION.to_string(),
            arguments: arguments.into(),
            generated_at: Some(chrono::Local::now().to_rfc3339()),
        }
    }
}

/// The persisted configuration consumed by the generation hook.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub metadata: Metadata,
    pub answers: AnswerSet,
}

fn is_reserved(key: &str) -> bool {
    key.starts_with("__") && key.ends_with("__")
}

impl Record {
    pub fn new(answers: AnswerSet, arguments: impl Into<String>) -> Self {
        Self {
            metadata: Metadata::new(arguments),
            answers,
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        let mut table = Table::new();
        for (key, answer) in self.answers.iter() {
            table.insert(key.to_string(), Value::from(answer.clone()));
        }
        let metadata = Table::try_from(&self.metadata)?;
        table.extend(metadata);
        Ok(toml::to_string_pretty(&table)?)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let metadata = toml::from_str::<Metadata>(contents)?;
        let table = contents.parse::<Table>()?;
        let mut answers = AnswerSet::new();
        for (key, value) in table {
            if !is_reserved(&key) {
                let answer = Answer::try_from_toml(&key, value)?;
                answers.insert(key, answer);
            }
        }
        Ok(Self { metadata, answers })
    }

    /// Overwrites `path` unconditionally.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = self.to_toml_string()?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
