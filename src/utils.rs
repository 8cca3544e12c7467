#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    DeserializeToml(#[from] toml::de::Error),
    #[error(transparent)]
    SerializeToml(#[from] toml::ser::Error),
    #[error(transparent)]
    MiniJinja(#[from] minijinja::Error),
    #[error("failed to read answer")]
    Prompt(#[from] dialoguer::Error),
    #[error("invalid question: '{key}'")]
    InvalidQuestion {
        key: String,
        source: InvalidQuestionError,
    },
    #[error("condition refers to '{key}' before it was asked")]
    UndefinedReference { key: String },
    #[error("answer for '{key}' out of range [{min}, {max}]: {value}")]
    OutOfRange {
        key: String,
        min: i64,
        max: i64,
        value: i64,
    },
    #[error("answer for '{key}' is not one of the options: '{value}'")]
    MissingOption { key: String, value: String },
    #[error("answer for '{key}' has the wrong type: expected {expected}")]
    MismatchedAnswer { key: String, expected: &'static str },
    #[error("invalid answer '{key}': unsupported value type {type_str}")]
    UnsupportedAnswer { key: String, type_str: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum InvalidQuestionError {
    #[error("unsupported question type: '{type_str}'")]
    UnsupportedType { type_str: String },
    #[error("missing field: '{field}'")]
    MissingField { field: &'static str },
    #[error("default of type {type_str} for {kind} question")]
    IllegalDefault {
        kind: &'static str,
        type_str: &'static str,
    },
    #[error("illegal field '{field}' for {kind} question")]
    IllegalField {
        field: &'static str,
        kind: &'static str,
    },
    #[error("unreasonable range")]
    UnreasonableRange,
    #[error("empty options")]
    EmptyOptions,
    #[error("default outside options")]
    DefaultOutsideOptions,
    #[error("condition refers to '{key}' before it is declared")]
    UndefinedReference { key: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
