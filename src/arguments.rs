use indexmap::IndexMap;
use toml::Value;

/// Renders flags the way `rails new` expects them.
///
/// Strings become `--key=value`, `true` becomes `--key`; anything else is
/// dropped. Values are not escaped.
pub fn encode(flags: &IndexMap<String, Value>) -> String {
    flags
        .iter()
        .filter_map(|(key, value)| match value {
            Value::String(value) => Some(format!("--{key}={value}")),
            Value::Boolean(true) => Some(format!("--{key}")),
            _ => None,
        })
        .collect::<Vec<String>>()
        .join(" ")
}
