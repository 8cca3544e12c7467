use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Deserialize;
use toml::Value;

use crate::answer::{Answer, AnswerSet};
use crate::utils::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    #[default]
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
}

/// Gate over previously collected answers.
///
/// ```toml
/// condition = { key = "test_suite", value = "minitest" }
/// condition = { all = [{ key = "devise", value = true }, { key = "pundit", operator = "ne", value = true }] }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    All {
        all: Vec<Condition>,
    },
    Any {
        any: Vec<Condition>,
    },
    Not {
        not: Box<Condition>,
    },
    Compare {
        key: String,
        #[serde(default)]
        operator: Operator,
        value: Value,
    },
}

impl Condition {
    pub fn compare(key: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self::Compare {
            key: key.into(),
            operator,
            value: value.into(),
        }
    }

    /// `visited` holds every key the traversal has reached so far, answered or
    /// skipped. Keys outside it are an error; skipped keys only satisfy `ne`.
    pub fn eval(&self, answers: &AnswerSet, visited: &HashSet<String>) -> Result<bool> {
        match self {
            Self::All { all } => {
                for condition in all {
                    if !condition.eval(answers, visited)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Any { any } => {
                for condition in any {
                    if condition.eval(answers, visited)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Not { not } => Ok(!not.eval(answers, visited)?),
            Self::Compare {
                key,
                operator,
                value,
            } => {
                if !visited.contains(key) {
                    return Err(Error::UndefinedReference { key: key.clone() });
                }
                Ok(match answers.get(key) {
                    Some(answer) => operator.apply(answer, value),
                    None => *operator == Operator::Ne,
                })
            }
        }
    }

    /// Every answer key this condition reads, in declaration order.
    pub fn references(&self) -> Vec<&str> {
        match self {
            Self::All { all: conditions } | Self::Any { any: conditions } => conditions
                .iter()
                .flat_map(Condition::references)
                .collect(),
            Self::Not { not } => not.references(),
            Self::Compare { key, .. } => vec![key.as_str()],
        }
    }
}

impl Operator {
    fn apply(self, answer: &Answer, value: &Value) -> bool {
        match self {
            Self::Eq => answer.matches(value),
            Self::Ne => !answer.matches(value),
            Self::In => match value {
                Value::Array(items) => items.iter().any(|item| answer.matches(item)),
                other => answer.matches(other),
            },
            Self::Lt => ordering(answer, value) == Some(Ordering::Less),
            Self::Le => matches!(
                ordering(answer, value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Self::Gt => ordering(answer, value) == Some(Ordering::Greater),
            Self::Ge => matches!(
                ordering(answer, value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

fn ordering(answer: &Answer, value: &Value) -> Option<Ordering> {
    match (answer, value) {
        (Answer::Number(a), Value::Integer(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visited(keys: &[&str]) -> HashSet<String> {
        keys.iter().map(|key| key.to_string()).collect()
    }

    fn answers() -> AnswerSet {
        AnswerSet::from_iter([
            ("devise", Answer::Bool(true)),
            ("workers", Answer::Number(4)),
            ("background_job", Answer::from("sidekiq")),
        ])
    }

    #[test]
    fn deserializes_all_shapes() {
        #[derive(Deserialize)]
        struct Doc {
            condition: Condition,
        }
        let doc: Doc = toml::from_str(
            r#"
            [condition]
            any = [
                { key = "a", value = 1 },
                { not = { key = "b", operator = "in", value = ["x", "y"] } },
                { all = [] },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(
            doc.condition,
            Condition::Any {
                any: vec![
                    Condition::compare("a", Operator::Eq, 1),
                    Condition::Not {
                        not: Box::new(Condition::compare(
                            "b",
                            Operator::In,
                            Value::Array(vec!["x".into(), "y".into()])
                        )),
                    },
                    Condition::All { all: vec![] },
                ]
            }
        );
        assert_eq!(doc.condition.references(), ["a", "b"]);
    }

    #[test]
    fn compares_answers() {
        let answers = answers();
        let seen = visited(&["devise", "workers", "background_job"]);
        let eval = |c: Condition| c.eval(&answers, &seen).unwrap();

        assert!(eval(Condition::compare("devise", Operator::Eq, true)));
        assert!(!eval(Condition::compare("devise", Operator::Eq, "true")));
        assert!(eval(Condition::compare("background_job", Operator::Ne, "none")));
        assert!(eval(Condition::compare("workers", Operator::Ge, 4)));
        assert!(!eval(Condition::compare("workers", Operator::Lt, 4)));
        assert!(!eval(Condition::compare("background_job", Operator::Gt, 1)));
        assert!(eval(Condition::compare(
            "background_job",
            Operator::In,
            Value::Array(vec!["resque".into(), "sidekiq".into()])
        )));
    }

    #[test]
    fn combinators_short_circuit() {
        let answers = answers();
        let seen = visited(&["devise"]);
        // The second operand is never reached, so the unvisited key is not an error.
        let any = Condition::Any {
            any: vec![
                Condition::compare("devise", Operator::Eq, true),
                Condition::compare("later", Operator::Eq, true),
            ],
        };
        assert!(any.eval(&answers, &seen).unwrap());
        let all = Condition::All {
            all: vec![
                Condition::compare("devise", Operator::Eq, false),
                Condition::compare("later", Operator::Eq, true),
            ],
        };
        assert!(!all.eval(&answers, &seen).unwrap());
        assert!(Condition::All { all: vec![] }.eval(&answers, &seen).unwrap());
        assert!(!Condition::Any { any: vec![] }.eval(&answers, &seen).unwrap());
    }

    #[test]
    fn skipped_key_only_satisfies_ne() {
        let answers = AnswerSet::new();
        let seen = visited(&["skipped"]);
        assert!(!Condition::compare("skipped", Operator::Eq, true)
            .eval(&answers, &seen)
            .unwrap());
        assert!(Condition::compare("skipped", Operator::Ne, true)
            .eval(&answers, &seen)
            .unwrap());
        assert!(!Condition::compare("skipped", Operator::Le, 1)
            .eval(&answers, &seen)
            .unwrap());
    }

    #[test]
    fn unvisited_key_is_an_error() {
        let err = Condition::compare("later", Operator::Eq, true)
            .eval(&answers(), &visited(&[]))
            .unwrap_err();
        assert!(matches!(err, Error::UndefinedReference { key } if key == "later"));
    }
}
