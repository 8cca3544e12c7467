use std::collections::HashSet;

use crate::answer::{Answer, AnswerSet};
use crate::backend::Prompter;
use crate::question::{Question, QuestionKind, QuestionTree};
use crate::utils::Result;

/// Walks a question tree depth-first, asking every question whose condition
/// holds and descending into subquestions behind a truthy answer.
pub struct Customizer<'a, P> {
    tree: &'a QuestionTree,
    prompter: P,
    answers: AnswerSet,
    visited: HashSet<String>,
}

impl<'a, P: Prompter> Customizer<'a, P> {
    pub fn new(tree: &'a QuestionTree, prompter: P) -> Self {
        Self {
            tree,
            prompter,
            answers: AnswerSet::new(),
            visited: HashSet::new(),
        }
    }

    pub fn run(mut self) -> Result<AnswerSet> {
        let tree = self.tree;
        self.ask_questions(&tree.questions)?;
        Ok(self.answers)
    }

    fn ask_questions(&mut self, questions: &[Question]) -> Result<()> {
        for question in questions {
            if let Some(condition) = &question.condition {
                if !condition.eval(&self.answers, &self.visited)? {
                    tracing::debug!(key = %question.key, "condition not met, skipping");
                    self.skip(question);
                    continue;
                }
            }

            let answer = self.ask_question(question)?;
            tracing::trace!(key = %question.key, %answer, "recorded answer");
            let truthy = answer.is_truthy();
            self.visited.insert(question.key.clone());
            self.answers.insert(question.key.clone(), answer);

            if !question.subquestions.is_empty() {
                if truthy {
                    self.ask_questions(&question.subquestions)?;
                } else {
                    question.subquestions.iter().for_each(|q| self.skip(q));
                }
            }
        }
        Ok(())
    }

    fn ask_question(&mut self, question: &Question) -> Result<Answer> {
        let (key, title) = (question.key.as_str(), question.title.as_str());
        let answer = match &question.kind {
            QuestionKind::Boolean { default } => {
                Answer::Bool(self.prompter.confirm(key, title, *default)?)
            }
            QuestionKind::Range { default, min, max } => {
                Answer::Number(self.prompter.range(key, title, *default, (*min, *max))?)
            }
            QuestionKind::Text { default } => Answer::Text(self.prompter.text(key, title, default)?),
            QuestionKind::Select { options, default } => {
                Answer::Text(
                    self.prompter
                        .select(key, title, options, default.as_deref())?,
                )
            }
        };
        Ok(answer)
    }

    /// Marks a skipped subtree as visited so later conditions may test it.
    fn skip(&mut self, question: &Question) {
        self.visited.insert(question.key.clone());
        for subquestion in &question.subquestions {
            self.skip(subquestion);
        }
    }
}
