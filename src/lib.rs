//! Interactive questionnaire that customizes `rails new`.
//!
//! A [`question::QuestionTree`] is walked by a [`customizer::Customizer`]
//! through a [`backend::Prompter`], the resulting [`answer::AnswerSet`] is
//! persisted as a [`store::Record`], and [`recipe::apply`] turns that record
//! into a Rails application template through the [`generator::Generator`]
//! operations.

pub mod answer;
pub mod arguments;
pub mod backend;
pub mod condition;
pub mod customizer;
pub mod generator;
pub mod question;
pub mod recipe;
pub mod stats;
pub mod store;
pub mod utils;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Opt-in question for usage statistics; never persisted nor sent.
pub const STATS_KEY: &str = "share_statistics";
