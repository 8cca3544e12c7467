use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use clap::Args;
use indexmap::IndexMap;
use regex::Regex;
use tempfile::TempPath;
use toml::Value;

use panacea::answer::AnswerSet;
use panacea::arguments;
use panacea::backend::ScriptedPrompter;
use panacea::customizer::Customizer;
use panacea::generator::Script;
use panacea::question::QuestionTree;
use panacea::recipe;
use panacea::stats::{Dispatch, HttpTransport, Stats};
use panacea::store::Record;

use crate::config::{Config, StatsConfig};
use crate::prompt::TerminalPrompter;
use crate::rails;
use crate::App;

const DATABASES: [&str; 11] = [
    "mysql",
    "postgresql",
    "sqlite3",
    "oracle",
    "frontbase",
    "ibm_db",
    "sqlserver",
    "jdbcmysql",
    "jdbcsqlite3",
    "jdbcpostgresql",
    "jdbc",
];

#[derive(Clone, Args)]
pub(crate) struct New {
    #[arg(help = "Name of the Rails application to generate.")]
    app_name: Option<String>,

    #[arg(
        short = 'd',
        long = "database",
        default_value = "postgresql",
        value_parser = DATABASES,
        help = "Preconfigure for selected database.",
    )]
    database: String,

    #[arg(long = "skip-git", help = "Skip .gitignore file and git initialization.")]
    skip_git: bool,
    #[arg(long = "skip-keeps", help = "Skip source control .keep files.")]
    skip_keeps: bool,
    #[arg(long = "skip-action-mailer", help = "Skip Action Mailer files.")]
    skip_action_mailer: bool,
    #[arg(long = "skip-active-record", help = "Skip Active Record files.")]
    skip_active_record: bool,
    #[arg(long = "skip-active-storage", help = "Skip Active Storage files.")]
    skip_active_storage: bool,
    #[arg(long = "skip-action-cable", help = "Skip Action Cable files.")]
    skip_action_cable: bool,
    #[arg(long = "skip-sprockets", help = "Skip Sprockets files.")]
    skip_sprockets: bool,
    #[arg(long = "skip-spring", help = "Don't install Spring application preloader.")]
    skip_spring: bool,
    #[arg(
        long = "skip-listen",
        help = "Don't generate configuration that depends on the listen gem."
    )]
    skip_listen: bool,
    #[arg(long = "skip-javascript", help = "Skip JavaScript files.")]
    skip_javascript: bool,
    #[arg(long = "skip-turbolinks", help = "Skip turbolinks gem.")]
    skip_turbolinks: bool,
    #[arg(long = "skip-test", help = "Skip test files.")]
    skip_test: bool,
    #[arg(long = "skip-system-test", help = "Skip system test files.")]
    skip_system_test: bool,
    #[arg(long = "skip-bootsnap", help = "Skip bootsnap gem.")]
    skip_bootsnap: bool,

    #[arg(long = "api", help = "Preconfigure smaller stack for API only apps.")]
    api: bool,
    #[arg(short = 'f', long = "force", help = "Overwrite files that already exist.")]
    force: bool,
    #[arg(short = 'p', long = "pretend", help = "Run but do not make any changes.")]
    pretend: bool,
    #[arg(short = 'q', long = "quiet", help = "Suppress status output.")]
    quiet: bool,
    #[arg(short = 's', long = "skip", help = "Skip files that already exist.")]
    skip: bool,

    #[arg(
        long = "questions",
        help = "Question definitions to ask instead of the built-in ones."
    )]
    questions: Option<PathBuf>,
    #[arg(long = "config", help = "Configuration file [default: ~/.panacea.config.toml].")]
    config: Option<PathBuf>,
    #[arg(long = "defaults", help = "Accept every default without prompting.")]
    defaults: bool,
}

impl New {
    /// Options forwarded to `rails new`, in declaration order.
    fn flags(&self) -> IndexMap<String, Value> {
        let switches = [
            ("skip-git", self.skip_git),
            ("skip-keeps", self.skip_keeps),
            ("skip-action-mailer", self.skip_action_mailer),
            ("skip-active-record", self.skip_active_record),
            ("skip-active-storage", self.skip_active_storage),
            ("skip-action-cable", self.skip_action_cable),
            ("skip-sprockets", self.skip_sprockets),
            ("skip-spring", self.skip_spring),
            ("skip-listen", self.skip_listen),
            ("skip-javascript", self.skip_javascript),
            ("skip-turbolinks", self.skip_turbolinks),
            ("skip-test", self.skip_test),
            ("skip-system-test", self.skip_system_test),
            ("skip-bootsnap", self.skip_bootsnap),
            ("api", self.api),
            ("force", self.force),
            ("pretend", self.pretend),
            ("quiet", self.quiet),
            ("skip", self.skip),
        ];
        let mut flags = IndexMap::new();
        flags.insert(
            String::from("database"),
            Value::String(self.database.clone()),
        );
        for (name, on) in switches {
            flags.insert(name.to_string(), Value::Boolean(on));
        }
        flags
    }
}

impl App {
    pub(crate) fn run(&self) -> Result<()> {
        let args = &self.cli.new;
        let flags = args.flags();

        let Some(app_name) = &args.app_name else {
            println!("usage: panacea <APP_NAME> [OPTIONS]");
            println!();
            for (name, value) in &flags {
                println!("{name}: {value}");
            }
            return Ok(());
        };
        validate_app_name(app_name)?;

        let config_path = match &args.config {
            Some(path) => path.clone(),
            None => Config::default_path()?,
        };
        let config = Config::init(&config_path)
            .context(format!("failed to initialize config: {}", config_path.display()))?;

        if !rails::check_rails_installed(&config.rails)? {
            bail!("'{}' is not installed or not runnable", config.rails)
        }

        let tree = match args.questions.as_ref().or(config.questions.as_ref()) {
            Some(path) => QuestionTree::load(path)
                .context(format!("failed to load questions from {}", path.display()))?,
            None => QuestionTree::embedded().context("failed to load built-in questions")?,
        };

        let mut answers = if args.defaults {
            Customizer::new(&tree, ScriptedPrompter::new()).run()
        } else {
            Customizer::new(&tree, TerminalPrompter).run()
        }
        .context("failed to collect answers")?;
        let share = answers.take_flag(panacea::STATS_KEY);

        let arguments = arguments::encode(&flags);
        let record = Record::new(answers, arguments.clone());
        record.persist(&config.answers_file).context(format!(
            "failed to write answers to {}",
            config.answers_file.display()
        ))?;
        tracing::info!(path = %config.answers_file.display(), "answers saved");

        let dispatch = if share {
            track(&config.stats, &record.answers)
        } else {
            None
        };

        let generated = render_template(&config.answers_file).and_then(|template| {
            println!();
            rails::new_app(&config.rails, app_name, &arguments, &template)
        });
        finish(dispatch, config.stats.grace(), generated)
    }
}

/// Gives an in-flight statistics request its grace period, whether or not
/// generation succeeded, then reports the generation outcome.
fn finish(dispatch: Option<Dispatch>, grace: Duration, generated: Result<()>) -> Result<()> {
    if let Some(dispatch) = dispatch {
        dispatch.wait(grace);
    }
    generated
}

fn validate_app_name(app_name: &str) -> Result<()> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").unwrap());
    if !pattern.is_match(app_name) {
        bail!("invalid application name: '{app_name}'")
    }
    Ok(())
}

fn track(config: &StatsConfig, answers: &AnswerSet) -> Option<Dispatch> {
    let payload = match serde_json::to_value(answers) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::debug!(error = %err, "failed to encode statistics");
            return None;
        }
    };
    match HttpTransport::new() {
        Ok(transport) => Some(Stats::new(&config.endpoint, transport).track(payload)),
        Err(err) => {
            tracing::debug!(error = %err, "failed to build statistics client");
            None
        }
    }
}

/// Reads the saved answers back and renders the Rails template they describe.
fn render_template(answers_file: &Path) -> Result<TempPath> {
    let record = Record::load(answers_file).context(format!(
        "failed to read answers from {}",
        answers_file.display()
    ))?;
    let mut script = Script::new();
    recipe::apply(&record, &mut script);
    let source = script
        .render()
        .context("failed to render application template")?;

    let mut file = tempfile::Builder::new()
        .prefix("panacea-")
        .suffix(".rb")
        .tempfile()
        .context("failed to create temporary file")?;
    file.write_all(source.as_bytes()).context(format!(
        "failed to write application template: {}",
        file.path().display()
    ))?;
    Ok(file.into_temp_path())
}
