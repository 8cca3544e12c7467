use crate::answer::AnswerSet;
use crate::generator::{quote, Generator};
use crate::store::Record;

const DEVELOPMENT: &[&str] = &["development"];
const TEST: &[&str] = &["test"];
const DEVELOPMENT_AND_TEST: &[&str] = &["development", "test"];

/// Drives `generator` from the persisted answers of one run.
///
/// Questions missing from the answers (skipped, or absent from a custom
/// question file) count as declined.
pub fn apply(record: &Record, generator: &mut dyn Generator) {
    let answers = &record.answers;
    let skip_git = record
        .metadata
        .arguments
        .split_whitespace()
        .any(|arg| arg == "--skip-git");
    let rspec = answers.text("test_suite") == Some("rspec");
    let background_job = answers
        .text("background_job")
        .filter(|adapter| *adapter != "none")
        .filter(|adapter| checked("background_job", adapter));

    add_gems(answers, rspec, background_job, generator);
    generator.replace_file("README.md", README);
    generator.create_file("PANACEA.md", &panacea_document(record));

    if answers.flag("rubocop") {
        setup_rubocop(answers, generator);
    }
    if answers.flag("letter_opener") {
        setup_letter_opener(generator);
    }
    if let Some(timezone) = answers.text("timezone") {
        setup_timezone(timezone, generator);
    }
    if let Some(locale) = answers.text("locale") {
        setup_default_locale(locale, generator);
    }
    if answers.flag("oj") {
        generator.create_file("config/initializers/oj.rb", "Oj.optimize_rails\n");
    }
    if answers.flag("dotenv") {
        generator.create_file(".env", "# Environment variables loaded by dotenv-rails\n");
        generator.append_to_file(".gitignore", "\n# Ignore .env file\n.env\n");
    }
    if let Some(adapter) = background_job {
        generator.application(&format!(
            "# Background jobs\nconfig.active_job.queue_adapter = :{adapter}\n"
        ));
    }

    generator.after_bundle();

    generator.rails_command("db:create");
    if answers.flag("bullet") {
        setup_bullet(generator);
    }
    setup_test_suite(answers, rspec, generator);
    if background_job == Some("delayed_job") {
        generator.generate("delayed_job:active_record", &[]);
    }
    if answers.flag("devise") {
        setup_devise(answers, generator);
    }
    if answers.flag("pundit") {
        generator.generate("pundit:install", &[]);
    }
    if answers.flag("money_rails") {
        generator.generate("money_rails:initializer", &[]);
    }
    if answers.flag("kaminari") {
        generator.generate("kaminari:config", &[]);
    }
    if answers.flag("foreman") {
        setup_foreman(background_job, generator);
    }
    if answers.flag("rubocop") {
        generator.run("bundle exec rubocop -a --format=simple");
    }
    if !skip_git {
        if answers.flag("autocommit") {
            generator.git_commit(answers.text("commit_msg").unwrap_or("Initial commit"));
        }
        if answers.flag("githook") {
            setup_githook(answers, generator);
        }
    }
    generator.say(BYE_MESSAGE);
}

const README: &str = "# README\n\nThis application was generated with [panacea](https://panacea.website).\n\n## Getting started\n\n    bin/setup\n    bin/rails server\n\nThe options chosen at generation time are listed in `PANACEA.md`.\n";

const BYE_MESSAGE: &str = "Panacea is done. Your application is ready, have fun!";

/// Answers reach Ruby symbols, file paths and shell commands; only plain
/// identifiers get through.
fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn checked(key: &str, value: &str) -> bool {
    let ok = is_identifier(value);
    if !ok {
        tracing::warn!(key, value, "ignoring answer that is not a plain identifier");
    }
    ok
}

/// Markdown record of what this application was generated with.
fn panacea_document(record: &Record) -> String {
    let arguments = match record.metadata.arguments.as_str() {
        "" => "(none)",
        arguments => arguments,
    };
    let mut doc = format!(
        "# Panacea\n\nGenerated by panacea {}.\n\n## Arguments\n\n    {arguments}\n\n## Answers\n\n| Question | Answer |\n| --- | --- |\n",
        record.metadata.version
    );
    for (key, answer) in record.answers.iter() {
        let answer = answer.to_string().replace('|', "\\|");
        doc.push_str(&format!("| {key} | {answer} |\n"));
    }
    doc
}

fn setup_githook(answers: &AnswerSet, generator: &mut dyn Generator) {
    let hook = answers.text("githook_type").unwrap_or("pre-commit");
    if !checked("githook_type", hook) {
        return;
    }
    let path = format!(".git/hooks/{hook}");
    generator.create_file(&path, "#!/bin/sh\n\nbundle exec rubocop\n");
    generator.run(&format!("chmod ug+x {path}"));
}

fn add_gems(
    answers: &AnswerSet,
    rspec: bool,
    background_job: Option<&str>,
    generator: &mut dyn Generator,
) {
    let gems: [(&str, &str, &[&str]); 11] = [
        ("oj", "oj", &[]),
        ("dotenv", "dotenv-rails", DEVELOPMENT_AND_TEST),
        ("devise", "devise", &[]),
        ("pundit", "pundit", &[]),
        ("money_rails", "money-rails", &[]),
        ("kaminari", "kaminari", &[]),
        ("bullet", "bullet", DEVELOPMENT),
        ("letter_opener", "letter_opener", DEVELOPMENT),
        ("foreman", "foreman", DEVELOPMENT),
        ("rubocop", "rubocop-rails", DEVELOPMENT),
        ("simplecov", "simplecov", TEST),
    ];
    for (key, gem, groups) in gems {
        if answers.flag(key) {
            generator.gem(gem, groups);
        }
    }
    if rspec {
        generator.gem("rspec-rails", DEVELOPMENT_AND_TEST);
    }
    match background_job {
        Some("delayed_job") => generator.gem("delayed_job_active_record", &[]),
        Some(adapter) => generator.gem(adapter, &[]),
        None => {}
    }
}

fn setup_rubocop(answers: &AnswerSet, generator: &mut dyn Generator) {
    let max = answers
        .get("rubocop_max_line_length")
        .and_then(|answer| answer.as_number())
        .unwrap_or(120);
    generator.create_file(
        ".rubocop.yml",
        &format!(
            "require: rubocop-rails\n\nAllCops:\n  NewCops: enable\n  Exclude:\n    - \"bin/**/*\"\n    - \"db/schema.rb\"\n    - \"node_modules/**/*\"\n    - \"vendor/**/*\"\n\nLayout/LineLength:\n  Max: {max}\n"
        ),
    );
}

fn setup_letter_opener(generator: &mut dyn Generator) {
    generator.environment(
        "# Settings for Letter Opener\nconfig.action_mailer.delivery_method = :letter_opener\nconfig.action_mailer.perform_deliveries = true\nconfig.action_mailer.default_url_options = { host: \"localhost\", port: 3000 }\n",
        "development",
    );
}

/// Options read like "Madrid - (GMT+01:00)".
fn setup_timezone(timezone: &str, generator: &mut dyn Generator) {
    let timezone = timezone.split('-').next().unwrap_or(timezone).trim();
    generator.application(&format!(
        "# Default timezone\nconfig.time_zone = {}\n",
        quote(timezone)
    ));
}

/// Options read like "French - fr".
fn setup_default_locale(locale: &str, generator: &mut dyn Generator) {
    let locale = locale.rsplit("- ").next().unwrap_or(locale).trim();
    if !checked("locale", locale) {
        return;
    }
    generator.application(&format!(
        "# Default i18n locale\nconfig.i18n.default_locale = :{locale}\n"
    ));
    if locale != "en" {
        generator.create_file(
            &format!("config/locales/{locale}.yml"),
            &format!("{locale}:\n  hello: \"Hello world\"\n"),
        );
    }
}

fn setup_bullet(generator: &mut dyn Generator) {
    generator.environment(
        "# Settings for Bullet\nconfig.after_initialize do\n  Bullet.enable = true\n  Bullet.alert = true\n  Bullet.bullet_logger = true\n  Bullet.console = true\n  Bullet.rails_logger = true\n  Bullet.add_footer = true\nend\n",
        "development",
    );
}

fn setup_test_suite(answers: &AnswerSet, rspec: bool, generator: &mut dyn Generator) {
    let helper = if rspec {
        generator.generate("rspec:install", &[]);
        "spec/rails_helper.rb"
    } else {
        "test/test_helper.rb"
    };
    if answers.flag("simplecov") {
        let minimum = answers
            .get("simplecov_minimum_coverage")
            .and_then(|answer| answer.as_number())
            .unwrap_or(0);
        generator.create_file(
            ".simplecov",
            &format!("SimpleCov.start \"rails\" do\n  minimum_coverage {minimum}\nend\n"),
        );
        generator.prepend_to_file(helper, "require \"simplecov\"\n");
        generator.append_to_file(".gitignore", "\n# Ignore coverage reports\n/coverage\n");
    }
    if !rspec && answers.flag("headless_chrome") {
        generator.replace_file(
            "test/application_system_test_case.rb",
            "require \"test_helper\"\n\nclass ApplicationSystemTestCase < ActionDispatch::SystemTestCase\n  driven_by :selenium, using: :headless_chrome, screen_size: [1400, 1400]\nend\n",
        );
    }
}

fn setup_devise(answers: &AnswerSet, generator: &mut dyn Generator) {
    let model = match answers.text("devise_model_name") {
        Some(model) if is_model_name(model) => model,
        Some(model) => {
            tracing::warn!(model, "devise model name is not a Ruby constant, using User");
            "User"
        }
        None => "User",
    };
    generator.generate("devise:install", &[]);
    generator.generate("devise", &[model]);
    if answers.flag("devise_override_views") {
        let scope = pluralize(&model.to_lowercase());
        generator.generate("devise:views", &[scope.as_str()]);
    }
}

/// `User`, `Admin::Account`.
fn is_model_name(name: &str) -> bool {
    name.split("::").all(|part| {
        part.starts_with(|c: char| c.is_ascii_uppercase())
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

fn setup_foreman(background_job: Option<&str>, generator: &mut dyn Generator) {
    let mut procfile = String::from("web: bundle exec rails server -p ${PORT:-3000}\n");
    match background_job {
        Some("sidekiq") => procfile.push_str("worker: bundle exec sidekiq\n"),
        Some("resque") => procfile.push_str("worker: QUEUE=* bundle exec rake resque:work\n"),
        Some("delayed_job") => procfile.push_str("worker: bundle exec rake jobs:work\n"),
        _ => {}
    }
    generator.create_file("Procfile", &procfile);
}

fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{stem}ies");
        }
    }
    if word.ends_with(['s', 'x', 'z']) || word.ends_with("ch") || word.ends_with("sh") {
        return format!("{word}es");
    }
    format!("{word}s")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::Answer;
    use crate::generator::{Action, Script};

    fn script(answers: AnswerSet, arguments: &str) -> Script {
        let mut script = Script::new();
        apply(&Record::new(answers, arguments), &mut script);
        script
    }

    fn generated(actions: &[Action]) -> Vec<String> {
        actions
            .iter()
            .filter_map(|action| match action {
                Action::Generate { generator, args } => {
                    Some(format!("{generator} {}", args.join(" ")).trim().to_string())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn devise_with_views() {
        let script = script(
            AnswerSet::from_iter([
                ("devise", Answer::Bool(true)),
                ("devise_model_name", Answer::from("Company")),
                ("devise_override_views", Answer::Bool(true)),
            ]),
            "",
        );
        assert!(script.setup_actions().contains(&Action::Gem {
            name: "devise".into(),
            groups: vec![],
        }));
        assert_eq!(
            generated(script.after_bundle_actions()),
            ["devise:install", "devise Company", "devise:views companies"]
        );
    }

    #[test]
    fn nothing_chosen_still_creates_database() {
        let script = script(AnswerSet::new(), "");
        let paths = script
            .setup_actions()
            .iter()
            .filter_map(|action| match action {
                Action::CreateFile { path, .. } => Some(path.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(paths, ["README.md", "PANACEA.md"]);
        assert_eq!(
            script.after_bundle_actions(),
            [
                Action::RailsCommand("db:create".into()),
                Action::Say(BYE_MESSAGE.into()),
            ]
        );
    }

    #[test]
    fn panacea_document_lists_answers() {
        let record = Record::new(
            AnswerSet::from_iter([
                ("devise", Answer::Bool(true)),
                ("rubocop_max_line_length", Answer::Number(100)),
                ("commit_msg", Answer::from("a | b")),
            ]),
            "--database=mysql",
        );
        let doc = panacea_document(&record);
        assert!(doc.contains(&format!("Generated by panacea {}.", crate::VERSION)));
        assert!(doc.contains("    --database=mysql\n"));
        assert!(doc.contains("| devise | true |\n"));
        assert!(doc.contains("| rubocop_max_line_length | 100 |\n"));
        assert!(doc.contains("| commit_msg | a \\| b |\n"));
    }

    #[test]
    fn unsafe_answers_never_reach_ruby_or_shell() {
        let script = script(
            AnswerSet::from_iter([
                ("timezone", Answer::from("UTC\" + `id` + \"")),
                ("locale", Answer::from("Evil - en; rm -rf /")),
                ("background_job", Answer::from("sidekiq\nend")),
                ("devise", Answer::Bool(true)),
                ("devise_model_name", Answer::from("User`id`")),
                ("githook", Answer::Bool(true)),
                ("githook_type", Answer::from("pre-commit; rm -rf ~")),
            ]),
            "",
        );
        let setup = script.setup_actions();
        assert!(setup.contains(&Action::Application {
            contents: "# Default timezone\nconfig.time_zone = \"UTC\\\" + `id` + \\\"\"\n".into(),
            env: None,
        }));
        assert!(!setup.iter().any(|action| matches!(
            action,
            Action::Application { contents, .. }
                if contents.contains("default_locale") || contents.contains("queue_adapter")
        )));
        let after = script.after_bundle_actions();
        assert_eq!(generated(after), ["devise:install", "devise User"]);
        assert!(!after.iter().any(|action| matches!(action, Action::Run(_))));
    }

    #[test]
    fn skip_git_drops_commit_and_hook() {
        let answers = AnswerSet::from_iter([
            ("autocommit", Answer::Bool(true)),
            ("commit_msg", Answer::from("First")),
            ("githook", Answer::Bool(true)),
            ("githook_type", Answer::from("pre-push")),
        ]);
        let with_git = script(answers.clone(), "--database=postgresql");
        let actions = with_git.after_bundle_actions();
        assert!(actions.contains(&Action::GitCommit("First".into())));
        assert!(actions.contains(&Action::Run("chmod ug+x .git/hooks/pre-push".into())));

        let without_git = script(answers, "--database=postgresql --skip-git");
        assert!(!without_git
            .after_bundle_actions()
            .iter()
            .any(|action| matches!(action, Action::GitCommit(_) | Action::Run(_))));
    }

    #[test]
    fn locale_and_timezone_are_extracted_from_labels() {
        let script = script(
            AnswerSet::from_iter([
                ("locale", Answer::from("French - fr")),
                ("timezone", Answer::from("Pacific Time (US & Canada) - (GMT-08:00)")),
            ]),
            "",
        );
        let actions = script.setup_actions();
        assert!(actions.contains(&Action::Application {
            contents: "# Default timezone\nconfig.time_zone = \"Pacific Time (US & Canada)\"\n"
                .into(),
            env: None,
        }));
        assert!(actions.contains(&Action::Application {
            contents: "# Default i18n locale\nconfig.i18n.default_locale = :fr\n".into(),
            env: None,
        }));
        assert!(actions.iter().any(
            |action| matches!(action, Action::CreateFile { path, .. } if path == "config/locales/fr.yml")
        ));
    }

    #[test]
    fn rspec_with_sidekiq_and_foreman() {
        let script = script(
            AnswerSet::from_iter([
                ("test_suite", Answer::from("rspec")),
                ("simplecov", Answer::Bool(true)),
                ("simplecov_minimum_coverage", Answer::Number(80)),
                ("background_job", Answer::from("sidekiq")),
                ("foreman", Answer::Bool(true)),
            ]),
            "",
        );
        let setup = script.setup_actions();
        assert!(setup.contains(&Action::Gem {
            name: "rspec-rails".into(),
            groups: vec!["development".into(), "test".into()],
        }));
        assert!(setup.contains(&Action::Gem {
            name: "sidekiq".into(),
            groups: vec![],
        }));
        let after = script.after_bundle_actions();
        assert!(after.contains(&Action::PrependToFile {
            path: "spec/rails_helper.rb".into(),
            contents: "require \"simplecov\"\n".into(),
        }));
        assert!(after.iter().any(|action| matches!(
            action,
            Action::CreateFile { path, contents, .. }
                if path == "Procfile" && contents.contains("worker: bundle exec sidekiq")
        )));
    }

    #[test]
    fn pluralizes_model_names() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("company"), "companies");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("boss"), "bosses");
        assert_eq!(pluralize("match"), "matches");
    }
}
