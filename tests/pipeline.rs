use tempfile::TempDir;

use panacea::backend::ScriptedPrompter;
use panacea::customizer::Customizer;
use panacea::generator::Script;
use panacea::question::QuestionTree;
use panacea::recipe;
use panacea::store::Record;

fn generate(prompter: ScriptedPrompter, arguments: &str) -> String {
    let tree = QuestionTree::embedded().unwrap();
    let mut answers = Customizer::new(&tree, prompter).run().unwrap();
    assert!(!answers.take_flag(panacea::STATS_KEY));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".panacea");
    Record::new(answers, arguments).persist(&path).unwrap();

    let record = Record::load(&path).unwrap();
    let mut script = Script::new();
    recipe::apply(&record, &mut script);
    let source = script.render().unwrap();
    assert_heredocs_close(&source);
    source
}

/// Every `<<'TAG'` opener is closed by a line that is exactly `TAG`, and no
/// terminator-like line appears outside a heredoc.
fn assert_heredocs_close(source: &str) {
    let mut open: Option<&str> = None;
    for (number, line) in source.lines().enumerate() {
        match open {
            Some(tag) => {
                if line == tag {
                    open = None;
                }
            }
            None => {
                assert!(
                    !line.starts_with("PANACEA"),
                    "stray terminator on line {}: {line:?}\n{source}",
                    number + 1
                );
                if let Some((_, rest)) = line.split_once("<<'") {
                    let tag = rest.split('\'').next().unwrap();
                    open = Some(tag);
                }
            }
        }
    }
    assert_eq!(open, None, "unterminated heredoc\n{source}");
    assert_eq!(source.lines().last(), Some("end"));
}

#[test]
fn defaults_render_a_complete_template() {
    let source = generate(ScriptedPrompter::new(), "--database=postgresql");

    let (setup, after_bundle) = source.split_once("after_bundle do").unwrap();
    assert!(setup.contains("gem \"devise\""));
    assert!(setup.contains("gem \"rubocop-rails\", group: :development"));
    assert!(setup.contains("config.time_zone = \"UTC\""));
    assert!(setup.contains("config.i18n.default_locale = :en"));
    assert!(!setup.contains("rspec-rails"));

    assert!(after_bundle.contains("rails_command \"db:create\""));
    assert!(after_bundle.contains("generate \"devise:install\""));
    assert!(after_bundle.contains("minimum_coverage 90"));
    assert!(after_bundle.contains("headless_chrome"));
    assert!(after_bundle.contains("git commit:"));
    assert!(!after_bundle.contains("pundit:install"));
    assert!(after_bundle.contains("environment <<'PANACEA', env: \"development\""));
    assert!(after_bundle.contains(
        "create_file \"test/application_system_test_case.rb\", <<'PANACEA', force: true"
    ));
    assert!(after_bundle
        .trim_end()
        .ends_with("say \"Panacea is done. Your application is ready, have fun!\", :green\nend"));
}

#[test]
fn answers_shape_the_template() {
    let prompter = ScriptedPrompter::new()
        .with_response("test_suite", "rspec")
        .with_response("devise", false)
        .with_response("pundit", true)
        .with_response("background_job", "sidekiq");
    let source = generate(prompter, "--database=mysql --skip-git");

    assert!(source.contains("gem \"rspec-rails\", group: [:development, :test]"));
    assert!(source.contains("gem \"sidekiq\""));
    assert!(source.contains("config.active_job.queue_adapter = :sidekiq"));
    assert!(source.contains("generate \"rspec:install\""));
    assert!(source.contains("prepend_to_file \"spec/rails_helper.rb\""));
    // pundit is only offered once devise is accepted
    assert!(!source.contains("| pundit |"));
    assert!(!source.contains("pundit:install"));
    assert!(source.contains("| devise | false |"));
    assert!(!source.contains("gem \"devise\""));
    assert!(!source.contains("using: :headless_chrome"));
    assert!(!source.contains("git commit:"));
}
