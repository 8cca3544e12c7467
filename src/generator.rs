use minijinja::{context, Environment};

use crate::utils::Result;

const SCRIPT_TEMPLATE: &str = r#"# Rails application template generated by panacea {{ version }}.
# Passed to `rails new` through --template; safe to delete afterwards.
{% for line in setup %}
{{ line }}
{%- endfor %}

after_bundle do
  run "spring stop"
{%- for line in after_bundle %}
{{ line }}
{%- endfor %}
end
"#;

/// Operations the generation hook performs on a freshly generated application.
pub trait Generator {
    fn gem(&mut self, name: &str, groups: &[&str]);

    fn create_file(&mut self, path: &str, contents: &str);

    /// Like `create_file`, overwriting whatever `rails new` put there.
    fn replace_file(&mut self, path: &str, contents: &str);

    fn prepend_to_file(&mut self, path: &str, contents: &str);

    fn append_to_file(&mut self, path: &str, contents: &str);

    /// Adds lines to `config/application.rb`.
    fn application(&mut self, contents: &str);

    /// Adds lines to `config/environments/<env>.rb`.
    fn environment(&mut self, contents: &str, env: &str);

    fn generate(&mut self, generator: &str, args: &[&str]);

    fn rails_command(&mut self, command: &str);

    fn run(&mut self, command: &str);

    fn git_commit(&mut self, message: &str);

    /// Prints a status line while the template runs.
    fn say(&mut self, message: &str);

    /// Every operation after this call runs once gems are installed.
    fn after_bundle(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Gem {
        name: String,
        groups: Vec<String>,
    },
    CreateFile {
        path: String,
        contents: String,
        force: bool,
    },
    PrependToFile {
        path: String,
        contents: String,
    },
    AppendToFile {
        path: String,
        contents: String,
    },
    Application {
        contents: String,
        env: Option<String>,
    },
    Generate {
        generator: String,
        args: Vec<String>,
    },
    RailsCommand(String),
    Run(String),
    GitCommit(String),
    Say(String),
}

impl Action {
    /// One statement of the Rails template DSL.
    pub fn to_ruby(&self) -> String {
        match self {
            Self::Gem { name, groups } => match groups.as_slice() {
                [] => format!("gem {}", quote(name)),
                [group] => format!("gem {}, group: :{group}", quote(name)),
                groups => format!(
                    "gem {}, group: [{}]",
                    quote(name),
                    groups
                        .iter()
                        .map(|group| format!(":{group}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            },
            Self::CreateFile {
                path,
                contents,
                force,
            } => heredoc(
                &format!("create_file {}, ", quote(path)),
                if *force { ", force: true" } else { "" },
                contents,
            ),
            Self::PrependToFile { path, contents } => {
                heredoc(&format!("prepend_to_file {}, ", quote(path)), "", contents)
            }
            Self::AppendToFile { path, contents } => {
                heredoc(&format!("append_to_file {}, ", quote(path)), "", contents)
            }
            Self::Application {
                contents,
                env: None,
            } => heredoc("application ", "", contents),
            Self::Application {
                contents,
                env: Some(env),
            } => heredoc("environment ", &format!(", env: {}", quote(env)), contents),
            Self::Generate { generator, args } => {
                let mut line = format!("generate {}", quote(generator));
                for arg in args {
                    line.push_str(", ");
                    line.push_str(&quote(arg));
                }
                line
            }
            Self::RailsCommand(command) => format!("rails_command {}", quote(command)),
            Self::Say(message) => format!("say {}, :green", quote(message)),
            Self::Run(command) => format!("run {}", quote(command)),
            Self::GitCommit(message) => format!(
                "git add: \".\"\ngit commit: {}",
                quote(&format!("-m {}", shell_quote(message)))
            ),
        }
    }
}

const HEREDOC_TAG: &str = "PANACEA";

/// Double-quoted Ruby string literal without interpolation.
pub(crate) fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' | '\\' | '#' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// `<head><<'TAG'<tail>` followed by the body and the closing tag.
///
/// The plain single-quoted form neither interpolates nor strips indentation.
/// The tag is extended until no body line equals it.
fn heredoc(head: &str, tail: &str, contents: &str) -> String {
    let mut tag = String::from(HEREDOC_TAG);
    let mut n = 0;
    while contents.lines().any(|line| line.trim() == tag) {
        n += 1;
        tag = format!("{HEREDOC_TAG}_{n}");
    }
    let mut doc = format!("{head}<<'{tag}'{tail}\n{contents}");
    if !contents.ends_with('\n') {
        doc.push('\n');
    }
    doc.push_str(&tag);
    doc
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Records operations and renders them as a Rails application template.
#[derive(Debug, Default)]
pub struct Script {
    setup: Vec<Action>,
    after_bundle: Vec<Action>,
    bundled: bool,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn setup_actions(&self) -> &[Action] {
        &self.setup
    }

    pub fn after_bundle_actions(&self) -> &[Action] {
        &self.after_bundle
    }

    fn push(&mut self, action: Action) {
        tracing::trace!(?action, after_bundle = self.bundled, "queued action");
        if self.bundled {
            self.after_bundle.push(action);
        } else {
            self.setup.push(action);
        }
    }

    pub fn render(&self) -> Result<String> {
        let to_ruby =
            |actions: &[Action]| actions.iter().map(Action::to_ruby).collect::<Vec<_>>();
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        let rendered = env.render_str(
            SCRIPT_TEMPLATE,
            context! {
                version => crate::VERSION,
                setup => to_ruby(&self.setup),
                after_bundle => to_ruby(&self.after_bundle),
            },
        )?;
        Ok(rendered)
    }
}

impl Generator for Script {
    fn gem(&mut self, name: &str, groups: &[&str]) {
        self.push(Action::Gem {
            name: name.to_string(),
            groups: groups.iter().map(|group| group.to_string()).collect(),
        });
    }

    fn create_file(&mut self, path: &str, contents: &str) {
        self.push(Action::CreateFile {
            path: path.to_string(),
            contents: contents.to_string(),
            force: false,
        });
    }

    fn replace_file(&mut self, path: &str, contents: &str) {
        self.push(Action::CreateFile {
            path: path.to_string(),
            contents: contents.to_string(),
            force: true,
        });
    }

    fn prepend_to_file(&mut self, path: &str, contents: &str) {
        self.push(Action::PrependToFile {
            path: path.to_string(),
            contents: contents.to_string(),
        });
    }

    fn append_to_file(&mut self, path: &str, contents: &str) {
        self.push(Action::AppendToFile {
            path: path.to_string(),
            contents: contents.to_string(),
        });
    }

    fn application(&mut self, contents: &str) {
        self.push(Action::Application {
            contents: contents.to_string(),
            env: None,
        });
    }

    fn environment(&mut self, contents: &str, env: &str) {
        self.push(Action::Application {
            contents: contents.to_string(),
            env: Some(env.to_string()),
        });
    }

    fn generate(&mut self, generator: &str, args: &[&str]) {
        self.push(Action::Generate {
            generator: generator.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        });
    }

    fn rails_command(&mut self, command: &str) {
        self.push(Action::RailsCommand(command.to_string()));
    }

    fn run(&mut self, command: &str) {
        self.push(Action::Run(command.to_string()));
    }

    fn git_commit(&mut self, message: &str) {
        self.push(Action::GitCommit(message.to_string()));
    }

    fn say(&mut self, message: &str) {
        self.push(Action::Say(message.to_string()));
    }

    fn after_bundle(&mut self) {
        self.bundled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_ruby_strings() {
        assert_eq!(quote(r#"say "hi" #{x}"#), r#""say \"hi\" \#{x}""#);
        assert_eq!(
            Action::Gem {
                name: "rspec-rails".into(),
                groups: vec!["development".into(), "test".into()]
            }
            .to_ruby(),
            r#"gem "rspec-rails", group: [:development, :test]"#
        );
        assert_eq!(
            Action::Gem {
                name: "bullet".into(),
                groups: vec!["development".into()]
            }
            .to_ruby(),
            r#"gem "bullet", group: :development"#
        );
        assert_eq!(
            Action::Generate {
                generator: "devise".into(),
                args: vec!["Account".into()]
            }
            .to_ruby(),
            r#"generate "devise", "Account""#
        );
    }

    #[test]
    fn git_commit_escapes_single_quotes() {
        assert_eq!(
            Action::GitCommit("it's done".into()).to_ruby(),
            "git add: \".\"\ngit commit: \"-m 'it'\\\\''s done'\""
        );
    }

    #[test]
    fn splits_actions_around_bundle() {
        let mut script = Script::new();
        script.gem("oj", &[]);
        script.create_file("config/initializers/oj.rb", "Oj.optimize_rails\n");
        script.after_bundle();
        script.generate("kaminari:config", &[]);
        script.environment("config.x = 1", "development");

        assert_eq!(script.setup_actions().len(), 2);
        assert_eq!(script.after_bundle_actions().len(), 2);

        let rendered = script.render().unwrap();
        let expected = r#"gem "oj"
create_file "config/initializers/oj.rb", <<'PANACEA'
Oj.optimize_rails
PANACEA

after_bundle do
  run "spring stop"
generate "kaminari:config"
environment <<'PANACEA', env: "development"
config.x = 1
PANACEA
end
"#;
        assert!(rendered.starts_with("# Rails application template generated by panacea"));
        assert!(rendered.ends_with(expected), "{rendered}");
    }

    #[test]
    fn trailing_arguments_stay_on_the_opening_line() {
        let forced = Action::CreateFile {
            path: "test/application_system_test_case.rb".into(),
            contents: "require \"test_helper\"\n".into(),
            force: true,
        };
        assert_eq!(
            forced.to_ruby(),
            "create_file \"test/application_system_test_case.rb\", <<'PANACEA', force: true\nrequire \"test_helper\"\nPANACEA"
        );
    }

    #[test]
    fn file_contents_are_written_as_given() {
        let action = Action::CreateFile {
            path: "a.rb".into(),
            contents: "  indented\n    more\n".into(),
            force: false,
        };
        assert_eq!(
            action.to_ruby(),
            "create_file \"a.rb\", <<'PANACEA'\n  indented\n    more\nPANACEA"
        );
    }

    #[test]
    fn closing_tag_avoids_body_lines() {
        let action = Action::AppendToFile {
            path: "NOTES".into(),
            contents: "PANACEA\nPANACEA_1\n".into(),
        };
        assert_eq!(
            action.to_ruby(),
            "append_to_file \"NOTES\", <<'PANACEA_2'\nPANACEA\nPANACEA_1\nPANACEA_2"
        );
    }
}
