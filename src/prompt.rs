use std::sync::OnceLock;

use dialoguer::theme::SimpleTheme;
use dialoguer::{Confirm, Input, Select};

use panacea::backend::Prompter;
use panacea::utils::Result;

static THEME: OnceLock<SimpleTheme> = OnceLock::new();

/// Interactive prompts on the controlling terminal.
pub(crate) struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, _key: &str, title: &str, default: bool) -> Result<bool> {
        let theme = THEME.get_or_init(|| SimpleTheme);
        let answer = Confirm::with_theme(theme)
            .with_prompt(title)
            .default(default)
            .interact()?;
        Ok(answer)
    }

    fn range(&mut self, _key: &str, title: &str, default: i64, bounds: (i64, i64)) -> Result<i64> {
        let theme = THEME.get_or_init(|| SimpleTheme);
        let (min, max) = bounds;
        let answer = Input::with_theme(theme)
            .with_prompt(format!("{title} [{min}-{max}]"))
            .default(default)
            .validate_with(move |input: &i64| {
                if *input < min || *input > max {
                    return Err(format!("input out of range: [{min}, {max}]"));
                }
                Ok(())
            })
            .interact_text()?;
        Ok(answer)
    }

    fn text(&mut self, _key: &str, title: &str, default: &str) -> Result<String> {
        let theme = THEME.get_or_init(|| SimpleTheme);
        let mut p = Input::<String>::with_theme(theme).with_prompt(title);
        if default.is_empty() {
            p = p.allow_empty(true);
        } else {
            p = p.default(default.to_string());
        }
        Ok(p.interact_text()?)
    }

    fn select(
        &mut self,
        _key: &str,
        title: &str,
        options: &[String],
        default: Option<&str>,
    ) -> Result<String> {
        let theme = THEME.get_or_init(|| SimpleTheme);
        let position = default
            .and_then(|default| options.iter().position(|option| option == default))
            .unwrap_or(0);
        let index = Select::with_theme(theme)
            .with_prompt(title)
            .items(options)
            .default(position)
            .interact()?;
        Ok(options[index].clone())
    }
}
