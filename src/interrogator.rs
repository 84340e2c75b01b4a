//! Terminal prompts for template variables

use dialoguer::Input;
use metafile::Prompt;
use scaffold::{Error, Interrogator};

use crate::ui;

/// Asks prompts on the terminal, validation is left to the engine
pub struct DialoguerInterrogator;

/// Prompt label: the description when there is one, then the variable name
fn label(prompt: &Prompt) -> String {
    let mut label = if prompt.description.is_empty() {
        prompt.variable.clone()
    } else {
        format!("{} ({})", prompt.description, prompt.variable)
    };
    if prompt.optional {
        label.push_str(" [optional]");
    }
    label
}

impl Interrogator for DialoguerInterrogator {
    fn ask(&mut self, prompt: &Prompt, current: Option<&str>) -> scaffold::Result<String> {
        let mut input = Input::<String>::new()
            .with_prompt(label(prompt))
            .allow_empty(true);
        if let Some(current) = current {
            input = input.with_initial_text(current);
        }
        input.interact_text().map_err(|e| Error::PromptFailed {
            variable: prompt.variable.clone(),
            message: e.to_string(),
        })
    }

    fn rejected(&mut self, prompt: &Prompt, answer: &str, reason: &str) {
        ui::warn(&format!("'{}' is not valid for {}: {}", answer, prompt.variable, reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label() {
        let mut prompt = Prompt {
            variable: "Name".into(),
            ..Default::default()
        };
        assert_eq!(label(&prompt), "Name");

        prompt.description = "Project name".into();
        assert_eq!(label(&prompt), "Project name (Name)");

        prompt.optional = true;
        assert_eq!(label(&prompt), "Project name (Name) [optional]");
    }
}
