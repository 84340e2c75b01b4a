//! Variable gathering
//!
//! Prompts are collected from every task in resolution order and asked
//! through an [`Interrogator`]. System variables fill in whatever the user
//! did not set.

use crate::address::TemplateAddress;
use crate::context::Interrogator;
use crate::error::{Error, Result};
use crate::types::{PromptMode, Task};
use crate::variables::Variables;
use chrono::{DateTime, Datelike, Local};
use metafile::{Author, Prompt, template_name};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

/// Names the engine binds when the user has not
pub const SYSTEM_VARIABLES: &[&str] = &[
    "TemplatePath",
    "TemplateName",
    "OutputDir",
    "OutputName",
    "AuthorName",
    "AuthorEmail",
    "AuthorHomepage",
    "Date",
    "Year",
];

/// Ask every prompt declared by `tasks`, storing answers in `vars`.
///
/// A variable is asked at most once per run; the first declaration wins.
/// Returns the number of prompts that were asked.
pub fn gather_prompts(
    tasks: &[Task],
    vars: &mut Variables,
    mode: PromptMode,
    interrogator: &mut dyn Interrogator,
) -> Result<usize> {
    let mut seen = HashSet::new();
    let mut asked = 0;

    for prompt in tasks.iter().flat_map(|t| &t.metafile.prompts) {
        if !seen.insert(prompt.variable.as_str()) {
            log::debug!("Skipping duplicate prompt for '{}'", prompt.variable);
            continue;
        }

        let pattern = compile(prompt)?;

        if mode == PromptMode::SkipDeclared && vars.contains(&prompt.variable) {
            log::debug!("'{}' already set, not prompting", prompt.variable);
            continue;
        }

        let value = ask_until_valid(prompt, pattern.as_ref(), vars, interrogator)?;
        vars.set(prompt.variable.clone(), value);
        asked += 1;
    }

    Ok(asked)
}

fn compile(prompt: &Prompt) -> Result<Option<Regex>> {
    if prompt.regexp.is_empty() {
        return Ok(None);
    }
    Regex::new(&prompt.regexp)
        .map(Some)
        .map_err(|source| Error::InvalidPrompt {
            variable: prompt.variable.clone(),
            source,
        })
}

fn ask_until_valid(
    prompt: &Prompt,
    pattern: Option<&Regex>,
    vars: &Variables,
    interrogator: &mut dyn Interrogator,
) -> Result<String> {
    loop {
        let answer = interrogator.ask(prompt, vars.get(&prompt.variable))?;

        match validate(prompt, pattern, &answer) {
            Ok(()) => return Ok(answer),
            Err(reason) => {
                log::debug!("Rejected answer for '{}': {}", prompt.variable, reason);
                interrogator.rejected(prompt, &answer, &reason);
                if !interrogator.can_retry() {
                    return Err(Error::InvalidAnswer {
                        variable: prompt.variable.clone(),
                        reason,
                    });
                }
            }
        }
    }
}

fn validate(
    prompt: &Prompt,
    pattern: Option<&Regex>,
    answer: &str,
) -> std::result::Result<(), String> {
    if answer.is_empty() {
        return if prompt.optional {
            Ok(())
        } else {
            Err("a value is required".to_string())
        };
    }
    match pattern {
        Some(re) if !re.is_match(answer) => Err(format!("must match /{}/", re.as_str())),
        _ => Ok(()),
    }
}

/// Values for the reserved system variables
pub fn system_variables(
    address: &TemplateAddress,
    output_dir: &Path,
    author: &Author,
    now: DateTime<Local>,
) -> Variables {
    let mut vars = Variables::new();
    let template_path =
        metafile::path::normalize(&address.path).unwrap_or_else(|_| address.path.clone());
    let display_path = if template_path.is_empty() {
        "."
    } else {
        template_path.as_str()
    };

    vars.set("TemplatePath", display_path);
    vars.set("TemplateName", template_name(&template_path));
    vars.set("OutputDir", output_dir.display().to_string());
    vars.set(
        "OutputName",
        output_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    vars.set("AuthorName", author.name.as_str());
    vars.set("AuthorEmail", author.email.as_str());
    vars.set("AuthorHomepage", author.homepage.as_str());
    vars.set("Date", now.format("%Y-%m-%d").to_string());
    vars.set("Year", now.year().to_string());
    vars
}
