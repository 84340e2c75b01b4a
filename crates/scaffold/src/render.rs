//! File rendering
//!
//! Template files go through handlebars and `$Name` expansion in a single
//! pass: bound `$Name` tokens are held aside while handlebars runs, so
//! neither substitution sees the output of the other.
//! Files that are not UTF-8 are copied as they are.

use crate::data::{self, DeclarationSet};
use crate::error::{Error, Result};
use crate::types::Execution;
use crate::variables::Variables;
use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext};
use metafile::Repository;
use std::fs;
use std::path::Path;

pub struct Renderer {
    registry: Handlebars<'static>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(DeclarationSet::default())
    }
}

impl Renderer {
    /// Renderer whose lookup helpers answer from `data`
    pub fn new(data: DeclarationSet) -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);

        registry.register_helper("upper", Box::new(upper_helper));
        registry.register_helper("lower", Box::new(lower_helper));
        registry.register_helper("snake_case", Box::new(snake_case_helper));
        registry.register_helper("kebab_case", Box::new(kebab_case_helper));
        registry.register_helper("pascal_case", Box::new(pascal_case_helper));
        data::register_helpers(&mut registry, data);

        Self { registry }
    }

    /// Render template text against `vars` without touching the filesystem.
    ///
    /// `template_file` only labels errors.
    pub fn render_to_string(
        &self,
        template_file: &str,
        template: &str,
        vars: &Variables,
        target: &Path,
    ) -> Result<String> {
        let shielded = vars.shield(template);
        let rendered = self
            .registry
            .render_template(&shielded.text, &vars.to_json())
            .map_err(|e| Error::RenderError {
                template_file: template_file.to_string(),
                target: target.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(shielded.restore(&rendered))
    }

    /// Rendered contents of a file execution
    pub fn render_contents(
        &self,
        repo: &dyn Repository,
        execution: &Execution,
        vars: &Variables,
    ) -> Result<Vec<u8>> {
        let raw = repo.read_file(&execution.source)?;
        match String::from_utf8(raw) {
            Ok(text) => self
                .render_to_string(&execution.source, &text, vars, &execution.target)
                .map(String::into_bytes),
            Err(e) => {
                log::debug!("{} is not UTF-8, copying as is", execution.source);
                Ok(e.into_bytes())
            }
        }
    }

    /// Create the directory or render and write the file
    pub fn render_execution(
        &self,
        repo: &dyn Repository,
        execution: &Execution,
        vars: &Variables,
    ) -> Result<()> {
        let target = &execution.target;

        if execution.is_dir {
            fs::create_dir_all(target).map_err(|e| Error::io(target, e))?;
            log::debug!("Created {}", target.display());
            return Ok(());
        }

        let contents = self.render_contents(repo, execution, vars)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(target, contents).map_err(|e| Error::io(target, e))?;
        log::debug!("Rendered {} -> {}", execution.source, target.display());
        Ok(())
    }
}

fn string_param<'a>(h: &'a Helper) -> &'a str {
    h.param(0).and_then(|v| v.value().as_str()).unwrap_or("")
}

fn upper_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&string_param(h).to_uppercase())?;
    Ok(())
}

fn lower_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&string_param(h).to_lowercase())?;
    Ok(())
}

fn snake_case_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&words(string_param(h)).join("_"))?;
    Ok(())
}

fn kebab_case_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&words(string_param(h)).join("-"))?;
    Ok(())
}

fn pascal_case_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let pascal: String = words(string_param(h))
        .iter()
        .map(|w| capitalize(w))
        .collect();
    out.write(&pascal)?;
    Ok(())
}

/// Lowercase words of an identifier-ish string.
///
/// Splits on anything that is not alphanumeric, on lower-to-upper
/// transitions, and before the last capital of an acronym (`HTTPServer`
/// is `http server`).
fn words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
