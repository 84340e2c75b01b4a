use anyhow::{Context as AnyhowContext, Result, bail};
use metafile::{Group, METAFILE_NAME, Metafile, Prompt, Repository};
use std::path::PathBuf;
use std::process::Command;

use super::{display_path, open_repository};
use crate::Context;
use crate::cli::EditArgs;
use crate::ui;

/// Apply flag edits to a template, or open it in an editor when no flag is given
pub fn run(ctx: &Context, args: &EditArgs) -> Result<()> {
    let (repo, key) = open_repository(ctx, &args.path)?;
    let meta = repo
        .open_meta(&key)
        .with_context(|| format!("Cannot open template '{}'", display_path(&key)))?;

    if args.is_empty() {
        let file = PathBuf::from(repo.location()).join(&key).join(METAFILE_NAME);
        open_editor(&file)?;
        let edited = repo
            .open_meta(&key)
            .with_context(|| format!("{} is no longer valid", file.display()))?;
        ui::success(&format!("Saved template '{}'", edited.display_name()));
        return Ok(());
    }

    let mut meta = meta;
    let changes = apply(repo.as_ref(), &mut meta, args)?;
    if changes == 0 {
        ui::info("Nothing changed");
        return Ok(());
    }

    repo.save_meta(&meta)
        .with_context(|| format!("Failed to save template '{}'", display_path(&key)))?;
    ui::success(&format!(
        "Updated template '{}' ({} change(s))",
        display_path(&key),
        changes
    ));
    Ok(())
}

/// Apply every requested change, returning how many took effect
fn apply(repo: &dyn Repository, meta: &mut Metafile, args: &EditArgs) -> Result<usize> {
    let mut changes = 0;

    for (field, value) in [
        (&mut meta.name, &args.name),
        (&mut meta.description, &args.description),
        (&mut meta.version, &args.version),
        (&mut meta.url, &args.url),
    ] {
        if let Some(value) = value
            && field != value
        {
            field.clone_from(value);
            changes += 1;
        }
    }

    for file in &args.add_file {
        let source = metafile::path::join(&meta.path, file)?;
        if !repo.exists(&source) {
            bail!("'{}' does not exist in template '{}'", file, display_path(&meta.path));
        }
        changes += usize::from(meta.add_file(file));
    }
    for file in &args.remove_file {
        if meta.remove_file(file) {
            changes += 1;
        } else {
            ui::warn(&format!("'{file}' is not listed"));
        }
    }
    for dir in &args.add_dir {
        changes += usize::from(meta.add_directory(dir));
    }
    for dir in &args.remove_dir {
        if meta.remove_directory(dir) {
            changes += 1;
        } else {
            ui::warn(&format!("'{dir}/' is not listed"));
        }
    }

    for raw in &args.add_prompt {
        meta.set_prompt(parse_prompt(raw)?);
        changes += 1;
    }
    for raw in &args.add_group {
        meta.set_group(parse_group(raw)?);
        changes += 1;
    }

    Ok(changes)
}

/// Parse `VAR[:REGEXP]`; `VAR?` marks the prompt optional
fn parse_prompt(raw: &str) -> Result<Prompt> {
    let (variable, regexp) = raw.split_once(':').unwrap_or((raw, ""));
    let (variable, optional) = match variable.strip_suffix('?') {
        Some(v) => (v, true),
        None => (variable, false),
    };
    if !is_identifier(variable) {
        bail!("Invalid prompt '{raw}': '{variable}' is not a variable name");
    }
    Ok(Prompt {
        variable: variable.to_string(),
        description: String::new(),
        regexp: regexp.to_string(),
        optional,
    })
}

/// Parse `NAME=MEMBER,MEMBER`
fn parse_group(raw: &str) -> Result<Group> {
    let Some((name, members)) = raw.split_once('=') else {
        bail!("Invalid group '{raw}' (expected NAME=MEMBER,...)");
    };
    let name = name.trim();
    if name.is_empty() || name.contains(metafile::GROUP_DELIMITER) {
        bail!("Invalid group name in '{raw}'");
    }
    Ok(Group {
        name: name.to_string(),
        description: String::new(),
        templates: members
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Open `file` in `$VISUAL`/`$EDITOR` (default `vi`) and wait for it to exit
fn open_editor(file: &std::path::Path) -> Result<()> {
    let editor = std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .unwrap_or_else(|_| "vi".to_string());
    let mut parts = editor.split_whitespace();
    let program = parts.next().context("Editor command is empty")?;

    log::debug!("Opening {} with {}", file.display(), editor);
    let status = Command::new(program)
        .args(parts)
        .arg(file)
        .status()
        .with_context(|| format!("Failed to start editor '{editor}'"))?;
    if !status.success() {
        bail!("Editor '{}' exited with {}", editor, status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::context;
    use metafile::LocalRepository;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LocalRepository) {
        let tmp = TempDir::new().unwrap();
        let repo = LocalRepository::new(tmp.path());
        repo.save_meta(&Metafile::new("apps/cli")).unwrap();
        fs::write(tmp.path().join("apps/cli/main.go"), "package main\n").unwrap();
        (tmp, repo)
    }

    fn edit(path: &str) -> EditArgs {
        EditArgs {
            path: path.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_prompt() {
        let prompt = parse_prompt("Name").unwrap();
        assert_eq!(prompt.variable, "Name");
        assert!(prompt.regexp.is_empty());
        assert!(!prompt.optional);

        let prompt = parse_prompt("Port?:^[0-9]+$").unwrap();
        assert_eq!(prompt.variable, "Port");
        assert_eq!(prompt.regexp, "^[0-9]+$");
        assert!(prompt.optional);

        assert!(parse_prompt("1abc").is_err());
        assert!(parse_prompt(":x").is_err());
    }

    #[test]
    fn test_parse_group() {
        let group = parse_group("full= cli, ../lib ,").unwrap();
        assert_eq!(group.name, "full");
        assert_eq!(group.templates, vec!["cli", "../lib"]);

        assert!(parse_group("full").is_err());
        assert!(parse_group("=cli").is_err());
        assert!(parse_group("a#b=cli").is_err());
    }

    #[test]
    fn test_edit_flags() {
        let (tmp, repo) = setup();
        let ctx = context(tmp.path());

        let mut args = edit("apps/cli");
        args.description = Some("Go CLI".into());
        args.add_file = vec!["main.go".into()];
        args.add_dir = vec!["cmd".into()];
        args.add_prompt = vec!["Name:^[a-z]+$".into()];
        args.add_group = vec!["full=../lib".into()];
        run(&ctx, &args).unwrap();

        let meta = repo.open_meta("apps/cli").unwrap();
        assert_eq!(meta.description, "Go CLI");
        assert_eq!(meta.files, vec!["main.go"]);
        assert_eq!(meta.directories, vec!["cmd"]);
        assert_eq!(meta.prompts[0].regexp, "^[a-z]+$");
        assert_eq!(meta.find_group("full").unwrap().templates, vec!["../lib"]);

        let mut args = edit("apps/cli");
        args.remove_file = vec!["main.go".into()];
        run(&ctx, &args).unwrap();
        assert!(repo.open_meta("apps/cli").unwrap().files.is_empty());
    }

    #[test]
    fn test_add_missing_file_fails() {
        let (tmp, repo) = setup();
        let ctx = context(tmp.path());

        let mut args = edit("apps/cli");
        args.add_file = vec!["missing.go".into()];
        assert!(run(&ctx, &args).is_err());
        assert!(repo.open_meta("apps/cli").unwrap().files.is_empty());
    }

    #[test]
    fn test_unchanged_fields_count_nothing() {
        let (_tmp, repo) = setup();
        let mut meta = repo.open_meta("apps/cli").unwrap();
        let mut args = edit("apps/cli");
        args.name = Some(String::new());
        assert_eq!(apply(&repo, &mut meta, &args).unwrap(), 0);
    }
}
