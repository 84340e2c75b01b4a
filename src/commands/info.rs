use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use metafile::{Metafile, Phase};
use scaffold::{Resolver, TemplateAddress};
use std::path::Path;

use super::{display_path, open_repository};
use crate::Context;
use crate::ui;

/// Show one template, or the resolution order of an address with a group
pub fn run(ctx: &Context, raw: &str) -> Result<()> {
    let address = TemplateAddress::parse(raw);
    let (repo, key) = open_repository(ctx, &address.path)?;

    let meta = repo
        .open_meta(&key)
        .with_context(|| format!("Cannot open template '{}'", display_path(&key)))?;
    show_metafile(ctx, &meta);

    if address.group.is_none() {
        return Ok(());
    }

    let resolver = Resolver::new(repo.as_ref())
        .with_context(|| format!("Failed to load templates from {}", repo.location()))?;
    let resolved = TemplateAddress {
        path: key,
        group: address.group,
    };
    let tasks = resolver
        .resolve(&resolved, Path::new("."))
        .with_context(|| format!("Failed to resolve '{resolved}'"))?;

    ui::section(&format!("Resolution order for {resolved}"));
    for (i, task) in tasks.iter().enumerate() {
        println!(
            "  {} {} {}",
            format!("{}.", i + 1).blue().bold(),
            display_path(&task.metafile.path),
            format!(
                "({} dir(s), {} file(s), {} prompt(s))",
                task.directories().count(),
                task.files().count(),
                task.metafile.prompts.len()
            )
            .dimmed()
        );
    }
    Ok(())
}

fn show_metafile(ctx: &Context, meta: &Metafile) {
    ui::header(meta.display_name());
    ui::kv("Path", display_path(&meta.path));
    for (key, value) in [
        ("Description", &meta.description),
        ("Version", &meta.version),
        ("URL", &meta.url),
    ] {
        if !value.is_empty() {
            ui::kv(key, value);
        }
    }
    if !meta.author.is_empty() {
        ui::kv("Author", &author_line(&meta.author));
    }

    if !meta.directories.is_empty() || !meta.files.is_empty() {
        ui::section("Contents");
        for dir in &meta.directories {
            println!("  {}/", dir.blue());
        }
        for file in &meta.files {
            println!("  {file}");
        }
    }

    if !meta.prompts.is_empty() {
        ui::section("Prompts");
        for prompt in &meta.prompts {
            let mut line = prompt.variable.bold().to_string();
            if !prompt.regexp.is_empty() {
                line.push_str(&format!(" /{}/", prompt.regexp).dimmed().to_string());
            }
            if prompt.optional {
                line.push_str(&" (optional)".dimmed().to_string());
            }
            println!("  {line}");
            if ctx.verbose > 0 && !prompt.description.is_empty() {
                ui::dim(&format!("  {}", prompt.description));
            }
        }
    }

    if !meta.groups.is_empty() {
        ui::section("Groups");
        for group in &meta.groups {
            ui::kv(&group.name, &group.templates.join(", "));
        }
    }

    if !meta.actions.is_empty() {
        ui::section("Actions");
        for phase in [Phase::PreParse, Phase::PreExecute, Phase::PostExecute] {
            for action in meta.actions.for_phase(phase) {
                let suffix = if action.no_fail { " (may fail)" } else { "" };
                ui::kv(phase.name(), &format!("{}{}", action.command_line(), suffix));
            }
        }
    }
}

fn author_line(author: &metafile::Author) -> String {
    let mut line = author.name.clone();
    if !author.email.is_empty() {
        line.push_str(&format!(" <{}>", author.email));
    }
    if !author.homepage.is_empty() {
        line.push_str(&format!(" ({})", author.homepage));
    }
    line.trim().to_string()
}
