use anyhow::{Context as AnyhowContext, Result, bail};
use metafile::{Group, Metafile, Repository, template_name};
use scaffold::TemplateAddress;

use super::{display_path, open_repository};
use crate::Context;
use crate::cli::NewArgs;
use crate::ui;

/// Create an empty template and optionally register it in parent groups
pub fn run(ctx: &Context, args: &NewArgs) -> Result<()> {
    let (repo, key) = open_repository(ctx, &args.path)?;
    ui::header(&format!("New template: {}", display_path(&key)));

    if repo.open_meta(&key).is_ok() {
        bail!(
            "Template '{}' already exists in {}",
            display_path(&key),
            repo.location()
        );
    }

    let mut meta = Metafile::new(&key);
    meta.name = match &args.name {
        Some(name) => name.clone(),
        None if key.is_empty() => String::new(),
        None => template_name(&key).to_string(),
    };
    meta.description = args.description.clone().unwrap_or_default();
    meta.version = args.version.clone().unwrap_or_default();
    meta.author = ctx.config.author();

    repo.save_meta(&meta)
        .with_context(|| format!("Failed to save template '{}'", display_path(&key)))?;
    ui::kv("Repository", &repo.location());
    ui::kv("Name", meta.display_name());
    ui::success(&format!("Created template '{}'", display_path(&key)));

    for raw in &args.group_of {
        let member = add_to_group(repo.as_ref(), raw, &key)?;
        ui::success(&format!("Added '{}' to {}", member, raw));
    }

    ui::dim("Add files with 'stencil edit --add-file', or snap an existing directory");
    Ok(())
}

/// Register `key` as a member of the group named by `PARENT#GROUP`.
///
/// The group is created when missing. Returns the member entry written.
fn add_to_group(repo: &dyn Repository, raw: &str, key: &str) -> Result<String> {
    let address = TemplateAddress::parse(raw);
    let Some(group_name) = address.group else {
        bail!("'{raw}' does not name a group (expected PARENT#GROUP)");
    };

    let parent_key = metafile::path::normalize(&address.path)
        .with_context(|| format!("Invalid parent template in '{raw}'"))?;
    let mut parent = repo
        .open_meta(&parent_key)
        .with_context(|| format!("Cannot open parent template '{}'", display_path(&parent_key)))?;

    let member = relative_member(&parent_key, key)?;
    let mut group = parent
        .find_group(&group_name)
        .cloned()
        .unwrap_or_else(|| Group {
            name: group_name.clone(),
            ..Default::default()
        });
    if !group.templates.contains(&member) {
        group.templates.push(member.clone());
    }
    parent.set_group(group);

    repo.save_meta(&parent)
        .with_context(|| format!("Failed to save template '{}'", display_path(&parent_key)))?;
    Ok(member)
}

/// Member entry that addresses `child` from the template at `parent`
fn relative_member(parent: &str, child: &str) -> Result<String> {
    let parent_parts: Vec<&str> = parent.split('/').filter(|s| !s.is_empty()).collect();
    let child_parts: Vec<&str> = child.split('/').filter(|s| !s.is_empty()).collect();

    let common = parent_parts
        .iter()
        .zip(&child_parts)
        .take_while(|(a, b)| a == b)
        .count();
    if common == parent_parts.len() && common == child_parts.len() {
        bail!("A template cannot be a member of its own group");
    }

    let mut parts = vec![".."; parent_parts.len() - common];
    parts.extend(&child_parts[common..]);
    Ok(parts.join("/"))
}
