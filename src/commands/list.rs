use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use metafile::{LocalRepository, Metamap, Repository};

use super::display_path;
use crate::Context;
use crate::cli::ListArgs;
use crate::ui;

/// List every template in the repository
pub fn run(ctx: &Context, args: &ListArgs) -> Result<()> {
    let repo = LocalRepository::new(&ctx.repository);
    let metamap = repo
        .load_metamap()
        .with_context(|| format!("Failed to load templates from {}", repo.location()))?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&metamap).context("Failed to serialize templates")?;
        println!("{json}");
        return Ok(());
    }

    ui::header(&format!("Templates in {}", repo.location()));
    if metamap.is_empty() {
        ui::dim("No templates yet. Create one with 'stencil new' or 'stencil snap'.");
        return Ok(());
    }

    for (key, meta) in &metamap {
        let version = if meta.version.is_empty() {
            String::new()
        } else {
            format!(" {}", meta.version.dimmed())
        };
        println!("  {}{}", display_path(key).bold(), version);
        if !meta.description.is_empty() {
            ui::dim(&format!("  {}", meta.description));
        }
        if args.groups {
            for line in group_lines(meta) {
                println!("    {line}");
            }
        }
    }

    println!();
    ui::info(&format!("{} template(s)", metamap.len()));
    if args.groups {
        ui::info(&format!("{} group(s)", group_count(&metamap)));
    }
    Ok(())
}

/// One line per group: `#name: member, member`
fn group_lines(meta: &metafile::Metafile) -> Vec<String> {
    meta.groups
        .iter()
        .map(|g| {
            format!(
                "{}{}: {}",
                metafile::GROUP_DELIMITER,
                g.name,
                ui::summarize_list(&g.templates, 6)
            )
        })
        .collect()
}

fn group_count(metamap: &Metamap) -> usize {
    metamap.values().map(|m| m.groups.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::context;
    use metafile::{Group, Metafile};
    use tempfile::TempDir;

    #[test]
    fn test_group_lines() {
        let mut meta = Metafile::new("apps");
        meta.groups.push(Group {
            name: "all".into(),
            description: String::new(),
            templates: vec!["cli".into(), "../lib".into()],
        });
        assert_eq!(group_lines(&meta), vec!["#all: cli, ../lib"]);
    }

    #[test]
    fn test_list_runs_on_repository() {
        let tmp = TempDir::new().unwrap();
        let repo = LocalRepository::new(tmp.path());
        let mut meta = Metafile::new("apps");
        meta.groups.push(Group {
            name: "all".into(),
            ..Default::default()
        });
        repo.save_meta(&meta).unwrap();
        repo.save_meta(&Metafile::new("lib")).unwrap();

        let metamap = repo.load_metamap().unwrap();
        assert_eq!(group_count(&metamap), 1);

        let ctx = context(tmp.path());
        run(&ctx, &ListArgs { groups: true, json: false }).unwrap();
        run(&ctx, &ListArgs { groups: false, json: true }).unwrap();
    }

    #[test]
    fn test_list_missing_repository_fails() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp.path().join("missing"));
        assert!(run(&ctx, &ListArgs { groups: false, json: false }).is_err());
    }
}
