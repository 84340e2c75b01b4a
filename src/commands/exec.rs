use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use metafile::Phase;
use scaffold::actions::{expanded_command_line, planned_actions};
use scaffold::{
    BackupOptions, DeclarationSet, Engine, ExecuteOptions, ExecuteSummary, Interrogator,
    NonInteractive, Plan, PromptMode, TemplateAddress, Variables,
};
use std::path;

use super::{display_path, open_repository};
use crate::Context;
use crate::cli::ExecArgs;
use crate::interrogator::DialoguerInterrogator;
use crate::progress::RenderProgress;
use crate::{paths, ui};

/// Render a template address into the output directory
pub fn run(ctx: &Context, args: &ExecArgs) -> Result<()> {
    let parsed = TemplateAddress::parse(&args.address);
    let (repo, key) = open_repository(ctx, &parsed.path)?;
    let address = TemplateAddress {
        path: key,
        group: parsed.group,
    };

    let opts = options(ctx, args)?;
    let output_dir = opts.output_dir.clone();
    let data = DeclarationSet::load_all(&args.data).context("Failed to load --data files")?;
    if !data.is_empty() {
        log::info!("Loaded {} declaration(s)", data.len());
    }

    let engine = Engine::with_data(repo.as_ref(), opts, data);
    let mut interrogator: Box<dyn Interrogator> = if args.no_prompt {
        Box::new(NonInteractive)
    } else {
        Box::new(DialoguerInterrogator)
    };
    let mut progress = RenderProgress::new(&output_dir, ctx.quiet);

    if !ctx.quiet {
        ui::header(&format!("{} → {}", address, output_dir.display()));
    }

    let plan = engine
        .plan(&address, interrogator.as_mut(), &mut progress)
        .with_context(|| format!("Failed to prepare '{address}'"))?;

    if args.dry_run {
        return print_dry_run(&engine, &plan);
    }

    let summary = engine
        .execute(&plan, &mut progress)
        .with_context(|| format!("Failed to render '{address}'"))?;
    print_summary(&plan, &summary);
    Ok(())
}

/// Engine options from the command line, falling back to the config file
fn options(ctx: &Context, args: &ExecArgs) -> Result<ExecuteOptions> {
    let output = paths::expand(&args.output.to_string_lossy());
    let output_dir = path::absolute(&output)
        .with_context(|| format!("Invalid output directory: {}", output.display()))?;

    let backup = if args.no_backup || args.dry_run || !ctx.config.backup.enabled {
        None
    } else {
        let dir = ctx.config.backup_dir()?;
        let inside = path::absolute(&dir).is_ok_and(|abs| abs.starts_with(&output_dir));
        if inside {
            // A snapshot cannot contain its own archive
            ui::warn(&format!(
                "Backup directory {} is inside {}, running without a backup (set backup.dir to keep one)",
                dir.display(),
                output_dir.display()
            ));
            None
        } else {
            Some(BackupOptions {
                dir,
                keep: args.keep_backup || ctx.config.backup.keep,
            })
        }
    };

    Ok(ExecuteOptions {
        output_dir,
        overwrite: args.overwrite,
        dry_run: args.dry_run,
        prompt_mode: if args.force_prompts {
            PromptMode::Force
        } else {
            PromptMode::SkipDeclared
        },
        assignments: args.defines.clone(),
        author: ctx.config.author(),
        backup,
    })
}

fn print_summary(plan: &Plan, summary: &ExecuteSummary) {
    ui::success(&format!(
        "Rendered {} file(s) and {} directory(ies) into {}",
        summary.files,
        summary.directories,
        plan.output_dir.display()
    ));
    if summary.actions > 0 {
        ui::kv("Actions", &summary.actions.to_string());
    }
    if summary.failed_actions > 0 {
        ui::warn(&format!(
            "{} action(s) failed and were ignored",
            summary.failed_actions
        ));
    }
    if let Some(archive) = &summary.backup {
        ui::kv("Backup", &archive.display().to_string());
    }
}

// ============================================================================
// Dry run
// ============================================================================

fn print_dry_run(engine: &Engine<'_>, plan: &Plan) -> Result<()> {
    ui::section("Templates");
    for task in &plan.tasks {
        println!(
            "  {} {}",
            display_path(&task.metafile.path).bold(),
            format!(
                "({} dir(s), {} file(s))",
                task.directories().count(),
                task.files().count()
            )
            .dimmed()
        );
    }

    let actions = action_lines(plan);
    if !actions.is_empty() {
        ui::section("Actions");
        for (phase, command) in &actions {
            ui::kv(phase.name(), command);
        }
    }

    ui::section("Files");
    let previews = engine
        .preview(plan)
        .with_context(|| format!("Failed to render '{}'", plan.address))?;
    let mut changed = 0;
    for preview in &previews {
        let shown = preview.target_relative_to(&plan.output_dir).display();
        if preview.is_dir {
            println!("  {} {}/", "+".green(), shown);
            continue;
        }
        match &preview.existing {
            None => {
                changed += 1;
                println!("  {} {}", "+".green(), shown);
            }
            Some(_) if preview.is_unchanged() => {
                println!("  {} {} {}", "=".dimmed(), shown, "(unchanged)".dimmed());
            }
            Some(existing) => {
                changed += 1;
                println!("  {} {}", "~".yellow(), shown);
                match (std::str::from_utf8(existing), std::str::from_utf8(&preview.contents)) {
                    (Ok(old), Ok(new)) => ui::print_diff(old, new),
                    _ => ui::dim("  (binary content differs)"),
                }
            }
        }
    }

    println!();
    ui::info(&format!(
        "Dry run: {} of {} file(s) would change, nothing was written",
        changed,
        plan.file_count()
    ));
    Ok(())
}

/// Actions the run would start, in order, with placeholders expanded.
/// Pre-parse actions see no variables.
fn action_lines(plan: &Plan) -> Vec<(Phase, String)> {
    let empty = Variables::new();
    let mut lines = Vec::new();
    for phase in [Phase::PreParse, Phase::PreExecute, Phase::PostExecute] {
        let vars = if phase == Phase::PreParse {
            &empty
        } else {
            &plan.variables
        };
        for action in planned_actions(&plan.tasks, phase) {
            lines.push((phase, expanded_command_line(action, vars)));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::context;
    use metafile::{Action, LocalRepository, Metafile, Prompt, Repository};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn setup_repo(root: &Path) {
        let repo = LocalRepository::new(root);
        let mut meta = Metafile::new("apps/cli");
        meta.directories = vec!["cmd/$Name".into()];
        meta.files = vec!["README.md".into()];
        meta.prompts = vec![Prompt {
            variable: "Name".into(),
            regexp: "^[a-z]+$".into(),
            ..Default::default()
        }];
        meta.actions.post_execute = vec![Action {
            program: "echo".into(),
            arguments: vec!["$Name".into()],
            ..Default::default()
        }];
        repo.save_meta(&meta).unwrap();
        repo.write_file("apps/cli/README.md", b"# {{Name}} by $AuthorName\n")
            .unwrap();
    }

    fn exec_args(out: &Path) -> ExecArgs {
        ExecArgs {
            address: "apps/cli".into(),
            output: out.to_path_buf(),
            no_prompt: true,
            no_backup: true,
            defines: vec!["Name=demo".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_options_from_args_and_config() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path());
        ctx.config.backup.dir = Some(tmp.path().join("backups").display().to_string());
        ctx.config.author.name = "Ada".into();

        let mut args = exec_args(&tmp.path().join("out"));
        args.no_backup = false;
        args.force_prompts = true;
        let opts = options(&ctx, &args).unwrap();
        assert!(opts.output_dir.is_absolute());
        assert_eq!(opts.prompt_mode, PromptMode::Force);
        assert_eq!(opts.author.name, "Ada");
        let backup = opts.backup.unwrap();
        assert_eq!(backup.dir, tmp.path().join("backups"));
        assert!(!backup.keep);

        args.dry_run = true;
        assert!(options(&ctx, &args).unwrap().backup.is_none());

        ctx.config.backup.enabled = false;
        args.dry_run = false;
        assert!(options(&ctx, &args).unwrap().backup.is_none());
    }

    #[test]
    fn test_backup_dir_inside_output_is_skipped() {
        let repo_dir = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        setup_repo(repo_dir.path());
        fs::write(home.path().join("notes.txt"), "mine\n").unwrap();

        let mut ctx = context(repo_dir.path());
        let state = home.path().join(".local/state/stencil");
        ctx.config.backup.dir = Some(state.display().to_string());

        let mut args = exec_args(home.path());
        args.no_backup = false;
        assert!(options(&ctx, &args).unwrap().backup.is_none());

        run(&ctx, &args).unwrap();
        assert!(home.path().join("README.md").is_file());
        assert!(home.path().join("notes.txt").is_file());
        assert!(!state.exists());
    }

    #[test]
    fn test_exec_renders_and_second_run_conflicts() {
        let repo_dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        setup_repo(repo_dir.path());
        let mut ctx = context(repo_dir.path());
        ctx.config.author.name = "Ada".into();

        let args = exec_args(out.path());
        run(&ctx, &args).unwrap();

        assert!(out.path().join("cmd/demo").is_dir());
        assert_eq!(
            fs::read_to_string(out.path().join("README.md")).unwrap(),
            "# demo by Ada\n"
        );

        assert!(run(&ctx, &args).is_err());

        let mut overwrite = exec_args(out.path());
        overwrite.overwrite = true;
        overwrite.defines = vec!["Name=other".into()];
        run(&ctx, &overwrite).unwrap();
        assert_eq!(
            fs::read_to_string(out.path().join("README.md")).unwrap(),
            "# other by Ada\n"
        );
    }

    #[test]
    fn test_exec_requires_answers_without_prompting() {
        let repo_dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        setup_repo(repo_dir.path());
        let ctx = context(repo_dir.path());

        let mut args = exec_args(out.path());
        args.defines.clear();
        assert!(run(&ctx, &args).is_err());
        assert!(!out.path().join("README.md").exists());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let repo_dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        setup_repo(repo_dir.path());
        fs::write(out.path().join("README.md"), "old\n").unwrap();
        let ctx = context(repo_dir.path());

        let mut args = exec_args(out.path());
        args.dry_run = true;
        args.overwrite = true;
        run(&ctx, &args).unwrap();

        assert_eq!(
            fs::read_to_string(out.path().join("README.md")).unwrap(),
            "old\n"
        );
        assert!(!out.path().join("cmd").exists());
    }

    #[test]
    fn test_action_lines_expand_after_parse() {
        let repo_dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        setup_repo(repo_dir.path());
        let repo = LocalRepository::new(repo_dir.path());

        let opts = ExecuteOptions {
            output_dir: out.path().to_path_buf(),
            dry_run: true,
            assignments: vec!["Name=demo".into()],
            ..Default::default()
        };
        let engine = Engine::new(&repo, opts);
        let plan = engine
            .plan(
                &TemplateAddress::parse("apps/cli"),
                &mut NonInteractive,
                &mut scaffold::NoProgress,
            )
            .unwrap();

        assert_eq!(
            action_lines(&plan),
            vec![(Phase::PostExecute, "echo demo".to_string())]
        );
    }

    #[test]
    fn test_keep_backup_reports_archive() {
        let repo_dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        setup_repo(repo_dir.path());
        fs::write(out.path().join("notes.txt"), "keep me\n").unwrap();

        let mut ctx = context(repo_dir.path());
        ctx.config.backup.dir = Some(backups.path().display().to_string());

        let mut args = exec_args(out.path());
        args.no_backup = false;
        args.keep_backup = true;
        run(&ctx, &args).unwrap();

        let archives: Vec<_> = fs::read_dir(backups.path()).unwrap().collect();
        assert_eq!(archives.len(), 1);
        assert!(out.path().join("notes.txt").exists());
    }
}
