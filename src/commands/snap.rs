use anyhow::{Context as AnyhowContext, Result, bail};
use metafile::{METAFILE_NAME, Metafile, template_name};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::{display_path, open_repository};
use crate::Context;
use crate::cli::SnapArgs;
use crate::ui;

/// Files and empty directories found under a source directory, as
/// forward-slash relative paths
#[derive(Debug, Default, PartialEq, Eq)]
struct Snapshot {
    files: Vec<String>,
    directories: Vec<String>,
}

/// Copy a directory into the repository as a new template
pub fn run(ctx: &Context, args: &SnapArgs) -> Result<()> {
    if !args.source.is_dir() {
        bail!("Source is not a directory: {}", args.source.display());
    }

    let (repo, key) = open_repository(ctx, &args.path)?;
    ui::header(&format!("Snap: {} → {}", args.source.display(), display_path(&key)));

    if repo.open_meta(&key).is_ok() {
        bail!("Template '{}' already exists", display_path(&key));
    }

    let snapshot = scan(&args.source)?;
    for file in &snapshot.files {
        let source = args.source.join(file);
        let contents =
            fs::read(&source).with_context(|| format!("Failed to read {}", source.display()))?;
        let target = metafile::path::join(&key, file)?;
        repo.write_file(&target, &contents)
            .with_context(|| format!("Failed to copy {file}"))?;
        log::debug!("Copied {}", file);
    }

    let mut meta = Metafile::new(&key);
    meta.name = args
        .name
        .clone()
        .unwrap_or_else(|| template_name(&key).to_string());
    meta.description = args.description.clone().unwrap_or_default();
    meta.author = ctx.config.author();
    meta.files = snapshot.files;
    meta.directories = snapshot.directories;
    repo.save_meta(&meta)
        .with_context(|| format!("Failed to save template '{}'", display_path(&key)))?;

    ui::kv("Files", &meta.files.len().to_string());
    ui::kv("Directories", &meta.directories.len().to_string());
    ui::success(&format!("Created template '{}'", display_path(&key)));
    Ok(())
}

/// Walk `source`, skipping `.git` and existing metadata files
fn scan(source: &Path) -> Result<Snapshot> {
    let mut snapshot = Snapshot::default();

    let walker = WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", source.display()))?;
        let rel = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            let empty = fs::read_dir(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?
                .next()
                .is_none();
            if empty {
                snapshot.directories.push(rel);
            }
        } else if entry.file_type().is_file() && entry.file_name() != METAFILE_NAME {
            snapshot.files.push(rel);
        } else {
            log::debug!("Skipping {}", rel);
        }
    }

    Ok(snapshot)
}
