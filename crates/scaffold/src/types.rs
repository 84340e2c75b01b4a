//! Core types for template execution

use metafile::{Author, Metafile};
use std::path::{Path, PathBuf};

/// One template visited during resolution with the operations it contributes
#[derive(Debug, Clone)]
pub struct Task {
    pub metafile: Metafile,
    pub executions: Vec<Execution>,
}

impl Task {
    /// File executions (directories excluded)
    pub fn files(&self) -> impl Iterator<Item = &Execution> {
        self.executions.iter().filter(|e| !e.is_dir)
    }

    /// Directory executions
    pub fn directories(&self) -> impl Iterator<Item = &Execution> {
        self.executions.iter().filter(|e| e.is_dir)
    }
}

/// A single file render or directory creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Entry as listed in the metafile, relative to its template
    pub path: String,
    /// Location in the repository
    pub source: String,
    /// Output location; holds unexpanded placeholders until targets are bound
    pub target: PathBuf,
    pub is_dir: bool,
}

/// How prompts treat variables that already have a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptMode {
    /// Skip prompts whose variable is already set
    #[default]
    SkipDeclared,
    /// Ask every prompt, offering the existing value as the default
    Force,
}

/// Where backups go and whether they outlive a successful run
#[derive(Debug, Clone)]
pub struct BackupOptions {
    pub dir: PathBuf,
    pub keep: bool,
}

/// Options for one template run
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Directory the templates render into
    pub output_dir: PathBuf,
    /// Replace existing targets instead of failing
    pub overwrite: bool,
    /// Resolve, validate and render in memory only
    pub dry_run: bool,
    pub prompt_mode: PromptMode,
    /// Raw `key=value` assignments from the command line
    pub assignments: Vec<String>,
    /// Identity used for the Author* system variables
    pub author: Author,
    /// Snapshot the output directory before writing
    pub backup: Option<BackupOptions>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            overwrite: false,
            dry_run: false,
            prompt_mode: PromptMode::default(),
            assignments: Vec::new(),
            author: Author::default(),
            backup: None,
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Default)]
pub struct ExecuteSummary {
    pub directories: usize,
    pub files: usize,
    pub actions: usize,
    /// Actions that failed but were marked no_fail
    pub failed_actions: usize,
    /// Backup archive kept after the run
    pub backup: Option<PathBuf>,
}

impl ExecuteSummary {
    pub fn merge_actions(&mut self, report: PhaseReport) {
        self.actions += report.run;
        self.failed_actions += report.failed;
    }
}

/// Outcome of one action phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseReport {
    pub run: usize,
    pub failed: usize,
}

/// In-memory rendering of one execution, produced for dry runs
#[derive(Debug, Clone)]
pub struct Preview {
    pub target: PathBuf,
    pub source: String,
    pub is_dir: bool,
    /// Rendered contents (empty for directories)
    pub contents: Vec<u8>,
    /// Current contents of the target, if it exists as a file
    pub existing: Option<Vec<u8>>,
}

impl Preview {
    pub fn is_unchanged(&self) -> bool {
        self.existing.as_deref() == Some(self.contents.as_slice())
    }

    pub fn target_relative_to<'a>(&'a self, base: &Path) -> &'a Path {
        self.target.strip_prefix(base).unwrap_or(&self.target)
    }
}
