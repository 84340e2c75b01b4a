use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::paths::ENV_REPOSITORY;

#[derive(Parser)]
#[command(name = "stencil")]
#[command(version)]
#[command(about = "Scaffold projects from a repository of templates", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Template repository root
    #[arg(long, global = true, env = ENV_REPOSITORY, value_name = "DIR")]
    pub repository: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty template
    New(NewArgs),

    /// Turn an existing directory into a template
    Snap(SnapArgs),

    /// List templates in the repository
    List(ListArgs),

    /// Show a template, or the resolution order of `path#group`
    Info {
        /// Template address (`path` or `path#group`)
        address: String,
    },

    /// Change a template's metadata
    Edit(EditArgs),

    /// Render a template into a directory
    Exec(ExecArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Authoring
// ============================================================================

#[derive(Args)]
pub struct NewArgs {
    /// Template path inside the repository
    pub path: String,

    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(id = "template_version", long = "template-version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Also register the template as a member of PARENT#GROUP
    #[arg(long, value_name = "PARENT#GROUP")]
    pub group_of: Vec<String>,
}

#[derive(Args)]
pub struct SnapArgs {
    /// Directory to copy from
    pub source: PathBuf,

    /// Template path inside the repository
    pub path: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Show groups and their members
    #[arg(short, long)]
    pub groups: bool,

    /// Print the metadata of every template as JSON
    #[arg(long, conflicts_with = "groups")]
    pub json: bool,
}

#[derive(Args, Default)]
pub struct EditArgs {
    /// Template path inside the repository
    pub path: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(id = "template_version", long = "template-version", value_name = "VERSION")]
    pub version: Option<String>,

    #[arg(long)]
    pub url: Option<String>,

    /// List a file (must exist in the template directory)
    #[arg(long, value_name = "FILE")]
    pub add_file: Vec<String>,

    #[arg(long, value_name = "FILE")]
    pub remove_file: Vec<String>,

    /// List a directory to create
    #[arg(long, value_name = "DIR")]
    pub add_dir: Vec<String>,

    #[arg(long, value_name = "DIR")]
    pub remove_dir: Vec<String>,

    /// Add or replace a prompt; a trailing `?` marks it optional
    #[arg(long, value_name = "VAR[:REGEXP]")]
    pub add_prompt: Vec<String>,

    /// Add or replace a group
    #[arg(long, value_name = "NAME=MEMBER,...")]
    pub add_group: Vec<String>,
}

impl EditArgs {
    /// True when no change was requested and the editor should open
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.version.is_none()
            && self.url.is_none()
            && self.add_file.is_empty()
            && self.remove_file.is_empty()
            && self.add_dir.is_empty()
            && self.remove_dir.is_empty()
            && self.add_prompt.is_empty()
            && self.add_group.is_empty()
    }
}

// ============================================================================
// Execution
// ============================================================================

#[derive(Args, Default)]
pub struct ExecArgs {
    /// Template address (`path` or `path#group`)
    pub address: String,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Replace existing files
    #[arg(long)]
    pub overwrite: bool,

    /// Show what would be written without writing or running actions
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Never prompt; required variables must come from -D
    #[arg(long)]
    pub no_prompt: bool,

    /// Ask every prompt even when the variable is already set
    #[arg(long, conflicts_with = "no_prompt")]
    pub force_prompts: bool,

    /// Set a variable
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE")]
    pub defines: Vec<String>,

    /// JSON declarations available to template helpers
    #[arg(long, value_name = "FILE")]
    pub data: Vec<PathBuf>,

    /// Do not snapshot the output directory
    #[arg(long)]
    pub no_backup: bool,

    /// Keep the snapshot after a successful run
    #[arg(long, conflicts_with = "no_backup")]
    pub keep_backup: bool,
}
