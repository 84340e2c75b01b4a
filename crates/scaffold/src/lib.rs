//! # Scaffold
//!
//! Resolves template addresses against a repository and renders them into
//! an output directory.
//!
//! ## Pipeline
//!
//! 1. **Resolve**: `path#group` becomes an ordered list of [`Task`]s, the
//!    parent first, then each group member depth-first
//! 2. **Pre-parse actions** run with no variables bound
//! 3. **Gather**: command-line assignments, prompt answers, then system
//!    variables for whatever is still unset
//! 4. **Bind and check**: `$Name` placeholders in entries are expanded and
//!    every target is checked for conflicts before anything is written
//! 5. **Execute**: backup, pre-execute actions, rendering, post-execute
//!    actions; the backup is restored if any step fails
//!
//! ## Example
//!
//! ```no_run
//! use metafile::LocalRepository;
//! use scaffold::{Engine, ExecuteOptions, NoProgress, NonInteractive, TemplateAddress};
//!
//! let repo = LocalRepository::new("/path/to/templates");
//! let opts = ExecuteOptions {
//!     output_dir: "out".into(),
//!     assignments: vec!["Name=demo".into()],
//!     ..Default::default()
//! };
//!
//! let engine = Engine::new(&repo, opts);
//! let summary = engine
//!     .run(&TemplateAddress::parse("apps/cli"), &mut NonInteractive, &mut NoProgress)
//!     .unwrap();
//! println!("{} files written", summary.files);
//! ```

pub mod actions;
mod address;
mod backup;
pub mod conflict;
mod context;
mod data;
mod error;
mod executor;
pub mod prompts;
mod render;
mod resolver;
mod types;
mod variables;

pub use address::TemplateAddress;
pub use backup::Snapshot;
pub use context::{Interrogator, NoProgress, NonInteractive, ProgressCallback, ScriptedAnswers};
pub use data::{Declaration, DeclarationKind, DeclarationSet, Field, Signature};
pub use error::{Error, Result};
pub use executor::{Engine, Plan};
pub use render::Renderer;
pub use resolver::Resolver;
pub use types::{
    BackupOptions, ExecuteOptions, ExecuteSummary, Execution, PhaseReport, Preview, PromptMode,
    Task,
};
pub use variables::{Variables, parse_assignment};
