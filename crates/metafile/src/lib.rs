//! # Metafile
//!
//! Template metadata and repository storage.
//!
//! A *repository* is a directory tree. Every directory holding a
//! `.stencil.json` file is a *template*; the file lists what the template
//! renders (files and directories), which variables it asks for (prompts),
//! which commands run around it (actions) and which other templates run with
//! it (groups).
//!
//! ## Example
//!
//! ```no_run
//! use metafile::{LocalRepository, Repository};
//!
//! let repo = LocalRepository::new("/path/to/templates");
//! let metamap = repo.load_metamap()?;
//! for (path, meta) in &metamap {
//!     println!("{path}: {}", meta.description);
//! }
//! # Ok::<(), metafile::Error>(())
//! ```

mod error;
pub mod path;
mod repository;
mod types;

pub use error::{Error, Result};
pub use path::GROUP_DELIMITER;
pub use repository::{LocalRepository, Metamap, Repository, open_repository, template_name};
pub use types::{Action, Actions, Author, Group, METAFILE_NAME, Metafile, Phase, Prompt};
