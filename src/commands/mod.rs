pub mod edit;
pub mod exec;
pub mod info;
pub mod list;
pub mod new;
pub mod snap;

use anyhow::{Context as AnyhowContext, Result};
use metafile::Repository;

use crate::Context;

/// Open the repository holding `template` (a path without group suffix).
///
/// Returns the repository and the normalized template path inside it.
pub fn open_repository(ctx: &Context, template: &str) -> Result<(Box<dyn Repository>, String)> {
    metafile::open_repository(template, &ctx.repository)
        .with_context(|| format!("Cannot open template '{template}'"))
}

/// Path shown to the user for a template key (`.` for the root)
pub fn display_path(key: &str) -> &str {
    if key.is_empty() { "." } else { key }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;

    use crate::Context;
    use crate::config::Config;

    pub fn context(repository: &Path) -> Context {
        Context {
            verbose: 0,
            quiet: true,
            config: Config::default(),
            repository: repository.to_path_buf(),
        }
    }
}
