//! User configuration
//!
//! Read once from `<config_dir>/config.toml`. Every field is optional:
//!
//! ```toml
//! repository = "~/templates"
//!
//! [author]
//! name = "Ada Lovelace"
//! email = "ada@example.com"
//!
//! [backup]
//! enabled = true
//! dir = "~/.cache/stencil-backups"
//! keep = false
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Template repository root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Identity for the Author* template variables
    pub author: AuthorConfig,

    pub backup: BackupConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorConfig {
    pub name: String,
    pub email: String,
    pub homepage: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Snapshot the output directory before writing
    pub enabled: bool,
    /// Where archives go (default: `<state_dir>/backups`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Keep the archive after a successful run
    pub keep: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            keep: false,
        }
    }
}

impl Config {
    /// Load from the config directory, or defaults if there is no file
    pub fn load() -> Result<Self> {
        let path = paths::config_dir()?.join(CONFIG_FILE);
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in config file: {}", path.display()))
    }

    /// Repository root: the CLI (or `STENCIL_REPOSITORY`) wins over the
    /// config file, which wins over `<config_dir>/templates`.
    pub fn repository_root(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = cli_override {
            return Ok(paths::expand(&path.to_string_lossy()));
        }
        match &self.repository {
            Some(repo) => Ok(paths::expand(repo)),
            None => paths::default_repository(),
        }
    }

    pub fn backup_dir(&self) -> Result<PathBuf> {
        match &self.backup.dir {
            Some(dir) => Ok(paths::expand(dir)),
            None => paths::backup_dir(),
        }
    }

    pub fn author(&self) -> metafile::Author {
        metafile::Author {
            name: self.author.name.clone(),
            email: self.author.email.clone(),
            homepage: self.author.homepage.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_from(&tmp.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.backup.enabled);
        assert!(!config.backup.keep);
    }

    #[test]
    fn test_parse_full_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"
repository = "/srv/templates"

[author]
name = "Ada"
email = "ada@example.com"

[backup]
enabled = false
dir = "/var/backups/stencil"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.repository.as_deref(), Some("/srv/templates"));
        assert_eq!(config.author().name, "Ada");
        assert_eq!(config.author().homepage, "");
        assert!(!config.backup.enabled);
        assert_eq!(
            config.backup_dir().unwrap(),
            PathBuf::from("/var/backups/stencil")
        );
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "repository = [").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_repository_root_precedence() {
        let config = Config {
            repository: Some("/from/config".into()),
            ..Default::default()
        };
        assert_eq!(
            config
                .repository_root(Some(Path::new("/from/cli")))
                .unwrap(),
            PathBuf::from("/from/cli")
        );
        assert_eq!(
            config.repository_root(None).unwrap(),
            PathBuf::from("/from/config")
        );
    }
}
