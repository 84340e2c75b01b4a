//! Path resolution for stencil
//!
//! # Environment Variables
//!
//! - `STENCIL_CONFIG_DIR` - Override config directory
//! - `STENCIL_STATE_DIR` - Override state directory (backups live here)
//! - `STENCIL_REPOSITORY` - Override the template repository (read by the CLI)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `STENCIL_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/stencil` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\stencil`
//!    - macOS/Linux: `~/.config/stencil`
//!
//! For state_dir():
//! 1. `STENCIL_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/stencil` (if set)
//! 3. Platform default:
//!    - Windows: `%LOCALAPPDATA%\stencil`
//!    - macOS/Linux: `~/.local/state/stencil`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "STENCIL_CONFIG_DIR";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "STENCIL_STATE_DIR";

/// Environment variable for the repository root
pub const ENV_REPOSITORY: &str = "STENCIL_REPOSITORY";

const APP_DIR: &str = "stencil";

/// Get the stencil config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join(APP_DIR);
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join(APP_DIR));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join(APP_DIR);
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Get the stencil state directory path
pub fn state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_STATE_DIR) {
        let path = expand(&dir);
        log::debug!("Using state dir from {}: {}", ENV_STATE_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        let path = PathBuf::from(xdg_state).join(APP_DIR);
        log::debug!("Using XDG_STATE_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(local_app_data) = dirs::data_local_dir() {
            return Ok(local_app_data.join(APP_DIR));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".local").join("state").join(APP_DIR);
    log::debug!("Using default state dir: {}", path.display());
    Ok(path)
}

/// Default template repository when neither the CLI nor the config names one
pub fn default_repository() -> Result<PathBuf> {
    Ok(config_dir()?.join("templates"))
}

/// Default directory for output backups
pub fn backup_dir() -> Result<PathBuf> {
    Ok(state_dir()?.join("backups"))
}

/// Expand `~` and environment variables in a path string
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Run `f` with `key` set to `value`, restoring the previous value after.
    ///
    /// # Safety
    /// Uses env::set_var/remove_var; only call from tests that do not read
    /// the same variable concurrently.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: each test uses its own variable
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: see above
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    #[test]
    fn test_config_dir_env_override() {
        with_env_var(ENV_CONFIG_DIR, "/custom/stencil/config", || {
            assert_eq!(
                config_dir().unwrap(),
                PathBuf::from("/custom/stencil/config")
            );
            assert_eq!(
                default_repository().unwrap(),
                PathBuf::from("/custom/stencil/config/templates")
            );
        });
    }

    #[test]
    fn test_state_dir_env_override() {
        with_env_var(ENV_STATE_DIR, "/custom/stencil/state", || {
            assert_eq!(
                backup_dir().unwrap(),
                PathBuf::from("/custom/stencil/state/backups")
            );
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand("~/templates"), home.join("templates"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_unknown_variable_is_kept() {
        assert_eq!(
            expand("$STENCIL_TEST_UNSET_VARIABLE/x"),
            PathBuf::from("$STENCIL_TEST_UNSET_VARIABLE/x")
        );
    }
}
