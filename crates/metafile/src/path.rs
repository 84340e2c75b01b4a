//! Repository-relative path handling
//!
//! Every path handed to a [`Repository`](crate::Repository) is a
//! forward-slash separated string relative to the repository root. The root
//! itself is the empty string.

use crate::error::{Error, Result};
use std::path::{Component, Path};

/// Delimiter separating a template path from a group name in an address
pub const GROUP_DELIMITER: char = '#';

/// Normalize a repository-relative path
///
/// Removes `.` components, folds `..` into its parent and joins the result
/// with `/`. Rejects absolute paths, paths that climb above the root, and
/// paths containing the group delimiter.
pub fn normalize(path: &str) -> Result<String> {
    let invalid = |reason| Error::InvalidPath {
        path: path.to_string(),
        reason,
    };

    if path.contains(GROUP_DELIMITER) {
        return Err(invalid("contains the group delimiter '#'"));
    }
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(invalid("must be relative to the repository root"));
    }

    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(invalid("escapes the repository root"));
                }
            }
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("must be relative to the repository root"));
            }
        }
    }

    Ok(parts.join("/"))
}

/// Join `child` onto `base` and normalize the result
pub fn join(base: &str, child: &str) -> Result<String> {
    if base.is_empty() {
        normalize(child)
    } else if child.is_empty() {
        normalize(base)
    } else {
        normalize(&format!("{base}/{child}"))
    }
}

/// Last component of a repository path, or `None` for the root
pub fn base_name(path: &str) -> Option<&str> {
    path.rsplit('/').next().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain() {
        assert_eq!(normalize("apps/cli").unwrap(), "apps/cli");
        assert_eq!(normalize("./apps//cli/").unwrap(), "apps/cli");
    }

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize("").unwrap(), "");
        assert_eq!(normalize(".").unwrap(), "");
        assert_eq!(normalize("apps/..").unwrap(), "");
    }

    #[test]
    fn test_normalize_parent_inside_root() {
        assert_eq!(normalize("apps/cli/../web").unwrap(), "apps/web");
    }

    #[test]
    fn test_normalize_rejects_escape() {
        assert!(matches!(
            normalize("../outside"),
            Err(Error::InvalidPath { .. })
        ));
        assert!(normalize("apps/../../x").is_err());
    }

    #[test]
    fn test_normalize_rejects_absolute() {
        assert!(normalize("/etc/passwd").is_err());
        assert!(normalize("\\windows").is_err());
    }

    #[test]
    fn test_normalize_rejects_delimiter() {
        assert!(normalize("apps#web").is_err());
    }

    #[test]
    fn test_join() {
        assert_eq!(join("apps", "cli").unwrap(), "apps/cli");
        assert_eq!(join("", "cli").unwrap(), "cli");
        assert_eq!(join("apps/cli", "").unwrap(), "apps/cli");
        assert_eq!(join("apps/cli", "../web").unwrap(), "apps/web");
        assert!(join("apps", "../../x").is_err());
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("apps/cli"), Some("cli"));
        assert_eq!(base_name("cli"), Some("cli"));
        assert_eq!(base_name(""), None);
    }
}
