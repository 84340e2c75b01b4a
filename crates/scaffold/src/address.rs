//! Template address parsing

use metafile::GROUP_DELIMITER;
use std::fmt;

/// A template path with an optional group, written `path` or `path#group`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateAddress {
    pub path: String,
    pub group: Option<String>,
}

impl TemplateAddress {
    /// Split on the first `#`. An empty path is the repository root and an
    /// empty group is the same as no group.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.split_once(GROUP_DELIMITER) {
            Some((path, group)) => Self {
                path: path.to_string(),
                group: (!group.is_empty()).then(|| group.to_string()),
            },
            None => Self {
                path: raw.to_string(),
                group: None,
            },
        }
    }

    pub fn new(path: impl Into<String>, group: Option<&str>) -> Self {
        Self {
            path: path.into(),
            group: group.map(str::to_string),
        }
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty() || self.path == "."
    }
}

impl fmt::Display for TemplateAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "." } else { &self.path };
        match &self.group {
            Some(group) => write!(f, "{path}{GROUP_DELIMITER}{group}"),
            None => write!(f, "{path}"),
        }
    }
}
