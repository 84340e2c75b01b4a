//! Template metadata model
//!
//! One [`Metafile`] lives in every template directory. Empty fields are
//! omitted when the file is written.

use serde::{Deserialize, Serialize};

/// Well-known name of the metadata file inside a template directory
pub const METAFILE_NAME: &str = ".stencil.json";

/// Metadata describing one template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metafile {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,

    #[serde(skip_serializing_if = "Author::is_empty")]
    pub author: Author,

    /// Files to render, relative to the template directory
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,

    /// Directories to create, relative to the template directory
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,

    #[serde(skip_serializing_if = "Actions::is_empty")]
    pub actions: Actions,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prompts: Vec<Prompt>,

    /// Location relative to the repository root (runtime only)
    #[serde(skip)]
    pub path: String,
}

/// Template author
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub homepage: String,
}

impl Author {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.homepage.is_empty()
    }
}

/// A named, ordered list of templates executed together with the owner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Member paths, joined onto the owning template's path.
    /// A member may carry its own `#group` suffix.
    pub templates: Vec<String>,
}

/// A variable the template needs before it can be rendered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompt {
    pub variable: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Pattern a non-empty answer must match
    #[serde(skip_serializing_if = "String::is_empty")]
    pub regexp: String,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

/// Actions grouped by the phase they run in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Actions {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_parse: Vec<Action>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_execute: Vec<Action>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_execute: Vec<Action>,
}

impl Actions {
    pub fn is_empty(&self) -> bool {
        self.pre_parse.is_empty() && self.pre_execute.is_empty() && self.post_execute.is_empty()
    }

    /// Actions declared for a phase
    pub fn for_phase(&self, phase: Phase) -> &[Action] {
        match phase {
            Phase::PreParse => &self.pre_parse,
            Phase::PreExecute => &self.pre_execute,
            Phase::PostExecute => &self.post_execute,
        }
    }
}

/// An external command run around template execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    pub program: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub work_dir: String,

    /// `KEY=value` entries added to the process environment
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<String>,

    /// Report failures instead of aborting the run
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_fail: bool,
}

impl Action {
    /// Command line for display
    pub fn command_line(&self) -> String {
        if self.arguments.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.arguments.join(" "))
        }
    }
}

/// Phase an action runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before any variable is gathered
    PreParse,
    /// After gathering, before rendering
    PreExecute,
    /// After all files are rendered
    PostExecute,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PreParse => "pre-parse",
            Self::PreExecute => "pre-execute",
            Self::PostExecute => "post-execute",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Metafile {
    /// Create empty metadata for a template at `path`
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Default::default()
        }
    }

    /// Name for display, falling back to the template path
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.path.is_empty() {
            &self.path
        } else {
            "."
        }
    }

    /// Find a group by name
    pub fn find_group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Add a group, replacing one with the same name
    pub fn set_group(&mut self, group: Group) {
        match self.groups.iter_mut().find(|g| g.name == group.name) {
            Some(existing) => *existing = group,
            None => self.groups.push(group),
        }
    }

    /// Add a file entry unless already listed
    pub fn add_file(&mut self, file: &str) -> bool {
        add_unique(&mut self.files, file)
    }

    /// Remove a file entry
    pub fn remove_file(&mut self, file: &str) -> bool {
        remove_entry(&mut self.files, file)
    }

    /// Add a directory entry unless already listed
    pub fn add_directory(&mut self, dir: &str) -> bool {
        add_unique(&mut self.directories, dir)
    }

    /// Remove a directory entry
    pub fn remove_directory(&mut self, dir: &str) -> bool {
        remove_entry(&mut self.directories, dir)
    }

    /// Add a prompt, replacing one that declares the same variable
    pub fn set_prompt(&mut self, prompt: Prompt) {
        match self
            .prompts
            .iter_mut()
            .find(|p| p.variable == prompt.variable)
        {
            Some(existing) => *existing = prompt,
            None => self.prompts.push(prompt),
        }
    }
}

fn add_unique(list: &mut Vec<String>, entry: &str) -> bool {
    if list.iter().any(|e| e == entry) {
        return false;
    }
    list.push(entry.to_string());
    true
}

fn remove_entry(list: &mut Vec<String>, entry: &str) -> bool {
    let len_before = list.len();
    list.retain(|e| e != entry);
    list.len() < len_before
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fields_are_omitted() {
        let meta = Metafile {
            name: "cli".into(),
            files: vec!["main.go.tmpl".into()],
            ..Default::default()
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"name":"cli","files":["main.go.tmpl"]}"#);
    }

    #[test]
    fn test_path_is_not_persisted() {
        let meta = Metafile::new("apps/cli");
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, "{}");

        let back: Metafile = serde_json::from_str(&json).unwrap();
        assert!(back.path.is_empty());
    }

    #[test]
    fn test_parse_full_document() {
        let json = r#"{
            "name": "service",
            "author": {"name": "Ada", "email": "ada@example.com"},
            "directories": ["cmd/$ProjectName"],
            "files": ["main.go"],
            "groups": [{"name": "all", "templates": ["../db", "web"]}],
            "actions": {"pre_execute": [{"program": "echo", "arguments": ["hi"], "no_fail": true}]},
            "prompts": [{"variable": "ProjectName", "regexp": "^[a-z]+$"}]
        }"#;
        let meta: Metafile = serde_json::from_str(json).unwrap();

        assert_eq!(meta.author.name, "Ada");
        assert_eq!(meta.find_group("all").unwrap().templates, vec!["../db", "web"]);
        assert!(meta.actions.pre_execute[0].no_fail);
        assert!(!meta.prompts[0].optional);
        assert_eq!(meta.actions.for_phase(Phase::PreExecute).len(), 1);
        assert!(meta.actions.for_phase(Phase::PostExecute).is_empty());
    }

    #[test]
    fn test_add_remove_entries() {
        let mut meta = Metafile::default();
        assert!(meta.add_file("a.txt"));
        assert!(!meta.add_file("a.txt"));
        assert!(meta.add_directory("src"));
        assert!(meta.remove_file("a.txt"));
        assert!(!meta.remove_file("a.txt"));
        assert_eq!(meta.directories, vec!["src"]);
    }

    #[test]
    fn test_set_group_replaces_by_name() {
        let mut meta = Metafile::default();
        meta.set_group(Group {
            name: "all".into(),
            templates: vec!["a".into()],
            ..Default::default()
        });
        meta.set_group(Group {
            name: "all".into(),
            templates: vec!["b".into()],
            ..Default::default()
        });
        assert_eq!(meta.groups.len(), 1);
        assert_eq!(meta.groups[0].templates, vec!["b"]);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(Metafile::default().display_name(), ".");
        assert_eq!(Metafile::new("apps/cli").display_name(), "apps/cli");
    }

    #[test]
    fn test_action_command_line() {
        let action = Action {
            program: "go".into(),
            arguments: vec!["mod".into(), "tidy".into()],
            ..Default::default()
        };
        assert_eq!(action.command_line(), "go mod tidy");
    }
}
