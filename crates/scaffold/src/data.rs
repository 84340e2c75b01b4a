//! Structured declarations for templates
//!
//! Declarations are read from JSON documents passed on the command line and
//! reach templates only through lookup helpers:
//!
//! ```text
//! {{#with (struct "User")}}type {{name}} struct { ... }{{/with}}
//! {{#each (decls "function")}}{{name}}{{/each}}
//! ```

use crate::error::{Error, Result};
use handlebars::{
    Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, RenderErrorReason,
    ScopedJson,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// One top-level declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Constant {
        name: String,
        #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
        type_name: String,
        #[serde(default)]
        value: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        doc: String,
    },
    Variable {
        name: String,
        #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
        type_name: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        value: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        doc: String,
    },
    Struct {
        name: String,
        #[serde(default)]
        fields: Vec<Field>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        doc: String,
    },
    Interface {
        name: String,
        #[serde(default)]
        methods: Vec<Signature>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        doc: String,
    },
    Function {
        name: String,
        #[serde(default)]
        params: Vec<Field>,
        #[serde(default)]
        results: Vec<String>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        doc: String,
    },
}

/// Struct field or function parameter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub doc: String,
}

/// Interface method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signature {
    pub name: String,
    pub params: Vec<Field>,
    pub results: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Constant,
    Variable,
    Struct,
    Interface,
    Function,
}

impl DeclarationKind {
    pub const ALL: [Self; 5] = [
        Self::Constant,
        Self::Variable,
        Self::Struct,
        Self::Interface,
        Self::Function,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Variable => "variable",
            Self::Struct => "struct",
            Self::Interface => "interface",
            Self::Function => "function",
        }
    }

    /// Name of the template helper that looks up one declaration of this kind
    pub fn helper(self) -> &'static str {
        match self {
            Self::Constant => "const",
            Self::Variable => "var",
            Self::Struct => "struct",
            Self::Interface => "interface",
            Self::Function => "func",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeclarationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s || k.helper() == s)
            .ok_or_else(|| format!("unknown declaration kind '{s}'"))
    }
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Self::Constant { name, .. }
            | Self::Variable { name, .. }
            | Self::Struct { name, .. }
            | Self::Interface { name, .. }
            | Self::Function { name, .. } => name,
        }
    }

    pub fn kind(&self) -> DeclarationKind {
        match self {
            Self::Constant { .. } => DeclarationKind::Constant,
            Self::Variable { .. } => DeclarationKind::Variable,
            Self::Struct { .. } => DeclarationKind::Struct,
            Self::Interface { .. } => DeclarationKind::Interface,
            Self::Function { .. } => DeclarationKind::Function,
        }
    }
}

/// Declarations available to one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationSet {
    declarations: Vec<Declaration>,
}

impl DeclarationSet {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self { declarations }
    }

    /// Read a JSON array of declarations
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let set = Self::from_json_str(&content).map_err(|e| Error::InvalidData {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        log::debug!(
            "Loaded {} declaration(s) from {}",
            set.len(),
            path.display()
        );
        Ok(set)
    }

    /// Read and merge several files in order
    pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut set = Self::default();
        for path in paths {
            set.extend(Self::load(path.as_ref())?);
        }
        Ok(set)
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json).map(Self::new)
    }

    pub fn extend(&mut self, other: Self) {
        self.declarations.extend(other.declarations);
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// First declaration of `kind` called `name`
    pub fn find(&self, kind: DeclarationKind, name: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|d| d.kind() == kind && d.name() == name)
    }

    /// All declarations of `kind`, in input order
    pub fn of_kind(&self, kind: DeclarationKind) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().filter(move |d| d.kind() == kind)
    }
}

/// `{{const "Name"}}`, `{{struct "Name"}}` and friends
struct LookupHelper {
    set: Arc<DeclarationSet>,
    kind: DeclarationKind,
}

impl HelperDef for LookupHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> std::result::Result<ScopedJson<'rc>, RenderError> {
        let name = h
            .param(0)
            .and_then(|v| v.value().as_str())
            .ok_or(RenderErrorReason::ParamNotFoundForIndex(self.kind.helper(), 0))?;

        let decl = self.set.find(self.kind, name).ok_or_else(|| {
            RenderErrorReason::Other(format!("no {} named '{}'", self.kind, name))
        })?;
        let value = serde_json::to_value(decl)
            .map_err(|e| RenderErrorReason::Other(e.to_string()))?;
        Ok(ScopedJson::Derived(value))
    }
}

/// `{{decls "struct"}}`: every declaration of a kind
struct ListHelper {
    set: Arc<DeclarationSet>,
}

impl HelperDef for ListHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> std::result::Result<ScopedJson<'rc>, RenderError> {
        let kind = h
            .param(0)
            .and_then(|v| v.value().as_str())
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("decls", 0))?;
        let kind: DeclarationKind = kind.parse().map_err(RenderErrorReason::Other)?;

        let list: Vec<&Declaration> = self.set.of_kind(kind).collect();
        let value =
            serde_json::to_value(list).map_err(|e| RenderErrorReason::Other(e.to_string()))?;
        Ok(ScopedJson::Derived(value))
    }
}

/// Register the lookup helpers backed by `set`
pub(crate) fn register_helpers(registry: &mut Handlebars<'static>, set: DeclarationSet) {
    let set = Arc::new(set);
    for kind in DeclarationKind::ALL {
        registry.register_helper(
            kind.helper(),
            Box::new(LookupHelper {
                set: Arc::clone(&set),
                kind,
            }),
        );
    }
    registry.register_helper("decls", Box::new(ListHelper { set }));
}
