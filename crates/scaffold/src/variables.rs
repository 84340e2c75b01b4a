//! Variable store and `$Name` placeholder expansion

use crate::error::{Error, Result};
use regex::{Captures, Regex};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// `$Name` or `${Name}`
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("placeholder pattern is valid")
});

/// Marker standing in for a substituted `$Name` while handlebars runs
static SHIELDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x{E000}([0-9]+)\x{E001}").expect("shield pattern is valid")
});

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// Named string values available to paths, actions and templates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Variables {
    values: BTreeMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `key=value` strings
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vars = Self::new();
        for raw in assignments {
            let (key, value) = parse_assignment(raw.as_ref())?;
            vars.set(key, value);
        }
        Ok(vars)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy entries from `other` whose names are not set here yet.
    /// Returns how many were added.
    pub fn merge_missing(&mut self, other: &Variables) -> usize {
        let mut added = 0;
        for (name, value) in &other.values {
            if !self.values.contains_key(name) {
                self.values.insert(name.clone(), value.clone());
                added += 1;
            }
        }
        added
    }

    /// Replace `$Name` and `${Name}` tokens with bound values in one pass.
    ///
    /// Unbound names are left as written and substituted values are never
    /// scanned again.
    pub fn expand<'a>(&self, input: &'a str) -> Cow<'a, str> {
        if !input.contains('$') {
            return Cow::Borrowed(input);
        }

        PLACEHOLDER.replace_all(input, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str());
            match self.values.get(name) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
    }

    /// Swap bound `$Name` tokens for private-use markers so another template
    /// pass can run over `input` without seeing the substituted values.
    pub(crate) fn shield(&self, input: &str) -> Shielded {
        let mut values = Vec::new();
        if !input.contains('$') {
            return Shielded {
                text: input.to_string(),
                values,
            };
        }

        let text = PLACEHOLDER.replace_all(input, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str());
            match self.values.get(name) {
                Some(value) => {
                    values.push(value.clone());
                    format!("\u{E000}{}\u{E001}", values.len() - 1)
                }
                None => caps[0].to_string(),
            }
        });
        Shielded {
            text: text.into_owned(),
            values,
        }
    }

    /// Store as a JSON object for the template engine
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }
}

/// Template text whose `$Name` substitutions are held aside
pub(crate) struct Shielded {
    pub text: String,
    values: Vec<String>,
}

impl Shielded {
    /// Put the held values back into `rendered`, in one pass
    pub fn restore(&self, rendered: &str) -> String {
        if self.values.is_empty() {
            return rendered.to_string();
        }
        SHIELDED
            .replace_all(rendered, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.values.get(i))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Split `key=value` on the first `=`. The key must be an identifier; the
/// value may be empty or contain further `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| Error::InvalidAssignment(raw.to_string()))?;
    let key = key.trim();
    if !IDENTIFIER.is_match(key) {
        return Err(Error::InvalidAssignment(raw.to_string()));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        let mut v = Variables::new();
        for (k, val) in pairs {
            v.set(*k, *val);
        }
        v
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("Name=demo").unwrap(),
            ("Name".to_string(), "demo".to_string())
        );
        assert_eq!(
            parse_assignment("Flags=a=b").unwrap(),
            ("Flags".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_assignment("Empty=").unwrap(),
            ("Empty".to_string(), String::new())
        );
    }

    #[test]
    fn test_parse_assignment_rejects_malformed() {
        for raw in ["novalue", "=value", "1abc=x", "bad key=x", ""] {
            assert!(
                matches!(parse_assignment(raw), Err(Error::InvalidAssignment(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_assignments_last_wins() {
        let v = Variables::from_assignments(["A=1", "B=2", "A=3"]).unwrap();
        assert_eq!(v.get("A"), Some("3"));
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_merge_missing_does_not_overwrite() {
        let mut user = vars(&[("OutputDir", "/custom")]);
        let system = vars(&[("OutputDir", "/default"), ("Year", "2026")]);

        assert_eq!(user.merge_missing(&system), 1);
        assert_eq!(user.get("OutputDir"), Some("/custom"));
        assert_eq!(user.get("Year"), Some("2026"));
    }

    #[test]
    fn test_expand_without_tokens_is_identity() {
        let v = vars(&[("Name", "demo")]);
        let input = "plain/path/file.txt";
        assert!(matches!(v.expand(input), Cow::Borrowed(_)));
        assert_eq!(v.expand(input), input);
        assert_eq!(v.expand(&v.expand(input)), input);
    }

    #[test]
    fn test_expand_replaces_all_occurrences() {
        let v = vars(&[("Name", "demo")]);
        assert_eq!(v.expand("$Name/$Name.go"), "demo/demo.go");
        assert_eq!(v.expand("${Name}_test.go"), "demo_test.go");
    }

    #[test]
    fn test_expand_is_case_sensitive() {
        let v = vars(&[("Name", "demo")]);
        assert_eq!(v.expand("$name"), "$name");
    }

    #[test]
    fn test_expand_leaves_unknown_tokens() {
        let v = vars(&[("Name", "demo")]);
        assert_eq!(v.expand("$HOME/$Name"), "$HOME/demo");
        assert_eq!(v.expand("cost: $5"), "cost: $5");
    }

    #[test]
    fn test_expand_does_not_rescan_output() {
        let v = vars(&[("A", "$B"), ("B", "oops")]);
        assert_eq!(v.expand("$A"), "$B");

        let self_ref = vars(&[("A", "$A$A")]);
        assert_eq!(self_ref.expand("$A"), "$A$A");
    }

    #[test]
    fn test_expand_longest_identifier() {
        let v = vars(&[("Name", "demo")]);
        // `$Name_suffix` names a different variable
        assert_eq!(v.expand("$Name_suffix"), "$Name_suffix");
        assert_eq!(v.expand("$Name.suffix"), "demo.suffix");
    }

    #[test]
    fn test_shield_restores_values_verbatim() {
        let v = vars(&[("Price", "costs $Name"), ("Name", "demo")]);
        let shielded = v.shield("$Price and ${Name}, not $Other");

        assert!(!shielded.text.contains("costs"));
        assert!(shielded.text.ends_with(", not $Other"));
        assert_eq!(
            shielded.restore(&shielded.text),
            "costs $Name and demo, not $Other"
        );
    }

    #[test]
    fn test_shield_without_bound_tokens() {
        let v = vars(&[("Name", "demo")]);
        let shielded = v.shield("{{Name}} $Unbound");
        assert_eq!(shielded.text, "{{Name}} $Unbound");
        assert_eq!(shielded.restore("demo $Unbound"), "demo $Unbound");
    }

    #[test]
    fn test_to_json() {
        let v = vars(&[("A", "1")]);
        assert_eq!(v.to_json(), serde_json::json!({"A": "1"}));
    }
}
