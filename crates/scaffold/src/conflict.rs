//! Target binding and conflict checking

use crate::error::{Error, Result};
use crate::types::Task;
use crate::variables::Variables;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Expand every execution's entry and place it under `output_dir`.
///
/// Runs once all variables are known. An expanded entry that is absolute or
/// climbs out of the output directory is rejected.
pub fn bind_targets(tasks: &mut [Task], vars: &Variables, output_dir: &Path) -> Result<()> {
    for execution in tasks.iter_mut().flat_map(|t| t.executions.iter_mut()) {
        let expanded = vars.expand(&execution.path);
        let relative = relative_target(&expanded)?;
        execution.target = output_dir.join(relative);
        log::trace!("{} -> {}", execution.source, execution.target.display());
    }
    Ok(())
}

fn relative_target(entry: &str) -> Result<PathBuf> {
    let invalid = |reason| Error::InvalidPath {
        path: entry.to_string(),
        reason,
    };

    let mut parts = PathBuf::new();
    for component in Path::new(entry).components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => parts.push(part),
            Component::ParentDir => {
                if !parts.pop() {
                    return Err(invalid("escapes the output directory"));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("must be relative to the output directory"));
            }
        }
    }
    Ok(parts)
}

/// Fail with every target that would be clobbered.
///
/// Without `overwrite`, a file target that exists or that two executions
/// share is a conflict. A directory target conflicts only when something
/// other than a directory is in the way, and a file target never may be an
/// existing directory.
pub fn check_conflicts(tasks: &[Task], overwrite: bool) -> Result<()> {
    let mut conflicts = Vec::new();
    let mut claimed = HashSet::new();

    for execution in tasks.iter().flat_map(|t| &t.executions) {
        let target = &execution.target;

        if execution.is_dir {
            if target.exists() && !target.is_dir() {
                conflicts.push(target.clone());
            }
            continue;
        }

        if target.is_dir() {
            conflicts.push(target.clone());
            continue;
        }

        if overwrite {
            continue;
        }

        if !claimed.insert(target.as_path()) || target.exists() {
            conflicts.push(target.clone());
        }
    }

    if conflicts.is_empty() {
        Ok(())
    } else {
        conflicts.dedup();
        log::debug!("Found {} conflicting target(s)", conflicts.len());
        Err(Error::TargetConflict(conflicts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Execution;
    use metafile::Metafile;
    use std::fs;
    use tempfile::TempDir;

    fn task(entries: &[(&str, bool)], out: &Path) -> Task {
        Task {
            metafile: Metafile::new("t"),
            executions: entries
                .iter()
                .map(|(path, is_dir)| Execution {
                    path: (*path).to_string(),
                    source: format!("t/{path}"),
                    target: out.join(path),
                    is_dir: *is_dir,
                })
                .collect(),
        }
    }

    #[test]
    fn test_bind_targets_expands_entries() {
        let out = Path::new("/out");
        let mut tasks = vec![task(&[("cmd/$Name", true), ("$Name/${Name}.go", false)], out)];
        let vars = Variables::from_assignments(["Name=demo"]).unwrap();

        bind_targets(&mut tasks, &vars, out).unwrap();

        assert_eq!(tasks[0].executions[0].target, PathBuf::from("/out/cmd/demo"));
        assert_eq!(tasks[0].executions[1].target, PathBuf::from("/out/demo/demo.go"));
        assert_eq!(tasks[0].executions[1].path, "$Name/${Name}.go");
    }

    #[test]
    fn test_bind_targets_rejects_escape() {
        let out = Path::new("/out");
        let vars = Variables::from_assignments(["Dir=../../etc"]).unwrap();

        let mut escaping = vec![task(&[("$Dir/passwd", false)], out)];
        assert!(matches!(
            bind_targets(&mut escaping, &vars, out),
            Err(Error::InvalidPath { .. })
        ));

        let abs = Variables::from_assignments(["Dir=/etc"]).unwrap();
        let mut absolute = vec![task(&[("$Dir/passwd", false)], out)];
        assert!(bind_targets(&mut absolute, &abs, out).is_err());
    }

    #[test]
    fn test_bind_targets_allows_inner_parent() {
        let out = Path::new("/out");
        let mut tasks = vec![task(&[("a/../b.txt", false)], out)];
        bind_targets(&mut tasks, &Variables::new(), out).unwrap();
        assert_eq!(tasks[0].executions[0].target, PathBuf::from("/out/b.txt"));
    }

    #[test]
    fn test_existing_file_conflicts() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("main.go"), "old").unwrap();
        let tasks = vec![task(&[("main.go", false), ("go.mod", false)], tmp.path())];

        match check_conflicts(&tasks, false) {
            Err(Error::TargetConflict(paths)) => {
                assert_eq!(paths, vec![tmp.path().join("main.go")]);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert!(check_conflicts(&tasks, true).is_ok());
    }

    #[test]
    fn test_duplicate_targets_conflict() {
        let tmp = TempDir::new().unwrap();
        let tasks = vec![
            task(&[("README.md", false)], tmp.path()),
            task(&[("README.md", false)], tmp.path()),
        ];
        assert!(matches!(
            check_conflicts(&tasks, false),
            Err(Error::TargetConflict(paths)) if paths.len() == 1
        ));
    }

    #[test]
    fn test_existing_directory_is_fine() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("cmd")).unwrap();
        let tasks = vec![task(&[("cmd", true), ("cmd", true)], tmp.path())];
        assert!(check_conflicts(&tasks, false).is_ok());
    }

    #[test]
    fn test_file_in_place_of_directory_conflicts() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("cmd"), "").unwrap();
        let tasks = vec![task(&[("cmd", true)], tmp.path())];
        assert!(check_conflicts(&tasks, true).is_err());
    }

    #[test]
    fn test_directory_in_place_of_file_conflicts() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("main.go")).unwrap();
        let tasks = vec![task(&[("main.go", false)], tmp.path())];
        assert!(check_conflicts(&tasks, true).is_err());
    }
}
