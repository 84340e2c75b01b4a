//! Template resolution
//!
//! Turns an address into an ordered list of [`Task`]s. Resolution is
//! depth-first and pre-order: a template's task always precedes the tasks of
//! its group members, and members appear in the order the group lists them.

use crate::address::TemplateAddress;
use crate::error::{Error, Result};
use crate::types::{Execution, Task};
use metafile::{Metafile, Metamap, Repository, path};
use std::path::Path;

/// Resolves addresses against one repository
pub struct Resolver<'a> {
    repo: &'a dyn Repository,
    metamap: Metamap,
}

impl<'a> Resolver<'a> {
    /// Create a resolver, reading every template in the repository once
    pub fn new(repo: &'a dyn Repository) -> Result<Self> {
        let metamap = repo.load_metamap()?;
        Ok(Self { repo, metamap })
    }

    /// Create a resolver over an already loaded metamap
    pub fn with_metamap(repo: &'a dyn Repository, metamap: Metamap) -> Self {
        Self { repo, metamap }
    }

    pub fn metamap(&self) -> &Metamap {
        &self.metamap
    }

    /// Resolve `address` into tasks whose targets live under `output_dir`.
    ///
    /// Targets still contain placeholders; they are bound once all
    /// variables are known.
    pub fn resolve(&self, address: &TemplateAddress, output_dir: &Path) -> Result<Vec<Task>> {
        let root = path::normalize(&address.path)?;
        let mut tasks = Vec::new();
        let mut ancestors = Vec::new();
        self.visit(
            &root,
            address.group.as_deref(),
            output_dir,
            &mut ancestors,
            &mut tasks,
        )?;

        log::debug!(
            "Resolved '{}' into {} task(s), {} execution(s)",
            address,
            tasks.len(),
            tasks.iter().map(|t| t.executions.len()).sum::<usize>()
        );
        Ok(tasks)
    }

    fn visit(
        &self,
        template: &str,
        group: Option<&str>,
        output_dir: &Path,
        ancestors: &mut Vec<String>,
        tasks: &mut Vec<Task>,
    ) -> Result<()> {
        let meta = self
            .metamap
            .get(template)
            .ok_or_else(|| Error::TemplateNotFound(display_path(template).to_string()))?;

        tasks.push(self.build_task(meta, output_dir)?);

        let Some(group_name) = group else {
            return Ok(());
        };

        let group = meta
            .find_group(group_name)
            .ok_or_else(|| Error::GroupNotFound {
                template: display_path(template).to_string(),
                group: group_name.to_string(),
            })?;

        ancestors.push(template.to_string());
        for member in &group.templates {
            let member = TemplateAddress::parse(member);
            let member_path = path::join(template, &member.path)?;

            if ancestors.contains(&member_path) {
                let mut chain: Vec<String> = ancestors
                    .iter()
                    .map(|p| display_path(p).to_string())
                    .collect();
                chain.push(display_path(&member_path).to_string());
                return Err(Error::CyclicGroupReference { chain });
            }

            log::trace!("Expanding group member '{}'", member_path);
            self.visit(
                &member_path,
                member.group.as_deref(),
                output_dir,
                ancestors,
                tasks,
            )?;
        }
        ancestors.pop();

        Ok(())
    }

    /// Directories first, then files; every file must exist in the repository
    fn build_task(&self, meta: &Metafile, output_dir: &Path) -> Result<Task> {
        let mut executions = Vec::with_capacity(meta.directories.len() + meta.files.len());

        for dir in &meta.directories {
            executions.push(Execution {
                path: dir.clone(),
                source: path::join(&meta.path, dir)?,
                target: output_dir.join(dir),
                is_dir: true,
            });
        }

        for file in &meta.files {
            let source = path::join(&meta.path, file)?;
            if !self.repo.exists(&source) {
                return Err(Error::MissingTemplateFile {
                    template: display_path(&meta.path).to_string(),
                    file: source,
                });
            }
            executions.push(Execution {
                path: file.clone(),
                source,
                target: output_dir.join(file),
                is_dir: false,
            });
        }

        Ok(Task {
            metafile: meta.clone(),
            executions,
        })
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "." } else { path }
}
