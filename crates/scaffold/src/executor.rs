//! Template execution pipeline
//!
//! A run is split in two. [`Engine::plan`] resolves the address, gathers
//! variables, binds targets and checks conflicts without writing anything.
//! [`Engine::execute`] takes a plan and makes it real: backup, pre-execute
//! actions, rendering, post-execute actions, and a restore if any of those
//! fail.

use crate::actions::run_phase;
use crate::address::TemplateAddress;
use crate::backup::Snapshot;
use crate::conflict::{bind_targets, check_conflicts};
use crate::context::{Interrogator, ProgressCallback};
use crate::data::DeclarationSet;
use crate::error::{Error, Result};
use crate::prompts::{gather_prompts, system_variables};
use crate::render::Renderer;
use crate::resolver::Resolver;
use crate::types::{ExecuteOptions, ExecuteSummary, PhaseReport, Preview, Task};
use crate::variables::Variables;
use chrono::Local;
use metafile::{Phase, Repository};
use std::fs;
use std::path::PathBuf;

/// Everything needed to render, computed before the first write
#[derive(Debug, Clone)]
pub struct Plan {
    pub address: TemplateAddress,
    pub output_dir: PathBuf,
    pub tasks: Vec<Task>,
    pub variables: Variables,
    /// Outcome of the pre-parse actions, which run while planning
    pub pre_parse: PhaseReport,
}

impl Plan {
    pub fn file_count(&self) -> usize {
        self.tasks.iter().map(|t| t.files().count()).sum()
    }

    pub fn directory_count(&self) -> usize {
        self.tasks.iter().map(|t| t.directories().count()).sum()
    }
}

/// Runs templates from one repository
pub struct Engine<'a> {
    repo: &'a dyn Repository,
    renderer: Renderer,
    opts: ExecuteOptions,
}

impl<'a> Engine<'a> {
    pub fn new(repo: &'a dyn Repository, opts: ExecuteOptions) -> Self {
        Self::with_data(repo, opts, DeclarationSet::default())
    }

    /// Engine whose templates can look up `data`
    pub fn with_data(repo: &'a dyn Repository, opts: ExecuteOptions, data: DeclarationSet) -> Self {
        Self {
            repo,
            renderer: Renderer::new(data),
            opts,
        }
    }

    pub fn options(&self) -> &ExecuteOptions {
        &self.opts
    }

    /// Resolve and validate a run without writing anything.
    ///
    /// Pre-parse actions run here unless this is a dry run.
    pub fn plan(
        &self,
        address: &TemplateAddress,
        interrogator: &mut dyn Interrogator,
        progress: &mut dyn ProgressCallback,
    ) -> Result<Plan> {
        let output_dir = self.opts.output_dir.clone();
        let mut variables = Variables::from_assignments(&self.opts.assignments)?;

        let resolver = Resolver::new(self.repo)?;
        let mut tasks = resolver.resolve(address, &output_dir)?;

        let pre_parse = if self.opts.dry_run {
            PhaseReport::default()
        } else {
            run_phase(
                &tasks,
                Phase::PreParse,
                &Variables::new(),
                &output_dir,
                progress,
            )?
        };

        let asked = gather_prompts(
            &tasks,
            &mut variables,
            self.opts.prompt_mode,
            interrogator,
        )?;
        log::debug!("Asked {} prompt(s)", asked);

        let system = system_variables(address, &output_dir, &self.opts.author, Local::now());
        variables.merge_missing(&system);

        bind_targets(&mut tasks, &variables, &output_dir)?;
        check_conflicts(&tasks, self.opts.overwrite)?;

        Ok(Plan {
            address: address.clone(),
            output_dir,
            tasks,
            variables,
            pre_parse,
        })
    }

    /// Write a plan to disk, restoring the output directory on failure
    pub fn execute(
        &self,
        plan: &Plan,
        progress: &mut dyn ProgressCallback,
    ) -> Result<ExecuteSummary> {
        let snapshot = match &self.opts.backup {
            Some(backup) => Some(Snapshot::take(&plan.output_dir, &backup.dir)?),
            None => None,
        };

        match self.write(plan, progress) {
            Ok(mut summary) => {
                summary.merge_actions(plan.pre_parse);
                if let Some(snapshot) = snapshot {
                    if self.opts.backup.as_ref().is_some_and(|b| b.keep) {
                        summary.backup = snapshot.keep();
                    } else {
                        snapshot.discard()?;
                    }
                }
                Ok(summary)
            }
            Err(err) => {
                let Some(snapshot) = snapshot else {
                    return Err(err);
                };
                log::warn!("Run failed, restoring {}", plan.output_dir.display());
                progress.on_restore(&err);
                match snapshot.restore() {
                    Ok(()) => Err(err),
                    Err(restore) => Err(Error::RestoreFailed {
                        original: Box::new(err),
                        restore: Box::new(restore),
                    }),
                }
            }
        }
    }

    fn write(&self, plan: &Plan, progress: &mut dyn ProgressCallback) -> Result<ExecuteSummary> {
        let mut summary = ExecuteSummary::default();
        let vars = &plan.variables;

        // Relative action work dirs resolve against it
        fs::create_dir_all(&plan.output_dir).map_err(|e| Error::io(&plan.output_dir, e))?;

        summary.merge_actions(run_phase(
            &plan.tasks,
            Phase::PreExecute,
            vars,
            &plan.output_dir,
            progress,
        )?);

        progress.on_render_start(plan.file_count() + plan.directory_count());
        for task in &plan.tasks {
            // Directories first; they were resolved in that order
            for execution in &task.executions {
                self.renderer.render_execution(self.repo, execution, vars)?;
                if execution.is_dir {
                    summary.directories += 1;
                } else {
                    summary.files += 1;
                }
                progress.on_execution(execution);
            }
        }
        progress.on_render_complete();

        summary.merge_actions(run_phase(
            &plan.tasks,
            Phase::PostExecute,
            vars,
            &plan.output_dir,
            progress,
        )?);

        Ok(summary)
    }

    /// Render every execution in memory for a dry run
    pub fn preview(&self, plan: &Plan) -> Result<Vec<Preview>> {
        let mut previews = Vec::new();
        for execution in plan.tasks.iter().flat_map(|t| &t.executions) {
            let (contents, existing) = if execution.is_dir {
                (Vec::new(), None)
            } else {
                let contents = self
                    .renderer
                    .render_contents(self.repo, execution, &plan.variables)?;
                let existing = if execution.target.is_file() {
                    Some(
                        fs::read(&execution.target)
                            .map_err(|e| Error::io(&execution.target, e))?,
                    )
                } else {
                    None
                };
                (contents, existing)
            };

            previews.push(Preview {
                target: execution.target.clone(),
                source: execution.source.clone(),
                is_dir: execution.is_dir,
                contents,
                existing,
            });
        }
        Ok(previews)
    }

    /// Plan and execute in one go. A dry run stops after planning and
    /// reports what would be written.
    pub fn run(
        &self,
        address: &TemplateAddress,
        interrogator: &mut dyn Interrogator,
        progress: &mut dyn ProgressCallback,
    ) -> Result<ExecuteSummary> {
        let plan = self.plan(address, interrogator, progress)?;
        if self.opts.dry_run {
            self.preview(&plan)?;
            return Ok(ExecuteSummary {
                directories: plan.directory_count(),
                files: plan.file_count(),
                ..Default::default()
            });
        }
        self.execute(&plan, progress)
    }
}
