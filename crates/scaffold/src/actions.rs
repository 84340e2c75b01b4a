//! Action runner
//!
//! Runs the external commands a template declares for a phase. Fields are
//! expanded right before the process starts, so pre-parse actions only see
//! literal text.

use crate::context::ProgressCallback;
use crate::error::{Error, Result};
use crate::types::{PhaseReport, Task};
use crate::variables::Variables;
use metafile::{Action, Phase};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Run every action declared for `phase`, task by task in resolution order
pub fn run_phase(
    tasks: &[Task],
    phase: Phase,
    vars: &Variables,
    output_dir: &Path,
    progress: &mut dyn ProgressCallback,
) -> Result<PhaseReport> {
    let mut report = PhaseReport::default();

    for task in tasks {
        for action in task.metafile.actions.for_phase(phase) {
            let command = expanded_command_line(action, vars);
            progress.on_action_start(phase, &command);
            log::info!("Running {} action: {}", phase, command);

            report.run += 1;
            if let Err(reason) = run_action(action, vars, output_dir) {
                if !action.no_fail {
                    return Err(Error::ActionFailed {
                        phase,
                        command,
                        reason,
                    });
                }
                log::warn!("{} action '{}' failed: {}", phase, command, reason);
                progress.on_action_failed(phase, &command, &reason);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Actions of `phase` across `tasks`, for display
pub fn planned_actions<'t>(tasks: &'t [Task], phase: Phase) -> Vec<&'t Action> {
    tasks
        .iter()
        .flat_map(|t| t.metafile.actions.for_phase(phase))
        .collect()
}

/// Command line after placeholder expansion
pub fn expanded_command_line(action: &Action, vars: &Variables) -> String {
    vars.expand(&action.command_line()).into_owned()
}

fn run_action(
    action: &Action,
    vars: &Variables,
    output_dir: &Path,
) -> std::result::Result<(), String> {
    let program = vars.expand(&action.program);
    if program.trim().is_empty() {
        return Err("no program given".to_string());
    }

    let mut cmd = Command::new(program.as_ref());
    cmd.args(action.arguments.iter().map(|a| vars.expand(a).into_owned()))
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    if let Some(dir) = work_dir(action, vars, output_dir) {
        cmd.current_dir(dir);
    }

    for entry in &action.environment {
        let entry = vars.expand(entry);
        match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                cmd.env(key, value);
            }
            _ => return Err(format!("invalid environment entry '{entry}'")),
        }
    }

    let status = cmd.status().map_err(|e| format!("could not start: {e}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(match status.code() {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_string(),
        })
    }
}

/// Relative work dirs resolve against the output directory; empty means
/// the current directory.
fn work_dir(action: &Action, vars: &Variables, output_dir: &Path) -> Option<PathBuf> {
    if action.work_dir.is_empty() {
        return None;
    }
    let dir = PathBuf::from(vars.expand(&action.work_dir).as_ref());
    if dir.is_absolute() {
        Some(dir)
    } else {
        Some(output_dir.join(dir))
    }
}
