//! Terminal progress for template runs

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use metafile::Phase;
use scaffold::{Error, Execution, ProgressCallback};
use std::path::{Path, PathBuf};

use crate::ui;

/// Progress bar over rendered entries, with action lines printed above it
pub struct RenderProgress {
    output_dir: PathBuf,
    quiet: bool,
    bar: Option<ProgressBar>,
}

impl RenderProgress {
    pub fn new(output_dir: &Path, quiet: bool) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            quiet,
            bar: None,
        }
    }

    /// Print a line without tearing the bar
    fn print(&self, line: &str) {
        match &self.bar {
            Some(pb) => pb.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }
}

impl ProgressCallback for RenderProgress {
    fn on_action_start(&mut self, phase: Phase, command: &str) {
        if !self.quiet {
            self.print(&format!("  {} {} {}", "▸".blue(), phase.to_string().dimmed(), command));
        }
    }

    fn on_action_failed(&mut self, phase: Phase, command: &str, reason: &str) {
        self.print(&format!(
            "  {} {} action '{}' failed ({}), continuing",
            "⚠".yellow(),
            phase,
            command,
            reason
        ));
    }

    fn on_render_start(&mut self, total: usize) {
        if self.quiet || total == 0 {
            return;
        }
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        self.bar = Some(pb);
    }

    fn on_execution(&mut self, execution: &Execution) {
        if let Some(pb) = &self.bar {
            let shown = execution
                .target
                .strip_prefix(&self.output_dir)
                .unwrap_or(&execution.target);
            pb.set_message(shown.display().to_string());
            pb.inc(1);
        }
    }

    fn on_render_complete(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }

    fn on_restore(&mut self, reason: &Error) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
        ui::error(&format!("{} (restoring {})", reason, self.output_dir.display()));
    }
}
