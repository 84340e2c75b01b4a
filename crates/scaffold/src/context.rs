//! Collaborator traits
//!
//! The engine never talks to a terminal directly. Answers come from an
//! [`Interrogator`] and progress goes to a [`ProgressCallback`], so the
//! engine can run under an interactive CLI, a script, or a test.

use crate::error::{Error, Result};
use crate::types::Execution;
use metafile::{Phase, Prompt};
use std::collections::VecDeque;

/// Source of answers for template prompts
pub trait Interrogator {
    /// Ask for a value. `current` is the value already bound, if any.
    fn ask(&mut self, prompt: &Prompt, current: Option<&str>) -> Result<String>;

    /// Called when an answer fails validation; the prompt is asked again
    /// unless [`Interrogator::can_retry`] says otherwise.
    fn rejected(&mut self, _prompt: &Prompt, _answer: &str, _reason: &str) {}

    /// False when asking again would only repeat the rejected answer
    fn can_retry(&self) -> bool {
        true
    }
}

/// Interrogator for runs that must not block on input
///
/// Optional prompts resolve to an empty value; required prompts fail with
/// [`Error::PromptUnanswered`]. A bound value that fails validation fails
/// with [`Error::InvalidAnswer`].
pub struct NonInteractive;

impl Interrogator for NonInteractive {
    fn ask(&mut self, prompt: &Prompt, current: Option<&str>) -> Result<String> {
        match current {
            Some(value) => Ok(value.to_string()),
            None if prompt.optional => Ok(String::new()),
            None => Err(Error::PromptUnanswered(prompt.variable.clone())),
        }
    }

    fn can_retry(&self) -> bool {
        false
    }
}

/// Interrogator answering from a fixed list, in order
#[derive(Debug, Default)]
pub struct ScriptedAnswers {
    answers: VecDeque<String>,
    /// Prompts that were rejected, with the offending answer
    pub rejections: Vec<(String, String)>,
}

impl ScriptedAnswers {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            rejections: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Interrogator for ScriptedAnswers {
    fn ask(&mut self, prompt: &Prompt, _current: Option<&str>) -> Result<String> {
        self.answers
            .pop_front()
            .ok_or_else(|| Error::PromptUnanswered(prompt.variable.clone()))
    }

    fn rejected(&mut self, prompt: &Prompt, answer: &str, _reason: &str) {
        self.rejections
            .push((prompt.variable.clone(), answer.to_string()));
    }
}

/// Progress callback for a template run
///
/// Every method has an empty default so implementors pick what they show.
pub trait ProgressCallback {
    /// Called before an action is started
    fn on_action_start(&mut self, _phase: Phase, _command: &str) {}

    /// Called when a `no_fail` action failed and the run continues
    fn on_action_failed(&mut self, _phase: Phase, _command: &str, _reason: &str) {}

    /// Called before rendering starts with the number of files to render
    fn on_render_start(&mut self, _total: usize) {}

    /// Called after a directory was created or a file was written
    fn on_execution(&mut self, _execution: &Execution) {}

    /// Called when rendering finished
    fn on_render_complete(&mut self) {}

    /// Called when the output directory is being restored from a backup
    fn on_restore(&mut self, _reason: &Error) {}
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {}
