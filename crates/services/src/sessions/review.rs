use std::sync::Arc;

use reasoning_core::model::{GradingResult, Question};
use reasoning_core::time::Clock;

use super::content::ContentApi;
use super::lifecycle::{QuestionLifecycle, until_cancelled};
use super::progress::ReviewProgress;
use super::state::LifecycleState;
use crate::error::SessionError;

/// Walks once through the learner's missed questions.
///
/// The queue is fetched on `start` and never refreshed; an empty queue or advancing
/// past the last question ends in `ReviewComplete`. A new review needs a new flow.
pub struct ReviewFlow {
    api: Arc<dyn ContentApi>,
    queue: Vec<Question>,
    index: usize,
    lifecycle: QuestionLifecycle,
}

impl ReviewFlow {
    #[must_use]
    pub fn new(api: Arc<dyn ContentApi>) -> Self {
        Self {
            api,
            queue: Vec::new(),
            index: 0,
            lifecycle: QuestionLifecycle::new(Clock::default()),
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        *self.lifecycle.clock_mut() = clock;
        self
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    #[must_use]
    pub fn lifecycle(&self) -> &QuestionLifecycle {
        &self.lifecycle
    }

    pub fn lifecycle_mut(&mut self) -> &mut QuestionLifecycle {
        &mut self.lifecycle
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.lifecycle.state().is_terminal()
    }

    #[must_use]
    pub fn progress(&self) -> ReviewProgress {
        let total = self.queue.len();
        let is_complete = self.is_complete();
        let position = if is_complete {
            total
        } else {
            (self.index + 1).min(total)
        };
        ReviewProgress {
            total,
            position,
            remaining: total.saturating_sub(self.index),
            is_complete,
        }
    }

    /// Fetch the missed questions and present the first one.
    ///
    /// Returns `Ok(None)` when there is nothing to review.
    ///
    /// # Errors
    ///
    /// `Cancelled` if the flow was cancelled (the flow is back in `Idle`), or
    /// `InvalidTransition` if already started.
    pub async fn start(&mut self) -> Result<Option<&Question>, SessionError> {
        self.lifecycle.begin_loading("start review", LifecycleState::Idle)?;
        let token = self.lifecycle.cancellation_token();
        let questions = match until_cancelled(&token, self.api.missed_questions()).await {
            Ok(questions) => questions,
            Err(err) => {
                self.lifecycle.reset();
                return Err(err);
            }
        };

        tracing::debug!(count = questions.len(), "review queue loaded");
        self.queue = questions;
        self.index = 0;
        Ok(self.present_current())
    }

    /// # Errors
    ///
    /// See [`super::QuestionLifecycle::select`].
    pub fn select(&mut self, label: &str) -> Result<bool, SessionError> {
        self.lifecycle.select(label)
    }

    /// # Errors
    ///
    /// Returns the grading error; the flow stays `Selected` with the choice kept.
    pub async fn submit(&mut self) -> Result<&GradingResult, SessionError> {
        self.lifecycle.submit(self.api.as_ref()).await
    }

    /// Move to the next missed question, or to `ReviewComplete` after the last.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the current question is graded.
    pub fn next(&mut self) -> Result<Option<&Question>, SessionError> {
        self.lifecycle.begin_loading("advance", LifecycleState::Graded)?;
        self.index += 1;
        Ok(self.present_current())
    }

    pub fn cancel(&self) {
        self.lifecycle.cancel();
    }

    fn present_current(&mut self) -> Option<&Question> {
        match self.queue.get(self.index).cloned() {
            Some(question) => Some(self.lifecycle.present(question)),
            None => {
                self.lifecycle.complete_review();
                None
            }
        }
    }
}
