use std::sync::Arc;

use reasoning_core::model::{Difficulty, GradingResult, Question, QuestionCategory};
use reasoning_core::time::Clock;

use super::content::ContentApi;
use super::lifecycle::{QuestionLifecycle, until_cancelled};
use super::state::LifecycleState;
use crate::error::SessionError;

/// Endless practice on one category.
///
/// Drives both the main practice screen and the single-question screen: after a
/// question is graded, `next` generates a fresh one of the same category.
pub struct PracticeFlow {
    api: Arc<dyn ContentApi>,
    category: QuestionCategory,
    difficulty: Option<Difficulty>,
    lifecycle: QuestionLifecycle,
    graded: usize,
}

impl PracticeFlow {
    #[must_use]
    pub fn new(api: Arc<dyn ContentApi>, category: QuestionCategory) -> Self {
        Self {
            api,
            category,
            difficulty: None,
            lifecycle: QuestionLifecycle::new(Clock::default()),
            graded: 0,
        }
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Option<Difficulty>) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        *self.lifecycle.clock_mut() = clock;
        self
    }

    #[must_use]
    pub fn category(&self) -> QuestionCategory {
        self.category
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

    /// Number of questions graded in this flow.
    #[must_use]
    pub fn graded_count(&self) -> usize {
        self.graded
    }

    /// Request the first question.
    ///
    /// # Errors
    ///
    /// Returns the generation error after returning to `Idle`, `Cancelled` if the
    /// flow was cancelled (the flow is back in `Idle`), or `InvalidTransition` if not
    /// idle.
    pub async fn start(&mut self) -> Result<&Question, SessionError> {
        self.lifecycle.begin_loading("start practice", LifecycleState::Idle)?;
        self.load().await
    }

    /// # Errors
    ///
    /// See [`QuestionLifecycle::select`].
    pub fn select(&mut self, label: &str) -> Result<bool, SessionError> {
        self.lifecycle.select(label)
    }

    /// Submit the selected option.
    ///
    /// # Errors
    ///
    /// Returns the grading error; the flow stays `Selected` with the choice kept.
    pub async fn submit(&mut self) -> Result<&GradingResult, SessionError> {
        let result = self.lifecycle.submit(self.api.as_ref()).await?;
        self.graded += 1;
        Ok(result)
    }

    /// Leave the graded question and load a fresh one of the same category.
    ///
    /// # Errors
    ///
    /// As [`PracticeFlow::start`]; also `InvalidTransition` unless graded.
    pub async fn next(&mut self) -> Result<&Question, SessionError> {
        self.lifecycle.begin_loading("advance", LifecycleState::Graded)?;
        self.load().await
    }

    pub fn cancel(&self) {
        self.lifecycle.cancel();
    }

    async fn load(&mut self) -> Result<&Question, SessionError> {
        let token = self.lifecycle.cancellation_token();
        let generated = match until_cancelled(
            &token,
            self.api.generate_question(self.category, self.difficulty),
        )
        .await
        {
            Ok(generated) => generated,
            Err(err) => {
                self.lifecycle.reset();
                return Err(err);
            }
        };

        match generated {
            Ok(question) => Ok(self.lifecycle.present(question)),
            Err(err) => {
                tracing::warn!(category = %self.category, error = %err, "question generation failed");
                self.lifecycle.reset();
                Err(err.into())
            }
        }
    }
}
