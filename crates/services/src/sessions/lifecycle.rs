use std::future::Future;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use reasoning_core::model::{AnswerSubmission, GradingResult, Question};
use reasoning_core::time::Clock;

use super::content::ContentApi;
use super::state::LifecycleState;
use crate::error::SessionError;

/// State machine shared by the practice and review flows.
///
/// Owns the question on screen, the chosen option, the grading result and the
/// timestamp response times are measured from. Each instance carries a
/// cancellation token that is cancelled when the instance is dropped; a request
/// that loses the race against cancellation leaves the state untouched.
pub struct QuestionLifecycle {
    state: LifecycleState,
    clock: Clock,
    question: Option<Question>,
    selected: Option<String>,
    grading: Option<GradingResult>,
    started_at: Option<DateTime<Utc>>,
    cancel: CancellationToken,
}

impl QuestionLifecycle {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            state: LifecycleState::Idle,
            clock,
            question: None,
            selected: None,
            grading: None,
            started_at: None,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[must_use]
    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn grading(&self) -> Option<&GradingResult> {
        self.grading.as_ref()
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Mutable clock access, for advancing fixed clocks in tests.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// A handle the owning screen can cancel from elsewhere, e.g. on navigation.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Choose an option on the question in view.
    ///
    /// Returns `Ok(false)` without changing anything once the question is graded.
    ///
    /// # Errors
    ///
    /// `SessionError::UnknownOption` for a label the question does not offer, or
    /// `SessionError::InvalidTransition` when no question is in view.
    pub fn select(&mut self, label: &str) -> Result<bool, SessionError> {
        match self.state {
            LifecycleState::Graded => Ok(false),
            LifecycleState::Presented | LifecycleState::Selected => {
                let option = self
                    .question
                    .as_ref()
                    .and_then(|question| question.option(label))
                    .ok_or_else(|| SessionError::UnknownOption(label.to_string()))?;
                self.selected = Some(option.label.clone());
                self.state = LifecycleState::Selected;
                Ok(true)
            }
            state => Err(SessionError::InvalidTransition {
                action: "select an answer",
                state,
            }),
        }
    }

    /// Submit the chosen option and move to `Graded` on success.
    ///
    /// On failure the state stays `Selected` with the choice preserved.
    pub(crate) async fn submit(
        &mut self,
        api: &dyn ContentApi,
    ) -> Result<&GradingResult, SessionError> {
        let (Some(question), Some(selected), LifecycleState::Selected) =
            (&self.question, &self.selected, self.state)
        else {
            return Err(SessionError::InvalidTransition {
                action: "submit",
                state: self.state,
            });
        };

        let mut submission = AnswerSubmission::new(question.id().clone(), selected.clone());
        if let Some(started_at) = self.started_at {
            submission = submission.with_response_time(self.clock.elapsed_millis(started_at));
        }

        let result = until_cancelled(&self.cancel, api.submit_answer(&submission)).await??;
        self.state = LifecycleState::Graded;
        Ok(&*self.grading.insert(result))
    }

    /// `from` → `Loading`; records the start timestamp.
    ///
    /// Starting a flow loads from `Idle`, advancing loads from `Graded`.
    pub(crate) fn begin_loading(
        &mut self,
        action: &'static str,
        from: LifecycleState,
    ) -> Result<(), SessionError> {
        if self.is_cancelled() {
            return Err(SessionError::Cancelled);
        }
        if self.state != from {
            return Err(SessionError::InvalidTransition {
                action,
                state: self.state,
            });
        }
        self.clear_question();
        self.started_at = Some(self.clock.now());
        self.state = LifecycleState::Loading;
        Ok(())
    }

    pub(crate) fn present(&mut self, question: Question) -> &Question {
        self.state = LifecycleState::Presented;
        self.question.insert(question)
    }

    /// Abandon a failed or cancelled load.
    pub(crate) fn reset(&mut self) {
        self.clear_question();
        self.started_at = None;
        self.state = LifecycleState::Idle;
    }

    pub(crate) fn complete_review(&mut self) {
        self.clear_question();
        self.started_at = None;
        self.state = LifecycleState::ReviewComplete;
    }

    fn clear_question(&mut self) {
        self.question = None;
        self.selected = None;
        self.grading = None;
    }
}

impl Drop for QuestionLifecycle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Race `fut` against `token`; a cancelled token wins without polling `fut`.
pub(crate) async fn until_cancelled<F: Future>(
    token: &CancellationToken,
    fut: F,
) -> Result<F::Output, SessionError> {
    tokio::select! {
        biased;
        () = token.cancelled() => Err(SessionError::Cancelled),
        output = fut => Ok(output),
    }
}
