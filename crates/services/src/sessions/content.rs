use async_trait::async_trait;

use reasoning_core::model::{
    AnswerSubmission, Difficulty, GradingResult, Question, QuestionCategory,
};

use crate::error::ApiError;
use crate::session_client::SessionClient;

/// Content operations a lifecycle controller needs from the session layer.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError` when no question could be produced.
    async fn generate_question(
        &self,
        category: QuestionCategory,
        difficulty: Option<Difficulty>,
    ) -> Result<Question, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` when the answer could not be graded.
    async fn submit_answer(&self, submission: &AnswerSubmission)
    -> Result<GradingResult, ApiError>;

    /// Previously missed questions, oldest first; empty when unavailable.
    async fn missed_questions(&self) -> Vec<Question>;
}

#[async_trait]
impl ContentApi for SessionClient {
    async fn generate_question(
        &self,
        category: QuestionCategory,
        difficulty: Option<Difficulty>,
    ) -> Result<Question, ApiError> {
        SessionClient::generate_question(self, category, difficulty).await
    }

    async fn submit_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<GradingResult, ApiError> {
        SessionClient::submit_answer(self, submission).await
    }

    async fn missed_questions(&self) -> Vec<Question> {
        self.get_missed_questions().await
    }
}
