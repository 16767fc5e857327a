use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reasoning_core::fallback::sample_question;
use reasoning_core::model::{
    AnswerSubmission, Difficulty, GradingResult, Question, QuestionCategory,
};
use reasoning_core::time::{Clock, fixed_now};

use super::*;
use crate::error::ApiError;

#[derive(Default)]
struct ScriptedContent {
    generated: Mutex<VecDeque<Result<Question, ApiError>>>,
    grades: Mutex<VecDeque<Result<GradingResult, ApiError>>>,
    missed: Vec<Question>,
    submissions: Mutex<Vec<AnswerSubmission>>,
    generate_calls: Mutex<usize>,
}

impl ScriptedContent {
    fn generating(questions: Vec<Result<Question, ApiError>>) -> Self {
        Self {
            generated: Mutex::new(questions.into()),
            ..Self::default()
        }
    }

    fn with_grades(self, grades: Vec<Result<GradingResult, ApiError>>) -> Self {
        *self.grades.lock().unwrap() = grades.into();
        self
    }

    fn submissions(&self) -> Vec<AnswerSubmission> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentApi for ScriptedContent {
    async fn generate_question(
        &self,
        category: QuestionCategory,
        _difficulty: Option<Difficulty>,
    ) -> Result<Question, ApiError> {
        *self.generate_calls.lock().unwrap() += 1;
        self.generated
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(sample_question(category)))
    }

    async fn submit_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<GradingResult, ApiError> {
        self.submissions.lock().unwrap().push(submission.clone());
        self.grades
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no grade scripted".into())))
    }

    async fn missed_questions(&self) -> Vec<Question> {
        self.missed.clone()
    }
}

/// Never completes; used to exercise cancellation.
///
/// Can hand out one question first so that grading is what hangs.
#[derive(Default)]
struct Hanging {
    ready: Mutex<Option<Question>>,
}

impl Hanging {
    fn presenting(question: Question) -> Self {
        Self {
            ready: Mutex::new(Some(question)),
        }
    }
}

#[async_trait]
impl ContentApi for Hanging {
    async fn generate_question(
        &self,
        _category: QuestionCategory,
        _difficulty: Option<Difficulty>,
    ) -> Result<Question, ApiError> {
        let ready = self.ready.lock().unwrap().take();
        if let Some(question) = ready {
            return Ok(question);
        }
        std::future::pending().await
    }

    async fn submit_answer(
        &self,
        _submission: &AnswerSubmission,
    ) -> Result<GradingResult, ApiError> {
        std::future::pending().await
    }

    async fn missed_questions(&self) -> Vec<Question> {
        std::future::pending().await
    }
}

fn correct(label: &str) -> GradingResult {
    GradingResult {
        correct: true,
        correct_answer: label.to_string(),
        explanation: "because".to_string(),
    }
}

fn http_500() -> ApiError {
    ApiError::Http {
        status: 500,
        message: "HTTP 500".into(),
    }
}

#[tokio::test]
async fn practice_walks_full_lifecycle_and_measures_response_time() {
    let api = Arc::new(
        ScriptedContent::generating(vec![Ok(sample_question(QuestionCategory::Weaken))])
            .with_grades(vec![Ok(correct("B"))]),
    );
    let mut flow = PracticeFlow::new(api.clone(), QuestionCategory::Weaken)
        .with_clock(Clock::fixed(fixed_now()));
    assert_eq!(flow.state(), LifecycleState::Idle);

    let question = flow.start().await.unwrap();
    assert_eq!(question.category(), QuestionCategory::Weaken);
    assert_eq!(flow.state(), LifecycleState::Presented);
    assert_eq!(flow.lifecycle().started_at(), Some(fixed_now()));

    assert!(flow.select("b").unwrap());
    assert_eq!(flow.state(), LifecycleState::Selected);
    assert_eq!(flow.lifecycle().selected(), Some("B"));

    flow.lifecycle_mut()
        .clock_mut()
        .advance(chrono::Duration::milliseconds(2_500));
    let grading = flow.submit().await.unwrap();
    assert!(grading.correct);
    assert_eq!(flow.state(), LifecycleState::Graded);
    assert_eq!(flow.graded_count(), 1);

    let sent = api.submissions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].user_answer, "B");
    assert_eq!(sent[0].response_time, Some(2_500));
}

#[tokio::test]
async fn failed_submission_keeps_selection() {
    let api = Arc::new(
        ScriptedContent::generating(vec![]).with_grades(vec![Err(http_500()), Ok(correct("D"))]),
    );
    let mut flow = PracticeFlow::new(api.clone(), QuestionCategory::Strengthen);
    flow.start().await.unwrap();
    flow.select("D").unwrap();

    let err = flow.submit().await.unwrap_err();
    assert!(matches!(err, SessionError::Api(ApiError::Http { status: 500, .. })));
    assert_eq!(flow.state(), LifecycleState::Selected);
    assert_eq!(flow.lifecycle().selected(), Some("D"));
    assert!(flow.lifecycle().grading().is_none());

    // Retrying is the user's choice and succeeds with the same selection.
    flow.submit().await.unwrap();
    assert_eq!(flow.state(), LifecycleState::Graded);
    assert_eq!(api.submissions().len(), 2);
}

#[tokio::test]
async fn selection_rules() {
    let api = Arc::new(ScriptedContent::generating(vec![]).with_grades(vec![Ok(correct("C"))]));
    let mut flow = PracticeFlow::new(api, QuestionCategory::Assumption);

    let err = flow.select("A").unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidTransition {
            state: LifecycleState::Idle,
            ..
        }
    ));

    flow.start().await.unwrap();
    assert!(matches!(flow.select("Z"), Err(SessionError::UnknownOption(_))));
    assert_eq!(flow.state(), LifecycleState::Presented);

    flow.select("A").unwrap();
    flow.select("C").unwrap();
    assert_eq!(flow.lifecycle().selected(), Some("C"));

    flow.submit().await.unwrap();
    assert!(!flow.select("A").unwrap());
    assert_eq!(flow.lifecycle().selected(), Some("C"));
    assert_eq!(flow.state(), LifecycleState::Graded);
}

#[tokio::test]
async fn submit_requires_selection() {
    let api = Arc::new(ScriptedContent::generating(vec![]));
    let mut flow = PracticeFlow::new(api.clone(), QuestionCategory::Flaw);
    flow.start().await.unwrap();

    let err = flow.submit().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidTransition {
            action: "submit",
            state: LifecycleState::Presented
        }
    ));
    assert!(api.submissions().is_empty());
}

#[tokio::test]
async fn generation_failure_returns_to_idle() {
    let api = Arc::new(ScriptedContent::generating(vec![Err(ApiError::Transport(
        "offline".into(),
    ))]));
    let mut flow = PracticeFlow::new(api, QuestionCategory::Flaw);

    let err = flow.start().await.unwrap_err();
    assert!(matches!(err, SessionError::Api(ApiError::Transport(_))));
    assert_eq!(flow.state(), LifecycleState::Idle);
    assert!(flow.lifecycle().question().is_none());

    // The screen can try again.
    flow.start().await.unwrap();
    assert_eq!(flow.state(), LifecycleState::Presented);
}

#[tokio::test]
async fn next_generates_a_fresh_question_of_same_category() {
    let api = Arc::new(
        ScriptedContent::generating(vec![]).with_grades(vec![Ok(correct("B"))]),
    );
    let mut flow = PracticeFlow::new(api.clone(), QuestionCategory::Weaken);
    flow.start().await.unwrap();

    assert!(matches!(
        flow.next().await,
        Err(SessionError::InvalidTransition { .. })
    ));

    flow.select("B").unwrap();
    flow.submit().await.unwrap();
    let next = flow.next().await.unwrap();
    assert_eq!(next.category(), QuestionCategory::Weaken);
    assert_eq!(flow.state(), LifecycleState::Presented);
    assert!(flow.lifecycle().selected().is_none());
    assert!(flow.lifecycle().grading().is_none());
    assert_eq!(*api.generate_calls.lock().unwrap(), 2);
}

#[tokio::test]
async fn start_is_rejected_once_a_question_is_graded() {
    let api = Arc::new(
        ScriptedContent {
            missed: vec![
                sample_question(QuestionCategory::Flaw),
                sample_question(QuestionCategory::Assumption),
            ],
            ..ScriptedContent::default()
        }
        .with_grades(vec![Ok(correct("B")), Ok(correct("B"))]),
    );

    let mut review = ReviewFlow::new(api.clone());
    review.start().await.unwrap();
    review.select("B").unwrap();
    review.submit().await.unwrap();
    assert!(matches!(
        review.start().await,
        Err(SessionError::InvalidTransition {
            state: LifecycleState::Graded,
            ..
        })
    ));
    assert_eq!(review.state(), LifecycleState::Graded);
    assert_eq!(review.progress().position, 1);
    assert_eq!(review.progress().total, 2);

    let mut practice = PracticeFlow::new(api.clone(), QuestionCategory::Weaken);
    practice.start().await.unwrap();
    practice.select("B").unwrap();
    practice.submit().await.unwrap();
    assert!(matches!(
        practice.start().await,
        Err(SessionError::InvalidTransition {
            state: LifecycleState::Graded,
            ..
        })
    ));
    assert_eq!(practice.state(), LifecycleState::Graded);
    assert_eq!(*api.generate_calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn review_with_nothing_missed_completes_immediately() {
    let api = Arc::new(ScriptedContent::default());
    let mut flow = ReviewFlow::new(api);

    assert!(flow.start().await.unwrap().is_none());
    assert_eq!(flow.state(), LifecycleState::ReviewComplete);
    assert!(flow.is_complete());
    assert!(matches!(flow.next(), Err(SessionError::InvalidTransition { .. })));
    assert!(matches!(flow.start().await, Err(SessionError::InvalidTransition { .. })));
}

#[tokio::test]
async fn review_advances_through_queue_to_completion() {
    let api = Arc::new(
        ScriptedContent {
            missed: vec![
                sample_question(QuestionCategory::Flaw),
                sample_question(QuestionCategory::Assumption),
            ],
            ..ScriptedContent::default()
        }
        .with_grades(vec![Ok(correct("B")), Ok(correct("C"))]),
    );
    let mut flow = ReviewFlow::new(api.clone());

    let first = flow.start().await.unwrap().unwrap();
    assert_eq!(first.category(), QuestionCategory::Flaw);
    assert_eq!(flow.progress().position, 1);
    assert_eq!(flow.progress().total, 2);

    flow.select("B").unwrap();
    flow.submit().await.unwrap();
    let second = flow.next().unwrap().unwrap();
    assert_eq!(second.category(), QuestionCategory::Assumption);
    assert_eq!(flow.progress().remaining, 1);

    flow.select("C").unwrap();
    flow.submit().await.unwrap();
    assert!(flow.next().unwrap().is_none());
    assert_eq!(flow.state(), LifecycleState::ReviewComplete);
    assert_eq!(
        flow.progress(),
        ReviewProgress {
            total: 2,
            position: 2,
            remaining: 0,
            is_complete: true
        }
    );
    assert_eq!(api.submissions().len(), 2);
}

#[tokio::test]
async fn cancelled_flow_never_issues_requests() {
    let api = Arc::new(ScriptedContent::generating(vec![]));
    let mut flow = PracticeFlow::new(api.clone(), QuestionCategory::Weaken);
    flow.cancel();

    assert!(matches!(flow.start().await, Err(SessionError::Cancelled)));
    assert_eq!(*api.generate_calls.lock().unwrap(), 0);
    assert_eq!(flow.state(), LifecycleState::Idle);
}

#[tokio::test]
async fn cancellation_interrupts_in_flight_generation() {
    let mut flow = PracticeFlow::new(Arc::new(Hanging::default()), QuestionCategory::Weaken);
    let token = flow.lifecycle().cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
    });

    assert!(matches!(flow.start().await, Err(SessionError::Cancelled)));
    assert!(flow.lifecycle().question().is_none());
    assert_eq!(flow.state(), LifecycleState::Idle);
    assert!(!flow.state().is_busy());
}

#[tokio::test]
async fn cancelled_review_fetch_returns_to_idle() {
    let mut flow = ReviewFlow::new(Arc::new(Hanging::default()));
    let token = flow.lifecycle().cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
    });

    assert!(matches!(flow.start().await, Err(SessionError::Cancelled)));
    assert_eq!(flow.state(), LifecycleState::Idle);
    assert!(!flow.is_complete());
    assert_eq!(flow.progress().total, 0);
}

#[tokio::test]
async fn cancelled_submission_keeps_selection_without_grading() {
    let api = Arc::new(Hanging::presenting(sample_question(QuestionCategory::Flaw)));
    let mut flow = PracticeFlow::new(api, QuestionCategory::Flaw);
    flow.start().await.unwrap();
    flow.select("C").unwrap();

    let token = flow.lifecycle().cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
    });

    assert!(matches!(flow.submit().await, Err(SessionError::Cancelled)));
    assert_eq!(flow.state(), LifecycleState::Selected);
    assert_eq!(flow.lifecycle().selected(), Some("C"));
    assert!(flow.lifecycle().grading().is_none());
    assert_eq!(flow.graded_count(), 0);
}

#[tokio::test]
async fn dropping_a_flow_cancels_its_token() {
    let flow = ReviewFlow::new(Arc::new(Hanging::default()));
    let token = flow.lifecycle().cancellation_token();
    assert!(!token.is_cancelled());
    drop(flow);
    assert!(token.is_cancelled());
}
