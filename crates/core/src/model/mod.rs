mod ids;
mod question;
mod stats;
mod user;

pub use ids::{QuestionId, UserId};
pub use question::{
    AnswerOption, AnswerSubmission, CategoryError, Difficulty, DifficultyError, GradingResult,
    Question, QuestionCategory,
};
pub use stats::{CategoryAccuracy, ProgressStats};
pub use user::{AuthSession, Credential, User};
