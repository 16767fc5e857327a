use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── CATEGORY ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CategoryError {
    #[error("unknown question category: {0}")]
    Unknown(String),
}

/// Logical-reasoning question family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionCategory {
    Strengthen,
    Weaken,
    Assumption,
    Flaw,
}

impl QuestionCategory {
    pub const ALL: [Self; 4] = [Self::Strengthen, Self::Weaken, Self::Assumption, Self::Flaw];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strengthen => "strengthen",
            Self::Weaken => "weaken",
            Self::Assumption => "assumption",
            Self::Flaw => "flaw",
        }
    }

    /// Parses a category name, resolving anything unrecognised to `Strengthen`.
    #[must_use]
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or(Self::Strengthen)
    }
}

impl FromStr for QuestionCategory {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CategoryError::Unknown(s.to_string()))
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DifficultyError {
    #[error("unknown difficulty: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl FromStr for Difficulty {
    type Err = DifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(DifficultyError::Unknown(s.to_string())),
        }
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// One labeled answer choice, e.g. `("B", "The survey excluded commuters.")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub label: String,
    pub text: String,
}

impl AnswerOption {
    #[must_use]
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// A practice question, either issued by the backend or built from bundled samples.
///
/// Questions are never mutated after they are received; the next question is always
/// a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    #[serde(alias = "type")]
    category: QuestionCategory,
    #[serde(alias = "question")]
    prompt: String,
    options: Vec<AnswerOption>,
    correct_answer: String,
    #[serde(default)]
    explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty: Option<Difficulty>,
}

impl Question {
    #[must_use]
    pub fn new(
        id: QuestionId,
        category: QuestionCategory,
        prompt: impl Into<String>,
        options: Vec<AnswerOption>,
        correct_answer: impl Into<String>,
        explanation: impl Into<String>,
        difficulty: Option<Difficulty>,
    ) -> Self {
        Self {
            id,
            category,
            prompt: prompt.into(),
            options,
            correct_answer: correct_answer.into(),
            explanation: explanation.into(),
            difficulty,
        }
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn category(&self) -> QuestionCategory {
        self.category
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.id.is_fallback()
    }

    /// Looks up an option by label, ignoring ASCII case.
    #[must_use]
    pub fn option(&self, label: &str) -> Option<&AnswerOption> {
        self.options
            .iter()
            .find(|option| option.label.eq_ignore_ascii_case(label.trim()))
    }
}

//
// ─── ANSWERING ────────────────────────────────────────────────────────────────
//

/// Payload of `POST /questions/answer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub question_id: QuestionId,
    pub user_answer: String,
    /// Milliseconds between the question being requested and the answer being submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
}

impl AnswerSubmission {
    #[must_use]
    pub fn new(question_id: QuestionId, user_answer: impl Into<String>) -> Self {
        Self {
            question_id,
            user_answer: user_answer.into(),
            response_time: None,
        }
    }

    #[must_use]
    pub fn with_response_time(mut self, millis: u64) -> Self {
        self.response_time = Some(millis);
        self
    }
}

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    pub correct: bool,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
}
