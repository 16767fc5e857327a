use serde::{Deserialize, Serialize};

use crate::model::question::QuestionCategory;

/// Accuracy per question category, always carrying all four categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryAccuracy {
    pub strengthen: f64,
    pub weaken: f64,
    pub assumption: f64,
    pub flaw: f64,
}

impl CategoryAccuracy {
    #[must_use]
    pub fn get(&self, category: QuestionCategory) -> f64 {
        match category {
            QuestionCategory::Strengthen => self.strengthen,
            QuestionCategory::Weaken => self.weaken,
            QuestionCategory::Assumption => self.assumption,
            QuestionCategory::Flaw => self.flaw,
        }
    }
}

/// Aggregate progress counters reported by `GET /questions/stats`.
///
/// `Default` is the all-zero record shown whenever stats cannot be fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressStats {
    pub questions_answered: u64,
    pub accuracy: f64,
    pub current_streak: u64,
    pub longest_streak: u64,
    pub correct_answers: u64,
    pub accuracy_by_type: CategoryAccuracy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_serializes_to_zeroed_wire_shape() {
        let json = serde_json::to_value(ProgressStats::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "questionsAnswered": 0,
                "accuracy": 0.0,
                "currentStreak": 0,
                "longestStreak": 0,
                "correctAnswers": 0,
                "accuracyByType": {
                    "strengthen": 0.0,
                    "weaken": 0.0,
                    "assumption": 0.0,
                    "flaw": 0.0
                }
            })
        );
    }

    #[test]
    fn partial_payload_fills_missing_counters() {
        let stats: ProgressStats = serde_json::from_str(
            r#"{"questionsAnswered": 12, "accuracy": 75.0, "accuracyByType": {"flaw": 50.0}}"#,
        )
        .unwrap();

        assert_eq!(stats.questions_answered, 12);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.accuracy_by_type.get(QuestionCategory::Flaw), 50.0);
        assert_eq!(stats.accuracy_by_type.get(QuestionCategory::Weaken), 0.0);
    }
}
