//! Bundled sample questions used when live generation is unavailable.
//!
//! Every category maps to exactly one pre-authored question. Lookups are pure:
//! the same category always yields an identical `Question` value.

use crate::model::{
    AnswerOption, Difficulty, GradingResult, Question, QuestionCategory, QuestionId,
};

/// Returns the bundled sample question for `category`.
#[must_use]
pub fn sample_question(category: QuestionCategory) -> Question {
    match category {
        QuestionCategory::Strengthen => strengthen(),
        QuestionCategory::Weaken => weaken(),
        QuestionCategory::Assumption => assumption(),
        QuestionCategory::Flaw => flaw(),
    }
}

/// Resolves a category by name; unrecognised names get the `strengthen` sample.
#[must_use]
pub fn sample_question_named(name: &str) -> Question {
    sample_question(QuestionCategory::from_name_or_default(name))
}

/// Finds the bundled sample that carries `id`, if any.
#[must_use]
pub fn find_sample(id: &QuestionId) -> Option<Question> {
    if !id.is_fallback() {
        return None;
    }
    QuestionCategory::ALL
        .into_iter()
        .map(sample_question)
        .find(|question| question.id() == id)
}

/// Grades an answer against the question's own correct label.
///
/// Only meaningful for bundled samples, which the backend has never seen.
#[must_use]
pub fn grade_locally(question: &Question, answer: &str) -> GradingResult {
    GradingResult {
        correct: question.correct_answer().eq_ignore_ascii_case(answer.trim()),
        correct_answer: question.correct_answer().to_string(),
        explanation: question.explanation().to_string(),
    }
}

fn options(texts: [&str; 5]) -> Vec<AnswerOption> {
    ["A", "B", "C", "D", "E"]
        .into_iter()
        .zip(texts)
        .map(|(label, text)| AnswerOption::new(label, text))
        .collect()
}

fn strengthen() -> Question {
    Question::new(
        QuestionId::fallback("strengthen"),
        QuestionCategory::Strengthen,
        "A city replaced its downtown parking meters with a pay-by-phone system. \
         In the following year, parking revenue rose by 20 percent. The city's \
         transportation director concludes that the new system caused the increase.\n\n\
         Which one of the following, if true, most strengthens the director's conclusion?",
        options([
            "Parking rates downtown were raised shortly before the new system was installed.",
            "The number of cars parked downtown was the same in both years.",
            "Neighboring cities saw similar revenue increases without changing their meters.",
            "The pay-by-phone system makes it harder to overstay a paid session without paying.",
            "Some drivers found the pay-by-phone system confusing at first.",
        ]),
        "D",
        "The conclusion attributes the revenue gain to the new system. (D) gives a \
         mechanism by which the system itself collects more money per parked car, \
         making the causal claim more likely. (A) and (C) point to other causes.",
        Some(Difficulty::Medium),
    )
}

fn weaken() -> Question {
    Question::new(
        QuestionId::fallback("weaken"),
        QuestionCategory::Weaken,
        "Students who eat breakfast score higher on morning exams than students who \
         skip it. Therefore, the school should provide free breakfast to raise exam scores.\n\n\
         Which one of the following, if true, most seriously weakens the argument?",
        options([
            "Many students say they would eat a free breakfast if it were offered.",
            "Students who eat breakfast also tend to get more sleep the night before exams.",
            "Breakfast foods vary widely in nutritional value.",
            "Exam scores at the school have risen slightly over the past decade.",
            "Some students who skip breakfast still score well on morning exams.",
        ]),
        "B",
        "The argument assumes breakfast causes the higher scores. (B) offers an \
         alternative cause, more sleep, that explains the correlation without \
         breakfast doing any work. (E) describes exceptions, which a correlation allows.",
        Some(Difficulty::Medium),
    )
}

fn assumption() -> Question {
    Question::new(
        QuestionId::fallback("assumption"),
        QuestionCategory::Assumption,
        "The new library wing will attract more visitors, because it will house the \
         region's largest collection of rare maps.\n\n\
         The argument depends on which one of the following assumptions?",
        options([
            "Rare maps are more valuable than rare books.",
            "The library currently has no maps at all.",
            "Some potential visitors are interested in seeing rare maps.",
            "The new wing will be open every day of the week.",
            "Other libraries in the region plan to expand their map collections.",
        ]),
        "C",
        "If nobody cared about rare maps, housing them could not attract anyone. \
         Negating (C) destroys the argument, so the argument requires it.",
        Some(Difficulty::Easy),
    )
}

fn flaw() -> Question {
    Question::new(
        QuestionId::fallback("flaw"),
        QuestionCategory::Flaw,
        "Every successful novelist reads widely. Mara reads widely. So Mara will \
         become a successful novelist.\n\n\
         The reasoning in the argument is flawed because the argument",
        options([
            "relies on the testimony of an unnamed authority",
            "treats a condition required for success as if it guaranteed success",
            "draws a general conclusion from a single example",
            "attacks Mara's character rather than her reasoning",
            "uses the term \"reads widely\" in two different senses",
        ]),
        "B",
        "Reading widely is necessary for success according to the premise, not \
         sufficient. The argument confuses a necessary condition with a sufficient one.",
        Some(Difficulty::Easy),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_category_yields_identical_question() {
        for category in QuestionCategory::ALL {
            assert_eq!(sample_question(category), sample_question(category));
            assert_eq!(sample_question(category).category(), category);
        }
    }

    #[test]
    fn unknown_name_resolves_to_strengthen() {
        assert_eq!(
            sample_question_named("parallel-reasoning"),
            sample_question(QuestionCategory::Strengthen)
        );
        assert_eq!(
            sample_question_named("weaken"),
            sample_question(QuestionCategory::Weaken)
        );
    }

    #[test]
    fn samples_are_marked_as_fallback_and_answerable() {
        for category in QuestionCategory::ALL {
            let question = sample_question(category);
            assert!(question.is_fallback());
            assert!(question.option(question.correct_answer()).is_some());
            assert_eq!(find_sample(question.id()), Some(question));
        }
        assert_eq!(find_sample(&QuestionId::numeric(1)), None);
    }

    #[test]
    fn local_grading_compares_labels() {
        let question = sample_question(QuestionCategory::Flaw);

        let right = grade_locally(&question, "b");
        assert!(right.correct);
        assert_eq!(right.correct_answer, "B");

        let wrong = grade_locally(&question, "C");
        assert!(!wrong.correct);
        assert_eq!(wrong.explanation, question.explanation());
    }
}
