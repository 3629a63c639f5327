use serde::{Deserialize, Serialize};

use super::catalog::Catalog;
use super::domain::{AnswerSet, OptionId, QuestionId};

/// Whether an answer set is being saved mid-session or finalized into a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    InProgress,
    Finalize,
}

/// First invariant an answer set violates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("question {0} is not part of the catalog")]
    UnknownQuestion(QuestionId),
    #[error("option {option} does not belong to question {question}")]
    OptionNotInQuestion {
        question: QuestionId,
        option: OptionId,
    },
    #[error("answer all questions before submitting ({} unanswered)", .missing.len())]
    MissingAnswers { missing: Vec<QuestionId> },
}

/// Check `answers` against `catalog`, reporting only the first violation.
///
/// Membership checks run over every answer before the completeness check, so an
/// unknown question is reported even when other questions are also missing.
pub fn validate(
    answers: &AnswerSet,
    catalog: &Catalog,
    mode: ValidationMode,
) -> Result<(), ValidationError> {
    for answer in answers.iter() {
        if !catalog.contains_question(answer.question_id) {
            return Err(ValidationError::UnknownQuestion(answer.question_id));
        }
    }

    for answer in answers.iter() {
        if catalog.owner_of(answer.option_id) != Some(answer.question_id) {
            return Err(ValidationError::OptionNotInQuestion {
                question: answer.question_id,
                option: answer.option_id,
            });
        }
    }

    if mode == ValidationMode::Finalize {
        let missing: Vec<QuestionId> = catalog
            .list_questions()
            .iter()
            .map(|question| question.id)
            .filter(|id| !answers.contains(*id))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingAnswers { missing });
        }
    }

    Ok(())
}
