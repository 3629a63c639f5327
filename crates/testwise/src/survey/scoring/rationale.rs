use serde::{Deserialize, Serialize};

use super::recommender::{rank, recommend, share_percent, RankedTool, Recommendation};
use crate::survey::catalog::Catalog;
use crate::survey::domain::{AnswerSet, OptionId, QuestionId, ScoreVector, Tool};

/// An answer whose strongest weight went to the recommended tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RationaleEntry {
    pub question_id: QuestionId,
    pub option_id: OptionId,
    pub category: String,
    pub reason: String,
}

/// Presentation data derived from a score vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultExplanation {
    pub recommendation: Recommendation,
    pub share: u8,
    pub ranking: Vec<RankedTool>,
    pub rationale: Vec<RationaleEntry>,
}

pub fn explain(catalog: &Catalog, answers: &AnswerSet, scores: &ScoreVector) -> ResultExplanation {
    let order = catalog.tool_order();
    let recommendation = recommend(scores, order);

    ResultExplanation {
        share: share_percent(scores, &recommendation),
        ranking: rank(scores, order),
        rationale: aligned_answers(catalog, answers, recommendation.tool),
        recommendation,
    }
}

fn aligned_answers(catalog: &Catalog, answers: &AnswerSet, tool: Tool) -> Vec<RationaleEntry> {
    let order = catalog.tool_order();
    answers
        .iter()
        .filter_map(|answer| catalog.option(answer.option_id).ok())
        .filter(|(_, option)| option.weights.strongest(order) == tool)
        .map(|(question, option)| RationaleEntry {
            question_id: question.id,
            option_id: option.id,
            category: question.category.clone(),
            reason: format!(
                "Your answer \"{}\" strongly aligns with {}'s strengths in {}.",
                option.text,
                tool.display_name(),
                question.category.to_lowercase()
            ),
        })
        .collect()
}
