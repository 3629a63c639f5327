mod rationale;
mod recommender;

pub use rationale::{explain, RationaleEntry, ResultExplanation};
pub use recommender::{rank, recommend, share_percent, RankedTool, Recommendation};

use std::collections::BTreeMap;

use tracing::debug;

use super::catalog::Catalog;
use super::domain::{Answer, AnswerSet, QuestionId, ScoreVector};

/// Stateless aggregator turning answers into per-tool scores.
///
/// Answers are expected to have passed validation already; an option the
/// catalog does not know contributes nothing.
pub struct Scorer<'c> {
    catalog: &'c Catalog,
}

impl<'c> Scorer<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    pub fn score(&self, answers: &AnswerSet) -> ScoreVector {
        self.score_answers(answers.iter())
    }

    /// Sum the weights of `answers` in whatever order they arrive.
    pub fn score_answers<'a, I>(&self, answers: I) -> ScoreVector
    where
        I: IntoIterator<Item = &'a Answer>,
    {
        let mut scores = ScoreVector::zero();
        for answer in answers {
            match self.catalog.option(answer.option_id) {
                Ok((_, option)) => scores.add(&option.weights),
                Err(err) => debug!(question = %answer.question_id, %err, "skipping unscored answer"),
            }
        }
        scores
    }

    /// Each answered question's own share of the aggregate.
    pub fn contributions(&self, answers: &AnswerSet) -> BTreeMap<QuestionId, ScoreVector> {
        answers
            .iter()
            .filter_map(|answer| {
                self.catalog
                    .option(answer.option_id)
                    .ok()
                    .map(|(_, option)| (answer.question_id, ScoreVector::from(option.weights)))
            })
            .collect()
    }
}
