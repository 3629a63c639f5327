use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use super::catalog::Catalog;
use super::domain::{
    Answer, AnswerSet, OptionId, QuestionId, ResultId, ScoreVector, SurveyResult, UserId,
};
use super::repository::{AnswerRepository, RepositoryError, ResultRepository, UserDirectory};
use super::scoring::{explain, recommend, ResultExplanation, Scorer};
use super::validation::{validate, ValidationError, ValidationMode};
use crate::config::HistoryLimits;

/// Service composing the catalog, validator, scorer, and result storage.
pub struct SurveyService<R, A, U> {
    catalog: Arc<Catalog>,
    results: Arc<R>,
    answers: Arc<A>,
    users: Arc<U>,
    history: HistoryLimits,
}

static RESULT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_result_id() -> ResultId {
    ResultId(RESULT_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

impl<R, A, U> SurveyService<R, A, U>
where
    R: ResultRepository + 'static,
    A: AnswerRepository + 'static,
    U: UserDirectory + 'static,
{
    pub fn new(catalog: Arc<Catalog>, results: Arc<R>, answers: Arc<A>, users: Arc<U>) -> Self {
        Self {
            catalog,
            results,
            answers,
            users,
            history: HistoryLimits::default(),
        }
    }

    pub fn with_history_limits(mut self, history: HistoryLimits) -> Self {
        self.history = history;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Score `answers` without validating or persisting anything.
    pub fn score(&self, answers: &AnswerSet) -> ScoreVector {
        Scorer::new(&self.catalog).score(answers)
    }

    /// Validate, score, recommend, and store a complete answer set.
    pub fn submit(
        &self,
        user_id: UserId,
        answers: AnswerSet,
    ) -> Result<SurveyResult, SurveyServiceError> {
        self.submit_for_project(user_id, None, answers)
    }

    /// [`Self::submit`], labelling the result with a project name.
    ///
    /// Surrounding whitespace is trimmed and a blank name is stored as `None`.
    pub fn submit_for_project(
        &self,
        user_id: UserId,
        project_name: Option<String>,
        answers: AnswerSet,
    ) -> Result<SurveyResult, SurveyServiceError> {
        self.require_user(user_id)?;

        if let Err(err) = validate(&answers, &self.catalog, ValidationMode::Finalize) {
            debug!(%user_id, %err, "submission rejected");
            return Err(err.into());
        }

        let scores = Scorer::new(&self.catalog).score(&answers);
        let recommendation = recommend(&scores, self.catalog.tool_order());

        let result = SurveyResult {
            id: next_result_id(),
            user_id,
            project_name: project_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            recommended_tool: recommendation.tool,
            score: recommendation.score,
            per_tool_scores: scores,
            answers,
            generated_at: Utc::now(),
        };

        let stored = self.results.insert(result)?;
        info!(
            %user_id,
            result_id = %stored.id,
            tool = %stored.recommended_tool,
            score = stored.score,
            "survey result stored"
        );
        Ok(stored)
    }

    /// Finalize the answers saved through [`Self::save_answer`].
    pub fn submit_saved(&self, user_id: UserId) -> Result<SurveyResult, SurveyServiceError> {
        self.require_user(user_id)?;
        let answers = self.answers.answers_for(user_id)?;
        self.submit(user_id, answers)
    }

    /// Ranking, share, and per-answer rationale for a stored result.
    pub fn explain(&self, result: &SurveyResult) -> ResultExplanation {
        explain(&self.catalog, &result.answers, &result.per_tool_scores)
    }

    /// Record one in-progress answer, replacing any earlier choice for the question.
    pub fn save_answer(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        option_id: OptionId,
    ) -> Result<AnswerProgress, SurveyServiceError> {
        self.require_user(user_id)?;

        let answer = Answer::new(question_id, option_id);
        let single: AnswerSet = std::iter::once(answer.clone()).collect();
        validate(&single, &self.catalog, ValidationMode::InProgress)?;

        if let Some(previous) = self.answers.upsert(user_id, answer)? {
            debug!(%user_id, question = %question_id, replaced = %previous.option_id, "answer replaced");
        }

        self.current_answers(user_id)
    }

    pub fn current_answers(&self, user_id: UserId) -> Result<AnswerProgress, SurveyServiceError> {
        self.require_user(user_id)?;
        let answers = self.answers.answers_for(user_id)?;
        Ok(AnswerProgress::new(answers, self.catalog.question_count()))
    }

    /// Stored results of `user_id`, newest first. A `limit` of 0 uses the default page size.
    pub fn list_results(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<ResultHistory, SurveyServiceError> {
        self.require_user(user_id)?;
        let limit = self.history.clamp(limit);
        let results = self.results.list_for_user(user_id, limit)?;
        Ok(ResultHistory::new(results))
    }

    pub fn count_results(&self, user_id: UserId) -> Result<usize, SurveyServiceError> {
        self.require_user(user_id)?;
        Ok(self.results.count_for_user(user_id)?)
    }

    pub fn get_result(&self, result_id: ResultId) -> Result<SurveyResult, SurveyServiceError> {
        self.results
            .fetch(result_id)?
            .ok_or(SurveyServiceError::ResultNotFound(result_id))
    }

    /// Delete a result on behalf of its owner.
    pub fn delete_result(
        &self,
        result_id: ResultId,
        user_id: UserId,
    ) -> Result<(), SurveyServiceError> {
        let existing = self.get_result(result_id)?;
        if existing.user_id != user_id {
            return Err(SurveyServiceError::Forbidden { result_id, user_id });
        }

        self.results
            .remove(result_id)?
            .ok_or(SurveyServiceError::ResultNotFound(result_id))?;
        info!(%user_id, %result_id, "survey result deleted");
        Ok(())
    }

    /// Remove a user along with their result history and saved answers.
    ///
    /// The user entry goes last, so a storage failure part way leaves the user
    /// registered and the call can be repeated until it succeeds.
    pub fn forget_user(&self, user_id: UserId) -> Result<(), SurveyServiceError> {
        self.require_user(user_id)?;
        let results = self.results.purge_user(user_id)?;
        let answers = self.answers.clear(user_id)?;
        self.users.remove(user_id)?;
        info!(%user_id, answers, results, "user data removed");
        Ok(())
    }

    fn require_user(&self, user_id: UserId) -> Result<(), SurveyServiceError> {
        if self.users.exists(user_id)? {
            Ok(())
        } else {
            Err(SurveyServiceError::UserNotFound(user_id))
        }
    }
}

/// Saved answers plus how far through the questionnaire the user is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerProgress {
    pub answers: AnswerSet,
    pub answered: usize,
    pub total: usize,
    pub complete: bool,
}

impl AnswerProgress {
    fn new(answers: AnswerSet, total: usize) -> Self {
        let answered = answers.len();
        Self {
            answers,
            answered,
            total,
            complete: answered >= total,
        }
    }
}

/// Single-pass listing of results captured when the history was requested.
#[derive(Debug)]
pub struct ResultHistory {
    results: std::vec::IntoIter<SurveyResult>,
}

impl ResultHistory {
    fn new(results: Vec<SurveyResult>) -> Self {
        Self {
            results: results.into_iter(),
        }
    }
}

impl Iterator for ResultHistory {
    type Item = SurveyResult;

    fn next(&mut self) -> Option<Self::Item> {
        self.results.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.results.size_hint()
    }
}

impl ExactSizeIterator for ResultHistory {}

/// Error raised by the survey service.
#[derive(Debug, thiserror::Error)]
pub enum SurveyServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("result {0} not found")]
    ResultNotFound(ResultId),
    #[error("result {result_id} does not belong to user {user_id}")]
    Forbidden { result_id: ResultId, user_id: UserId },
    #[error("could not save, try again: {0}")]
    Storage(#[from] RepositoryError),
}

impl SurveyServiceError {
    /// Stable category string exposed to API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            SurveyServiceError::Validation(_) => "validation",
            SurveyServiceError::UserNotFound(_) | SurveyServiceError::ResultNotFound(_) => {
                "not_found"
            }
            SurveyServiceError::Forbidden { .. } => "authorization",
            SurveyServiceError::Storage(_) => "storage",
        }
    }
}
