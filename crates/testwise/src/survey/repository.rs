use super::domain::{Answer, AnswerSet, ResultId, SurveyResult, UserId};

/// Append-only storage for finalized results.
pub trait ResultRepository: Send + Sync {
    fn insert(&self, result: SurveyResult) -> Result<SurveyResult, RepositoryError>;
    fn fetch(&self, id: ResultId) -> Result<Option<SurveyResult>, RepositoryError>;
    /// At most `limit` results of `user_id`, newest first.
    fn list_for_user(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<SurveyResult>, RepositoryError>;
    fn count_for_user(&self, user_id: UserId) -> Result<usize, RepositoryError>;
    fn remove(&self, id: ResultId) -> Result<Option<SurveyResult>, RepositoryError>;
    /// Drop every result of `user_id`, returning how many were removed.
    fn purge_user(&self, user_id: UserId) -> Result<usize, RepositoryError>;
}

/// In-progress answers, one per (user, question).
pub trait AnswerRepository: Send + Sync {
    /// Store `answer`, returning the answer it replaced.
    fn upsert(&self, user_id: UserId, answer: Answer) -> Result<Option<Answer>, RepositoryError>;
    fn answers_for(&self, user_id: UserId) -> Result<AnswerSet, RepositoryError>;
    fn clear(&self, user_id: UserId) -> Result<usize, RepositoryError>;
}

/// Lookup of registered users. Account management lives elsewhere.
pub trait UserDirectory: Send + Sync {
    fn exists(&self, user_id: UserId) -> Result<bool, RepositoryError>;
    fn remove(&self, user_id: UserId) -> Result<bool, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("write failed: {0}")]
    WriteFailed(String),
}
