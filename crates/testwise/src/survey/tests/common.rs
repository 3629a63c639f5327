use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::survey::catalog::Catalog;
use crate::survey::domain::{Answer, AnswerSet, ResultId, SurveyResult, UserId};
use crate::survey::repository::{
    AnswerRepository, RepositoryError, ResultRepository, UserDirectory,
};
use crate::survey::{survey_router, SurveyService};

pub(super) const ALICE: UserId = UserId(1);
pub(super) const BOB: UserId = UserId(2);
pub(super) const STRANGER: UserId = UserId(404);

pub(super) fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::bundled().expect("bundled catalog loads"))
}

/// Every question answered with the option of the given ordinal.
pub(super) fn answers_at_ordinal(catalog: &Catalog, ordinal: u32) -> AnswerSet {
    catalog
        .list_questions()
        .iter()
        .fold(AnswerSet::new(), |set, question| {
            let option = question
                .options
                .iter()
                .find(|option| option.ordinal == ordinal)
                .expect("ordinal present");
            set.with(question.id, option.id)
        })
}

pub(super) type MemoryService = SurveyService<MemoryResults, MemoryAnswers, MemoryUsers>;

pub(super) fn build_service() -> (MemoryService, Arc<MemoryResults>, Arc<MemoryAnswers>) {
    let results = Arc::new(MemoryResults::default());
    let answers = Arc::new(MemoryAnswers::default());
    let users = Arc::new(MemoryUsers::with([ALICE, BOB]));
    let service = SurveyService::new(catalog(), results.clone(), answers.clone(), users);
    (service, results, answers)
}

#[derive(Default, Clone)]
pub(super) struct MemoryResults {
    pub(super) records: Arc<Mutex<HashMap<ResultId, SurveyResult>>>,
}

impl ResultRepository for MemoryResults {
    fn insert(&self, result: SurveyResult) -> Result<SurveyResult, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&result.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(result.id, result.clone());
        Ok(result)
    }

    fn fetch(&self, id: ResultId) -> Result<Option<SurveyResult>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn list_for_user(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<SurveyResult>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut results: Vec<SurveyResult> = guard
            .values()
            .filter(|result| result.user_id == user_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| (b.generated_at, b.id).cmp(&(a.generated_at, a.id)));
        results.truncate(limit);
        Ok(results)
    }

    fn count_for_user(&self, user_id: UserId) -> Result<usize, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().filter(|result| result.user_id == user_id).count())
    }

    fn remove(&self, id: ResultId) -> Result<Option<SurveyResult>, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.remove(&id))
    }

    fn purge_user(&self, user_id: UserId) -> Result<usize, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let before = guard.len();
        guard.retain(|_, result| result.user_id != user_id);
        Ok(before - guard.len())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAnswers {
    answers: Arc<Mutex<HashMap<UserId, AnswerSet>>>,
}

impl AnswerRepository for MemoryAnswers {
    fn upsert(&self, user_id: UserId, answer: Answer) -> Result<Option<Answer>, RepositoryError> {
        let mut guard = self.answers.lock().expect("answer mutex poisoned");
        Ok(guard.entry(user_id).or_default().insert(answer))
    }

    fn answers_for(&self, user_id: UserId) -> Result<AnswerSet, RepositoryError> {
        let guard = self.answers.lock().expect("answer mutex poisoned");
        Ok(guard.get(&user_id).cloned().unwrap_or_default())
    }

    fn clear(&self, user_id: UserId) -> Result<usize, RepositoryError> {
        let mut guard = self.answers.lock().expect("answer mutex poisoned");
        Ok(guard.remove(&user_id).map(|set| set.len()).unwrap_or(0))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryUsers {
    users: Arc<Mutex<BTreeSet<UserId>>>,
}

impl MemoryUsers {
    pub(super) fn with<I: IntoIterator<Item = UserId>>(users: I) -> Self {
        Self {
            users: Arc::new(Mutex::new(users.into_iter().collect())),
        }
    }
}

impl UserDirectory for MemoryUsers {
    fn exists(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        Ok(self
            .users
            .lock()
            .expect("user mutex poisoned")
            .contains(&user_id))
    }

    fn remove(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        Ok(self
            .users
            .lock()
            .expect("user mutex poisoned")
            .remove(&user_id))
    }
}

pub(super) struct UnavailableResults;

impl ResultRepository for UnavailableResults {
    fn insert(&self, _result: SurveyResult) -> Result<SurveyResult, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: ResultId) -> Result<Option<SurveyResult>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_for_user(
        &self,
        _user_id: UserId,
        _limit: usize,
    ) -> Result<Vec<SurveyResult>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count_for_user(&self, _user_id: UserId) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: ResultId) -> Result<Option<SurveyResult>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn purge_user(&self, _user_id: UserId) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Result repository that panics when written to, proving a code path never stores.
pub(super) struct ForbiddenWrites;

impl ResultRepository for ForbiddenWrites {
    fn insert(&self, _result: SurveyResult) -> Result<SurveyResult, RepositoryError> {
        panic!("insert must not be reached");
    }

    fn fetch(&self, _id: ResultId) -> Result<Option<SurveyResult>, RepositoryError> {
        Ok(None)
    }

    fn list_for_user(
        &self,
        _user_id: UserId,
        _limit: usize,
    ) -> Result<Vec<SurveyResult>, RepositoryError> {
        Ok(Vec::new())
    }

    fn count_for_user(&self, _user_id: UserId) -> Result<usize, RepositoryError> {
        Ok(0)
    }

    fn remove(&self, _id: ResultId) -> Result<Option<SurveyResult>, RepositoryError> {
        Ok(None)
    }

    fn purge_user(&self, _user_id: UserId) -> Result<usize, RepositoryError> {
        Ok(0)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    survey_router(Arc::new(service))
}
