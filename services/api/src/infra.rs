use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use testwise::error::AppError;
use testwise::survey::{
    Answer, AnswerRepository, AnswerSet, Catalog, OptionId, QuestionId, RepositoryError,
    ResultId, ResultRepository, SurveyResult, SurveyService, UserDirectory, UserId,
};
use tracing::info;

pub(crate) type InMemorySurveyService =
    SurveyService<InMemoryResultRepository, InMemoryAnswerRepository, InMemoryUserDirectory>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryResultRepository {
    records: Arc<Mutex<HashMap<ResultId, SurveyResult>>>,
}

impl ResultRepository for InMemoryResultRepository {
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
        // newest first; ids break ties within one clock tick
        results.sort_by(|a, b| (b.generated_at, b.id).cmp(&(a.generated_at, a.id)));
        results.truncate(limit);
        Ok(results)
    }

    fn count_for_user(&self, user_id: UserId) -> Result<usize, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|result| result.user_id == user_id)
            .count())
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
pub(crate) struct InMemoryAnswerRepository {
    answers: Arc<Mutex<HashMap<UserId, AnswerSet>>>,
}

impl AnswerRepository for InMemoryAnswerRepository {
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

/// Registered users; account management lives outside this service.
#[derive(Default, Clone)]
pub(crate) struct InMemoryUserDirectory {
    users: Arc<Mutex<BTreeSet<UserId>>>,
}

impl InMemoryUserDirectory {
    pub(crate) fn seeded(users: &[UserId]) -> Self {
        Self {
            users: Arc::new(Mutex::new(users.iter().copied().collect())),
        }
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn exists(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let guard = self.users.lock().expect("user mutex poisoned");
        Ok(guard.contains(&user_id))
    }

    fn remove(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let mut guard = self.users.lock().expect("user mutex poisoned");
        Ok(guard.remove(&user_id))
    }
}

pub(crate) fn load_catalog(path: Option<&Path>) -> Result<Catalog, AppError> {
    let catalog = match path {
        Some(path) => {
            info!(path = %path.display(), "loading survey catalog from file");
            Catalog::from_path(path)?
        }
        None => Catalog::bundled()?,
    };
    Ok(catalog)
}

pub(crate) fn in_memory_service(catalog: Catalog, users: &[UserId]) -> InMemorySurveyService {
    SurveyService::new(
        Arc::new(catalog),
        Arc::new(InMemoryResultRepository::default()),
        Arc::new(InMemoryAnswerRepository::default()),
        Arc::new(InMemoryUserDirectory::seeded(users)),
    )
}

/// Parse a `QUESTION=OPTION` pair such as `3=10`.
pub(crate) fn parse_answer(raw: &str) -> Result<(QuestionId, OptionId), String> {
    let (question, option) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION=OPTION, got '{raw}'"))?;
    let question = question
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid question id in '{raw}' ({err})"))?;
    let option = option
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid option id in '{raw}' ({err})"))?;
    Ok((QuestionId(question), OptionId(option)))
}
