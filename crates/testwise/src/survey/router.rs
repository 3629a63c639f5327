use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    Answer, AnswerSet, OptionId, QuestionId, ResultId, ScoreVector, SurveyResult, Tool, UserId,
};
use super::repository::{AnswerRepository, ResultRepository, UserDirectory};
use super::scoring::{RankedTool, RationaleEntry};
use super::service::{SurveyService, SurveyServiceError};

/// Router builder exposing the questionnaire, submissions, and result history.
pub fn survey_router<R, A, U>(service: Arc<SurveyService<R, A, U>>) -> Router
where
    R: ResultRepository + 'static,
    A: AnswerRepository + 'static,
    U: UserDirectory + 'static,
{
    Router::new()
        .route("/api/v1/catalog", get(catalog_handler::<R, A, U>))
        .route("/api/v1/submissions", post(submit_handler::<R, A, U>))
        .route(
            "/api/v1/results/:result_id",
            get(result_handler::<R, A, U>).delete(delete_handler::<R, A, U>),
        )
        .route(
            "/api/v1/users/:user_id/results",
            get(history_handler::<R, A, U>),
        )
        .route(
            "/api/v1/users/:user_id/answers",
            get(answers_handler::<R, A, U>).put(save_answer_handler::<R, A, U>),
        )
        .route(
            "/api/v1/users/:user_id/answers/submit",
            post(submit_saved_handler::<R, A, U>),
        )
        .with_state(service)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnswerInput {
    pub question_id: QuestionId,
    pub option_id: OptionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub project_name: Option<String>,
    pub answers: Vec<AnswerInput>,
}

impl SubmissionRequest {
    /// Later entries for the same question replace earlier ones.
    pub fn answer_set(&self) -> AnswerSet {
        self.answers
            .iter()
            .map(|input| Answer::new(input.question_id, input.option_id))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub result_id: ResultId,
    pub user_id: UserId,
    pub project_name: Option<String>,
    pub recommended_tool: Tool,
    pub score: u32,
    pub share: u8,
    pub per_tool_scores: ScoreVector,
    pub ranking: Vec<RankedTool>,
    pub rationale: Vec<RationaleEntry>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub results: Vec<SurveyResult>,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OwnerRequest {
    pub user_id: UserId,
}

impl IntoResponse for SurveyServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            SurveyServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SurveyServiceError::UserNotFound(_) | SurveyServiceError::ResultNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SurveyServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
            SurveyServiceError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });
        (status, Json(payload)).into_response()
    }
}

/// Request that never reached the service because an extractor refused it.
#[derive(Debug)]
pub struct RequestRejection {
    message: String,
}

impl From<JsonRejection> for RequestRejection {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for RequestRejection {
    fn from(rejection: PathRejection) -> Self {
        Self {
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for RequestRejection {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for RequestRejection {
    fn into_response(self) -> Response {
        let payload = json!({
            "error": self.message,
            "kind": "bad_request",
        });
        (StatusCode::BAD_REQUEST, Json(payload)).into_response()
    }
}

fn reject<E: Into<RequestRejection>>(rejection: E) -> Response {
    rejection.into().into_response()
}

fn submission_response<R, A, U>(
    service: &SurveyService<R, A, U>,
    result: SurveyResult,
) -> SubmissionResponse
where
    R: ResultRepository + 'static,
    A: AnswerRepository + 'static,
    U: UserDirectory + 'static,
{
    let explanation = service.explain(&result);
    SubmissionResponse {
        result_id: result.id,
        user_id: result.user_id,
        project_name: result.project_name,
        recommended_tool: result.recommended_tool,
        score: result.score,
        share: explanation.share,
        per_tool_scores: result.per_tool_scores,
        ranking: explanation.ranking,
        rationale: explanation.rationale,
        generated_at: result.generated_at,
    }
}

pub(crate) async fn catalog_handler<R, A, U>(
    State(service): State<Arc<SurveyService<R, A, U>>>,
) -> Response
where
    R: ResultRepository + 'static,
    A: AnswerRepository + 'static,
    U: UserDirectory + 'static,
{
    (StatusCode::OK, Json(service.catalog().document())).into_response()
}

pub(crate) async fn submit_handler<R, A, U>(
    State(service): State<Arc<SurveyService<R, A, U>>>,
    request: Result<Json<SubmissionRequest>, JsonRejection>,
) -> Response
where
    R: ResultRepository + 'static,
    A: AnswerRepository + 'static,
    U: UserDirectory + 'static,
{
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return reject(rejection),
    };

    let answers = request.answer_set();
    match service.submit_for_project(request.user_id, request.project_name, answers) {
        Ok(result) => {
            let body = submission_response(&service, result);
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn submit_saved_handler<R, A, U>(
    State(service): State<Arc<SurveyService<R, A, U>>>,
    user_id: Result<Path<u64>, PathRejection>,
) -> Response
where
    R: ResultRepository + 'static,
    A: AnswerRepository + 'static,
    U: UserDirectory + 'static,
{
    let Path(user_id) = match user_id {
        Ok(extracted) => extracted,
        Err(rejection) => return reject(rejection),
    };

    match service.submit_saved(UserId(user_id)) {
        Ok(result) => {
            let body = submission_response(&service, result);
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn result_handler<R, A, U>(
    State(service): State<Arc<SurveyService<R, A, U>>>,
    result_id: Result<Path<u64>, PathRejection>,
) -> Response
where
    R: ResultRepository + 'static,
    A: AnswerRepository + 'static,
    U: UserDirectory + 'static,
{
    let Path(result_id) = match result_id {
        Ok(extracted) => extracted,
        Err(rejection) => return reject(rejection),
    };

    match service.get_result(ResultId(result_id)) {
        Ok(result) => (StatusCode::OK, Json(json!({ "result": result }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn delete_handler<R, A, U>(
    State(service): State<Arc<SurveyService<R, A, U>>>,
    result_id: Result<Path<u64>, PathRejection>,
    owner: Result<Json<OwnerRequest>, JsonRejection>,
) -> Response
where
    R: ResultRepository + 'static,
    A: AnswerRepository + 'static,
    U: UserDirectory + 'static,
{
    let Path(result_id) = match result_id {
        Ok(extracted) => extracted,
        Err(rejection) => return reject(rejection),
    };
    let Json(owner) = match owner {
        Ok(extracted) => extracted,
        Err(rejection) => return reject(rejection),
    };

    match service.delete_result(ResultId(result_id), owner.user_id) {
        Ok(()) => (StatusCode::OK, Json(json!({ "deleted": true }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn history_handler<R, A, U>(
    State(service): State<Arc<SurveyService<R, A, U>>>,
    user_id: Result<Path<u64>, PathRejection>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Response
where
    R: ResultRepository + 'static,
    A: AnswerRepository + 'static,
    U: UserDirectory + 'static,
{
    let Path(user_id) = match user_id {
        Ok(extracted) => extracted,
        Err(rejection) => return reject(rejection),
    };
    let Query(query) = match query {
        Ok(extracted) => extracted,
        Err(rejection) => return reject(rejection),
    };

    let user_id = UserId(user_id);
    let history = service
        .list_results(user_id, query.limit.unwrap_or(0))
        .and_then(|history| {
            let results: Vec<SurveyResult> = history.collect();
            service
                .count_results(user_id)
                .map(|count| HistoryResponse { results, count })
        });

    match history {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn answers_handler<R, A, U>(
    State(service): State<Arc<SurveyService<R, A, U>>>,
    user_id: Result<Path<u64>, PathRejection>,
) -> Response
where
    R: ResultRepository + 'static,
    A: AnswerRepository + 'static,
    U: UserDirectory + 'static,
{
    let Path(user_id) = match user_id {
        Ok(extracted) => extracted,
        Err(rejection) => return reject(rejection),
    };

    match service.current_answers(UserId(user_id)) {
        Ok(progress) => (StatusCode::OK, Json(progress)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn save_answer_handler<R, A, U>(
    State(service): State<Arc<SurveyService<R, A, U>>>,
    user_id: Result<Path<u64>, PathRejection>,
    input: Result<Json<AnswerInput>, JsonRejection>,
) -> Response
where
    R: ResultRepository + 'static,
    A: AnswerRepository + 'static,
    U: UserDirectory + 'static,
{
    let Path(user_id) = match user_id {
        Ok(extracted) => extracted,
        Err(rejection) => return reject(rejection),
    };
    let Json(input) = match input {
        Ok(extracted) => extracted,
        Err(rejection) => return reject(rejection),
    };

    match service.save_answer(UserId(user_id), input.question_id, input.option_id) {
        Ok(progress) => (StatusCode::OK, Json(progress)).into_response(),
        Err(err) => err.into_response(),
    }
}
