//! Questionnaire catalog, scoring, recommendation, and result history.
//!
//! Answers flow through [`validation::validate`], are aggregated by
//! [`scoring::Scorer`], resolved to a tool by [`scoring::recommend`], and kept
//! by a [`repository::ResultRepository`]. [`service::SurveyService`] composes the
//! steps and [`router::survey_router`] exposes them over HTTP.

pub mod catalog;
pub mod domain;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use catalog::{Catalog, CatalogDocument, CatalogError};
pub use domain::{
    Answer, AnswerOption, AnswerSet, OptionId, Question, QuestionId, ResultId, ScoreVector,
    SurveyResult, Tool, ToolOrder, ToolWeights, UserId,
};
pub use repository::{AnswerRepository, RepositoryError, ResultRepository, UserDirectory};
pub use router::survey_router;
pub use scoring::{Recommendation, ResultExplanation, Scorer};
pub use service::{AnswerProgress, ResultHistory, SurveyService, SurveyServiceError};
pub use validation::{ValidationError, ValidationMode};
