use crate::infra::{in_memory_service, load_catalog, parse_answer};
use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use testwise::config::AppConfig;
use testwise::error::AppError;
use testwise::survey::{
    AnswerSet, Catalog, OptionId, QuestionId, ResultExplanation, SurveyResult, UserId,
};
use testwise::telemetry::{self, LogSink};

/// Offline runs score on behalf of a throwaway local user.
const CONSOLE_USER: UserId = UserId(0);

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogArgs {
    /// Catalog JSON to load instead of the configured or bundled one
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Print the catalog document as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RecommendArgs {
    /// Answer as QUESTION=OPTION; repeat once per question
    #[arg(long = "answer", value_name = "Q=O", value_parser = parse_answer)]
    pub(crate) answers: Vec<(QuestionId, OptionId)>,
    /// Catalog JSON to load instead of the configured or bundled one
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Print the result and explanation as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

fn prepare(catalog_override: Option<PathBuf>) -> Result<Catalog, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, LogSink::Stderr)?;
    let path = catalog_override.or(config.survey.catalog_path);
    load_catalog(path.as_deref())
}

pub(crate) fn run_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let catalog = prepare(args.catalog)?;

    if args.json {
        let document = serde_json::to_string_pretty(&catalog.document())
            .map_err(|err| AppError::Io(err.into()))?;
        println!("{document}");
    } else {
        print!("{}", render_catalog(&catalog));
    }
    Ok(())
}

pub(crate) fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let catalog = prepare(args.catalog)?;
    let (result, explanation) = recommend_offline(catalog, &args.answers)?;

    if args.json {
        let payload = json!({ "result": result, "explanation": explanation });
        let rendered =
            serde_json::to_string_pretty(&payload).map_err(|err| AppError::Io(err.into()))?;
        println!("{rendered}");
    } else {
        print!("{}", render_recommendation(&result, &explanation));
    }
    Ok(())
}

pub(crate) fn recommend_offline(
    catalog: Catalog,
    answers: &[(QuestionId, OptionId)],
) -> Result<(SurveyResult, ResultExplanation), AppError> {
    let service = in_memory_service(catalog, &[CONSOLE_USER]);
    let answers = answers
        .iter()
        .fold(AnswerSet::new(), |set, (question, option)| {
            set.with(*question, *option)
        });

    let result = service.submit(CONSOLE_USER, answers)?;
    let explanation = service.explain(&result);
    Ok((result, explanation))
}

pub(crate) fn render_catalog(catalog: &Catalog) -> String {
    let mut out = String::new();
    let order: Vec<String> = catalog.tool_order().iter().map(|tool| tool.to_string()).collect();
    out.push_str(&format!(
        "Catalog v{} ({} questions, tie order: {})\n",
        catalog.version(),
        catalog.question_count(),
        order.join(" > ")
    ));

    for question in catalog.list_questions() {
        out.push_str(&format!(
            "\n{}. [{}] {}\n",
            question.id, question.category, question.prompt
        ));
        for option in &question.options {
            let weights: Vec<String> = option
                .weights
                .iter()
                .map(|(tool, weight)| format!("{tool}={weight}"))
                .collect();
            out.push_str(&format!(
                "   {:>3}) {} ({})\n",
                option.id,
                option.text,
                weights.join(", ")
            ));
        }
    }
    out
}

pub(crate) fn render_recommendation(
    result: &SurveyResult,
    explanation: &ResultExplanation,
) -> String {
    let mut out = format!(
        "Recommended tool: {} (score {}, {}% of all points)\n\nRanking:\n",
        result.recommended_tool.display_name(),
        result.score,
        explanation.share
    );
    for entry in &explanation.ranking {
        out.push_str(&format!(
            "  {}. {:<10} {}\n",
            entry.rank,
            entry.tool.display_name(),
            entry.score
        ));
    }

    if explanation.rationale.is_empty() {
        out.push_str("\nNo single answer favoured the winner outright.\n");
    } else {
        out.push_str("\nWhy:\n");
        for entry in &explanation.rationale {
            out.push_str(&format!("  - {}\n", entry.reason));
        }
    }
    out
}
