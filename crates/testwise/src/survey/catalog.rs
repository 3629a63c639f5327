use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{AnswerOption, OptionId, Question, QuestionId, Tool, ToolOrder};

const BUNDLED_CATALOG: &str = include_str!("../../data/catalog.json");

/// Errors raised while loading or querying the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog defines no questions")]
    Empty,
    #[error("question id must be positive")]
    InvalidQuestionId,
    #[error("question {0} is defined more than once")]
    DuplicateQuestion(QuestionId),
    #[error("question {0} has no options")]
    QuestionWithoutOptions(QuestionId),
    #[error("option {0} is defined more than once")]
    DuplicateOption(OptionId),
    #[error("option {option} of question {question} must have a positive ordinal")]
    InvalidOrdinal {
        question: QuestionId,
        option: OptionId,
    },
    #[error("question {0} not found")]
    QuestionNotFound(QuestionId),
    #[error("option {0} not found")]
    OptionNotFound(OptionId),
}

/// On-disk catalog layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub version: u32,
    #[serde(default)]
    pub tool_order: ToolOrder,
    pub questions: Vec<Question>,
}

/// Read-only questionnaire definition shared by every session.
#[derive(Debug, Clone)]
pub struct Catalog {
    version: u32,
    tool_order: ToolOrder,
    questions: Vec<Question>,
    question_index: HashMap<QuestionId, usize>,
    option_index: HashMap<OptionId, (usize, usize)>,
}

impl Catalog {
    /// The 12-question catalog shipped with the crate.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_reader(reader)?;
        Self::from_document(document)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        Self::from_document(document)
    }

    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        let CatalogDocument {
            version,
            tool_order,
            mut questions,
        } = document;

        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }
        questions.sort_by_key(|question| question.id);

        let mut question_index = HashMap::with_capacity(questions.len());
        let mut option_index = HashMap::new();
        for (q_idx, question) in questions.iter().enumerate() {
            if question.id.0 == 0 {
                return Err(CatalogError::InvalidQuestionId);
            }
            if question_index.insert(question.id, q_idx).is_some() {
                return Err(CatalogError::DuplicateQuestion(question.id));
            }
            if question.options.is_empty() {
                return Err(CatalogError::QuestionWithoutOptions(question.id));
            }

            for (o_idx, option) in question.options.iter().enumerate() {
                if option.ordinal == 0 {
                    return Err(CatalogError::InvalidOrdinal {
                        question: question.id,
                        option: option.id,
                    });
                }
                if option_index.insert(option.id, (q_idx, o_idx)).is_some() {
                    return Err(CatalogError::DuplicateOption(option.id));
                }
            }

            warn_on_irregular_ordinals(question);
        }

        let catalog = Self {
            version,
            tool_order,
            questions,
            question_index,
            option_index,
        };

        info!(
            version = catalog.version,
            questions = catalog.questions.len(),
            options = catalog.option_index.len(),
            "survey catalog loaded"
        );

        Ok(catalog)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn tool_order(&self) -> &ToolOrder {
        &self.tool_order
    }

    /// Questions ordered by id.
    pub fn list_questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn question(&self, question_id: QuestionId) -> Result<&Question, CatalogError> {
        self.question_index
            .get(&question_id)
            .map(|idx| &self.questions[*idx])
            .ok_or(CatalogError::QuestionNotFound(question_id))
    }

    pub fn options(&self, question_id: QuestionId) -> Result<&[AnswerOption], CatalogError> {
        self.question(question_id)
            .map(|question| question.options.as_slice())
    }

    pub fn contains_question(&self, question_id: QuestionId) -> bool {
        self.question_index.contains_key(&question_id)
    }

    /// Resolve an option together with the question that owns it.
    pub fn option(&self, option_id: OptionId) -> Result<(&Question, &AnswerOption), CatalogError> {
        let (q_idx, o_idx) = self
            .option_index
            .get(&option_id)
            .copied()
            .ok_or(CatalogError::OptionNotFound(option_id))?;
        let question = &self.questions[q_idx];
        Ok((question, &question.options[o_idx]))
    }

    pub fn owner_of(&self, option_id: OptionId) -> Option<QuestionId> {
        self.option_index
            .get(&option_id)
            .map(|(q_idx, _)| self.questions[*q_idx].id)
    }

    /// Weight `option_id` lends `tool`.
    pub fn weight(&self, option_id: OptionId, tool: Tool) -> Result<u32, CatalogError> {
        self.option(option_id)
            .map(|(_, option)| option.weights.get(tool))
    }

    pub fn document(&self) -> CatalogDocument {
        CatalogDocument {
            version: self.version,
            tool_order: self.tool_order,
            questions: self.questions.clone(),
        }
    }
}

fn warn_on_irregular_ordinals(question: &Question) {
    let mut seen = HashSet::with_capacity(question.options.len());
    let mut previous = 0;
    for option in &question.options {
        if !seen.insert(option.ordinal) {
            warn!(question = %question.id, ordinal = option.ordinal, "duplicate option ordinal");
        } else if option.ordinal < previous {
            warn!(question = %question.id, option = %option.id, "option ordinals are not ascending");
        }
        previous = option.ordinal;
    }
}
