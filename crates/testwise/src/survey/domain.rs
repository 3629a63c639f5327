use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Candidate tools a questionnaire can recommend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Selenium,
    Playwright,
    Testim,
    Mabl,
}

impl Tool {
    pub const COUNT: usize = 4;

    /// Declaration order. Tie-breaks use [`ToolOrder`], not this constant.
    pub const ALL: [Tool; Tool::COUNT] = [Tool::Selenium, Tool::Playwright, Tool::Testim, Tool::Mabl];

    pub const fn index(self) -> usize {
        match self {
            Tool::Selenium => 0,
            Tool::Playwright => 1,
            Tool::Testim => 2,
            Tool::Mabl => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Tool::Selenium => "selenium",
            Tool::Playwright => "playwright",
            Tool::Testim => "testim",
            Tool::Mabl => "mabl",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Tool::Selenium => "Selenium",
            Tool::Playwright => "Playwright",
            Tool::Testim => "Testim",
            Tool::Mabl => "Mabl",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed priority list over every [`Tool`], used to break score ties.
///
/// The earliest tool in the list wins a tie. The list is a permutation of
/// [`Tool::ALL`]; construction fails otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Tool>", into = "Vec<Tool>")]
pub struct ToolOrder([Tool; Tool::COUNT]);

impl ToolOrder {
    pub fn new(order: Vec<Tool>) -> Result<Self, InvalidToolOrder> {
        Self::try_from(order)
    }

    pub fn iter(&self) -> impl Iterator<Item = Tool> + '_ {
        self.0.iter().copied()
    }

    pub fn first(&self) -> Tool {
        self.0[0]
    }

    /// Position of `tool` in the priority list, 0 being the highest priority.
    pub fn position(&self, tool: Tool) -> usize {
        self.0
            .iter()
            .position(|candidate| *candidate == tool)
            .unwrap_or(Tool::COUNT)
    }
}

impl Default for ToolOrder {
    fn default() -> Self {
        Self(Tool::ALL)
    }
}

impl TryFrom<Vec<Tool>> for ToolOrder {
    type Error = InvalidToolOrder;

    fn try_from(order: Vec<Tool>) -> Result<Self, Self::Error> {
        if order.len() != Tool::COUNT {
            return Err(InvalidToolOrder(order));
        }

        let mut seen = [false; Tool::COUNT];
        let mut tools = Tool::ALL;
        for (slot, tool) in order.iter().enumerate() {
            if seen[tool.index()] {
                return Err(InvalidToolOrder(order));
            }
            seen[tool.index()] = true;
            tools[slot] = *tool;
        }

        Ok(Self(tools))
    }
}

impl From<ToolOrder> for Vec<Tool> {
    fn from(order: ToolOrder) -> Self {
        order.0.to_vec()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tool order must list every tool exactly once, got {0:?}")]
pub struct InvalidToolOrder(pub Vec<Tool>);

/// Raised when a weight or score table does not name every tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("missing entry for tool `{0}`")]
pub struct MissingToolEntry(pub Tool);

fn total_table(map: BTreeMap<Tool, u32>) -> Result<[u32; Tool::COUNT], MissingToolEntry> {
    let mut values = [0; Tool::COUNT];
    for tool in Tool::ALL {
        values[tool.index()] = *map.get(&tool).ok_or(MissingToolEntry(tool))?;
    }
    Ok(values)
}

fn table_map(values: &[u32; Tool::COUNT]) -> BTreeMap<Tool, u32> {
    Tool::ALL
        .iter()
        .map(|tool| (*tool, values[tool.index()]))
        .collect()
}

/// Per-tool contribution of one option. Every tool has an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Tool, u32>", into = "BTreeMap<Tool, u32>")]
pub struct ToolWeights([u32; Tool::COUNT]);

impl ToolWeights {
    /// Weights listed in [`Tool::ALL`] order.
    pub const fn new(weights: [u32; Tool::COUNT]) -> Self {
        Self(weights)
    }

    pub fn get(&self, tool: Tool) -> u32 {
        self.0[tool.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tool, u32)> + '_ {
        Tool::ALL.into_iter().map(|tool| (tool, self.get(tool)))
    }

    /// Tool this option favours most, ties resolved by `order`.
    pub fn strongest(&self, order: &ToolOrder) -> Tool {
        let mut best = order.first();
        for tool in order.iter() {
            if self.get(tool) > self.get(best) {
                best = tool;
            }
        }
        best
    }
}

impl TryFrom<BTreeMap<Tool, u32>> for ToolWeights {
    type Error = MissingToolEntry;

    fn try_from(map: BTreeMap<Tool, u32>) -> Result<Self, Self::Error> {
        total_table(map).map(Self)
    }
}

impl From<ToolWeights> for BTreeMap<Tool, u32> {
    fn from(weights: ToolWeights) -> Self {
        table_map(&weights.0)
    }
}

/// Aggregated score per tool for one answer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Tool, u32>", into = "BTreeMap<Tool, u32>")]
pub struct ScoreVector([u32; Tool::COUNT]);

impl ScoreVector {
    pub const fn zero() -> Self {
        Self([0; Tool::COUNT])
    }

    pub fn get(&self, tool: Tool) -> u32 {
        self.0[tool.index()]
    }

    pub fn add(&mut self, weights: &ToolWeights) {
        for tool in Tool::ALL {
            self.0[tool.index()] = self.0[tool.index()].saturating_add(weights.get(tool));
        }
    }

    pub fn total(&self) -> u32 {
        self.0.iter().fold(0u32, |sum, value| sum.saturating_add(*value))
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|value| *value == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tool, u32)> + '_ {
        Tool::ALL.into_iter().map(|tool| (tool, self.get(tool)))
    }
}

impl From<ToolWeights> for ScoreVector {
    fn from(weights: ToolWeights) -> Self {
        Self(weights.0)
    }
}

impl TryFrom<BTreeMap<Tool, u32>> for ScoreVector {
    type Error = MissingToolEntry;

    fn try_from(map: BTreeMap<Tool, u32>) -> Result<Self, Self::Error> {
        total_table(map).map(Self)
    }
}

impl From<ScoreVector> for BTreeMap<Tool, u32> {
    fn from(scores: ScoreVector) -> Self {
        table_map(&scores.0)
    }
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a catalog question.
    QuestionId(u32)
);
numeric_id!(
    /// Identifier of an option, unique across the whole catalog.
    OptionId(u32)
);
numeric_id!(
    /// Identifier of a registered user.
    UserId(u64)
);
numeric_id!(
    /// Identifier assigned to a stored result.
    ResultId(u64)
);

/// A published survey question with its answer options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub category: String,
    pub prompt: String,
    pub options: Vec<AnswerOption>,
}

/// One selectable answer and the weight it lends each tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: OptionId,
    pub text: String,
    /// Intensity of the option within its question, starting at 1.
    pub ordinal: u32,
    pub weights: ToolWeights,
}

/// A user's choice for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    pub option_id: OptionId,
    pub answered_at: DateTime<Utc>,
}

impl Answer {
    pub fn new(question_id: QuestionId, option_id: OptionId) -> Self {
        Self {
            question_id,
            option_id,
            answered_at: Utc::now(),
        }
    }
}

/// Current answers of one user, at most one per question, ordered by question id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Answer>", into = "Vec<Answer>")]
pub struct AnswerSet {
    answers: BTreeMap<QuestionId, Answer>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `answer`, returning the answer it replaced for the same question.
    pub fn insert(&mut self, answer: Answer) -> Option<Answer> {
        self.answers.insert(answer.question_id, answer)
    }

    pub fn select(&mut self, question_id: QuestionId, option_id: OptionId) -> Option<Answer> {
        self.insert(Answer::new(question_id, option_id))
    }

    pub fn with(mut self, question_id: QuestionId, option_id: OptionId) -> Self {
        self.select(question_id, option_id);
        self
    }

    pub fn get(&self, question_id: QuestionId) -> Option<&Answer> {
        self.answers.get(&question_id)
    }

    pub fn remove(&mut self, question_id: QuestionId) -> Option<Answer> {
        self.answers.remove(&question_id)
    }

    pub fn contains(&self, question_id: QuestionId) -> bool {
        self.answers.contains_key(&question_id)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Answer> {
        self.answers.values()
    }
}

impl From<Vec<Answer>> for AnswerSet {
    fn from(answers: Vec<Answer>) -> Self {
        answers.into_iter().collect()
    }
}

impl From<AnswerSet> for Vec<Answer> {
    fn from(set: AnswerSet) -> Self {
        set.answers.into_values().collect()
    }
}

impl FromIterator<Answer> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = Answer>>(iter: I) -> Self {
        let mut set = AnswerSet::new();
        for answer in iter {
            set.insert(answer);
        }
        set
    }
}

/// Immutable record of one finalized submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyResult {
    pub id: ResultId,
    pub user_id: UserId,
    /// Label the user gave the evaluated project, if any.
    #[serde(default)]
    pub project_name: Option<String>,
    pub recommended_tool: Tool,
    /// Score of the recommended tool.
    pub score: u32,
    pub per_tool_scores: ScoreVector,
    pub answers: AnswerSet,
    pub generated_at: DateTime<Utc>,
}
