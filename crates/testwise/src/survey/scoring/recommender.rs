use serde::{Deserialize, Serialize};

use crate::survey::domain::{ScoreVector, Tool, ToolOrder};

/// The winning tool and its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub tool: Tool,
    pub score: u32,
}

/// One row of the full ranking, rank 1 being the recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedTool {
    pub rank: usize,
    pub tool: Tool,
    pub score: u32,
}

/// Pick the tool with the highest score.
///
/// Ties go to the tool listed first in `order`. An all-zero vector still
/// resolves, to `order.first()`; callers that need to suppress recommendations
/// without real signal must check answer completeness themselves.
pub fn recommend(scores: &ScoreVector, order: &ToolOrder) -> Recommendation {
    let mut best = order.first();
    for tool in order.iter() {
        // strict comparison keeps the earlier tool on ties
        if scores.get(tool) > scores.get(best) {
            best = tool;
        }
    }

    Recommendation {
        tool: best,
        score: scores.get(best),
    }
}

/// Every tool ordered by score, descending, ties by `order`.
pub fn rank(scores: &ScoreVector, order: &ToolOrder) -> Vec<RankedTool> {
    let mut tools: Vec<Tool> = order.iter().collect();
    // stable sort preserves priority order among equal scores
    tools.sort_by(|a, b| scores.get(*b).cmp(&scores.get(*a)));

    tools
        .into_iter()
        .enumerate()
        .map(|(idx, tool)| RankedTool {
            rank: idx + 1,
            tool,
            score: scores.get(tool),
        })
        .collect()
}

/// Winning score as a rounded percentage of all scores; 0 when nothing scored.
pub fn share_percent(scores: &ScoreVector, recommendation: &Recommendation) -> u8 {
    let total = u64::from(scores.total());
    if total == 0 {
        return 0;
    }
    let percent = (u64::from(recommendation.score) * 100 + total / 2) / total;
    percent.min(100) as u8
}
