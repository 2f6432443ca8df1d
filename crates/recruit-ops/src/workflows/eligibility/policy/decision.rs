use serde::{Deserialize, Serialize};

use super::super::domain::{BlockDuration, BlockSource};

/// Instruction to create (or replace) a candidate's block record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDirective {
    pub reason: String,
    pub duration: BlockDuration,
    pub source: BlockSource,
}

/// Outcome of a policy evaluation. Applying it is the store's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum BlockDecision {
    Block(BlockDirective),
    NoAction { rationale: String },
}

impl BlockDecision {
    pub fn is_block(&self) -> bool {
        matches!(self, BlockDecision::Block(_))
    }

    pub fn directive(&self) -> Option<&BlockDirective> {
        match self {
            BlockDecision::Block(directive) => Some(directive),
            BlockDecision::NoAction { .. } => None,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            BlockDecision::Block(directive) => format!(
                "block for {} months: {}",
                directive.duration.months(),
                directive.reason
            ),
            BlockDecision::NoAction { rationale } => format!("no action: {rationale}"),
        }
    }
}
