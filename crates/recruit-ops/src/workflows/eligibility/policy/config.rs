use serde::{Deserialize, Serialize};

use super::super::domain::BlockDuration;

/// Thresholds applied by the eligibility policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Qualifying declines that trigger an automatic block.
    pub decline_threshold: u32,
    pub default_block_duration: BlockDuration,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            decline_threshold: 2,
            default_block_duration: BlockDuration::SixMonths,
        }
    }
}
