mod config;
mod decision;
mod rules;

pub use config::PolicyConfig;
pub use decision::{BlockDecision, BlockDirective};

use super::domain::{
    BlockDuration, BlockSource, OfferRecord, OfferStatus, ScreeningBlockReason, ScreeningRecord,
    ScreeningResult,
};
use super::error::EligibilityError;

/// Stateless evaluator deciding whether a candidate should be blocked and for how long.
#[derive(Debug, Clone, Default)]
pub struct EligibilityPolicy {
    config: PolicyConfig,
}

impl EligibilityPolicy {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Evaluate a freshly declined offer against the candidate's offers in the current
    /// decline window. Only qualifying declines count toward the threshold.
    pub fn evaluate_offer_decline(
        &self,
        window: &[OfferRecord],
        declined: &OfferRecord,
    ) -> BlockDecision {
        if declined.status != OfferStatus::Declined {
            return BlockDecision::NoAction {
                rationale: format!("offer is {}, not declined", declined.status.label()),
            };
        }

        if !declined.is_qualifying() {
            return BlockDecision::NoAction {
                rationale: rules::non_qualifying_rationale(declined),
            };
        }

        let threshold = self.config.decline_threshold;
        let count = rules::qualifying_declines(window, declined);
        if count < threshold {
            return BlockDecision::NoAction {
                rationale: format!("{count} of {threshold} qualifying declines recorded"),
            };
        }
        // The block was already applied when the window reached the threshold.
        if count > threshold {
            return BlockDecision::NoAction {
                rationale: format!(
                    "{count} qualifying declines recorded; block already applied at {threshold}"
                ),
            };
        }

        BlockDecision::Block(BlockDirective {
            reason: rules::offer_decline_reason(threshold),
            duration: self.config.default_block_duration,
            source: BlockSource::OfferDeclines,
        })
    }

    /// Failed screenings always block; the duration may be overridden by the HR actor.
    pub fn evaluate_screening_failure(
        &self,
        screening: &ScreeningRecord,
        reason: ScreeningBlockReason,
        duration_override: Option<u32>,
    ) -> Result<BlockDecision, EligibilityError> {
        let duration = match duration_override {
            Some(months) => BlockDuration::from_months(months)?,
            None => self.config.default_block_duration,
        };

        match screening.result {
            ScreeningResult::Failed => Ok(BlockDecision::Block(BlockDirective {
                reason: reason.label().to_string(),
                duration,
                source: BlockSource::ScreeningFailure,
            })),
            ScreeningResult::Passed | ScreeningResult::Pending => Ok(BlockDecision::NoAction {
                rationale: format!("screening result is {}", screening.result.label()),
            }),
        }
    }

    pub fn evaluate_manual_block(
        &self,
        reason: &str,
        duration_months: u32,
    ) -> Result<BlockDecision, EligibilityError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(EligibilityError::EmptyReason);
        }
        let duration = BlockDuration::from_months(duration_months)?;

        Ok(BlockDecision::Block(BlockDirective {
            reason: reason.to_string(),
            duration,
            source: BlockSource::Manual,
        }))
    }
}

#[cfg(test)]
pub(crate) fn offer_decline_reason_for_tests(threshold: u32) -> String {
    rules::offer_decline_reason(threshold)
}
