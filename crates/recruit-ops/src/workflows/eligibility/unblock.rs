use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::domain::{BlockRecord, CandidateEligibilityStatus, CandidateId};
use super::store::{BlockRecordStore, CandidateRepository, RepositoryError};

/// Why a candidate in a bulk unblock request was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    StillBlocked,
    NotBlocked,
    UnknownCandidate,
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCandidate {
    pub candidate_id: CandidateId,
    pub reason: SkipReason,
}

/// Result of a bulk unblock. Skips are informational, not failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUnblockReport {
    pub unblocked: Vec<CandidateId>,
    pub skipped: Vec<SkippedCandidate>,
}

impl BulkUnblockReport {
    fn skip(&mut self, candidate_id: &CandidateId, reason: SkipReason) {
        self.skipped.push(SkippedCandidate {
            candidate_id: candidate_id.clone(),
            reason,
        });
    }

    pub fn skipped_with(&self, reason: SkipReason) -> Vec<&CandidateId> {
        self.skipped
            .iter()
            .filter(|entry| entry.reason == reason)
            .map(|entry| &entry.candidate_id)
            .collect()
    }
}

/// Unblocks the ready subset of `candidate_ids`. Candidates still inside their window are
/// never force-unblocked; removal is a compare-and-swap so a concurrent re-block wins.
pub(crate) fn bulk_unblock<R>(
    store: &BlockRecordStore<R>,
    candidate_ids: &[CandidateId],
    now: DateTime<Utc>,
) -> Result<(BulkUnblockReport, Vec<(CandidateId, BlockRecord)>), RepositoryError>
where
    R: CandidateRepository + 'static,
{
    let mut report = BulkUnblockReport::default();
    let mut removed = Vec::new();
    let mut seen = HashSet::new();

    for candidate_id in candidate_ids {
        if !seen.insert(candidate_id) {
            continue;
        }

        let Some(mut record) = store.repository().fetch(candidate_id)? else {
            report.skip(candidate_id, SkipReason::UnknownCandidate);
            continue;
        };

        match record.status_at(now) {
            CandidateEligibilityStatus::ReadyForUnblock => {}
            CandidateEligibilityStatus::Blocked => {
                debug!(candidate = %candidate_id, "bulk unblock skipped, still blocked");
                report.skip(candidate_id, SkipReason::StillBlocked);
                continue;
            }
            CandidateEligibilityStatus::Active | CandidateEligibilityStatus::UnderReview => {
                report.skip(candidate_id, SkipReason::NotBlocked);
                continue;
            }
        }

        let Some(block) = record.block.take() else {
            report.skip(candidate_id, SkipReason::NotBlocked);
            continue;
        };
        record.last_unblocked_at = Some(now);

        match store.repository().update(record) {
            Ok(_) => {
                report.unblocked.push(candidate_id.clone());
                removed.push((candidate_id.clone(), block));
            }
            Err(RepositoryError::VersionConflict { .. }) | Err(RepositoryError::NotFound) => {
                report.skip(candidate_id, SkipReason::Superseded);
            }
            Err(err) => return Err(err),
        }
    }

    info!(
        unblocked = report.unblocked.len(),
        skipped = report.skipped.len(),
        "bulk unblock processed"
    );

    Ok((report, removed))
}

/// Candidates whose block window has elapsed. Read-only; unblocking stays explicit.
pub(crate) fn sweep_ready<R>(
    store: &BlockRecordStore<R>,
    now: DateTime<Utc>,
) -> Result<Vec<CandidateId>, RepositoryError>
where
    R: CandidateRepository + 'static,
{
    Ok(store
        .repository()
        .list()?
        .into_iter()
        .filter(|record| record.status_at(now) == CandidateEligibilityStatus::ReadyForUnblock)
        .map(|record| record.candidate.candidate_id)
        .collect())
}
