use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::activity::{
    ActivityError, ActivityEvent, ActivityKind, ActivityPublisher, Communication,
};
use super::domain::{
    BlockRecord, CandidateEligibilityStatus, CandidateId, OfferId, OfferRecord, OfferStatus,
    ScreeningBlockReason, ScreeningRecord, ScreeningResult,
};
use super::error::EligibilityError;
use super::offers::{
    self, OfferDraft, OfferResponse, OfferTransitionError, OfferValidationError,
};
use super::policy::{BlockDecision, EligibilityPolicy, PolicyConfig};
use super::projection::{
    self, BlockedCandidateRow, CandidateProjection, CandidateQuery, EligibilityDashboard,
    OfferManagementRow, ScreeningBlockingRow,
};
use super::store::{
    build_block, BlockRecordStore, CandidateRecord, CandidateRepository, RepositoryError,
    StoreError,
};
use super::unblock::{self, BulkUnblockReport};
use crate::workflows::selections::CandidateSelection;

/// Single entry point for the internal team pages: read projections plus thin commands.
pub struct EligibilityService<R, A> {
    store: BlockRecordStore<R>,
    activity: Arc<A>,
    policy: Arc<EligibilityPolicy>,
}

/// Block parameters supplied by HR when a screening fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningBlockRequest {
    pub reason: ScreeningBlockReason,
    #[serde(default)]
    pub duration_months: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreeningOutcome {
    pub screening: ScreeningRecord,
    pub decision: BlockDecision,
    pub block: Option<BlockRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferOutcome {
    pub offer: OfferRecord,
    pub decision: BlockDecision,
    pub block: Option<BlockRecord>,
}

impl<R, A> EligibilityService<R, A>
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    pub fn new(repository: Arc<R>, activity: Arc<A>, config: PolicyConfig) -> Self {
        Self {
            store: BlockRecordStore::new(repository),
            activity,
            policy: Arc::new(EligibilityPolicy::new(config)),
        }
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    pub fn store(&self) -> &BlockRecordStore<R> {
        &self.store
    }

    /// Register a candidate handed over by the selection flow.
    pub fn register_selection(
        &self,
        selection: &CandidateSelection,
    ) -> Result<CandidateRecord, EligibilityServiceError> {
        let record = self.store.repository().insert(selection.to_record())?;
        debug!(candidate = %record.candidate_id(), "candidate registered");
        Ok(record)
    }

    /// Register many selections, leaving already known candidates untouched.
    pub fn import_selections(
        &self,
        selections: &[CandidateSelection],
    ) -> Result<usize, EligibilityServiceError> {
        let mut registered = 0;
        for selection in selections {
            match self.register_selection(selection) {
                Ok(_) => registered += 1,
                Err(EligibilityServiceError::Repository(RepositoryError::Conflict)) => {
                    debug!(
                        candidate = %selection.candidate.candidate_id,
                        "selection for known candidate skipped"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        info!(registered, total = selections.len(), "selections imported");
        Ok(registered)
    }

    /// Apply a policy decision. `NoAction` leaves the candidate untouched.
    pub fn apply_block(
        &self,
        candidate_id: &CandidateId,
        decision: &BlockDecision,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<BlockRecord>, EligibilityServiceError> {
        let Some(directive) = decision.directive() else {
            return Ok(None);
        };

        let block = self.store.apply_block(candidate_id, directive, actor, now)?;
        self.publish_block(candidate_id, &block, actor)?;
        Ok(Some(block))
    }

    pub fn block_manually(
        &self,
        candidate_id: &CandidateId,
        reason: &str,
        duration_months: u32,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<BlockRecord, EligibilityServiceError> {
        let decision = self.policy.evaluate_manual_block(reason, duration_months)?;
        self.apply_block(candidate_id, &decision, actor, now)?
            .ok_or_else(|| EligibilityError::EmptyReason.into())
    }

    /// Single unblock. Idempotent for candidates that are not blocked.
    pub fn remove_block(
        &self,
        candidate_id: &CandidateId,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<BlockRecord>, EligibilityServiceError> {
        let removed = self.store.remove_block(candidate_id, now)?;
        if let Some(block) = &removed {
            self.publish_unblock(candidate_id, block, actor, now, "manual")?;
        }
        Ok(removed)
    }

    pub fn get_status(
        &self,
        candidate_id: &CandidateId,
        now: DateTime<Utc>,
    ) -> Result<CandidateEligibilityStatus, EligibilityServiceError> {
        Ok(self.store.get_status(candidate_id, now)?)
    }

    pub fn days_remaining(
        &self,
        candidate_id: &CandidateId,
        now: DateTime<Utc>,
    ) -> Result<i64, EligibilityServiceError> {
        Ok(self.store.days_remaining(candidate_id, now)?)
    }

    pub fn bulk_unblock(
        &self,
        candidate_ids: &[CandidateId],
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<BulkUnblockReport, EligibilityServiceError> {
        let (report, removed) = unblock::bulk_unblock(&self.store, candidate_ids, now)?;
        for (candidate_id, block) in &removed {
            self.publish_unblock(candidate_id, block, actor, now, "bulk")?;
        }
        Ok(report)
    }

    pub fn ready_for_unblock(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<CandidateId>, EligibilityServiceError> {
        Ok(unblock::sweep_ready(&self.store, now)?)
    }

    /// Store a screening result. A failure blocks the candidate in the same write.
    pub fn record_screening(
        &self,
        candidate_id: &CandidateId,
        result: ScreeningResult,
        notes: Option<String>,
        block_request: Option<ScreeningBlockRequest>,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<ScreeningOutcome, EligibilityServiceError> {
        let screening = ScreeningRecord {
            result,
            recorded_at: now,
            notes: notes.filter(|value| !value.trim().is_empty()),
        };

        let decision = match result {
            ScreeningResult::Failed => {
                let request = block_request.ok_or(EligibilityError::EmptyReason)?;
                self.policy.evaluate_screening_failure(
                    &screening,
                    request.reason,
                    request.duration_months,
                )?
            }
            ScreeningResult::Passed | ScreeningResult::Pending => BlockDecision::NoAction {
                rationale: format!("screening result is {}", result.label()),
            },
        };

        let block = decision
            .directive()
            .map(|directive| build_block(directive, actor, now))
            .transpose()?;

        self.store.mutate(candidate_id, |record| {
            record.screening = Some(screening.clone());
            if let Some(block) = &block {
                record.block = Some(block.clone());
            }
            Ok::<_, EligibilityServiceError>(())
        })?;

        self.activity.publish(
            ActivityEvent::new(
                ActivityKind::ScreeningRecorded,
                candidate_id.clone(),
                actor,
                now,
                format!("Screening marked {}", result.label()),
            )
            .with_detail("result", result.label()),
        )?;
        if let Some(block) = &block {
            info!(candidate = %candidate_id, %actor, "screening failure blocked candidate");
            self.publish_block(candidate_id, block, actor)?;
        }

        Ok(ScreeningOutcome {
            screening,
            decision,
            block,
        })
    }

    /// Validate the draft and attach a pending offer. Blocked candidates cannot receive offers.
    pub fn create_offer(
        &self,
        draft: &OfferDraft,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<OfferRecord, EligibilityServiceError> {
        let validated = draft.validate(now.date_naive())?;
        let candidate_id = CandidateId(validated.candidate_code.clone());

        let (_, offer) = self.store.mutate(&candidate_id, |record| {
            let status = projection::project(record, now).status;
            if !projection::can_receive_offers(status) {
                return Err(EligibilityServiceError::CandidateBlocked {
                    candidate_id: candidate_id.clone(),
                    status,
                });
            }
            let offer = offers::pending_offer(record, &validated, now);
            record.offers.push(offer.clone());
            Ok(offer)
        })?;

        self.activity.publish(
            ActivityEvent::new(
                ActivityKind::OfferCreated,
                candidate_id.clone(),
                actor,
                now,
                format!("Offer sent for {}", offer.job_title),
            )
            .with_detail("offer_id", offer.offer_id.0.clone())
            .with_detail("offered_salary", offer.offered_salary.to_string())
            .with_detail("location", offer.location.clone())
            .with_detail("selection_id", validated.candidate_selection_id.clone()),
        )?;
        info!(candidate = %candidate_id, offer = %offer.offer_id, "offer created");

        Ok(offer)
    }

    /// Record the candidate's answer. A decline that reaches the threshold blocks the
    /// candidate in the same write as the status change.
    pub fn respond_to_offer(
        &self,
        candidate_id: &CandidateId,
        offer_id: &OfferId,
        response: OfferResponse,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<OfferOutcome, EligibilityServiceError> {
        let policy = self.policy.clone();

        let (_, (offer, decision, block)) = self.store.mutate(candidate_id, |record| {
            let offer = offers::respond(record, offer_id, response, now)?;

            let decision = if offer.status == OfferStatus::Declined {
                policy.evaluate_offer_decline(&record.decline_window(), &offer)
            } else {
                BlockDecision::NoAction {
                    rationale: format!("offer {}", offer.status.label().to_lowercase()),
                }
            };

            let block = match decision.directive() {
                Some(directive) => Some(build_block(directive, actor, now)?),
                None => None,
            };
            if let Some(block) = &block {
                record.block = Some(block.clone());
            }

            Ok::<_, EligibilityServiceError>((offer, decision, block))
        })?;

        let kind = match offer.status {
            OfferStatus::Accepted => ActivityKind::OfferAccepted,
            OfferStatus::Declined => ActivityKind::OfferDeclined,
            OfferStatus::Expired | OfferStatus::Pending => ActivityKind::OfferExpired,
        };
        self.activity.publish(
            ActivityEvent::new(
                kind,
                candidate_id.clone(),
                actor,
                now,
                format!("{} {}", offer.job_title, offer.status.label().to_lowercase()),
            )
            .with_detail("offer_id", offer.offer_id.0.clone())
            .with_detail("decline_count", offer.decline_count.to_string())
            .with_detail("qualifying", offer.is_qualifying().to_string())
            .with_detail("decision", decision.summary()),
        )?;
        if let Some(block) = &block {
            info!(candidate = %candidate_id, %actor, "decline threshold reached, candidate blocked");
            self.publish_block(candidate_id, block, actor)?;
        }

        Ok(OfferOutcome {
            offer,
            decision,
            block,
        })
    }

    pub fn log_communication(
        &self,
        candidate_id: &CandidateId,
        communication: &Communication,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<ActivityEvent, EligibilityServiceError> {
        if self.store.repository().fetch(candidate_id)?.is_none() {
            return Err(EligibilityError::UnknownCandidate(candidate_id.clone()).into());
        }
        let subject = communication.subject.trim();
        if subject.is_empty() {
            return Err(EligibilityServiceError::EmptySubject);
        }

        let mut event = ActivityEvent::new(
            ActivityKind::CommunicationLogged,
            candidate_id.clone(),
            actor,
            now,
            format!("{}: {}", communication.channel.label(), subject),
        )
        .with_detail("channel", communication.channel.label());
        if !communication.notes.trim().is_empty() {
            event = event.with_detail("notes", communication.notes.trim());
        }

        self.activity.publish(event.clone())?;
        Ok(event)
    }

    pub fn recent_activity(
        &self,
        limit: usize,
    ) -> Result<Vec<ActivityEvent>, EligibilityServiceError> {
        Ok(self.activity.recent(limit)?)
    }

    pub fn project(
        &self,
        candidate_id: &CandidateId,
        now: DateTime<Utc>,
    ) -> Result<CandidateProjection, EligibilityServiceError> {
        let record = self
            .store
            .repository()
            .fetch(candidate_id)?
            .ok_or_else(|| EligibilityError::UnknownCandidate(candidate_id.clone()))?;
        Ok(projection::project(&record, now))
    }

    pub fn list(
        &self,
        query: &CandidateQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<CandidateProjection>, EligibilityServiceError> {
        Ok(self
            .filtered(query, now)?
            .into_iter()
            .map(|(projection, _)| projection)
            .collect())
    }

    pub fn dashboard(
        &self,
        now: DateTime<Utc>,
    ) -> Result<EligibilityDashboard, EligibilityServiceError> {
        let projections = self.list(&CandidateQuery::default(), now)?;
        Ok(EligibilityDashboard::from_projections(&projections))
    }

    pub fn blocked_candidates_view(
        &self,
        query: &CandidateQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<BlockedCandidateRow>, EligibilityServiceError> {
        Ok(self
            .filtered(query, now)?
            .iter()
            .filter_map(|(projection, _)| BlockedCandidateRow::from_projection(projection))
            .collect())
    }

    pub fn screening_blocking_view(
        &self,
        query: &CandidateQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScreeningBlockingRow>, EligibilityServiceError> {
        Ok(self
            .filtered(query, now)?
            .iter()
            .filter(|(_, record)| record.screening.is_some())
            .map(|(projection, _)| ScreeningBlockingRow::from_projection(projection))
            .collect())
    }

    pub fn offer_management_view(
        &self,
        query: &CandidateQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<OfferManagementRow>, EligibilityServiceError> {
        Ok(self
            .filtered(query, now)?
            .iter()
            .filter(|(_, record)| !record.offers.is_empty())
            .map(|(projection, record)| OfferManagementRow::from_projection(projection, record))
            .collect())
    }

    fn filtered(
        &self,
        query: &CandidateQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<(CandidateProjection, CandidateRecord)>, EligibilityServiceError> {
        Ok(self
            .store
            .repository()
            .list()?
            .into_iter()
            .map(|record| (projection::project(&record, now), record))
            .filter(|(projection, _)| query.matches(projection))
            .collect())
    }

    fn publish_block(
        &self,
        candidate_id: &CandidateId,
        block: &BlockRecord,
        actor: &str,
    ) -> Result<(), ActivityError> {
        self.activity.publish(
            ActivityEvent::new(
                ActivityKind::CandidateBlocked,
                candidate_id.clone(),
                actor,
                block.blocked_at,
                format!("Blocked for {} months: {}", block.duration.months(), block.reason),
            )
            .with_detail("source", block.source.label())
            .with_detail("block_end", block.block_end.date_naive().to_string()),
        )
    }

    fn publish_unblock(
        &self,
        candidate_id: &CandidateId,
        block: &BlockRecord,
        actor: &str,
        now: DateTime<Utc>,
        mode: &str,
    ) -> Result<(), ActivityError> {
        self.activity.publish(
            ActivityEvent::new(
                ActivityKind::CandidateUnblocked,
                candidate_id.clone(),
                actor,
                now,
                format!("Unblocked ({mode})"),
            )
            .with_detail("previous_reason", block.reason.clone())
            .with_detail("early", (now < block.block_end).to_string()),
        )
    }
}

/// Error raised by the eligibility service.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityServiceError {
    #[error(transparent)]
    Eligibility(#[from] EligibilityError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Activity(#[from] ActivityError),
    #[error(transparent)]
    OfferValidation(#[from] OfferValidationError),
    #[error(transparent)]
    OfferTransition(#[from] OfferTransitionError),
    #[error("candidate {candidate_id} is {} and cannot receive offers", .status.label())]
    CandidateBlocked {
        candidate_id: CandidateId,
        status: CandidateEligibilityStatus,
    },
    #[error("communication subject is required")]
    EmptySubject,
}

impl From<StoreError> for EligibilityServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Eligibility(err) => Self::Eligibility(err),
            StoreError::Repository(err) => Self::Repository(err),
        }
    }
}
