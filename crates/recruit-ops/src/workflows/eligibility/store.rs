use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{
    BlockRecord, Candidate, CandidateEligibilityStatus, CandidateExpectations, CandidateId, OfferId,
    OfferRecord, OfferStatus, ScreeningRecord,
};
use super::error::EligibilityError;
use super::policy::BlockDirective;

/// Read-modify-write attempts before a version conflict is surfaced.
pub(crate) const MAX_WRITE_ATTEMPTS: usize = 3;

/// Aggregate kept per candidate: identity, offer history, screening and the block gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub candidate: Candidate,
    pub expectations: Option<CandidateExpectations>,
    pub offers: Vec<OfferRecord>,
    pub screening: Option<ScreeningRecord>,
    pub block: Option<BlockRecord>,
    pub last_unblocked_at: Option<DateTime<Utc>>,
    /// Compare-and-swap stamp, bumped by the repository on every successful update.
    pub version: u64,
}

impl CandidateRecord {
    pub fn new(candidate: Candidate) -> Self {
        Self {
            candidate,
            expectations: None,
            offers: Vec::new(),
            screening: None,
            block: None,
            last_unblocked_at: None,
            version: 0,
        }
    }

    pub fn with_expectations(mut self, expectations: CandidateExpectations) -> Self {
        self.expectations = Some(expectations);
        self
    }

    pub fn candidate_id(&self) -> &CandidateId {
        &self.candidate.candidate_id
    }

    /// Block-derived status; never reports `under_review`.
    pub fn status_at(&self, now: DateTime<Utc>) -> CandidateEligibilityStatus {
        match &self.block {
            Some(block) => block.status_at(now),
            None => CandidateEligibilityStatus::Active,
        }
    }

    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        self.block
            .as_ref()
            .map(|block| block.days_remaining(now))
            .unwrap_or(0)
    }

    pub fn offer(&self, offer_id: &OfferId) -> Option<&OfferRecord> {
        self.offers.iter().find(|offer| &offer.offer_id == offer_id)
    }

    pub(crate) fn offer_mut(&mut self, offer_id: &OfferId) -> Option<&mut OfferRecord> {
        self.offers
            .iter_mut()
            .find(|offer| &offer.offer_id == offer_id)
    }

    pub fn total_declines(&self) -> u32 {
        self.offers
            .iter()
            .filter(|offer| offer.status == OfferStatus::Declined)
            .count() as u32
    }

    /// Declined offers that still count toward the threshold: those answered after the
    /// most recent unblock.
    pub fn decline_window(&self) -> Vec<OfferRecord> {
        self.offers
            .iter()
            .filter(|offer| offer.status == OfferStatus::Declined)
            .filter(|offer| match (self.last_unblocked_at, offer.responded_at) {
                (Some(unblocked), Some(responded)) => responded > unblocked,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .cloned()
            .collect()
    }

    pub fn qualifying_declines(&self) -> u32 {
        self.decline_window()
            .iter()
            .filter(|offer| offer.is_qualifying_decline())
            .count() as u32
    }
}

/// Storage abstraction so the store and service can be exercised in isolation.
pub trait CandidateRepository: Send + Sync {
    fn insert(&self, record: CandidateRecord) -> Result<CandidateRecord, RepositoryError>;
    /// Replace the stored record if its version still matches `record.version`.
    fn update(&self, record: CandidateRecord) -> Result<CandidateRecord, RepositoryError>;
    fn fetch(&self, id: &CandidateId) -> Result<Option<CandidateRecord>, RepositoryError>;
    fn list(&self) -> Result<Vec<CandidateRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed concurrently (expected version {expected}, found {found})")]
    VersionConflict { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Process-local repository keyed by candidate id.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCandidateRepository {
    records: Arc<Mutex<BTreeMap<CandidateId, CandidateRecord>>>,
}

impl InMemoryCandidateRepository {
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<CandidateId, CandidateRecord>>, RepositoryError>
    {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl CandidateRepository for InMemoryCandidateRepository {
    fn insert(&self, record: CandidateRecord) -> Result<CandidateRecord, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(record.candidate_id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.candidate_id().clone(), record.clone());
        Ok(record)
    }

    fn update(&self, mut record: CandidateRecord) -> Result<CandidateRecord, RepositoryError> {
        let mut guard = self.lock()?;
        let stored = guard
            .get(record.candidate_id())
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != record.version {
            return Err(RepositoryError::VersionConflict {
                expected: record.version,
                found: stored.version,
            });
        }
        record.version += 1;
        guard.insert(record.candidate_id().clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &CandidateId) -> Result<Option<CandidateRecord>, RepositoryError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<CandidateRecord>, RepositoryError> {
        Ok(self.lock()?.values().cloned().collect())
    }
}

/// Materialize a directive into a block record starting at `now`.
pub(crate) fn build_block(
    directive: &BlockDirective,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<BlockRecord, EligibilityError> {
    let reason = directive.reason.trim();
    if reason.is_empty() {
        return Err(EligibilityError::EmptyReason);
    }

    Ok(BlockRecord {
        reason: reason.to_string(),
        source: directive.source,
        duration: directive.duration,
        blocked_at: now,
        block_end: directive.duration.end_from(now)?,
        blocked_by: actor.to_string(),
    })
}

/// Error raised by block store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Eligibility(#[from] EligibilityError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Holds the single block record per candidate on top of a [`CandidateRepository`].
pub struct BlockRecordStore<R> {
    repository: Arc<R>,
}

impl<R> Clone for BlockRecordStore<R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
        }
    }
}

impl<R> BlockRecordStore<R>
where
    R: CandidateRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Create or replace the candidate's block. Existing blocks are overwritten, not stacked.
    pub fn apply_block(
        &self,
        candidate_id: &CandidateId,
        directive: &BlockDirective,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<BlockRecord, StoreError> {
        let block = build_block(directive, actor, now)?;

        let (_, replaced) = self.mutate(candidate_id, |record| {
            Ok::<_, StoreError>(record.block.replace(block.clone()))
        })?;

        if let Some(previous) = replaced {
            debug!(
                candidate = %candidate_id,
                previous_end = %previous.block_end,
                "replaced existing block record"
            );
        }
        info!(
            candidate = %candidate_id,
            months = block.duration.months(),
            source = ?block.source,
            %actor,
            "candidate blocked"
        );

        Ok(block)
    }

    /// Clear the candidate's block. A candidate without a block is left untouched.
    pub fn remove_block(
        &self,
        candidate_id: &CandidateId,
        now: DateTime<Utc>,
    ) -> Result<Option<BlockRecord>, StoreError> {
        let record = self
            .repository
            .fetch(candidate_id)?
            .ok_or_else(|| EligibilityError::UnknownCandidate(candidate_id.clone()))?;
        if record.block.is_none() {
            debug!(candidate = %candidate_id, "remove_block on unblocked candidate ignored");
            return Ok(None);
        }

        let (_, removed) = self.mutate(candidate_id, |record| {
            let removed = record.block.take();
            if removed.is_some() {
                record.last_unblocked_at = Some(now);
            }
            Ok::<_, StoreError>(removed)
        })?;

        if removed.is_some() {
            info!(candidate = %candidate_id, "candidate unblocked");
        }
        Ok(removed)
    }

    /// Unknown candidates read as `active`.
    pub fn get_status(
        &self,
        candidate_id: &CandidateId,
        now: DateTime<Utc>,
    ) -> Result<CandidateEligibilityStatus, RepositoryError> {
        Ok(self
            .repository
            .fetch(candidate_id)?
            .map(|record| record.status_at(now))
            .unwrap_or(CandidateEligibilityStatus::Active))
    }

    pub fn days_remaining(
        &self,
        candidate_id: &CandidateId,
        now: DateTime<Utc>,
    ) -> Result<i64, RepositoryError> {
        Ok(self
            .repository
            .fetch(candidate_id)?
            .map(|record| record.days_remaining(now))
            .unwrap_or(0))
    }

    /// Read-modify-write with compare-and-swap retries. The closure may run more than once.
    pub(crate) fn mutate<T, E>(
        &self,
        candidate_id: &CandidateId,
        mut apply: impl FnMut(&mut CandidateRecord) -> Result<T, E>,
    ) -> Result<(CandidateRecord, T), E>
    where
        E: From<RepositoryError> + From<EligibilityError>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut record = self
                .repository
                .fetch(candidate_id)?
                .ok_or_else(|| EligibilityError::UnknownCandidate(candidate_id.clone()))?;

            let output = apply(&mut record)?;

            match self.repository.update(record) {
                Ok(stored) => return Ok((stored, output)),
                Err(RepositoryError::VersionConflict { expected, found })
                    if attempt < MAX_WRITE_ATTEMPTS =>
                {
                    warn!(
                        candidate = %candidate_id,
                        expected,
                        found,
                        attempt,
                        "version conflict, retrying write"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
