use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::eligibility::activity::{ActivityError, ActivityEvent, ActivityPublisher};
use crate::workflows::eligibility::domain::{
    BlockDuration, BlockRecord, BlockSource, Candidate, CandidateExpectations, CandidateId,
    OfferId, OfferRecord, OfferStatus,
};
use crate::workflows::eligibility::offers::OfferDraft;
use crate::workflows::eligibility::policy::{BlockDirective, PolicyConfig};
use crate::workflows::eligibility::store::{
    CandidateRecord, CandidateRepository, InMemoryCandidateRepository, RepositoryError,
};
use crate::workflows::eligibility::{eligibility_router, EligibilityService};
use crate::workflows::selections::CandidateSelection;

pub(super) const ACTOR: &str = "Priya (HR)";

pub(super) fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn id(code: &str) -> CandidateId {
    CandidateId(code.to_string())
}

pub(super) fn candidate(code: &str) -> Candidate {
    Candidate {
        candidate_id: id(code),
        name: format!("Candidate {code}"),
        email: format!("{}@example.com", code.to_ascii_lowercase()),
        phone: None,
    }
}

pub(super) fn expectations() -> CandidateExpectations {
    CandidateExpectations {
        expected_salary: 90_000,
        preferred_location: "Bengaluru".to_string(),
    }
}

pub(super) fn record(code: &str) -> CandidateRecord {
    CandidateRecord::new(candidate(code)).with_expectations(expectations())
}

pub(super) fn selection(code: &str) -> CandidateSelection {
    CandidateSelection {
        selection_id: format!("sel-{}", code.to_ascii_lowercase()),
        candidate: candidate(code),
        recruiter: "Arjun".to_string(),
        job_title: "Backend Engineer".to_string(),
        job_description: Some("Payments platform APIs".to_string()),
        job_location: Some("Bengaluru".to_string()),
        proposed_salary: Some(95_000),
        expectations: Some(expectations()),
        selected_on: Some(date(2024, 1, 2)),
    }
}

pub(super) fn offer(suffix: &str, offered_salary: u32, location: &str) -> OfferRecord {
    OfferRecord {
        offer_id: OfferId(format!("offer-{suffix}")),
        job_title: "Backend Engineer".to_string(),
        offered_salary,
        expected_salary: 90_000,
        location: location.to_string(),
        preferred_location: "Bengaluru".to_string(),
        status: OfferStatus::Pending,
        decline_count: 0,
        created_at: at(2024, 1, 2),
        responded_at: None,
    }
}

pub(super) fn declined(mut offer: OfferRecord, responded_at: DateTime<Utc>) -> OfferRecord {
    offer.status = OfferStatus::Declined;
    offer.responded_at = Some(responded_at);
    offer
}

pub(super) fn manual_directive(reason: &str, duration: BlockDuration) -> BlockDirective {
    BlockDirective {
        reason: reason.to_string(),
        duration,
        source: BlockSource::Manual,
    }
}

pub(super) fn block(blocked_at: DateTime<Utc>, duration: BlockDuration) -> BlockRecord {
    BlockRecord {
        reason: "Repeated no-shows".to_string(),
        source: BlockSource::Manual,
        duration,
        blocked_at,
        block_end: duration.end_from(blocked_at).expect("in range"),
        blocked_by: ACTOR.to_string(),
    }
}

pub(super) fn blocked_record(
    code: &str,
    blocked_at: DateTime<Utc>,
    duration: BlockDuration,
) -> CandidateRecord {
    let mut record = record(code);
    record.block = Some(block(blocked_at, duration));
    record
}

pub(super) fn draft(code: &str, offered_salary: u32, location: &str, today: NaiveDate) -> OfferDraft {
    OfferDraft {
        candidate_code: code.to_string(),
        candidate_selection_id: format!("sel-{}", code.to_ascii_lowercase()),
        job_title: "Backend Engineer".to_string(),
        job_description: "Payments platform APIs".to_string(),
        offered_salary: Some(offered_salary),
        location: location.to_string(),
        benefits: vec!["Health insurance".to_string()],
        start_date: today.checked_add_days(chrono::Days::new(30)),
        offer_deadline: today.checked_add_days(chrono::Days::new(7)),
        offer_notes: "Shared over call".to_string(),
    }
}

pub(super) type MemoryService = EligibilityService<InMemoryCandidateRepository, MemoryActivity>;

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryCandidateRepository>,
    Arc<MemoryActivity>,
) {
    let repository = Arc::new(InMemoryCandidateRepository::default());
    let activity = Arc::new(MemoryActivity::default());
    let service =
        EligibilityService::new(repository.clone(), activity.clone(), PolicyConfig::default());
    (service, repository, activity)
}

pub(super) fn seeded_service(
    codes: &[&str],
) -> (
    MemoryService,
    Arc<InMemoryCandidateRepository>,
    Arc<MemoryActivity>,
) {
    let (service, repository, activity) = build_service();
    for code in codes {
        repository.insert(record(code)).expect("seed candidate");
    }
    (service, repository, activity)
}

#[derive(Default, Clone)]
pub(super) struct MemoryActivity {
    events: Arc<Mutex<Vec<ActivityEvent>>>,
}

impl MemoryActivity {
    pub(super) fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().expect("activity mutex poisoned").clone()
    }
}

impl ActivityPublisher for MemoryActivity {
    fn publish(&self, event: ActivityEvent) -> Result<(), ActivityError> {
        self.events
            .lock()
            .expect("activity mutex poisoned")
            .push(event);
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<ActivityEvent>, ActivityError> {
        let guard = self.events.lock().expect("activity mutex poisoned");
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

pub(super) struct OfflineActivity;

impl ActivityPublisher for OfflineActivity {
    fn publish(&self, _event: ActivityEvent) -> Result<(), ActivityError> {
        Err(ActivityError::Unavailable("feed offline".to_string()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<ActivityEvent>, ActivityError> {
        Err(ActivityError::Unavailable("feed offline".to_string()))
    }
}

/// Delegates to an in-memory repository but rejects the first `conflicts` updates as if
/// another writer got there first.
pub(super) struct ConflictingRepository {
    pub(super) inner: InMemoryCandidateRepository,
    remaining: AtomicUsize,
    pub(super) update_calls: AtomicUsize,
}

impl ConflictingRepository {
    pub(super) fn new(conflicts: usize) -> Self {
        Self {
            inner: InMemoryCandidateRepository::default(),
            remaining: AtomicUsize::new(conflicts),
            update_calls: AtomicUsize::new(0),
        }
    }
}

impl CandidateRepository for ConflictingRepository {
    fn insert(&self, record: CandidateRecord) -> Result<CandidateRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, record: CandidateRecord) -> Result<CandidateRecord, RepositoryError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let conflict = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if conflict {
            return Err(RepositoryError::VersionConflict {
                expected: record.version,
                found: record.version + 1,
            });
        }
        self.inner.update(record)
    }

    fn fetch(&self, id: &CandidateId) -> Result<Option<CandidateRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn list(&self) -> Result<Vec<CandidateRecord>, RepositoryError> {
        self.inner.list()
    }
}

pub(super) struct UnavailableRepository;

impl CandidateRepository for UnavailableRepository {
    fn insert(&self, _record: CandidateRecord) -> Result<CandidateRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: CandidateRecord) -> Result<CandidateRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &CandidateId) -> Result<Option<CandidateRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<CandidateRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    eligibility_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
