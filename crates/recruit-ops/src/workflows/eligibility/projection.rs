//! Display projections shared by the BlockedCandidates, ScreeningBlocking and
//! OfferManagement pages. Every page row is built from [`CandidateProjection`] so the
//! three views cannot disagree about a candidate's status.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use super::domain::{
    BlockSource, CandidateEligibilityStatus, CandidateId, OfferId, OfferStatus, ScreeningResult,
};
use super::store::CandidateRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTone {
    Success,
    Danger,
    Warning,
    Info,
}

impl BadgeTone {
    pub const fn for_status(status: CandidateEligibilityStatus) -> Self {
        match status {
            CandidateEligibilityStatus::Active => Self::Success,
            CandidateEligibilityStatus::Blocked => Self::Danger,
            CandidateEligibilityStatus::ReadyForUnblock => Self::Warning,
            CandidateEligibilityStatus::UnderReview => Self::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateProjection {
    pub candidate_id: CandidateId,
    pub name: String,
    pub email: String,
    pub status: CandidateEligibilityStatus,
    pub status_label: &'static str,
    pub badge: BadgeTone,
    pub days_remaining: i64,
    pub days_remaining_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_source: Option<BlockSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<String>,
    pub total_declines: u32,
    pub qualifying_declines: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screening_result: Option<ScreeningResult>,
}

/// Pure projection of a candidate record at `now`.
pub fn project(record: &CandidateRecord, now: DateTime<Utc>) -> CandidateProjection {
    let status = match (&record.block, &record.screening) {
        (Some(block), _) => block.status_at(now),
        (None, Some(screening)) if screening.result == ScreeningResult::Pending => {
            CandidateEligibilityStatus::UnderReview
        }
        (None, _) => CandidateEligibilityStatus::Active,
    };
    let days_remaining = record.days_remaining(now);
    let block = record.block.as_ref();

    CandidateProjection {
        candidate_id: record.candidate.candidate_id.clone(),
        name: record.candidate.name.clone(),
        email: record.candidate.email.clone(),
        status,
        status_label: status.label(),
        badge: BadgeTone::for_status(status),
        days_remaining,
        days_remaining_text: days_remaining_text(status, days_remaining),
        blocking_reason: block.map(|block| block.reason.clone()),
        block_source: block.map(|block| block.source),
        blocked_at: block.map(|block| block.blocked_at),
        block_end: block.map(|block| block.block_end),
        blocked_by: block.map(|block| block.blocked_by.clone()),
        total_declines: record.total_declines(),
        qualifying_declines: record.qualifying_declines(),
        screening_result: record.screening.as_ref().map(|screening| screening.result),
    }
}

fn days_remaining_text(status: CandidateEligibilityStatus, days: i64) -> String {
    match status {
        CandidateEligibilityStatus::Blocked if days == 1 => "Blocked for 1 more day".to_string(),
        CandidateEligibilityStatus::Blocked => format!("Blocked for {days} more days"),
        CandidateEligibilityStatus::ReadyForUnblock => "Ready for unblock".to_string(),
        CandidateEligibilityStatus::UnderReview => "Awaiting screening result".to_string(),
        CandidateEligibilityStatus::Active => "Active".to_string(),
    }
}

/// Explicit filter for list operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CandidateQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "status_filter")]
    pub status: Option<CandidateEligibilityStatus>,
}

/// Accepts `ready_for_unblock`, `ready-for-unblock` or any casing; blank means no filter.
fn status_filter<'de, D>(deserializer: D) -> Result<Option<CandidateEligibilityStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => CandidateEligibilityStatus::parse(value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("unknown candidate status '{value}'"))),
    }
}

impl CandidateQuery {
    pub fn matches(&self, projection: &CandidateProjection) -> bool {
        if let Some(status) = self.status {
            if projection.status != status {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                projection.candidate_id.0.to_lowercase().contains(&term)
                    || projection.name.to_lowercase().contains(&term)
                    || projection.email.to_lowercase().contains(&term)
            }
        }
    }
}

/// Row on the BlockedCandidates page.
#[derive(Debug, Clone, Serialize)]
pub struct BlockedCandidateRow {
    pub candidate_id: CandidateId,
    pub name: String,
    pub status: CandidateEligibilityStatus,
    pub status_label: &'static str,
    pub badge: BadgeTone,
    pub reason: String,
    pub source_label: &'static str,
    pub blocked_at: DateTime<Utc>,
    pub block_end: DateTime<Utc>,
    pub days_remaining: i64,
    pub days_remaining_text: String,
    pub can_unblock: bool,
}

impl BlockedCandidateRow {
    /// `None` for candidates without a block record.
    pub fn from_projection(projection: &CandidateProjection) -> Option<Self> {
        Some(Self {
            candidate_id: projection.candidate_id.clone(),
            name: projection.name.clone(),
            status: projection.status,
            status_label: projection.status_label,
            badge: projection.badge,
            reason: projection.blocking_reason.clone()?,
            source_label: projection.block_source?.label(),
            blocked_at: projection.blocked_at?,
            block_end: projection.block_end?,
            days_remaining: projection.days_remaining,
            days_remaining_text: projection.days_remaining_text.clone(),
            can_unblock: projection.status == CandidateEligibilityStatus::ReadyForUnblock,
        })
    }
}

/// Row on the ScreeningBlocking page.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningBlockingRow {
    pub candidate_id: CandidateId,
    pub name: String,
    pub screening_result: Option<ScreeningResult>,
    pub screening_label: &'static str,
    pub status: CandidateEligibilityStatus,
    pub status_label: &'static str,
    pub badge: BadgeTone,
    pub blocking_reason: Option<String>,
    pub days_remaining_text: String,
}

impl ScreeningBlockingRow {
    pub fn from_projection(projection: &CandidateProjection) -> Self {
        Self {
            candidate_id: projection.candidate_id.clone(),
            name: projection.name.clone(),
            screening_result: projection.screening_result,
            screening_label: projection
                .screening_result
                .map(ScreeningResult::label)
                .unwrap_or("Not screened"),
            status: projection.status,
            status_label: projection.status_label,
            badge: projection.badge,
            blocking_reason: projection.blocking_reason.clone(),
            days_remaining_text: projection.days_remaining_text.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferLine {
    pub offer_id: OfferId,
    pub job_title: String,
    pub offered_salary: u32,
    pub expected_salary: u32,
    pub location: String,
    pub preferred_location: String,
    pub status: OfferStatus,
    pub status_label: &'static str,
    pub decline_count: u32,
    /// Whether a decline of this offer counts toward the block threshold.
    pub qualifying: bool,
}

/// Row on the OfferManagement page.
#[derive(Debug, Clone, Serialize)]
pub struct OfferManagementRow {
    pub candidate_id: CandidateId,
    pub name: String,
    pub status: CandidateEligibilityStatus,
    pub status_label: &'static str,
    pub badge: BadgeTone,
    pub total_declines: u32,
    pub qualifying_declines: u32,
    pub blocking_reason: Option<String>,
    pub can_receive_offers: bool,
    pub offers: Vec<OfferLine>,
}

impl OfferManagementRow {
    pub fn from_projection(projection: &CandidateProjection, record: &CandidateRecord) -> Self {
        let offers = record
            .offers
            .iter()
            .map(|offer| OfferLine {
                offer_id: offer.offer_id.clone(),
                job_title: offer.job_title.clone(),
                offered_salary: offer.offered_salary,
                expected_salary: offer.expected_salary,
                location: offer.location.clone(),
                preferred_location: offer.preferred_location.clone(),
                status: offer.status,
                status_label: offer.status.label(),
                decline_count: offer.decline_count,
                qualifying: offer.is_qualifying(),
            })
            .collect();

        Self {
            candidate_id: projection.candidate_id.clone(),
            name: projection.name.clone(),
            status: projection.status,
            status_label: projection.status_label,
            badge: projection.badge,
            total_declines: projection.total_declines,
            qualifying_declines: projection.qualifying_declines,
            blocking_reason: projection.blocking_reason.clone(),
            can_receive_offers: can_receive_offers(projection.status),
            offers,
        }
    }
}

pub(crate) fn can_receive_offers(status: CandidateEligibilityStatus) -> bool {
    matches!(
        status,
        CandidateEligibilityStatus::Active | CandidateEligibilityStatus::UnderReview
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: CandidateEligibilityStatus,
    pub label: &'static str,
    pub count: usize,
}

/// Stat-card totals for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityDashboard {
    pub total_candidates: usize,
    pub by_status: Vec<StatusCount>,
}

impl EligibilityDashboard {
    pub fn from_projections(projections: &[CandidateProjection]) -> Self {
        let by_status = CandidateEligibilityStatus::ordered()
            .into_iter()
            .map(|status| StatusCount {
                status,
                label: status.label(),
                count: projections
                    .iter()
                    .filter(|projection| projection.status == status)
                    .count(),
            })
            .collect();

        Self {
            total_candidates: projections.len(),
            by_status,
        }
    }

    pub fn count(&self, status: CandidateEligibilityStatus) -> usize {
        self.by_status
            .iter()
            .find(|entry| entry.status == status)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }
}
