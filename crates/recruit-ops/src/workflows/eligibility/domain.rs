use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::EligibilityError;

/// Stable external candidate code (e.g. `CAND-0042`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for offers extended to a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferId(pub String);

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Candidate identity as received from the selection flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub candidate_id: CandidateId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Terms the candidate asked for during selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateExpectations {
    pub expected_salary: u32,
    pub preferred_location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl OfferStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Declined => "Declined",
            Self::Expired => "Expired",
        }
    }
}

/// Offer extended to a candidate together with the terms they asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferRecord {
    pub offer_id: OfferId,
    pub job_title: String,
    pub offered_salary: u32,
    pub expected_salary: u32,
    pub location: String,
    pub preferred_location: String,
    pub status: OfferStatus,
    /// Candidate's running decline tally, stamped when this offer was declined.
    pub decline_count: u32,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl OfferRecord {
    pub fn meets_salary_expectation(&self) -> bool {
        self.offered_salary >= self.expected_salary
    }

    pub fn matches_preferred_location(&self) -> bool {
        self.location
            .trim()
            .eq_ignore_ascii_case(self.preferred_location.trim())
    }

    /// A decline only counts toward blocking when the offer met both requirements.
    pub fn is_qualifying(&self) -> bool {
        self.meets_salary_expectation() && self.matches_preferred_location()
    }

    pub fn is_qualifying_decline(&self) -> bool {
        self.status == OfferStatus::Declined && self.is_qualifying()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningResult {
    Passed,
    Failed,
    Pending,
}

impl ScreeningResult {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "Passed",
            Self::Failed => "Failed",
            Self::Pending => "Pending",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningRecord {
    pub result: ScreeningResult,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Fixed set of reasons HR can pick from when a screening or interview fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningBlockReason {
    FailedTechnicalAssessment,
    FailedBackgroundVerification,
    FailedCommunicationAssessment,
    MissingMinimumQualifications,
    InconsistentInformation,
    NoShowForInterview,
}

impl ScreeningBlockReason {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::FailedTechnicalAssessment,
            Self::FailedBackgroundVerification,
            Self::FailedCommunicationAssessment,
            Self::MissingMinimumQualifications,
            Self::InconsistentInformation,
            Self::NoShowForInterview,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FailedTechnicalAssessment => "Failed technical assessment",
            Self::FailedBackgroundVerification => "Failed background verification",
            Self::FailedCommunicationAssessment => "Failed communication skills assessment",
            Self::MissingMinimumQualifications => "Did not meet minimum qualifications",
            Self::InconsistentInformation => "Provided inconsistent information during screening",
            Self::NoShowForInterview => "Did not attend scheduled interview",
        }
    }
}

/// Allowed block windows. Anything else is rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BlockDuration {
    ThreeMonths,
    SixMonths,
    TwelveMonths,
}

impl BlockDuration {
    pub const fn ordered() -> [Self; 3] {
        [Self::ThreeMonths, Self::SixMonths, Self::TwelveMonths]
    }

    pub fn from_months(months: u32) -> Result<Self, EligibilityError> {
        match months {
            3 => Ok(Self::ThreeMonths),
            6 => Ok(Self::SixMonths),
            12 => Ok(Self::TwelveMonths),
            other => Err(EligibilityError::InvalidDuration { months: other }),
        }
    }

    pub const fn months(self) -> u32 {
        match self {
            Self::ThreeMonths => 3,
            Self::SixMonths => 6,
            Self::TwelveMonths => 12,
        }
    }

    /// Calendar-month addition; day-of-month is clamped to the target month's end.
    pub fn end_from(self, start: DateTime<Utc>) -> Result<DateTime<Utc>, EligibilityError> {
        start
            .checked_add_months(Months::new(self.months()))
            .ok_or(EligibilityError::DateOutOfRange)
    }
}

impl TryFrom<u32> for BlockDuration {
    type Error = EligibilityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_months(value)
    }
}

impl From<BlockDuration> for u32 {
    fn from(value: BlockDuration) -> Self {
        value.months()
    }
}

/// Which trigger produced a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockSource {
    OfferDeclines,
    ScreeningFailure,
    Manual,
}

impl BlockSource {
    pub const fn label(self) -> &'static str {
        match self {
            Self::OfferDeclines => "Offer declines",
            Self::ScreeningFailure => "Screening failure",
            Self::Manual => "Manual block",
        }
    }
}

/// The eligibility gate. A candidate holds at most one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub reason: String,
    pub source: BlockSource,
    pub duration: BlockDuration,
    pub blocked_at: DateTime<Utc>,
    pub block_end: DateTime<Utc>,
    pub blocked_by: String,
}

impl BlockRecord {
    pub fn status_at(&self, now: DateTime<Utc>) -> CandidateEligibilityStatus {
        if now < self.block_end {
            CandidateEligibilityStatus::Blocked
        } else {
            CandidateEligibilityStatus::ReadyForUnblock
        }
    }

    /// Whole days left, rounded up; zero once the window has elapsed.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        let remaining = self.block_end - now;
        if remaining <= chrono::Duration::zero() {
            return 0;
        }

        const DAY_MS: i64 = 86_400_000;
        ((remaining.num_milliseconds() + DAY_MS - 1) / DAY_MS).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateEligibilityStatus {
    Active,
    Blocked,
    ReadyForUnblock,
    UnderReview,
}

impl CandidateEligibilityStatus {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Active,
            Self::UnderReview,
            Self::Blocked,
            Self::ReadyForUnblock,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Blocked => "Blocked",
            Self::ReadyForUnblock => "Ready for Unblock",
            Self::UnderReview => "Under Review",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "active" => Some(Self::Active),
            "blocked" => Some(Self::Blocked),
            "ready_for_unblock" => Some(Self::ReadyForUnblock),
            "under_review" => Some(Self::UnderReview),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn record(blocked_at: DateTime<Utc>, duration: BlockDuration) -> BlockRecord {
        BlockRecord {
            reason: "Declined 2 job offers that met salary and location requirements".to_string(),
            source: BlockSource::OfferDeclines,
            duration,
            blocked_at,
            block_end: duration.end_from(blocked_at).expect("in range"),
            blocked_by: "hr.lead".to_string(),
        }
    }

    #[test]
    fn block_duration_rejects_values_outside_allowed_set() {
        for months in [0, 1, 4, 5, 7, 11, 13, 24] {
            match BlockDuration::from_months(months) {
                Err(EligibilityError::InvalidDuration { months: rejected }) => {
                    assert_eq!(rejected, months)
                }
                other => panic!("expected invalid duration for {months}, got {other:?}"),
            }
        }
        for duration in BlockDuration::ordered() {
            assert_eq!(
                BlockDuration::from_months(duration.months()).expect("allowed"),
                duration
            );
        }
    }

    #[test]
    fn six_month_block_from_mid_january_ends_mid_july() {
        let block = record(at(2024, 1, 15), BlockDuration::SixMonths);
        assert_eq!(block.block_end, at(2024, 7, 15));

        assert_eq!(
            block.status_at(at(2024, 7, 14)),
            CandidateEligibilityStatus::Blocked
        );
        assert_eq!(block.days_remaining(at(2024, 7, 14)), 1);
        assert_eq!(
            block.status_at(at(2024, 7, 15)),
            CandidateEligibilityStatus::ReadyForUnblock
        );
        assert_eq!(block.days_remaining(at(2024, 7, 15)), 0);
        assert_eq!(block.days_remaining(at(2024, 9, 1)), 0);
    }

    #[test]
    fn month_addition_clamps_to_month_end() {
        let end = BlockDuration::ThreeMonths
            .end_from(at(2023, 11, 30))
            .expect("in range");
        assert_eq!(end, at(2024, 2, 29));
    }

    #[test]
    fn days_remaining_rounds_partial_days_up() {
        let block = record(at(2024, 1, 15), BlockDuration::ThreeMonths);
        let now = at(2024, 4, 13) + chrono::Duration::hours(1);
        assert_eq!(block.days_remaining(now), 2);
    }

    #[test]
    fn status_transitions_exactly_at_block_end() {
        let block = record(at(2024, 3, 1), BlockDuration::TwelveMonths);
        let boundary = block.block_end;
        assert_eq!(
            block.status_at(boundary - chrono::Duration::seconds(1)),
            CandidateEligibilityStatus::Blocked
        );
        assert_eq!(
            block.status_at(boundary),
            CandidateEligibilityStatus::ReadyForUnblock
        );
        assert_eq!(
            block.status_at(boundary + chrono::Duration::days(30)),
            CandidateEligibilityStatus::ReadyForUnblock
        );
    }

    #[test]
    fn qualifying_offer_requires_salary_and_location() {
        let mut offer = OfferRecord {
            offer_id: OfferId("offer-1".to_string()),
            job_title: "Backend Engineer".to_string(),
            offered_salary: 95_000,
            expected_salary: 90_000,
            location: " Bengaluru ".to_string(),
            preferred_location: "bengaluru".to_string(),
            status: OfferStatus::Declined,
            decline_count: 1,
            created_at: at(2024, 1, 2),
            responded_at: Some(at(2024, 1, 5)),
        };
        assert!(offer.is_qualifying_decline());

        offer.offered_salary = 85_000;
        assert!(!offer.is_qualifying());

        offer.offered_salary = 90_000;
        offer.location = "Pune".to_string();
        assert!(!offer.is_qualifying());
    }

    #[test]
    fn status_parse_accepts_kebab_and_snake_case() {
        assert_eq!(
            CandidateEligibilityStatus::parse("ready-for-unblock"),
            Some(CandidateEligibilityStatus::ReadyForUnblock)
        );
        assert_eq!(
            CandidateEligibilityStatus::parse(" Under_Review "),
            Some(CandidateEligibilityStatus::UnderReview)
        );
        assert_eq!(CandidateEligibilityStatus::parse("archived"), None);
    }
}
