use super::domain::CandidateId;

/// Validation failures raised by the eligibility policy and block store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EligibilityError {
    #[error("block duration must be 3, 6 or 12 months (got {months})")]
    InvalidDuration { months: u32 },
    #[error("a blocking reason is required")]
    EmptyReason,
    #[error("unknown candidate {0}")]
    UnknownCandidate(CandidateId),
    #[error("block end date is out of range")]
    DateOutOfRange,
}
