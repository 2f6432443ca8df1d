//! Internal team candidate eligibility: the block gate that keeps candidates who declined
//! too many qualifying offers, or failed screening, out of the offer pipeline for a fixed
//! window.
//!
//! [`EligibilityPolicy`] decides, [`BlockRecordStore`] persists one block per candidate,
//! and [`EligibilityService`] wires both to the activity feed and the page projections
//! served by [`eligibility_router`].

pub mod activity;
pub mod domain;
mod error;
pub mod offers;
pub mod policy;
pub mod projection;
pub mod router;
pub mod service;
pub mod store;
pub mod unblock;

#[cfg(test)]
mod tests;

pub use activity::{
    ActivityError, ActivityEvent, ActivityKind, ActivityPublisher, Communication,
    CommunicationChannel, InMemoryActivityLog,
};
pub use domain::{
    BlockDuration, BlockRecord, BlockSource, Candidate, CandidateEligibilityStatus,
    CandidateExpectations, CandidateId, OfferId, OfferRecord, OfferStatus, ScreeningBlockReason,
    ScreeningRecord, ScreeningResult,
};
pub use error::EligibilityError;
pub use offers::{
    OfferDraft, OfferIssue, OfferResponse, OfferTransitionError, OfferValidationError,
    ValidatedOffer,
};
pub use policy::{BlockDecision, BlockDirective, EligibilityPolicy, PolicyConfig};
pub use projection::{
    BadgeTone, BlockedCandidateRow, CandidateProjection, CandidateQuery, EligibilityDashboard,
    OfferManagementRow, ScreeningBlockingRow,
};
pub use router::{eligibility_router, ACTOR_HEADER};
pub use service::{
    EligibilityService, EligibilityServiceError, OfferOutcome, ScreeningBlockRequest,
    ScreeningOutcome,
};
pub use store::{
    BlockRecordStore, CandidateRecord, CandidateRepository, InMemoryCandidateRepository,
    RepositoryError, StoreError,
};
pub use unblock::{BulkUnblockReport, SkipReason, SkippedCandidate};
