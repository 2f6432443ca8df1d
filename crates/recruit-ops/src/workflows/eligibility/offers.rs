use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{OfferId, OfferRecord, OfferStatus};
use super::store::CandidateRecord;
use crate::workflows::selections::CandidateSelection;

static OFFER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_offer_id() -> OfferId {
    let id = OFFER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    OfferId(format!("offer-{id:06}"))
}

/// Offer-creation form as submitted by the internal team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferDraft {
    #[serde(default)]
    pub candidate_code: String,
    #[serde(default)]
    pub candidate_selection_id: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub offered_salary: Option<u32>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub offer_deadline: Option<NaiveDate>,
    #[serde(default)]
    pub offer_notes: String,
}

impl OfferDraft {
    /// Pre-fill the form from a candidate selection notification.
    pub fn prefill(selection: &CandidateSelection) -> Self {
        Self {
            candidate_code: selection.candidate.candidate_id.0.clone(),
            candidate_selection_id: selection.selection_id.clone(),
            job_title: selection.job_title.clone(),
            job_description: selection.job_description.clone().unwrap_or_default(),
            offered_salary: selection.proposed_salary,
            location: selection.job_location.clone().unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Required-field checks run before the eligibility core sees the offer.
    pub fn validate(&self, today: NaiveDate) -> Result<ValidatedOffer, OfferValidationError> {
        let mut issues = Vec::new();

        let required = [
            ("candidate_code", &self.candidate_code),
            ("candidate_selection_id", &self.candidate_selection_id),
            ("job_title", &self.job_title),
            ("job_description", &self.job_description),
            ("location", &self.location),
            ("offer_notes", &self.offer_notes),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                issues.push(OfferIssue::MissingField(field));
            }
        }

        match self.offered_salary {
            None => issues.push(OfferIssue::MissingField("offered_salary")),
            Some(0) => issues.push(OfferIssue::NonPositiveSalary),
            Some(_) => {}
        }

        for (field, date) in [
            ("start_date", self.start_date),
            ("offer_deadline", self.offer_deadline),
        ] {
            match date {
                None => issues.push(OfferIssue::MissingField(field)),
                Some(date) if date < today => issues.push(OfferIssue::DateInPast { field, date }),
                Some(_) => {}
            }
        }

        let benefits: Vec<String> = self
            .benefits
            .iter()
            .map(|benefit| benefit.trim())
            .filter(|benefit| !benefit.is_empty())
            .map(str::to_string)
            .collect();
        if benefits.is_empty() {
            issues.push(OfferIssue::NoBenefits);
        }

        match (self.offered_salary, self.start_date, self.offer_deadline) {
            (Some(offered_salary), Some(start_date), Some(offer_deadline)) if issues.is_empty() => {
                Ok(ValidatedOffer {
                    candidate_code: self.candidate_code.trim().to_string(),
                    candidate_selection_id: self.candidate_selection_id.trim().to_string(),
                    job_title: self.job_title.trim().to_string(),
                    job_description: self.job_description.trim().to_string(),
                    offered_salary,
                    location: self.location.trim().to_string(),
                    benefits,
                    start_date,
                    offer_deadline,
                    offer_notes: self.offer_notes.trim().to_string(),
                })
            }
            _ => Err(OfferValidationError { issues }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedOffer {
    pub candidate_code: String,
    pub candidate_selection_id: String,
    pub job_title: String,
    pub job_description: String,
    pub offered_salary: u32,
    pub location: String,
    pub benefits: Vec<String>,
    pub start_date: NaiveDate,
    pub offer_deadline: NaiveDate,
    pub offer_notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum OfferIssue {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("offered_salary must be a positive amount")]
    NonPositiveSalary,
    #[error("{field} {date} is in the past")]
    DateInPast { field: &'static str, date: NaiveDate },
    #[error("at least one benefit must be selected")]
    NoBenefits,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid offer: {}", .issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct OfferValidationError {
    pub issues: Vec<OfferIssue>,
}

/// Candidate's answer to a pending offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferResponse {
    Accepted,
    Declined,
    Expired,
}

impl OfferResponse {
    pub const fn status(self) -> OfferStatus {
        match self {
            Self::Accepted => OfferStatus::Accepted,
            Self::Declined => OfferStatus::Declined,
            Self::Expired => OfferStatus::Expired,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OfferTransitionError {
    #[error("unknown offer {0}")]
    UnknownOffer(OfferId),
    #[error("offer {offer_id} is {}, only pending offers can be answered", .status.label())]
    NotPending { offer_id: OfferId, status: OfferStatus },
}

/// Build the pending offer record, using the candidate's stated expectations when known.
pub(crate) fn pending_offer(
    record: &CandidateRecord,
    offer: &ValidatedOffer,
    now: DateTime<Utc>,
) -> OfferRecord {
    let (expected_salary, preferred_location) = match &record.expectations {
        Some(expectations) => (
            expectations.expected_salary,
            expectations.preferred_location.clone(),
        ),
        None => (offer.offered_salary, offer.location.clone()),
    };

    OfferRecord {
        offer_id: next_offer_id(),
        job_title: offer.job_title.clone(),
        offered_salary: offer.offered_salary,
        expected_salary,
        location: offer.location.clone(),
        preferred_location,
        status: OfferStatus::Pending,
        decline_count: record.total_declines(),
        created_at: now,
        responded_at: None,
    }
}

/// Move a pending offer to its answered state. Declines bump the running tally by one.
pub(crate) fn respond(
    record: &mut CandidateRecord,
    offer_id: &OfferId,
    response: OfferResponse,
    now: DateTime<Utc>,
) -> Result<OfferRecord, OfferTransitionError> {
    let declines_so_far = record.total_declines();
    let offer = record
        .offer_mut(offer_id)
        .ok_or_else(|| OfferTransitionError::UnknownOffer(offer_id.clone()))?;

    if offer.status != OfferStatus::Pending {
        return Err(OfferTransitionError::NotPending {
            offer_id: offer_id.clone(),
            status: offer.status,
        });
    }

    offer.status = response.status();
    offer.responded_at = Some(now);
    if response == OfferResponse::Declined {
        offer.decline_count = declines_so_far + 1;
    }

    Ok(offer.clone())
}
