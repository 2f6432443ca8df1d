use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::CandidateId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    CandidateBlocked,
    CandidateUnblocked,
    OfferCreated,
    OfferAccepted,
    OfferDeclined,
    OfferExpired,
    ScreeningRecorded,
    CommunicationLogged,
}

impl ActivityKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::CandidateBlocked => "Candidate blocked",
            Self::CandidateUnblocked => "Candidate unblocked",
            Self::OfferCreated => "Offer created",
            Self::OfferAccepted => "Offer accepted",
            Self::OfferDeclined => "Offer declined",
            Self::OfferExpired => "Offer expired",
            Self::ScreeningRecorded => "Screening recorded",
            Self::CommunicationLogged => "Communication logged",
        }
    }
}

/// Entry in the internal team activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub candidate_id: CandidateId,
    pub actor: String,
    pub occurred_at: DateTime<Utc>,
    pub summary: String,
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

impl ActivityEvent {
    pub fn new(
        kind: ActivityKind,
        candidate_id: CandidateId,
        actor: &str,
        occurred_at: DateTime<Utc>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            candidate_id,
            actor: actor.to_string(),
            occurred_at,
            summary: summary.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationChannel {
    Email,
    Phone,
    Sms,
    Meeting,
}

impl CommunicationChannel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::Sms => "SMS",
            Self::Meeting => "Meeting",
        }
    }
}

/// Communication with a candidate, logged by an internal team member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Communication {
    pub channel: CommunicationChannel,
    pub subject: String,
    #[serde(default)]
    pub notes: String,
}

/// Outbound hook for the activity feed.
pub trait ActivityPublisher: Send + Sync {
    fn publish(&self, event: ActivityEvent) -> Result<(), ActivityError>;
    /// Most recent events first.
    fn recent(&self, limit: usize) -> Result<Vec<ActivityEvent>, ActivityError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActivityError {
    #[error("activity feed unavailable: {0}")]
    Unavailable(String),
}

/// Bounded in-process feed; the oldest entries are dropped once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct InMemoryActivityLog {
    events: Arc<Mutex<VecDeque<ActivityEvent>>>,
    capacity: usize,
}

impl InMemoryActivityLog {
    pub const DEFAULT_CAPACITY: usize = 500;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }
}

impl Default for InMemoryActivityLog {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl ActivityPublisher for InMemoryActivityLog {
    fn publish(&self, event: ActivityEvent) -> Result<(), ActivityError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| ActivityError::Unavailable("activity mutex poisoned".to_string()))?;
        if guard.len() == self.capacity {
            guard.pop_front();
        }
        guard.push_back(event);
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<ActivityEvent>, ActivityError> {
        let guard = self
            .events
            .lock()
            .map_err(|_| ActivityError::Unavailable("activity mutex poisoned".to_string()))?;
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}
