//! Call record model
//!
//! A [`CallRecord`] tracks one phone-to-room bridging attempt from the moment
//! the call is placed or received until the telephony provider reports a
//! terminal status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a bridged call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    /// Outbound call accepted by the telephony provider
    #[default]
    Initiated,
    /// Phone is ringing / caller waiting for a provider
    Ringing,
    /// A provider picked up the call
    Answered,
    /// Media is flowing between the phone leg and the room
    Active,
    /// Call ended normally
    Completed,
    /// Call ended without being connected
    Failed,
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Initiated => "initiated",
            CallStatus::Ringing => "ringing",
            CallStatus::Answered => "answered",
            CallStatus::Active => "active",
            CallStatus::Completed => "completed",
            CallStatus::Failed => "failed",
        }
    }

    /// Whether the call has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallStatus::Completed | CallStatus::Failed)
    }

    /// Position in the forward-only lifecycle
    fn rank(&self) -> u8 {
        match self {
            CallStatus::Initiated => 0,
            CallStatus::Ringing => 1,
            CallStatus::Answered => 2,
            CallStatus::Active => 3,
            CallStatus::Completed | CallStatus::Failed => 4,
        }
    }

    /// Whether moving from `self` to `next` goes forward in the lifecycle
    ///
    /// Repeated and backward transitions return `false`, as does anything
    /// leaving a terminal state.
    pub fn can_advance_to(&self, next: CallStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

/// Which side placed the call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    Outbound,
    Inbound,
}

/// Local bookkeeping entry for one phone-to-room bridging attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    /// Telephony provider call identifier
    pub call_id: String,

    /// Room the phone leg is bridged into
    pub room_name: String,

    pub direction: CallDirection,

    /// External phone number (callee for outbound, caller for inbound)
    pub counterparty_phone: String,

    /// Patient the call was placed to (outbound only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,

    /// Healthcare worker handling the call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    pub status: CallStatus,

    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub answered_at: Option<DateTime<Utc>>,

    pub updated_at: DateTime<Utc>,

    /// Call length reported by the provider on completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
}

impl CallRecord {
    /// Outbound call placed by a provider to a patient
    pub fn outbound(
        call_id: impl Into<String>,
        room_name: impl Into<String>,
        patient_id: impl Into<String>,
        patient_phone: impl Into<String>,
        provider_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            call_id: call_id.into(),
            room_name: room_name.into(),
            direction: CallDirection::Outbound,
            counterparty_phone: patient_phone.into(),
            patient_id: Some(patient_id.into()),
            provider_id: Some(provider_id.into()),
            status: CallStatus::Initiated,
            created_at: now,
            answered_at: None,
            updated_at: now,
            duration_secs: None,
        }
    }

    /// Inbound call waiting in the holding queue
    pub fn inbound(
        call_id: impl Into<String>,
        room_name: impl Into<String>,
        caller_phone: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            call_id: call_id.into(),
            room_name: room_name.into(),
            direction: CallDirection::Inbound,
            counterparty_phone: caller_phone.into(),
            patient_id: None,
            provider_id: None,
            status: CallStatus::Ringing,
            created_at: now,
            answered_at: None,
            updated_at: now,
            duration_secs: None,
        }
    }

    /// Inbound call still waiting for a provider
    pub fn is_pending_inbound(&self) -> bool {
        self.direction == CallDirection::Inbound && self.status == CallStatus::Ringing
    }

    /// Whether this call belongs to the given patient
    ///
    /// Inbound calls carry no patient id, so the caller number is matched too.
    pub fn belongs_to_patient(&self, patient: &str) -> bool {
        self.patient_id.as_deref() == Some(patient) || self.counterparty_phone == patient
    }

    /// Seconds since the record was created
    pub fn wait_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_seconds().max(0)
    }

    /// Apply a status transition
    ///
    /// Returns `false` and leaves the record untouched when the transition
    /// does not move forward, or when an inbound call would be connected
    /// before a provider took it.
    pub fn apply(&mut self, update: &StatusUpdate) -> bool {
        if !self.status.can_advance_to(update.status) {
            return false;
        }
        if self.direction == CallDirection::Inbound
            && matches!(update.status, CallStatus::Answered | CallStatus::Active)
            && self.provider_id.is_none()
            && update.provider_id.is_none()
        {
            return false;
        }

        let now = Utc::now();
        if update.status == CallStatus::Answered && self.answered_at.is_none() {
            self.answered_at = Some(now);
        }
        if let Some(provider_id) = &update.provider_id {
            self.provider_id = Some(provider_id.clone());
        }
        if update.duration_secs.is_some() {
            self.duration_secs = update.duration_secs;
        }
        self.status = update.status;
        self.updated_at = now;
        true
    }
}

/// Status transition with the optional data that travels with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: CallStatus,
    pub provider_id: Option<String>,
    pub duration_secs: Option<u32>,
}

impl StatusUpdate {
    pub fn new(status: CallStatus) -> Self {
        Self {
            status,
            provider_id: None,
            duration_secs: None,
        }
    }

    pub fn with_provider(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    pub fn with_duration(mut self, duration_secs: Option<u32>) -> Self {
        self.duration_secs = duration_secs;
        self
    }
}

/// Provider joined a room directly (no call record owns the room)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSession {
    pub room_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub provider_id: String,
    pub joined_at: DateTime<Utc>,
}
