//! Call DTOs
//!
//! Request and response types for call placement, answering and the
//! dashboard views.

use carebridge_core::models::{CallRecord, CallStatus, RoomSession};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Outbound call request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CallPatientRequest {
    #[validate(length(min = 1, max = 64, message = "patientId is required"))]
    pub patient_id: String,

    #[validate(length(min = 3, max = 32, message = "patientPhone is required"))]
    pub patient_phone: String,

    #[validate(length(min = 1, message = "providerId is required"))]
    pub provider_id: String,
}

/// Outbound call placed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallPatientResponse {
    pub success: bool,
    pub call_id: String,
    pub room_name: String,
}

/// Provider answers a waiting call
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnswerCallRequest {
    #[validate(length(min = 1, message = "callSid is required"))]
    pub call_sid: String,

    #[validate(length(min = 1, message = "providerId is required"))]
    pub provider_id: String,
}

/// Provider joins an active call
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinCallRequest {
    #[validate(length(min = 1, message = "callId is required"))]
    pub call_id: String,

    #[validate(length(min = 1, message = "providerId is required"))]
    pub provider_id: String,
}

/// Active call snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCallsResponse {
    pub calls: Vec<CallRecord>,
    pub room_sessions: Vec<RoomSession>,
}

/// Caller waiting in the holding queue
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingCallView {
    pub call_sid: String,
    pub room_name: String,
    pub caller_phone: String,
    pub status: CallStatus,
    pub created_at: DateTime<Utc>,
    pub wait_seconds: i64,
}

impl IncomingCallView {
    pub fn from_record(record: CallRecord, now: DateTime<Utc>) -> Self {
        let wait_seconds = record.wait_seconds(now);
        Self {
            call_sid: record.call_id,
            room_name: record.room_name,
            caller_phone: record.counterparty_phone,
            status: record.status,
            created_at: record.created_at,
            wait_seconds,
        }
    }
}

/// Room metadata of a call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRoomResponse {
    pub call_id: String,
    pub room_name: String,
    pub status: CallStatus,
    pub patient_phone: String,
    pub ws_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_patient_request_validation() {
        let valid: CallPatientRequest = serde_json::from_str(
            r#"{"patientId":"p42","patientPhone":"+15550001","providerId":"P1"}"#,
        )
        .unwrap();
        assert!(valid.validate().is_ok());

        let invalid = CallPatientRequest {
            patient_phone: String::new(),
            ..valid
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_incoming_call_view_wait_time() {
        let record = CallRecord::inbound("CA1", "incoming-CA1", "+1555");
        let now = record.created_at + chrono::Duration::seconds(42);

        let view = IncomingCallView::from_record(record, now);
        assert_eq!(view.wait_seconds, 42);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["callSid"], "CA1");
        assert_eq!(json["waitSeconds"], 42);
        assert_eq!(json["status"], "ringing");
    }
}
