//! Webhook payloads posted by the telephony provider
//!
//! Bodies are `application/x-www-form-urlencoded` with PascalCase fields.
//! Unknown fields are ignored.

use carebridge_core::models::CallStatus;
use serde::Deserialize;

/// Status callback (`POST /api/call-status`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusCallback {
    pub call_sid: String,
    pub call_status: String,
    #[serde(default)]
    pub call_duration: Option<String>,
}

impl StatusCallback {
    /// Provider status mapped onto the call lifecycle
    pub fn status(&self) -> Option<CallStatus> {
        map_call_status(&self.call_status)
    }

    /// Reported call length; absent or malformed values are ignored
    pub fn duration_secs(&self) -> Option<u32> {
        self.call_duration
            .as_deref()
            .and_then(|d| d.trim().parse().ok())
    }
}

/// Inbound call notification (`POST /api/incoming-call`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IncomingCallWebhook {
    #[serde(default)]
    pub call_sid: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

/// Map a provider `CallStatus` value onto [`CallStatus`]
///
/// `queued`/`initiated` → initiated, `ringing` → ringing, `in-progress` →
/// active, `completed` → completed, and `busy`/`failed`/`no-answer`/`canceled`
/// → failed. Anything else is unknown.
pub fn map_call_status(value: &str) -> Option<CallStatus> {
    match value.trim().to_ascii_lowercase().as_str() {
        "queued" | "initiated" => Some(CallStatus::Initiated),
        "ringing" => Some(CallStatus::Ringing),
        "answered" => Some(CallStatus::Answered),
        "in-progress" => Some(CallStatus::Active),
        "completed" => Some(CallStatus::Completed),
        "busy" | "failed" | "no-answer" | "canceled" => Some(CallStatus::Failed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_call_status("queued"), Some(CallStatus::Initiated));
        assert_eq!(map_call_status("ringing"), Some(CallStatus::Ringing));
        assert_eq!(map_call_status("in-progress"), Some(CallStatus::Active));
        assert_eq!(map_call_status("Completed"), Some(CallStatus::Completed));
        assert_eq!(map_call_status("no-answer"), Some(CallStatus::Failed));
        assert_eq!(map_call_status("busy"), Some(CallStatus::Failed));
        assert_eq!(map_call_status("paused"), None);
    }

    #[test]
    fn test_status_callback_from_json_fields() {
        let callback: StatusCallback = serde_json::from_str(
            r#"{"CallSid":"CA123","CallStatus":"completed","CallDuration":"42","AccountSid":"AC1"}"#,
        )
        .unwrap();

        assert_eq!(callback.call_sid, "CA123");
        assert_eq!(callback.status(), Some(CallStatus::Completed));
        assert_eq!(callback.duration_secs(), Some(42));
    }

    #[test]
    fn test_duration_missing_or_malformed() {
        let callback = StatusCallback {
            call_sid: "CA1".to_string(),
            call_status: "ringing".to_string(),
            call_duration: Some("n/a".to_string()),
        };
        assert_eq!(callback.duration_secs(), None);

        let callback = StatusCallback {
            call_duration: None,
            ..callback
        };
        assert_eq!(callback.duration_secs(), None);
    }
}
