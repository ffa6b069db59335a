//! Room and participant naming
//!
//! Names are derived deterministically from identifiers plus a timestamp;
//! they are unique only as long as those inputs are.

use chrono::{DateTime, Utc};

pub const INBOUND_ROOM_PREFIX: &str = "incoming-";
pub const OUTBOUND_ROOM_PREFIX: &str = "call-";

/// Room for an inbound call: `incoming-<callId>`
pub fn inbound_room_name(call_id: &str) -> String {
    format!("{}{}", INBOUND_ROOM_PREFIX, call_id)
}

/// Room for an outbound call: `call-<patientId>-<unix millis>`
pub fn outbound_room_name(patient_id: &str, at: DateTime<Utc>) -> String {
    format!("{}{}-{}", OUTBOUND_ROOM_PREFIX, patient_id, at.timestamp_millis())
}

/// Participant identity of a healthcare provider
pub fn provider_identity(provider_id: &str) -> String {
    format!("provider-{}", provider_id)
}

/// SIP gateway address of a room
pub fn sip_uri(room_name: &str, sip_domain: &str) -> String {
    format!("sip:{}@{}", room_name, sip_domain)
}

/// Caller number encoded in a dispatch room name (`<prefix><digits>`)
///
/// A leading `+` is added when missing. Returns `None` when the room does
/// not carry the prefix or nothing follows it.
pub fn phone_from_room(room_name: &str, dispatch_prefix: &str) -> Option<String> {
    if dispatch_prefix.is_empty() {
        return None;
    }
    let number = room_name.strip_prefix(dispatch_prefix)?;
    if number.is_empty() {
        return None;
    }
    Some(if number.starts_with('+') {
        number.to_string()
    } else {
        format!("+{}", number)
    })
}
