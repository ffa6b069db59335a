//! Store key constants and builders for CareBridge
//!
//! Provides standardized key naming patterns for all stored entities,
//! ensuring consistency across the application and preventing key collisions.
//!
//! # Key Patterns
//!
//! - `call:{call_id}` - Active call record
//! - `room:{room_name}` - Room name to call id index
//! - `log:{call_id}` - Historical call log entry (never deleted)
//! - `session:{room_name}` - Provider joined a room directly
//!
//! # Example
//!
//! ```
//! use carebridge_store::keys;
//!
//! assert_eq!(keys::call_key("CA123"), "call:CA123");
//! assert_eq!(keys::room_key("incoming-CA123"), "room:incoming-CA123");
//! ```

/// Prefix for active call records
pub const CALL_PREFIX: &str = "call";

/// Prefix for the room name index
pub const ROOM_PREFIX: &str = "room";

/// Prefix for call log entries
pub const LOG_PREFIX: &str = "log";

/// Prefix for direct room sessions
pub const SESSION_PREFIX: &str = "session";

/// Build the key of an active call record
///
/// Format: `call:{call_id}`
pub fn call_key(call_id: &str) -> String {
    format!("{}:{}", CALL_PREFIX, call_id)
}

/// Build the room index key
///
/// Format: `room:{room_name}`
pub fn room_key(room_name: &str) -> String {
    format!("{}:{}", ROOM_PREFIX, room_name)
}

/// Build the call log key
///
/// Format: `log:{call_id}`
pub fn log_key(call_id: &str) -> String {
    format!("{}:{}", LOG_PREFIX, call_id)
}

/// Build the room session key
///
/// Format: `session:{room_name}`
pub fn session_key(room_name: &str) -> String {
    format!("{}:{}", SESSION_PREFIX, room_name)
}

/// Scan prefix covering every key of a namespace
///
/// Format: `{namespace}:`
pub fn namespace(prefix: &str) -> String {
    format!("{}:", prefix)
}
