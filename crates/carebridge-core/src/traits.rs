//! Common traits for storage and upstream services
//!
//! Call-flow logic only talks to these traits, so the in-memory store and the
//! HTTP clients can be swapped (durable storage, test doubles) without
//! touching the services.

use crate::error::AppError;
use crate::models::{RoomHandle, RoomSummary};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Key-value store holding call state
///
/// Values are JSON documents; keys are plain strings with `:` separated
/// namespaces. `scan` returns every entry whose key starts with `prefix`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Insert or replace a value
    async fn put(&self, key: &str, value: Value) -> Result<(), AppError>;

    /// Get a value
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError>;

    /// Delete a value, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, AppError>;

    /// All entries under a key prefix
    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Value)>, AppError>;
}

/// Media-room service
#[async_trait]
pub trait RoomService: Send + Sync {
    /// Create a room
    ///
    /// Not idempotent: creating an existing name may fail or return a
    /// distinct handle depending on the service.
    async fn create_room(
        &self,
        name: &str,
        empty_timeout: Duration,
        max_participants: u32,
    ) -> Result<RoomHandle, AppError>;

    /// List all rooms currently open on the service
    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, AppError>;

    /// Close a room
    async fn delete_room(&self, name: &str) -> Result<(), AppError>;

    /// Rooms whose name starts with one of `prefixes`
    async fn list_active_rooms(&self, prefixes: &[String]) -> Result<Vec<RoomSummary>, AppError> {
        let rooms = self.list_rooms().await?;
        Ok(rooms
            .into_iter()
            .filter(|room| room.matches_any(prefixes))
            .collect())
    }
}

/// Call progress events the telephony provider reports to the status webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    Initiated,
    Ringing,
    Answered,
    Completed,
}

impl StatusEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusEvent::Initiated => "initiated",
            StatusEvent::Ringing => "ringing",
            StatusEvent::Answered => "answered",
            StatusEvent::Completed => "completed",
        }
    }
}

/// Request to originate an outbound call
#[derive(Debug, Clone)]
pub struct OriginateCall {
    pub to: String,
    pub from: String,
    /// Webhook returning the connection instruction once the callee answers
    pub instruction_url: String,
    /// Webhook receiving status events
    pub status_callback_url: String,
    pub status_events: Vec<StatusEvent>,
}

/// Call accepted by the telephony provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginatedCall {
    pub call_id: String,
    /// Provider's own status string at creation (e.g. `queued`)
    pub status: String,
}

/// Telephony provider
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    /// Whether account credentials are available
    fn is_configured(&self) -> bool {
        true
    }

    /// Ask the provider to place a call
    async fn originate_call(&self, request: &OriginateCall) -> Result<OriginatedCall, AppError>;
}
