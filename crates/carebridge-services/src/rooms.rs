//! Room provisioning
//!
//! Wraps the media-room service with the configured room settings and
//! joins its listing with local call state for the dashboard.

use carebridge_core::config::LiveKitConfig;
use carebridge_core::models::{RoomHandle, RoomSummary};
use carebridge_core::traits::RoomService;
use carebridge_core::AppResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::naming;
use crate::registry::CallRegistry;

/// Room as shown on the provider dashboard
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRoom {
    pub room_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    pub participant_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Creates and lists rooms for bridged calls
pub struct RoomProvisioner {
    rooms: Arc<dyn RoomService>,
    registry: Arc<CallRegistry>,
    empty_timeout: Duration,
    max_participants: u32,
    prefixes: Vec<String>,
    dispatch_prefix: String,
}

impl RoomProvisioner {
    pub fn new(
        rooms: Arc<dyn RoomService>,
        registry: Arc<CallRegistry>,
        config: &LiveKitConfig,
    ) -> Self {
        Self {
            rooms,
            registry,
            empty_timeout: Duration::from_secs(u64::from(config.room_empty_timeout_secs)),
            max_participants: config.room_max_participants,
            prefixes: config.prefixes(),
            dispatch_prefix: config.dispatch_prefix.clone(),
        }
    }

    /// Create a room with the configured idle timeout and participant cap
    #[instrument(skip(self), fields(room_name = %name))]
    pub async fn provision(&self, name: &str) -> AppResult<RoomHandle> {
        let handle = self
            .rooms
            .create_room(name, self.empty_timeout, self.max_participants)
            .await?;
        info!(sid = %handle.sid, "Room provisioned");
        Ok(handle)
    }

    /// Best-effort room deletion
    ///
    /// Failures are logged; the room then closes on its idle timeout.
    #[instrument(skip(self), fields(room_name = %name))]
    pub async fn release(&self, name: &str) -> bool {
        match self.rooms.delete_room(name).await {
            Ok(()) => {
                info!("Room released");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to release room, leaving it to its idle timeout");
                false
            }
        }
    }

    /// Rooms matching the configured prefixes
    pub async fn list_active_rooms(&self) -> AppResult<Vec<RoomSummary>> {
        self.rooms.list_active_rooms(&self.prefixes).await
    }

    /// Active rooms enriched with the call that owns each one
    pub async fn active_rooms(&self) -> AppResult<Vec<ActiveRoom>> {
        let summaries = self.list_active_rooms().await?;
        let mut rooms = Vec::with_capacity(summaries.len());

        for summary in summaries {
            let call = self.registry.find_by_room(&summary.name).await?;
            let phone_number = call
                .as_ref()
                .map(|c| c.counterparty_phone.clone())
                .or_else(|| naming::phone_from_room(&summary.name, &self.dispatch_prefix));

            rooms.push(ActiveRoom {
                room_name: summary.name,
                phone_number,
                call_id: call.map(|c| c.call_id),
                participant_count: summary.num_participants,
                created_at: summary.creation_time,
            });
        }

        Ok(rooms)
    }
}
