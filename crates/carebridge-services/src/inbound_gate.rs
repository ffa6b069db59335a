//! Inbound call gate
//!
//! Callers are parked in a per-call room and kept on hold by a redirect
//! loop: every poll re-reads the registry and either holds again, bridges
//! the caller into the room, or releases them. The loop is bounded by
//! `max_wait_polls`.

use carebridge_core::config::BridgeConfig;
use carebridge_core::models::{CallRecord, CallStatus, ConnectionInstruction, StatusUpdate};
use carebridge_core::{AppError, AppResult};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::bridge::BridgeResponder;
use crate::callbacks::CallbackUrls;
use crate::naming;
use crate::registry::CallRegistry;
use crate::rooms::RoomProvisioner;

pub const SESSION_EXPIRED_MESSAGE: &str =
    "Sorry, your session has expired. Please call again. Goodbye.";
pub const NO_PROVIDER_MESSAGE: &str =
    "Sorry, no provider is available right now. Please try again later. Goodbye.";

/// Receives inbound calls and holds them until a provider answers
pub struct InboundCallGate {
    provisioner: Arc<RoomProvisioner>,
    registry: Arc<CallRegistry>,
    bridge: Arc<BridgeResponder>,
    callbacks: CallbackUrls,
    greeting: String,
    hold_audio: Option<String>,
    poll_interval_secs: u32,
    max_wait_polls: u32,
}

impl InboundCallGate {
    pub fn new(
        provisioner: Arc<RoomProvisioner>,
        registry: Arc<CallRegistry>,
        bridge: Arc<BridgeResponder>,
        callbacks: CallbackUrls,
        config: &BridgeConfig,
    ) -> Self {
        Self {
            provisioner,
            registry,
            bridge,
            callbacks,
            greeting: config.greeting.clone(),
            hold_audio: Some(config.hold_music_url.clone()).filter(|u| !u.trim().is_empty()),
            poll_interval_secs: config.poll_interval_secs.max(1),
            max_wait_polls: config.max_wait_polls,
        }
    }

    /// Register a new inbound call and put the caller on hold
    ///
    /// A missing call id is replaced with a generated one. A repeated
    /// webhook never provisions a second room or rewrites the record: a
    /// waiting call is held again, an answered one is bridged and a finished
    /// one is told its session expired.
    #[instrument(skip(self), fields(call_id = ?call_id, from = %from_phone))]
    pub async fn on_incoming_call(
        &self,
        call_id: Option<&str>,
        from_phone: &str,
        to_phone: &str,
    ) -> AppResult<ConnectionInstruction> {
        let call_id = call_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Some(existing) = self.registry.get(&call_id).await? {
            debug!(call_id = %call_id, status = %existing.status, "Duplicate incoming-call webhook");
            return match existing.status {
                CallStatus::Answered | CallStatus::Active => {
                    self.bridge.connect_instruction(&existing.room_name)
                }
                _ => Ok(self.hold(&call_id, 0, true)),
            };
        }
        if self.registry.logged(&call_id).await?.is_some() {
            info!(call_id = %call_id, "Incoming-call webhook for a finished call");
            return Ok(ConnectionInstruction::hangup(SESSION_EXPIRED_MESSAGE));
        }

        let room_name = naming::inbound_room_name(&call_id);
        self.provisioner.provision(&room_name).await?;

        match self
            .registry
            .put(CallRecord::inbound(call_id.clone(), room_name.clone(), from_phone))
            .await
        {
            Ok(()) => {}
            Err(AppError::Conflict(_)) => {
                debug!(call_id = %call_id, "Concurrent incoming-call webhook already registered");
                return Ok(self.hold(&call_id, 0, true));
            }
            Err(e) => return Err(e),
        }

        info!(
            call_id = %call_id,
            room_name = %room_name,
            to = %to_phone,
            "Incoming call waiting for a provider"
        );

        Ok(self.hold(&call_id, 0, true))
    }

    /// Next step for a caller on hold
    ///
    /// `attempt` counts the polls already made. Once it reaches
    /// `max_wait_polls` the call is marked failed and the caller released.
    #[instrument(skip(self), fields(call_id = %call_id))]
    pub async fn wait_for_provider(
        &self,
        call_id: &str,
        attempt: u32,
    ) -> AppResult<ConnectionInstruction> {
        let record = match self.registry.get(call_id).await? {
            Some(record) if !record.status.is_terminal() => record,
            _ => {
                info!("Waiting call no longer tracked, ending session");
                return Ok(ConnectionInstruction::hangup(SESSION_EXPIRED_MESSAGE));
            }
        };

        match record.status {
            CallStatus::Answered | CallStatus::Active => {
                info!(
                    room_name = %record.room_name,
                    provider_id = ?record.provider_id,
                    "Provider available, bridging caller"
                );
                self.bridge.connect_instruction(&record.room_name)
            }
            _ if attempt >= self.max_wait_polls => {
                warn!(attempt, "No provider answered in time, releasing caller");
                match self
                    .registry
                    .update_status(call_id, StatusUpdate::new(CallStatus::Failed))
                    .await
                {
                    Ok(_) | Err(AppError::NotFound(_)) => {}
                    Err(e) => return Err(e),
                }
                Ok(ConnectionInstruction::hangup(NO_PROVIDER_MESSAGE))
            }
            _ => {
                debug!(attempt, "Still waiting for a provider");
                Ok(self.hold(call_id, attempt, false))
            }
        }
    }

    /// Hold instruction; greeting and hold audio only when the caller arrives
    fn hold(&self, call_id: &str, attempt: u32, first: bool) -> ConnectionInstruction {
        ConnectionInstruction::Hold {
            greeting: first
                .then(|| self.greeting.clone())
                .filter(|g| !g.trim().is_empty()),
            hold_audio: if first { self.hold_audio.clone() } else { None },
            pause_secs: self.poll_interval_secs,
            redirect_url: self
                .callbacks
                .wait_for_provider(call_id, attempt.saturating_add(1)),
        }
    }
}
