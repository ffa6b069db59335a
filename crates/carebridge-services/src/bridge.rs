//! Bridge responder
//!
//! Hands out room access to providers and tells the phone leg how to reach
//! the room once a provider is there.

use carebridge_auth::TokenIssuer;
use carebridge_core::config::{BridgeConfig, LiveKitConfig};
use carebridge_core::models::{ConnectionInstruction, RoomSession};
use carebridge_core::{AppError, AppResult};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use crate::naming;
use crate::registry::CallRegistry;

const BRIDGE_ANNOUNCEMENT: &str = "Connecting you to your healthcare provider now.";

/// Room access handed to a provider's browser
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinGrant {
    pub token: String,
    pub ws_url: String,
    pub room_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_phone: Option<String>,
}

/// Turns registry state into tokens and bridge instructions
pub struct BridgeResponder {
    registry: Arc<CallRegistry>,
    issuer: Arc<TokenIssuer>,
    ws_url: String,
    sip_domain: Option<String>,
    dispatch_prefix: String,
    token_ttl: Duration,
    dial_timeout_secs: u32,
}

impl BridgeResponder {
    pub fn new(
        registry: Arc<CallRegistry>,
        issuer: Arc<TokenIssuer>,
        livekit: &LiveKitConfig,
        bridge: &BridgeConfig,
    ) -> Self {
        Self {
            registry,
            issuer,
            ws_url: livekit.ws_url.clone(),
            sip_domain: livekit
                .sip_domain
                .clone()
                .filter(|d| !d.trim().is_empty()),
            dispatch_prefix: livekit.dispatch_prefix.clone(),
            token_ttl: livekit.token_ttl(),
            dial_timeout_secs: bridge.dial_timeout_secs,
        }
    }

    /// WebSocket URL browser clients connect to
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Dial instruction bridging the phone leg into `room_name`
    ///
    /// # Errors
    ///
    /// `AppError::Config` when no SIP domain is configured.
    pub fn connect_instruction(&self, room_name: &str) -> AppResult<ConnectionInstruction> {
        let domain = self.sip_domain.as_deref().ok_or_else(|| {
            error!(room_name = %room_name, "SIP domain not configured");
            AppError::Config("LiveKit SIP domain not configured".to_string())
        })?;

        Ok(ConnectionInstruction::Bridge {
            announcement: BRIDGE_ANNOUNCEMENT.to_string(),
            sip_uri: naming::sip_uri(room_name, domain),
            timeout_secs: self.dial_timeout_secs,
        })
    }

    /// Provider picks up a waiting inbound call
    ///
    /// The token is issued before the registry is touched, so a
    /// configuration failure leaves the call waiting.
    #[instrument(skip(self), fields(call_id = %call_id, provider_id = %provider_id))]
    pub async fn answer_call(&self, call_id: &str, provider_id: &str) -> AppResult<JoinGrant> {
        let record = self
            .registry
            .get(call_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Call {} not found", call_id)))?;

        if !record.is_pending_inbound() {
            return Err(AppError::Conflict(format!(
                "Call {} is {} and cannot be answered",
                call_id, record.status
            )));
        }

        let token = self.provider_token(provider_id, &record.room_name)?;
        let record = self.registry.answer(call_id, provider_id).await?;

        info!(room_name = %record.room_name, "Provider answered incoming call");

        Ok(JoinGrant {
            token,
            ws_url: self.ws_url.clone(),
            room_name: record.room_name,
            patient_phone: Some(record.counterparty_phone),
        })
    }

    /// Token for the room of an active call
    #[instrument(skip(self), fields(call_id = %call_id, provider_id = %provider_id))]
    pub async fn join_call(&self, call_id: &str, provider_id: &str) -> AppResult<JoinGrant> {
        let record = self
            .registry
            .get(call_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Call {} not found", call_id)))?;

        let token = self.provider_token(provider_id, &record.room_name)?;
        debug!(room_name = %record.room_name, "Provider joining call");

        Ok(JoinGrant {
            token,
            ws_url: self.ws_url.clone(),
            room_name: record.room_name,
            patient_phone: Some(record.counterparty_phone),
        })
    }

    /// Provider joins a room by name
    ///
    /// A room owned by a waiting inbound call answers that call. The join is
    /// recorded as a room session either way.
    #[instrument(skip(self), fields(room_name = %room_name, provider_id = %provider_id))]
    pub async fn join_room(&self, room_name: &str, provider_id: &str) -> AppResult<JoinGrant> {
        let token = self.provider_token(provider_id, room_name)?;

        let call = self.registry.find_by_room(room_name).await?;
        if let Some(record) = &call {
            if record.is_pending_inbound() {
                match self.registry.answer(&record.call_id, provider_id).await {
                    Ok(_) => info!(call_id = %record.call_id, "Room join answered waiting call"),
                    Err(AppError::Conflict(msg)) => debug!("Call already taken: {}", msg),
                    Err(e) => return Err(e),
                }
            }
        }

        let phone_number = call
            .map(|c| c.counterparty_phone)
            .or_else(|| naming::phone_from_room(room_name, &self.dispatch_prefix));

        self.registry
            .record_room_session(RoomSession {
                room_name: room_name.to_string(),
                phone_number: phone_number.clone(),
                provider_id: provider_id.to_string(),
                joined_at: Utc::now(),
            })
            .await?;

        info!("Provider token generated");

        Ok(JoinGrant {
            token,
            ws_url: self.ws_url.clone(),
            room_name: room_name.to_string(),
            patient_phone: phone_number,
        })
    }

    /// Token for an arbitrary participant
    #[instrument(skip(self), fields(participant = %participant_name, room_name = %room_name))]
    pub fn participant_token(
        &self,
        participant_name: &str,
        room_name: &str,
        participant_type: &str,
    ) -> AppResult<JoinGrant> {
        let token = self
            .issuer
            .participant_token(participant_name, room_name, self.token_ttl)?;

        info!(participant_type = %participant_type, "Access token generated");

        Ok(JoinGrant {
            token,
            ws_url: self.ws_url.clone(),
            room_name: room_name.to_string(),
            patient_phone: None,
        })
    }

    fn provider_token(&self, provider_id: &str, room_name: &str) -> AppResult<String> {
        self.issuer.participant_token(
            &naming::provider_identity(provider_id),
            room_name,
            self.token_ttl,
        )
    }
}
