//! Test doubles for the upstream services

#![allow(dead_code)]

use async_trait::async_trait;
use carebridge_auth::TokenIssuer;
use carebridge_core::models::{RoomHandle, RoomSummary};
use carebridge_core::traits::{OriginateCall, OriginatedCall, RoomService, VoiceProvider};
use carebridge_core::{AppConfig, AppError};
use carebridge_services::Services;
use carebridge_store::MemoryStore;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Room service that records what it was asked to do
#[derive(Default)]
pub struct FakeRooms {
    pub created: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_create: bool,
    pub participants: u32,
}

#[async_trait]
impl RoomService for FakeRooms {
    async fn create_room(
        &self,
        name: &str,
        _empty_timeout: Duration,
        _max_participants: u32,
    ) -> Result<RoomHandle, AppError> {
        if self.fail_create {
            return Err(AppError::Upstream("room service unavailable".to_string()));
        }
        self.created.lock().push(name.to_string());
        Ok(RoomHandle {
            sid: format!("RM_{}", name),
            name: name.to_string(),
        })
    }

    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, AppError> {
        let deleted = self.deleted.lock().clone();
        Ok(self
            .created
            .lock()
            .iter()
            .filter(|name| !deleted.contains(name))
            .map(|name| RoomSummary {
                sid: format!("RM_{}", name),
                name: name.clone(),
                num_participants: self.participants,
                creation_time: Utc::now(),
                empty_timeout: 300,
                max_participants: 10,
            })
            .collect())
    }

    async fn delete_room(&self, name: &str) -> Result<(), AppError> {
        self.deleted.lock().push(name.to_string());
        Ok(())
    }
}

/// Telephony provider that hands out fixed call ids
pub struct FakeVoice {
    pub configured: bool,
    pub fail: bool,
    pub call_sid: String,
    pub requests: Mutex<Vec<OriginateCall>>,
}

impl Default for FakeVoice {
    fn default() -> Self {
        Self {
            configured: true,
            fail: false,
            call_sid: "CA900".to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VoiceProvider for FakeVoice {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn originate_call(&self, request: &OriginateCall) -> Result<OriginatedCall, AppError> {
        self.requests.lock().push(request.clone());
        if self.fail {
            return Err(AppError::Upstream("invalid To number".to_string()));
        }
        Ok(OriginatedCall {
            call_id: self.call_sid.clone(),
            status: "queued".to_string(),
        })
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.public_url = "https://bridge.example.org".to_string();
    config.twilio.phone_number = Some("+15559999".to_string());
    config.livekit.ws_url = "wss://media.example.org".to_string();
    config.livekit.api_key = Some("APIkey".to_string());
    config.livekit.api_secret = Some("secret".to_string());
    config.livekit.sip_domain = Some("sip.example.org".to_string());
    config.bridge.max_wait_polls = 5;
    config
}

pub fn issuer_for(config: &AppConfig) -> Arc<TokenIssuer> {
    Arc::new(TokenIssuer::new(
        config.livekit.api_key.clone(),
        config.livekit.api_secret.clone(),
    ))
}

pub fn build(config: &AppConfig, rooms: Arc<FakeRooms>, voice: Arc<FakeVoice>) -> Services {
    Services::build(
        config,
        Arc::new(MemoryStore::new()),
        rooms,
        voice,
        issuer_for(config),
    )
    .unwrap()
}
