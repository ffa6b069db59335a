//! Shared test app wiring

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

#[derive(Default)]
pub struct FakeRooms {
    pub created: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl RoomService for FakeRooms {
    async fn create_room(
        &self,
        name: &str,
        _empty_timeout: Duration,
        _max_participants: u32,
    ) -> Result<RoomHandle, AppError> {
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
                num_participants: 1,
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

#[derive(Default)]
pub struct FakeVoice {
    pub requests: Mutex<Vec<OriginateCall>>,
}

#[async_trait]
impl VoiceProvider for FakeVoice {
    async fn originate_call(&self, request: &OriginateCall) -> Result<OriginatedCall, AppError> {
        self.requests.lock().push(request.clone());
        Ok(OriginatedCall {
            call_id: "CA900".to_string(),
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
    config.bridge.max_wait_polls = 3;
    config
}

pub fn issuer_for(config: &AppConfig) -> Arc<TokenIssuer> {
    Arc::new(TokenIssuer::new(
        config.livekit.api_key.clone(),
        config.livekit.api_secret.clone(),
    ))
}

pub fn services(config: &AppConfig) -> Services {
    Services::build(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(FakeRooms::default()),
        Arc::new(FakeVoice::default()),
        issuer_for(config),
    )
    .unwrap()
}
