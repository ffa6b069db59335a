//! Call-flow services for CareBridge
//!
//! This crate holds the call-to-room lifecycle: provisioning rooms, placing
//! and receiving calls, tracking their state and deciding what the phone
//! leg does next.
//!
//! # Architecture
//!
//! Services only depend on the seam traits from `carebridge-core`:
//! - `KeyValueStore` behind the [`CallRegistry`]
//! - `RoomService` behind the [`RoomProvisioner`]
//! - `VoiceProvider` behind the [`CallPlacer`]
//!
//! Each service is wrapped in `Arc` and shared across HTTP workers.
//!
//! # Services
//!
//! - [`CallRegistry`] - Active calls, room index and call log
//! - [`RoomProvisioner`] - Room creation, release and listing
//! - [`CallPlacer`] - Outbound calls with room compensation
//! - [`InboundCallGate`] - Holding loop for inbound callers
//! - [`BridgeResponder`] - Provider tokens and bridge instructions

pub mod bridge;
pub mod call_placer;
pub mod callbacks;
pub mod inbound_gate;
pub mod naming;
pub mod registry;
pub mod rooms;

pub use bridge::{BridgeResponder, JoinGrant};
pub use call_placer::{CallPlacer, PlaceCall};
pub use callbacks::CallbackUrls;
pub use inbound_gate::InboundCallGate;
pub use registry::CallRegistry;
pub use rooms::{ActiveRoom, RoomProvisioner};

use carebridge_auth::TokenIssuer;
use carebridge_core::traits::{KeyValueStore, RoomService, VoiceProvider};
use carebridge_core::{AppConfig, AppResult};
use std::sync::Arc;

/// Every call-flow service, wired together
#[derive(Clone)]
pub struct Services {
    pub registry: Arc<CallRegistry>,
    pub rooms: Arc<RoomProvisioner>,
    pub placer: Arc<CallPlacer>,
    pub gate: Arc<InboundCallGate>,
    pub bridge: Arc<BridgeResponder>,
    /// Maximum entries returned by the call log
    pub call_log_limit: usize,
}

impl Services {
    /// Wire the services on top of the given backends
    ///
    /// # Errors
    ///
    /// `AppError::Config` when the public base URL is invalid.
    pub fn build(
        config: &AppConfig,
        store: Arc<dyn KeyValueStore>,
        room_service: Arc<dyn RoomService>,
        voice: Arc<dyn VoiceProvider>,
        issuer: Arc<TokenIssuer>,
    ) -> AppResult<Self> {
        let callbacks = CallbackUrls::new(&config.server.public_url)?;

        let registry = Arc::new(CallRegistry::new(store));
        let rooms = Arc::new(RoomProvisioner::new(
            room_service,
            registry.clone(),
            &config.livekit,
        ));
        let bridge = Arc::new(BridgeResponder::new(
            registry.clone(),
            issuer,
            &config.livekit,
            &config.bridge,
        ));
        let placer = Arc::new(CallPlacer::new(
            rooms.clone(),
            voice,
            registry.clone(),
            callbacks.clone(),
            config.twilio.phone_number.clone(),
        ));
        let gate = Arc::new(InboundCallGate::new(
            rooms.clone(),
            registry.clone(),
            bridge.clone(),
            callbacks,
            &config.bridge,
        ));

        Ok(Self {
            registry,
            rooms,
            placer,
            gate,
            bridge,
            call_log_limit: config.bridge.call_log_limit,
        })
    }
}
