//! Outbound call placement
//!
//! Provisions a room for the patient, asks the telephony provider to dial
//! them with our webhooks attached, and records the call.

use carebridge_core::models::CallRecord;
use carebridge_core::traits::{OriginateCall, StatusEvent, VoiceProvider};
use carebridge_core::{AppError, AppResult};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::callbacks::CallbackUrls;
use crate::naming;
use crate::registry::CallRegistry;
use crate::rooms::RoomProvisioner;

/// Status events requested for outbound calls
pub const DEFAULT_STATUS_EVENTS: [StatusEvent; 4] = [
    StatusEvent::Initiated,
    StatusEvent::Ringing,
    StatusEvent::Answered,
    StatusEvent::Completed,
];

/// Outbound call to a patient
#[derive(Debug, Clone)]
pub struct PlaceCall {
    pub patient_id: String,
    pub patient_phone: String,
    pub provider_id: String,
}

/// Places outbound calls
pub struct CallPlacer {
    provisioner: Arc<RoomProvisioner>,
    voice: Arc<dyn VoiceProvider>,
    registry: Arc<CallRegistry>,
    callbacks: CallbackUrls,
    from_phone: Option<String>,
    status_events: Vec<StatusEvent>,
}

impl CallPlacer {
    pub fn new(
        provisioner: Arc<RoomProvisioner>,
        voice: Arc<dyn VoiceProvider>,
        registry: Arc<CallRegistry>,
        callbacks: CallbackUrls,
        from_phone: Option<String>,
    ) -> Self {
        Self {
            provisioner,
            voice,
            registry,
            callbacks,
            from_phone: from_phone.filter(|p| !p.trim().is_empty()),
            status_events: DEFAULT_STATUS_EVENTS.to_vec(),
        }
    }

    /// Override the subscribed status events
    pub fn with_status_events(mut self, events: Vec<StatusEvent>) -> Self {
        self.status_events = events;
        self
    }

    /// Place a call and record it as `initiated`
    ///
    /// # Errors
    ///
    /// - `AppError::Config` when the source number or telephony credentials
    ///   are missing; nothing is provisioned in that case
    /// - `AppError::Upstream` when the room or the call cannot be created.
    ///   A room created for a call that could not be placed is deleted.
    #[instrument(skip(self, request), fields(patient_id = %request.patient_id, provider_id = %request.provider_id))]
    pub async fn place_call(&self, request: &PlaceCall) -> AppResult<CallRecord> {
        let from = self.from_phone.clone().ok_or_else(|| {
            error!("Telephony phone number not configured");
            AppError::Config("Twilio phone number not configured".to_string())
        })?;

        if !self.voice.is_configured() {
            error!("Telephony credentials not configured");
            return Err(AppError::Config(
                "Twilio credentials not configured".to_string(),
            ));
        }

        let room_name = naming::outbound_room_name(&request.patient_id, Utc::now());
        self.provisioner.provision(&room_name).await?;

        let originate = OriginateCall {
            to: request.patient_phone.clone(),
            from,
            instruction_url: self.callbacks.connect_sip(&room_name),
            status_callback_url: self.callbacks.call_status(),
            status_events: self.status_events.clone(),
        };

        let call = match self.voice.originate_call(&originate).await {
            Ok(call) => call,
            Err(e) => {
                error!(room_name = %room_name, error = %e, "Call origination failed");
                self.provisioner.release(&room_name).await;
                return Err(e);
            }
        };

        let record = CallRecord::outbound(
            call.call_id,
            room_name,
            request.patient_id.clone(),
            request.patient_phone.clone(),
            request.provider_id.clone(),
        );
        self.registry.put(record.clone()).await?;

        info!(
            call_id = %record.call_id,
            room_name = %record.room_name,
            provider_status = %call.status,
            "Outbound call placed"
        );

        Ok(record)
    }
}
