//! Room and token DTOs

use carebridge_services::JoinGrant;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Token request for an arbitrary participant
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    #[validate(length(min = 1, max = 128, message = "participantName is required"))]
    pub participant_name: String,

    #[validate(length(min = 1, max = 128, message = "roomName is required"))]
    pub room_name: String,

    #[serde(default = "default_participant_type")]
    pub participant_type: String,
}

fn default_participant_type() -> String {
    "provider".to_string()
}

/// Provider joins a room by name
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    #[validate(length(min = 1, max = 128, message = "roomName is required"))]
    pub room_name: String,

    #[validate(length(min = 1, message = "providerId is required"))]
    pub provider_id: String,
}

/// Token response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub ws_url: String,
    pub room_name: String,
}

impl From<JoinGrant> for TokenResponse {
    fn from(grant: JoinGrant) -> Self {
        Self {
            token: grant.token,
            ws_url: grant.ws_url,
            room_name: grant.room_name,
        }
    }
}

/// Successful join with room access
#[derive(Debug, Clone, Serialize)]
pub struct JoinResponse {
    pub success: bool,
    #[serde(flatten)]
    pub grant: JoinGrant,
}

impl From<JoinGrant> for JoinResponse {
    fn from(grant: JoinGrant) -> Self {
        Self {
            success: true,
            grant,
        }
    }
}
