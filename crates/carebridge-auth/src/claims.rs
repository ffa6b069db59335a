//! Token claims structure
//!
//! Mirrors the claim set the media-room service expects: standard JWT fields
//! plus a `video` grant describing what the bearer may do in which room.

use serde::{Deserialize, Serialize};

/// Room permissions carried by a token
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub room_join: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub room_create: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub room_list: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub room_admin: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_publish: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_subscribe: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_publish_data: Option<bool>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl VideoGrant {
    /// Full participant rights in one room
    ///
    /// # Examples
    ///
    /// ```
    /// use carebridge_auth::VideoGrant;
    ///
    /// let grant = VideoGrant::participant("incoming-CA1");
    /// assert!(grant.room_join);
    /// assert_eq!(grant.can_publish_data, Some(true));
    /// ```
    pub fn participant(room: impl Into<String>) -> Self {
        Self {
            room: Some(room.into()),
            room_join: true,
            can_publish: Some(true),
            can_subscribe: Some(true),
            can_publish_data: Some(true),
            ..Default::default()
        }
    }

    /// Rights needed by the server to create, list and close rooms
    pub fn room_service() -> Self {
        Self {
            room_create: true,
            room_list: true,
            room_admin: true,
            ..Default::default()
        }
    }

    /// Whether the grant carries every participant capability
    pub fn has_full_participant_rights(&self) -> bool {
        self.room_join
            && self.can_publish == Some(true)
            && self.can_subscribe == Some(true)
            && self.can_publish_data == Some(true)
    }
}

/// Token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Issuer (API key)
    pub iss: String,

    /// Subject (participant identity)
    pub sub: String,

    /// Token id
    pub jti: String,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Room permissions
    pub video: VideoGrant,
}

impl Claims {
    /// Room named in the grant
    pub fn room(&self) -> Option<&str> {
        self.video.room.as_deref()
    }

    /// Get the participant identity
    pub fn identity(&self) -> &str {
        &self.sub
    }
}
