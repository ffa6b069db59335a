//! Media room models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Room returned by the media-room service after creation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomHandle {
    /// Service-assigned room id
    pub sid: String,
    pub name: String,
}

/// Room as reported by the room listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomSummary {
    pub sid: String,
    pub name: String,
    pub num_participants: u32,
    pub creation_time: DateTime<Utc>,
    pub empty_timeout: u32,
    pub max_participants: u32,
}

impl RoomSummary {
    /// Whether the room name starts with any of the prefixes
    ///
    /// An empty prefix list matches every room.
    pub fn matches_any(&self, prefixes: &[String]) -> bool {
        prefixes.is_empty() || prefixes.iter().any(|p| self.name.starts_with(p.as_str()))
    }
}
