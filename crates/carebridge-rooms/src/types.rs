//! Wire types for the room service Twirp API
//!
//! Requests use the protobuf field names; responses accept both the proto
//! names and their camelCase JSON names. 64-bit integers arrive as strings.

use carebridge_core::models::{RoomHandle, RoomSummary};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Requests
// ============================================================================

/// Arguments for `RoomService/CreateRoom`
#[derive(Debug, Clone, Serialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub empty_timeout: u32,
    pub max_participants: u32,
}

/// Arguments for `RoomService/ListRooms`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListRoomsRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

/// Arguments for `RoomService/DeleteRoom`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteRoomRequest {
    pub room: String,
}

// ============================================================================
// Responses
// ============================================================================

/// Room object returned by the service
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Room {
    #[serde(default)]
    pub sid: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, alias = "emptyTimeout", deserialize_with = "number_or_string")]
    pub empty_timeout: i64,

    #[serde(default, alias = "maxParticipants", deserialize_with = "number_or_string")]
    pub max_participants: i64,

    #[serde(default, alias = "creationTime", deserialize_with = "number_or_string")]
    pub creation_time: i64,

    #[serde(default, alias = "numParticipants", deserialize_with = "number_or_string")]
    pub num_participants: i64,
}

impl Room {
    /// Creation time as a UTC timestamp (seconds precision)
    pub fn created_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.creation_time, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

impl From<Room> for RoomHandle {
    fn from(room: Room) -> Self {
        RoomHandle {
            sid: room.sid,
            name: room.name,
        }
    }
}

impl From<Room> for RoomSummary {
    fn from(room: Room) -> Self {
        let creation_time = room.created_at();
        RoomSummary {
            sid: room.sid,
            name: room.name,
            num_participants: clamp_u32(room.num_participants),
            creation_time,
            empty_timeout: clamp_u32(room.empty_timeout),
            max_participants: clamp_u32(room.max_participants),
        }
    }
}

fn clamp_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

/// Reply of `RoomService/ListRooms`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListRoomsResponse {
    #[serde(default)]
    pub rooms: Vec<Room>,
}

/// Twirp error body
#[derive(Debug, Clone, Deserialize)]
pub struct TwirpError {
    pub code: String,
    #[serde(default)]
    pub msg: String,
}

/// Deserialize an integer from either a JSON number or a string
fn number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct I64OrStringVisitor;

    impl<'de> Visitor<'de> for I64OrStringVisitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E>(self, value: i64) -> Result<i64, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<i64, E>
        where
            E: de::Error,
        {
            i64::try_from(value).map_err(de::Error::custom)
        }

        fn visit_str<E>(self, value: &str) -> Result<i64, E>
        where
            E: de::Error,
        {
            if value.is_empty() {
                return Ok(0);
            }
            value.parse::<i64>().map_err(de::Error::custom)
        }

        fn visit_unit<E>(self) -> Result<i64, E>
        where
            E: de::Error,
        {
            Ok(0)
        }
    }

    deserializer.deserialize_any(I64OrStringVisitor)
}
