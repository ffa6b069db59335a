//! Media-room service integration
//!
//! This module talks to the room service's Twirp JSON API:
//! - `CreateRoom`: provision a room with idle timeout and participant cap
//! - `ListRooms`: reconciliation view of the rooms currently open
//! - `DeleteRoom`: close a room that will not be used
//!
//! # Usage
//!
//! ```rust,ignore
//! use carebridge_rooms::RoomServiceClient;
//!
//! let client = RoomServiceClient::new("https://demo.livekit.cloud", issuer, 10)?;
//! let handle = client.create_room("incoming-CA123", Duration::from_secs(300), 10).await?;
//! ```

mod client;
mod types;

pub use client::{RoomServiceClient, RoomServiceError};
pub use types::*;
