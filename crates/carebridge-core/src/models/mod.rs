//! Domain models for CareBridge
//!
//! This module contains all the core domain models used throughout the application.

pub mod call;
pub mod instruction;
pub mod room;

pub use call::{CallDirection, CallRecord, CallStatus, RoomSession, StatusUpdate};
pub use instruction::ConnectionInstruction;
pub use room::{RoomHandle, RoomSummary};
