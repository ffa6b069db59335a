//! Telephony provider integration
//!
//! - [`TwilioClient`]: REST client that originates outbound calls
//! - [`webhook`]: form payloads posted by the provider to our webhooks
//! - [`twiml`]: renders a [`ConnectionInstruction`] into voice markup
//!
//! [`ConnectionInstruction`]: carebridge_core::models::ConnectionInstruction

mod client;
pub mod twiml;
pub mod webhook;

pub use client::{TwilioClient, VoiceError};
pub use twiml::TwimlRenderer;
pub use webhook::{IncomingCallWebhook, StatusCallback};
