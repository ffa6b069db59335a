//! Provider-neutral instructions for the phone leg
//!
//! Services decide *what* the caller's phone leg should do next; the voice
//! crate renders the decision into the telephony provider's markup.

/// Next step for the phone leg of a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionInstruction {
    /// Keep the caller on hold and poll again
    Hold {
        /// Spoken once when the caller first arrives
        greeting: Option<String>,
        /// Audio played while waiting
        hold_audio: Option<String>,
        /// Seconds to pause before polling
        pause_secs: u32,
        /// Webhook polled after the pause
        redirect_url: String,
    },
    /// Dial the room's SIP gateway address
    Bridge {
        announcement: String,
        sip_uri: String,
        timeout_secs: u32,
    },
    /// Say a message and end the call
    Hangup { message: String },
}

impl ConnectionInstruction {
    pub fn hangup(message: impl Into<String>) -> Self {
        ConnectionInstruction::Hangup {
            message: message.into(),
        }
    }

    pub fn is_bridge(&self) -> bool {
        matches!(self, ConnectionInstruction::Bridge { .. })
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, ConnectionInstruction::Hold { .. })
    }
}
