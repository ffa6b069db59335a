//! Access tokens for the media-room service
//!
//! This crate issues the signed, time-limited capability tokens that let a
//! browser client (or this server itself) act inside a named room.
//!
//! # Features
//!
//! - Participant tokens with join/publish/subscribe/publish-data grants
//! - Short-lived service tokens for room administration calls
//! - Token validation against the configured secret
//!
//! # Examples
//!
//! ```no_run
//! use carebridge_auth::{TokenIssuer, VideoGrant};
//! use std::time::Duration;
//!
//! let issuer = TokenIssuer::new(Some("APIkey".into()), Some("secret".into()));
//! let token = issuer.issue_token(
//!     "provider-42",
//!     &VideoGrant::participant("incoming-CA123"),
//!     Duration::from_secs(3600),
//! )?;
//! # Ok::<(), carebridge_core::AppError>(())
//! ```

pub mod claims;
pub mod token;

pub use claims::{Claims, VideoGrant};
pub use token::TokenIssuer;
