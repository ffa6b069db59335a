//! CareBridge Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the CareBridge phone-to-room bridging service. It includes:
//!
//! - Domain models (call records, room summaries, connection instructions)
//! - Seam traits for the key-value store, the media-room service and the
//!   telephony provider
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
