//! HTTP request handlers

pub mod calls;
pub mod health;
pub mod inbound;
pub mod rooms;
pub mod webhooks;

pub use calls::configure as configure_calls;
pub use health::configure as configure_health;
pub use inbound::configure as configure_inbound;
pub use rooms::configure as configure_rooms;
pub use webhooks::configure as configure_webhooks;
