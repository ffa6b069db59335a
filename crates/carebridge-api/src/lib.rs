//! API layer for CareBridge
//!
//! HTTP handlers for the provider dashboard and the telephony webhooks.
//! Handlers take the wired [`Services`] from application data:
//!
//! ```ignore
//! App::new()
//!     .app_data(web::Data::new(services.clone()))
//!     .configure(carebridge_api::configure_api)
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod dto;
pub mod handlers;

use actix_web::web;

pub use carebridge_services::Services;
pub use handlers::{
    configure_calls, configure_health, configure_inbound, configure_rooms, configure_webhooks,
};

/// Mount every route under `/api`
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(configure_health)
            // Provider dashboard
            .configure(configure_rooms)
            .configure(configure_calls)
            .configure(configure_inbound)
            // Telephony provider callbacks
            .configure(configure_webhooks),
    );
}
