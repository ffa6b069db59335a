//! Room handlers
//!
//! Dashboard room listing and access tokens for providers.

use crate::dto::room::{JoinResponse, JoinRoomRequest, TokenRequest, TokenResponse};
use actix_web::{web, HttpResponse};
use carebridge_core::AppError;
use carebridge_services::Services;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// List rooms of bridged calls
///
/// GET /api/active-rooms
#[instrument(skip(services))]
pub async fn list_active_rooms(services: web::Data<Services>) -> Result<HttpResponse, AppError> {
    let rooms = services.rooms.active_rooms().await?;
    debug!(count = rooms.len(), "Listed active rooms");
    Ok(HttpResponse::Ok().json(rooms))
}

/// Access token for any participant
///
/// POST /api/livekit-token
#[instrument(skip(services, req))]
pub async fn issue_token(
    services: web::Data<Services>,
    req: web::Json<TokenRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Token request validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    info!(
        participant = %req.participant_name,
        room_name = %req.room_name,
        participant_type = %req.participant_type,
        "Generating access token"
    );

    let grant =
        services
            .bridge
            .participant_token(&req.participant_name, &req.room_name, &req.participant_type)?;

    Ok(HttpResponse::Ok().json(TokenResponse::from(grant)))
}

/// Provider joins a room by name
///
/// POST /api/join-room
#[instrument(skip(services, req))]
pub async fn join_room(
    services: web::Data<Services>,
    req: web::Json<JoinRoomRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Join room validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    info!(room_name = %req.room_name, provider_id = %req.provider_id, "Provider joining room");

    let grant = services
        .bridge
        .join_room(&req.room_name, &req.provider_id)
        .await?;

    Ok(HttpResponse::Ok().json(JoinResponse::from(grant)))
}

/// Configure room routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/active-rooms", web::get().to(list_active_rooms))
        .route("/livekit-token", web::post().to(issue_token))
        .route("/join-room", web::post().to(join_room));
}
