//! Holding queue handlers

use crate::dto::call::{AnswerCallRequest, IncomingCallView};
use crate::dto::room::JoinResponse;
use actix_web::{web, HttpResponse};
use carebridge_core::AppError;
use carebridge_services::Services;
use chrono::Utc;
use tracing::{instrument, warn};
use validator::Validate;

/// Callers waiting for a provider
///
/// GET /api/incoming-calls
#[instrument(skip(services))]
pub async fn list_incoming_calls(services: web::Data<Services>) -> Result<HttpResponse, AppError> {
    let now = Utc::now();
    let pending: Vec<IncomingCallView> = services
        .registry
        .list_pending_inbound()
        .await?
        .into_iter()
        .map(|record| IncomingCallView::from_record(record, now))
        .collect();

    Ok(HttpResponse::Ok().json(pending))
}

/// Provider answers a waiting caller
///
/// POST /api/answer-call
#[instrument(skip(services, req))]
pub async fn answer_call(
    services: web::Data<Services>,
    req: web::Json<AnswerCallRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Answer call validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let grant = services
        .bridge
        .answer_call(&req.call_sid, &req.provider_id)
        .await
        .map_err(|e| {
            warn!(call_id = %req.call_sid, provider_id = %req.provider_id, error = %e, "Answer failed");
            e
        })?;

    Ok(HttpResponse::Ok().json(JoinResponse::from(grant)))
}

/// Configure holding queue routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/incoming-calls", web::get().to(list_incoming_calls))
        .route("/answer-call", web::post().to(answer_call));
}
