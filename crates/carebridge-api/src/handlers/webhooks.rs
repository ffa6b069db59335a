//! Telephony webhook handlers
//!
//! The provider calls these while a phone leg is live. Every TwiML route
//! answers with markup, even on failure, so the caller hears an apology
//! instead of the provider's generic error prompt.

use crate::dto::webhook::{ConnectSipQuery, WaitForProviderQuery};
use actix_web::{web, HttpResponse};
use carebridge_core::models::{ConnectionInstruction, StatusUpdate};
use carebridge_core::{AppError, AppResult};
use carebridge_services::Services;
use carebridge_voice::twiml::{self, TwimlRenderer};
use carebridge_voice::{IncomingCallWebhook, StatusCallback};
use tracing::{debug, error, info, instrument, warn};

/// Spoken when a webhook cannot be served
pub const APOLOGY_MESSAGE: &str =
    "We are sorry, we cannot connect your call right now. Please try again later. Goodbye.";

fn twiml_response(result: AppResult<ConnectionInstruction>) -> Result<HttpResponse, AppError> {
    let instruction = result.unwrap_or_else(|e| {
        error!(error = %e, "Webhook failed, hanging up caller");
        ConnectionInstruction::hangup(APOLOGY_MESSAGE)
    });

    let body = TwimlRenderer::render(&instruction)?;
    Ok(HttpResponse::Ok()
        .content_type(twiml::CONTENT_TYPE)
        .body(body))
}

/// Bridge the phone leg into a room
///
/// POST /api/twiml/connect-sip?room=
#[instrument(skip(services), fields(room = %query.room))]
pub async fn connect_sip(
    services: web::Data<Services>,
    query: web::Query<ConnectSipQuery>,
) -> Result<HttpResponse, AppError> {
    info!("Outbound call answered, bridging to room");
    twiml_response(services.bridge.connect_instruction(&query.room))
}

/// POST /api/call-completed
pub async fn call_completed() -> Result<HttpResponse, AppError> {
    let body = TwimlRenderer::goodbye()?;
    Ok(HttpResponse::Ok()
        .content_type(twiml::CONTENT_TYPE)
        .body(body))
}

/// Call progress reported by the provider
///
/// POST /api/call-status
///
/// Unknown statuses and untracked calls are acknowledged without change so
/// the provider does not retry them.
#[instrument(skip(services, form), fields(call_id = %form.call_sid, status = %form.call_status))]
pub async fn call_status(
    services: web::Data<Services>,
    form: web::Form<StatusCallback>,
) -> Result<HttpResponse, AppError> {
    let Some(status) = form.status() else {
        debug!("Ignoring unmapped call status");
        return Ok(HttpResponse::Ok().finish());
    };

    let update = StatusUpdate::new(status).with_duration(form.duration_secs());
    match services.registry.update_status(&form.call_sid, update).await {
        Ok(record) => {
            debug!(current = %record.status.as_str(), "Call status applied");
        }
        Err(e) if e.is_not_found() => {
            debug!("Status for untracked call");
        }
        Err(e) => {
            warn!(error = %e, "Failed to apply call status");
            return Err(e);
        }
    }

    Ok(HttpResponse::Ok().finish())
}

/// A caller dialed the service number
///
/// POST /api/incoming-call
#[instrument(skip(services, form))]
pub async fn incoming_call(
    services: web::Data<Services>,
    form: web::Form<IncomingCallWebhook>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let from = form.from.unwrap_or_default();
    let to = form.to.unwrap_or_default();

    twiml_response(
        services
            .gate
            .on_incoming_call(form.call_sid.as_deref(), &from, &to)
            .await,
    )
}

/// Poll made by a caller on hold
///
/// POST /api/twiml/wait-for-provider?callSid=&attempt=
///
/// The call id comes from the query string and falls back to the form body.
#[instrument(skip(services, query, form), fields(attempt = query.attempt))]
pub async fn wait_for_provider(
    services: web::Data<Services>,
    query: web::Query<WaitForProviderQuery>,
    form: Option<web::Form<IncomingCallWebhook>>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let call_id = query
        .call_sid
        .filter(|sid| !sid.trim().is_empty())
        .or_else(|| form.and_then(|f| f.into_inner().call_sid));

    let result = match call_id {
        Some(call_id) => services.gate.wait_for_provider(&call_id, query.attempt).await,
        None => Err(AppError::Validation("callSid is required".to_string())),
    };

    twiml_response(result)
}

/// Configure webhook routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/twiml/connect-sip", web::post().to(connect_sip))
        .route("/call-completed", web::post().to(call_completed))
        .route("/call-status", web::post().to(call_status))
        .route("/incoming-call", web::post().to(incoming_call))
        .route("/twiml/wait-for-provider", web::post().to(wait_for_provider));
}
