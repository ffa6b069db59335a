//! Call handlers
//!
//! Outbound call placement, call history and the active-call snapshot.

use crate::dto::call::{
    ActiveCallsResponse, CallPatientRequest, CallPatientResponse, CallRoomResponse,
    JoinCallRequest,
};
use crate::dto::room::JoinResponse;
use actix_web::{web, HttpResponse};
use carebridge_core::AppError;
use carebridge_services::{PlaceCall, Services};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Place an outbound call to a patient
///
/// POST /api/call-patient
#[instrument(skip(services, req))]
pub async fn call_patient(
    services: web::Data<Services>,
    req: web::Json<CallPatientRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Call request validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let req = req.into_inner();
    info!(
        patient_id = %req.patient_id,
        provider_id = %req.provider_id,
        "Initiating call to patient"
    );

    let record = services
        .placer
        .place_call(&PlaceCall {
            patient_id: req.patient_id,
            patient_phone: req.patient_phone,
            provider_id: req.provider_id,
        })
        .await?;

    Ok(HttpResponse::Ok().json(CallPatientResponse {
        success: true,
        call_id: record.call_id,
        room_name: record.room_name,
    }))
}

/// Recent call history
///
/// GET /api/call-logs
#[instrument(skip(services))]
pub async fn list_call_logs(services: web::Data<Services>) -> Result<HttpResponse, AppError> {
    let logs = services.registry.call_log(services.call_log_limit).await?;
    Ok(HttpResponse::Ok().json(logs))
}

/// Call history of one patient
///
/// GET /api/call-logs/{patient_id}
#[instrument(skip(services))]
pub async fn patient_call_logs(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let patient_id = path.into_inner();
    let logs = services.registry.call_log_for_patient(&patient_id).await?;
    debug!(patient_id = %patient_id, count = logs.len(), "Fetched patient call logs");
    Ok(HttpResponse::Ok().json(logs))
}

/// All active calls and direct room sessions
///
/// GET /api/active-calls
#[instrument(skip(services))]
pub async fn list_active_calls(services: web::Data<Services>) -> Result<HttpResponse, AppError> {
    let calls = services.registry.list_all().await?;
    let room_sessions = services.registry.room_sessions().await?;

    Ok(HttpResponse::Ok().json(ActiveCallsResponse {
        calls,
        room_sessions,
    }))
}

/// Active calls and room sessions of one provider
///
/// GET /api/active-calls/{provider_id}
#[instrument(skip(services))]
pub async fn provider_active_calls(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let provider_id = path.into_inner();
    let calls = services.registry.list_by_provider(&provider_id).await?;
    let room_sessions = services
        .registry
        .room_sessions()
        .await?
        .into_iter()
        .filter(|s| s.provider_id == provider_id)
        .collect();

    Ok(HttpResponse::Ok().json(ActiveCallsResponse {
        calls,
        room_sessions,
    }))
}

/// Room of an active call
///
/// GET /api/call-room/{call_id}
#[instrument(skip(services))]
pub async fn call_room(
    services: web::Data<Services>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let call_id = path.into_inner();
    let record = services
        .registry
        .get(&call_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Call {} not found", call_id)))?;

    Ok(HttpResponse::Ok().json(CallRoomResponse {
        call_id: record.call_id,
        room_name: record.room_name,
        status: record.status,
        patient_phone: record.counterparty_phone,
        ws_url: services.bridge.ws_url().to_string(),
    }))
}

/// Provider joins an active call
///
/// POST /api/join-call
#[instrument(skip(services, req))]
pub async fn join_call(
    services: web::Data<Services>,
    req: web::Json<JoinCallRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Join call validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let grant = services
        .bridge
        .join_call(&req.call_id, &req.provider_id)
        .await?;

    info!(call_id = %req.call_id, provider_id = %req.provider_id, "Provider joined call");
    Ok(HttpResponse::Ok().json(JoinResponse::from(grant)))
}

/// Video sessions of a patient; never populated
///
/// GET /api/video-sessions/{patient_id}
pub async fn video_sessions(_path: web::Path<String>) -> HttpResponse {
    HttpResponse::Ok().json(Vec::<Value>::new())
}

/// Configure call routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/call-patient", web::post().to(call_patient))
        .route("/call-logs", web::get().to(list_call_logs))
        .route("/call-logs/{patient_id}", web::get().to(patient_call_logs))
        .route("/active-calls", web::get().to(list_active_calls))
        .route("/active-calls/{provider_id}", web::get().to(provider_active_calls))
        .route("/call-room/{call_id}", web::get().to(call_room))
        .route("/join-call", web::post().to(join_call))
        .route("/video-sessions/{patient_id}", web::get().to(video_sessions));
}
