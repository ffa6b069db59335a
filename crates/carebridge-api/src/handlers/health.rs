//! Health check

use actix_web::{web, HttpResponse};

/// GET /api/health
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "carebridge",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Configure health route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
