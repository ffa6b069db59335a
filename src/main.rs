//! CareBridge Server
//!
//! Bridges patient phone calls into media rooms where healthcare providers
//! join from the browser.

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{http::header, middleware, web, App, HttpServer};
use carebridge_api::configure_api;
use carebridge_auth::TokenIssuer;
use carebridge_core::AppConfig;
use carebridge_rooms::RoomServiceClient;
use carebridge_services::Services;
use carebridge_store::MemoryStore;
use carebridge_voice::TwilioClient;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "carebridge={0},carebridge_api={0},carebridge_services={0},carebridge_rooms={0},\
             carebridge_voice={0},carebridge_auth={0},actix_web=info",
            log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

fn build_cors(origins: &str) -> Cors {
    let cors = if origins.split(',').any(|o| o.trim() == "*") {
        Cors::default().allow_any_origin()
    } else {
        let allowed: Vec<String> = origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        Cors::default().allowed_origin_fn(move |origin, _req_head| {
            origin
                .to_str()
                .map(|o| allowed.iter().any(|a| a == o))
                .unwrap_or(false)
        })
    };

    cors.allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Configuration also loads .env
    let config = AppConfig::load()?;

    init_tracing();

    info!("Starting CareBridge v{}", env!("CARGO_PKG_VERSION"));

    // Configuration check
    info!(
        telephony_configured = config.twilio.is_configured(),
        media_configured = config.livekit.is_configured(),
        sip_domain = config.livekit.sip_domain.as_deref().unwrap_or("not set"),
        public_url = %config.server.public_url,
        "Configuration check"
    );
    if !config.twilio.is_configured() {
        warn!("Telephony credentials missing, call placement is disabled");
    }
    if !config.livekit.is_configured() {
        warn!("Media room credentials missing, tokens cannot be issued");
    }

    let issuer = TokenIssuer::new(
        config.livekit.api_key.clone(),
        config.livekit.api_secret.clone(),
    );
    let room_service = RoomServiceClient::new(
        &config.livekit.http_url(),
        issuer.clone(),
        config.livekit.timeout_secs,
    )?;
    let voice = TwilioClient::new(&config.twilio)?;

    let services = Services::build(
        &config,
        Arc::new(MemoryStore::new()),
        Arc::new(room_service),
        Arc::new(voice),
        Arc::new(issuer),
    )?;

    let static_dir = config.server.static_dir.clone();
    let serve_static = Path::new(&static_dir).is_dir();
    if serve_static {
        info!(dir = %static_dir, "Serving static files");
    }

    let cors_origins = config.server.cors_origins.clone();
    let bind_addr = config.server_addr();
    let workers = config.server.workers.max(1);
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    HttpServer::new(move || {
        let app = App::new()
            .app_data(web::Data::new(services.clone()))
            .wrap(build_cors(&cors_origins))
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %Dms"))
            .wrap(TracingLogger::default())
            .configure(configure_api);

        if serve_static {
            app.service(Files::new("/", &static_dir).index_file("index.html"))
        } else {
            app
        }
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
