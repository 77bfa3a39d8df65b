//! Panel Backend - blog, review and product management API plus its client

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod images;
pub mod logging;
pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::state::{AppState, UPLOADS_PATH};

fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect()
}

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
/// Falls back to the local dev client origins.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .map(|s| parse_origins(&s))
        .filter(|origins| !origins.is_empty())
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:5173"),
                HeaderValue::from_static("http://127.0.0.1:5173"),
                HeaderValue::from_static("http://localhost:3000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();
    // Multipart framing on top of the largest accepted image
    let body_limit = state.uploads.max_bytes + 1024 * 1024;

    let mut app = Router::new()
        .nest("/api/blog", routes::blog::router(state.uploads.max_bytes))
        .nest("/api/reviews", routes::reviews::router())
        .nest("/api/products", routes::products::router())
        .route("/health", get(routes::health::health_ping))
        .route("/health/ready", get(routes::health::health_ready));

    if let Some(dir) = &state.serve_dir {
        app = app.nest_service(UPLOADS_PATH, ServeDir::new(dir));
    }

    app.layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Run the server (used by main).
pub async fn run() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();

    // Dropping these stops the background writers and loses buffered lines
    let _log_guards = logging::init(&logging::LogSettings::from_env(config.is_production()));

    routes::health::init_start_time();

    let addr = config.socket_addr().map_err(|e| {
        tracing::error!(host = %config.host, port = config.port, "Invalid HOST/PORT: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    for dir in [&config.uploads.staging_dir, &config.uploads.public_dir] {
        tokio::fs::create_dir_all(dir).await?;
    }

    let state = AppState::from_config(&config).await;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
