pub mod api;
mod config;
mod providers;
mod sync;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::Config;
use providers::feed::new_request_log_store;
use sync::CycleManager;

#[derive(OpenApi)]
#[openapi(
    info(title = "Polling Wait Map API", version = "0.1.0"),
    paths(
        api::markers::list_markers,
        api::status::get_status,
        api::health::health_check,
    ),
    components(schemas(
        api::ErrorResponse,
        api::markers::MarkerListResponse,
        api::status::StatusResponse,
        api::health::HealthResponse,
        sync::Marker,
        sync::MarkerPopup,
        sync::Legend,
        sync::legend::LegendEntry,
        sync::DegradedNotice,
        sync::CycleSummary,
        sync::CyclePhase,
        providers::feed::FeedRequestLog,
    )),
    tags(
        (name = "markers", description = "Rendered marker set and legend"),
        (name = "status", description = "Degraded-state notice and cycle diagnostics"),
        (name = "health", description = "Service health check")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    // Load config
    let config = Config::load("config.yaml").expect("Failed to load config");
    config.validate().expect("Invalid config");
    tracing::info!(
        feed_url = %config.feed.url,
        poll_interval_ms = config.feed.poll_interval_ms,
        classes = config.classification.classes,
        "Loaded configuration"
    );

    // Build CORS layer based on config
    let cors_layer = if config.cors_permissive {
        tracing::warn!("CORS: Permissive mode explicitly enabled (all origins allowed) - DO NOT USE IN PRODUCTION");
        CorsLayer::permissive()
    } else if !config.cors_origins.is_empty() {
        tracing::info!(origins = ?config.cors_origins, "CORS: Restricting to configured origins");
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    } else {
        panic!("CORS configuration error: Either set 'cors_origins' with allowed origins, or set 'cors_permissive: true' for development");
    };

    // Start the fetch cycle in the background
    let requests = new_request_log_store();
    let manager = Arc::new(
        CycleManager::new(&config, requests).expect("Failed to initialize cycle manager"),
    );
    let manager_clone = manager.clone();
    let cycle_task = tokio::spawn(async move {
        manager_clone.start().await;
    });

    // Build the app
    let app = Router::new()
        .route("/", get(root))
        .nest("/api", api::router(&manager))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer);

    // Start server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("Failed to bind to port 3000");

    tracing::info!("Server running on http://localhost:3000");
    tracing::info!("Swagger UI: http://localhost:3000/swagger-ui");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .expect("Failed to start server");

    // Cancel the pending timer and any in-flight fetch. The render step
    // has no await points, so a cancelled cycle never commits partially.
    cycle_task.abort();
}

async fn root() -> &'static str {
    "Polling Wait Map API"
}
