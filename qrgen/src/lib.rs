//! # qrgen: QR Code Generator API
//!
//! `qrgen` is a small HTTP service that turns typed payloads into QR code images and keeps a
//! browsable history of everything it generated. A client posts free text, a URL, an email draft,
//! a phone number, WiFi credentials or a contact card; the service validates the payload, builds
//! the canonical string a scanner expects (`mailto:`, `tel:`, `WIFI:`, vCard 3.0), renders it to a
//! PNG data URL and stores the record.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum). Requests flow through:
//!
//! 1. [`api::handlers`] - extract and convert the request, call the service, wrap the result
//!    in the `{ success, ... }` envelope
//! 2. [`qr::service::QrCodeService`] - defaults, validation, payload formatting, a single encoder
//!    call and a single store write
//! 3. [`qr::encoder::QrEncoder`] - renders an encodable string to a PNG data URL
//! 4. [`db::store::RecordStore`] - PostgreSQL through the [`db::handlers::QrCodes`] repository, or
//!    an in-memory map for development and tests
//!
//! ## Endpoints
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | POST | `/api/qr/generate` | generate and store a QR code |
//! | GET | `/api/qr` | paginated, filterable history |
//! | GET | `/api/qr/health` | liveness with timestamp |
//! | GET | `/api/qr/{id}` | one record |
//! | DELETE | `/api/qr/{id}` | delete one record |
//! | GET | `/healthz` | plain-text liveness probe |
//! | GET | `/docs` | API reference (Scalar) |
//! | GET | `/internal/metrics` | Prometheus metrics, when `enable_metrics` is set |
//!
//! Anything else is a JSON 404, or the frontend's assets when `frontend.static_dir` is set.
//!
//! ## Configuration
//!
//! See [`config`]. `DATABASE_URL` switches to PostgreSQL; migrations run at startup.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod qr;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderValue, Method},
    routing::get,
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    config::{CorsOrigin, DatabaseConfig},
    db::store::{InMemoryRecordStore, PgRecordStore, RecordStore},
    openapi::ApiDoc,
    qr::{PngQrEncoder, QrCodeService},
};

pub use config::{Args, Config};

/// Shared state handed to every handler.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .service(Arc::new(service))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub service: Arc<QrCodeService>,
}

/// Get the qrgen database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open the configured record store, running migrations for PostgreSQL.
///
/// Returns the pool alongside the store so it can be closed on shutdown.
async fn setup_store(config: &Config) -> anyhow::Result<(Arc<dyn RecordStore>, Option<PgPool>)> {
    match &config.database {
        DatabaseConfig::External { url, pool: settings } => {
            info!("Using external database");
            let pool = PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .min_connections(settings.min_connections)
                .acquire_timeout(settings.acquire_timeout())
                .idle_timeout(settings.idle_timeout())
                .max_lifetime(settings.max_lifetime())
                .connect(url)
                .await
                .context("Failed to connect to database")?;

            migrator().run(&pool).await.context("Failed to run database migrations")?;

            Ok((Arc::new(PgRecordStore::new(pool.clone())), Some(pool)))
        }
        DatabaseConfig::Memory => {
            info!("Using in-memory record store; records are lost on shutdown");
            Ok((Arc::new(InMemoryRecordStore::new()), None))
        }
    }
}

/// Create CORS layer from configuration
///
/// A `*` entry allows any origin; explicit URLs are only used when no wildcard is configured.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allow_origin = if config.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([http::header::CONTENT_TYPE, http::header::ACCEPT])
        .allow_credentials(config.cors.allow_credentials);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router.
///
/// `/api/qr/health` is registered ahead of `/api/qr/{id}`; axum prefers the
/// static segment either way, but the ordering keeps the table readable.
///
/// # Errors
///
/// Returns an error if the CORS configuration cannot be turned into headers.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{health, qr_codes, static_assets};

    let api_routes = Router::new()
        .route("/qr/generate", axum::routing::post(qr_codes::generate_qr_code))
        .route("/qr", get(qr_codes::list_qr_codes))
        .route("/qr/health", get(health::health_check))
        .route("/qr/{id}", get(qr_codes::get_qr_code).delete(qr_codes::delete_qr_code))
        // Unknown API paths stay JSON even when the frontend fallback serves HTML
        .fallback(static_assets::route_not_found);

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api", api_routes)
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(state.config.max_body_size));

    let router = static_assets::with_fallback(router, state.config.frontend.static_dir.as_deref());

    let cors_layer = create_cors_layer(&state.config)?;
    let mut router = router.layer(cors_layer);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The assembled service: router plus the resources it owns.
///
/// 1. **Create**: [`Application::new`] opens the store (running migrations when external) and builds the router
/// 2. **Serve**: [`Application::serve`] binds and handles requests until the shutdown future resolves
/// 3. **Shutdown**: the pool is closed and pending spans are flushed
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting QR code generator with configuration: {:#?}", config);

        let (store, pool) = setup_store(&config).await?;
        let encoder = Arc::new(PngQrEncoder::new(config.qr.error_correction));
        let service = QrCodeService::new(store, encoder, config.qr.clone());

        let app_state = AppState::builder().config(config.clone()).service(Arc::new(service)).build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "QR code generator listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::Application;
    use crate::config::CorsOrigin;
    use crate::test_utils::{create_test_config, create_test_server};
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use serde_json::{Value, json};

    /// The Prometheus recorder is process-global, so this is the only test that enables metrics.
    #[test_log::test(tokio::test)]
    async fn test_application_serves_api_and_metrics() {
        let mut config = create_test_config();
        config.enable_metrics = true;
        let server = Application::new(config).await.unwrap().into_test_server();

        let response = server
            .post("/api/qr/generate")
            .json(&json!({"data": "hello", "type": "text"}))
            .await;
        response.assert_status(StatusCode::CREATED);

        let response = server.get("/api/qr").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["total"], 1);

        let response = server.get("/internal/metrics").await;
        response.assert_status_ok();
        assert!(response.text().contains("axum_http_requests"));
    }

    #[tokio::test]
    async fn test_healthz_and_docs() {
        let (server, _) = create_test_server(create_test_config());

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");

        let response = server.get("/api-docs/openapi.json").await;
        response.assert_status_ok();
        let doc: Value = response.json();
        assert!(doc["paths"]["/qr/generate"].is_object());

        server.get("/docs").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_metrics_route_absent_when_disabled() {
        let (server, _) = create_test_server(create_test_config());
        server.get("/internal/metrics").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let mut config = create_test_config();
        config.cors.allowed_origins = vec![CorsOrigin::Url("https://qr.example.com".parse().unwrap())];
        let (server, _) = create_test_server(config);

        let response = server
            .get("/api/qr/health")
            .add_header(HeaderName::from_static("origin"), HeaderValue::from_static("https://qr.example.com"))
            .await;
        response.assert_status_ok();
        assert_eq!(
            response.header("access-control-allow-origin"),
            HeaderValue::from_static("https://qr.example.com")
        );

        let response = server
            .get("/api/qr/health")
            .add_header(HeaderName::from_static("origin"), HeaderValue::from_static("https://evil.example.com"))
            .await;
        assert!(response.maybe_header("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn test_cors_wildcard_allows_any_origin() {
        let mut config = create_test_config();
        config.cors.allowed_origins = vec![CorsOrigin::Wildcard];
        config.cors.allow_credentials = false;
        config.validate().unwrap();
        let (server, _) = create_test_server(config);

        let response = server
            .get("/api/qr/health")
            .add_header(HeaderName::from_static("origin"), HeaderValue::from_static("https://anywhere.example.com"))
            .await;
        response.assert_status_ok();
        assert_eq!(response.header("access-control-allow-origin"), HeaderValue::from_static("*"));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let mut config = create_test_config();
        config.max_body_size = 1024;
        let (server, store) = create_test_server(config);

        let response = server
            .post("/api/qr/generate")
            .json(&json!({"data": "x".repeat(4096)}))
            .await;
        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Request body is too large");
        assert!(store.is_empty());
    }
}
