//! Shared fixtures for unit and handler tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum_test::TestServer;

use crate::{
    AppState, build_router,
    config::{Config, DatabaseConfig},
    db::store::InMemoryRecordStore,
    qr::{
        PngQrEncoder, QrCodeService,
        encoder::{EncodeError, QrEncoder, RenderOptions},
    },
};

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: None,
        database: DatabaseConfig::Memory,
        enable_metrics: false,
        enable_otel_export: false,
        ..Default::default()
    }
}

/// Router over a fresh in-memory store; the store handle is returned for direct inspection.
pub fn create_test_server(config: Config) -> (TestServer, InMemoryRecordStore) {
    let store = InMemoryRecordStore::new();
    let encoder = Arc::new(PngQrEncoder::new(config.qr.error_correction));
    let service = QrCodeService::new(Arc::new(store.clone()), encoder, config.qr.clone());

    let state = AppState::builder().config(config).service(Arc::new(service)).build();
    let router = build_router(&state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");

    (server, store)
}

/// Encoder that always fails, for exercising the no-write-on-failure path.
pub struct FailingEncoder;

#[async_trait]
impl QrEncoder for FailingEncoder {
    async fn encode(&self, _text: &str, _options: &RenderOptions) -> Result<String, EncodeError> {
        Err(EncodeError::Render("encoder unavailable".to_string()))
    }
}
