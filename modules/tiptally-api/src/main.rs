use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::Claude;
use tiptally_common::Config;
use tiptally_pipeline::{
    BatchCoordinator, ContentCache, CostEstimator, ImageNormalizer, RetryPolicy,
    RetryingExtractor, VisionExtractor,
};

mod rest;

pub struct AppState {
    pub coordinator: BatchCoordinator,
    pub cache: Arc<ContentCache>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("tiptally_api=info".parse()?)
                .add_directive("tiptally_pipeline=info".parse()?),
        )
        .init();

    let config = Config::from_env();

    let claude = Claude::new(
        config.anthropic_api_key.clone(),
        config.extraction_model.clone(),
    )
    .with_timeout(Duration::from_secs(config.request_timeout_secs));

    let estimator = CostEstimator::new(config.input_price_per_mtok, config.output_price_per_mtok);
    let cache = Arc::new(ContentCache::new(Duration::from_secs(config.cache_ttl_secs)));
    let extractor = RetryingExtractor::new(
        Arc::new(VisionExtractor::new(claude, estimator)),
        cache.clone(),
        RetryPolicy {
            max_attempts: config.retry_max_attempts,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            multiplier: 2,
        },
    );
    let coordinator = BatchCoordinator::new(
        ImageNormalizer::new(config.max_dimension, config.jpeg_quality),
        extractor,
    );

    let state = Arc::new(AppState { coordinator, cache });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Pipeline entry points
        .route("/api/receipts", post(rest::api_scan_receipt))
        .route("/api/receipts/batch", post(rest::api_scan_batch))
        // Cache introspection for operational tooling
        .route("/api/cache/stats", get(rest::api_cache_stats))
        .route("/api/cache/flush", post(rest::api_cache_flush))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!(addr, model = %config.extraction_model, "TipTally API listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
