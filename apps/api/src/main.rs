mod chat;
mod config;
mod context;
mod corpus;
mod db;
mod errors;
mod figma;
mod generation;
mod history;
mod llm_client;
mod meeting;
mod models;
mod render;
mod routes;
mod selection;
mod state;
mod text;
mod verify;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::context::cache::{ContextCache, RedisIndexStore};
use crate::db::create_pool;
use crate::history::{HistoryLog, PgHistoryStore};
use crate::llm_client::{LlmClient, TextCompletion};
use crate::render::images::HttpImageFetcher;
use crate::render::mapper::SlideMap;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Specdeck API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis-backed context cache
    let redis = redis::Client::open(config.redis_url.clone())?;
    let context = Arc::new(ContextCache::new(Arc::new(RedisIndexStore::new(redis))));
    info!("Context cache initialized (redis)");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Initialize LLM client; a missing key is reported per request
    let llm: Option<Arc<dyn TextCompletion>> = match &config.anthropic_api_key {
        Some(key) => {
            let client = LlmClient::new(key.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(client))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; analysis and generation will be rejected");
            None
        }
    };

    let slide_map = match &config.slide_map_path {
        Some(path) => SlideMap::load(path)?,
        None => SlideMap::default(),
    };
    info!("Slide map: {} explicit entries", slide_map.0.len());

    let state = AppState {
        db: db.clone(),
        s3,
        llm,
        context,
        history: Arc::new(PgHistoryStore::new(db.clone(), HistoryLog::Clarify)),
        chat_history: Arc::new(PgHistoryStore::new(db, HistoryLog::Chat)),
        images: Arc::new(HttpImageFetcher::new()?),
        slide_map: Arc::new(slide_map),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "specdeck-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
