//! rpcache API server.
//!
//! Caching JSON-RPC proxy in front of a blockchain node. Requests are answered from the
//! cache backends when possible and forwarded to the node otherwise; a background task
//! tracks the node's last irreversible block for block-dependent cache rules.
//!
//! See `rpcache_shared::config` for the environment variables read at startup.

mod routes;
mod state;

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use rpcache_cache::backend::SharedBackend;
use rpcache_cache::context::CacheContext;
use rpcache_cache::memory::MemoryBackend;
use rpcache_cache::redis_backend::RedisBackend;
use rpcache_shared::config::Config;
use rpcache_shared::irreversible::IrreversibleBlock;
use rpcache_shared::upstream::UpstreamClient;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let config = Config::from_env().expect("invalid configuration");

    // a broken rule table would silently misconfigure caching, so refuse to start
    let rules = config.ttl_rules().expect("failed to load ttl rules");
    tracing::info!(
        rules = rules.len(),
        path = config.ttl_rules_path.as_deref().unwrap_or("<built-in>"),
        "ttl rules loaded"
    );

    let mut backends: Vec<SharedBackend> =
        vec![Arc::new(MemoryBackend::new(config.memory_cache_capacity))];
    if let Some(redis_url) = &config.redis_url {
        match RedisBackend::connect(redis_url, config.redis_timeout).await {
            Ok(redis) => {
                tracing::info!("redis cache connected");
                backends.push(Arc::new(redis));
            }
            Err(e) => {
                tracing::error!(error = %e, "redis cache unavailable, continuing without it");
            }
        }
    }

    let upstream = UpstreamClient::new(config.upstream_url.clone(), config.upstream_timeout)
        .expect("failed to build upstream client");
    let tracker = Arc::new(IrreversibleBlock::default());

    let state = AppState {
        cache: CacheContext::new(
            rules,
            backends,
            tracker.clone(),
            config.memory_cache_max_ttl,
        ),
        upstream: upstream.clone(),
    };

    // graceful shutdown: ctrl-c signals both the server and the poller
    let shutdown = tokio::signal::ctrl_c();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(rpcache_ingestion::run_irreversible_block_loop(
        upstream,
        tracker,
        config.poll_interval,
        shutdown_rx,
    ));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    let app = Router::new()
        .route("/", post(routes::jsonrpc::handle_jsonrpc))
        .route("/status", get(routes::status::cache_status))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, upstream = %config.upstream_url, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.await;
            let _ = shutdown_tx.send(());
            tracing::info!("shutdown signal received");
        })
        .await
        .expect("server error");
}
