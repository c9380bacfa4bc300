use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging;
use configs::AppConfig;
use dotenvy::dotenv;
use service::provider::{LocalProvider, Provider, SessionStore};
use service::runtime;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Public entry: load config, build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_and_validate()?;
    init_logging(cfg.logging.format);

    runtime::ensure_env(&cfg.storage.data_dir).await?;
    let local = LocalProvider::new(&cfg.storage.data_dir).await?;
    let provider: Arc<dyn Provider> = local.clone();
    let sessions: Arc<dyn SessionStore> = local;
    let state = ServerState::new(provider, sessions, &cfg.session.user_header)?;

    let app: Router = routes::build_router(state, build_cors(), cfg.server.max_body_bytes);

    let addr: SocketAddr = cfg.server.bind_addr().parse()?;
    info!(%addr, data_dir = %cfg.storage.data_dir, "starting preference server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
