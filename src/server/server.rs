use anyhow::{Context, Result};
use std::time::Duration;

use tower_http::services::ServeDir;
use tracing::info;

use axum::{
    extract::State,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::import_export_routes::make_import_export_routes;
use super::metrics::metrics_handler;
use super::{log_requests, state::*, ServerConfig};
use crate::collection_store::CollectionCounts;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub collection: Option<CollectionCounts>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        collection: state.collection_store.counts().ok(),
    };
    Json(stats)
}

async fn get_settings(State(config): State<ServerConfig>) -> Response {
    Json(config.settings).into_response()
}

pub fn make_app(
    config: ServerConfig,
    collection_store: GuardedCollectionStore,
    auth_gate: GuardedAuthGate,
) -> Result<Router> {
    let state = ServerState::new(config.clone(), collection_store, auth_gate);

    let api_routes: Router = Router::new()
        .route("/settings", get(get_settings))
        .route("/metrics", get(metrics_handler))
        .nest("/import-export", make_import_export_routes())
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new().route("/", get(home)).with_state(state.clone()),
    };

    let app: Router = home_router
        .merge(api_routes)
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    collection_store: GuardedCollectionStore,
    auth_gate: GuardedAuthGate,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, collection_store, auth_gate)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    info!("Listening on {}", listener.local_addr()?);
    Ok(axum::serve(listener, app).await?)
}
