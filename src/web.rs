use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use miette::IntoDiagnostic;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::cache::{MenuCache, RebuildStats};
use crate::jobs;
use crate::settings::Settings;

pub struct AppState {
    pub cache: Arc<MenuCache>,
    pub db: DatabaseConnection,
}

/// Identity of the caller as established by the host application.
#[derive(Debug, Default, Deserialize)]
pub struct NavigationQuery {
    pub user_id: Option<i64>,
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RebuildResponse {
    pub job: &'static str,
    #[serde(flatten)]
    pub stats: RebuildStats,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/navigation", get(handle_navigation))
        .route("/v1/roles", get(handle_roles))
        .route("/v1/menu-items", get(handle_menu_items))
        .route("/v1/cache/rebuild", post(handle_rebuild))
        .route("/healthz", get(health))
        .with_state(state)
}

async fn handle_navigation(
    State(state): State<Arc<AppState>>,
    Query(q): Query<NavigationQuery>,
) -> impl IntoResponse {
    match state.cache.ensure_cache().await {
        Ok(index) => Json(index.navigation(
            q.user_id,
            q.email.as_deref(),
            q.is_admin,
            q.path.as_deref(),
        ))
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn handle_roles(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.cache.ensure_cache().await {
        Ok(index) => Json(index.roles().to_vec()).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn handle_menu_items(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.cache.ensure_cache().await {
        Ok(index) => Json(index.menu_items().to_vec()).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn handle_rebuild(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match jobs::trigger_job_manually(&state.db, &state.cache, jobs::REBUILD_MENU_CACHE).await {
        Ok(stats) => Json(RebuildResponse {
            job: jobs::REBUILD_MENU_CACHE,
            stats,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Serve the HTTP API until `shutdown` resolves.
pub async fn serve(
    settings: &Settings,
    db: DatabaseConnection,
    cache: Arc<MenuCache>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> miette::Result<()> {
    let state = Arc::new(AppState { cache, db });

    let addr: SocketAddr = settings
        .bind_addr()
        .parse()
        .map_err(|e| miette::miette!("bad listen addr: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr).await.into_diagnostic()?;
    tracing::info!(%addr, "Menu cache API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .into_diagnostic()?;
    Ok(())
}
