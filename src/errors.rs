use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum MenuError {
    #[error("Failed to read menu snapshot `{path}`")]
    #[diagnostic(
        code(menu_cache::snapshot_read),
        help("Check that the snapshot path is readable by the server process")
    )]
    SnapshotRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write menu snapshot `{path}`")]
    #[diagnostic(
        code(menu_cache::snapshot_write),
        help("Check that the snapshot directory exists and is writable")
    )]
    SnapshotWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Menu snapshot `{path}` is malformed")]
    #[diagnostic(
        code(menu_cache::snapshot_parse),
        help("The snapshot must contain `roles`, `menu_items`, `menu_in_roles` and `overrides`; delete it to force a rebuild")
    )]
    SnapshotParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    #[diagnostic(code(menu_cache::serde))]
    Serde(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    #[diagnostic(code(menu_cache::db))]
    Db(#[from] sea_orm::DbErr),

    #[error("Cyclic menu hierarchy detected: {0}")]
    #[diagnostic(
        code(menu_cache::cyclic_menu),
        help("Check the `parent_id` of the listed menu items for circular references")
    )]
    CyclicMenu(String),

    #[error("Scheduler error: {0}")]
    #[diagnostic(code(menu_cache::scheduler))]
    Scheduler(String),

    #[error("Unknown job name: {0}")]
    #[diagnostic(code(menu_cache::unknown_job))]
    UnknownJob(String),

    #[error("Config error: {0}")]
    #[diagnostic(code(menu_cache::config))]
    Config(String),
}

impl IntoResponse for MenuError {
    fn into_response(self) -> Response {
        let status = match &self {
            MenuError::UnknownJob(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
