//! `/import-export` routes.

use super::auth::AdminAccess;
use super::state::ServerState;
use crate::import_export::{schema_document, ImportError, ImportExportService, ImportMode};
use crate::server::metrics;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

pub const EXPORT_FILE_NAME: &str = "collection-export.csv";

#[derive(Deserialize, Debug)]
struct ValidateBody {
    csv_data: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ImportBody {
    csv_data: Option<String>,
    mode: Option<String>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn require_csv_data(csv_data: Option<String>) -> Result<String, Response> {
    match csv_data {
        Some(data) => Ok(data),
        None => {
            warn!("Rejected request without csv_data");
            Err(error_response(StatusCode::BAD_REQUEST, "csv_data is required"))
        }
    }
}

async fn get_schema() -> impl IntoResponse {
    Json(schema_document())
}

async fn get_export(_access: AdminAccess, State(service): State<ImportExportService>) -> Response {
    match tokio::task::spawn_blocking(move || service.export()).await {
        Ok(Ok(csv)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
                ),
            ],
            csv,
        )
            .into_response(),
        Ok(Err(err)) => {
            error!("Export failed: {:#}", err);
            metrics::record_error("export_failed", "/import-export/export");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Export failed")
        }
        Err(err) => {
            error!("Export task failed: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Export failed")
        }
    }
}

async fn post_validate(
    State(service): State<ImportExportService>,
    Json(body): Json<ValidateBody>,
) -> Response {
    let csv_data = match require_csv_data(body.csv_data) {
        Ok(data) => data,
        Err(response) => return response,
    };

    match service.validate(&csv_data) {
        Ok(result) => Json(result).into_response(),
        Err(err) => {
            warn!("Validation rejected the document: {}", err);
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
    }
}

async fn post_import(
    State(service): State<ImportExportService>,
    Json(body): Json<ImportBody>,
) -> Response {
    let csv_data = match require_csv_data(body.csv_data) {
        Ok(data) => data,
        Err(response) => return response,
    };
    let mode = match body.mode.as_deref().map(str::parse::<ImportMode>) {
        None => ImportMode::default(),
        Some(Ok(mode)) => mode,
        Some(Err(message)) => {
            warn!("Rejected import: {}", message);
            return error_response(StatusCode::BAD_REQUEST, message);
        }
    };

    match tokio::task::spawn_blocking(move || service.import(&csv_data, mode)).await {
        Ok(Ok(result)) => Json(result).into_response(),
        Ok(Err(ImportError::Parse(err))) => {
            warn!("Import rejected the document: {}", err);
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
        Ok(Err(ImportError::Fatal {
            committed_groups,
            source,
        })) => {
            metrics::record_error("import_fatal", "/import-export/import");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": format!("Import aborted: {}", source),
                    "committed_groups": committed_groups,
                })),
            )
                .into_response()
        }
        Err(err) => {
            error!("Import task failed: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Import failed")
        }
    }
}

pub fn make_import_export_routes() -> Router<ServerState> {
    Router::new()
        .route("/schema", get(get_schema))
        .route("/export", get(get_export))
        .route("/validate", post(post_validate))
        .route("/import", post(post_import))
}
