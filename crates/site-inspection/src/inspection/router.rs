use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::export::ExportError;
use super::notice::Notice;
use super::service::InspectionService;
use super::state::{AuditAction, AuditState};

/// Request bodies carry photos as base64 data URLs, well past axum's 2 MB
/// default.
pub const AUDIT_BODY_LIMIT: usize = 32 * 1024 * 1024;

/// HTTP surface for the catalog and the single in-progress audit.
pub fn inspection_router(service: Arc<InspectionService>) -> Router {
    Router::new()
        .route("/api/v1/inspection/catalog", get(catalog_handler))
        .route(
            "/api/v1/audit",
            get(audit_handler)
                .put(replace_handler)
                .layer(DefaultBodyLimit::max(AUDIT_BODY_LIMIT)),
        )
        .route(
            "/api/v1/audit/actions",
            post(action_handler).layer(DefaultBodyLimit::max(AUDIT_BODY_LIMIT)),
        )
        .route("/api/v1/audit/save", post(save_handler))
        .route("/api/v1/audit/export", post(export_handler))
        .with_state(service)
}

pub(crate) async fn catalog_handler(State(service): State<Arc<InspectionService>>) -> Response {
    (StatusCode::OK, axum::Json(service.catalog())).into_response()
}

pub(crate) async fn audit_handler(State(service): State<Arc<InspectionService>>) -> Response {
    (StatusCode::OK, axum::Json(service.view())).into_response()
}

pub(crate) async fn action_handler(
    State(service): State<Arc<InspectionService>>,
    axum::Json(action): axum::Json<AuditAction>,
) -> Response {
    match service.apply(action) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}

/// Restores a whole audit, e.g. one saved from `GET /api/v1/audit`.
pub(crate) async fn replace_handler(
    State(service): State<Arc<InspectionService>>,
    axum::Json(audit): axum::Json<AuditState>,
) -> Response {
    match service.replace(audit) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn save_handler(State(service): State<Arc<InspectionService>>) -> Response {
    match service.save() {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn export_handler(State(service): State<Arc<InspectionService>>) -> Response {
    // Image decoding and compression are CPU bound.
    let rendered = match tokio::task::spawn_blocking(move || service.export()).await {
        Ok(rendered) => rendered,
        Err(join_error) => {
            tracing::error!(error = %join_error, "export task failed");
            let payload = json!({
                "error": join_error.to_string(),
                "notice": Notice::error(format!("PDF Generation Failed: {join_error}")),
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
        }
    };

    match rendered {
        Ok(report) => {
            let disposition = format!("attachment; filename=\"{}\"", report.file_name);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                report.bytes,
            )
                .into_response()
        }
        Err(error) => {
            let status = match error {
                ExportError::AlreadyRunning => StatusCode::CONFLICT,
                ExportError::Report(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let payload = json!({
                "error": error.to_string(),
                "notice": error.notice(),
            });
            (status, axum::Json(payload)).into_response()
        }
    }
}
