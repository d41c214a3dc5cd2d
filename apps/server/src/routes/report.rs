//! Report download route.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tracing::info;

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::report::{self, ReportKind};
use crate::AppState;

/// `GET /api/reports/{kind}` (admin only)
///
/// Compiles the requested summary and serves it as an attachment in
/// whatever format the configured sink renders.
pub async fn download(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(kind): Path<String>,
) -> ApiResult<Response> {
    let kind: ReportKind = kind.parse()?;

    let compiled = report::compile(&state.db, kind).await?;
    let body = state.report_sink.render(&compiled);

    let filename = format!(
        "{}-report-{}.{}",
        kind.slug(),
        Utc::now().format("%Y-%m-%d"),
        state.report_sink.file_extension()
    );

    info!(
        username = %admin.0.username,
        kind = kind.slug(),
        bytes = body.len(),
        "Report downloaded"
    );

    let response = (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                state.report_sink.content_type().to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response();

    Ok(response)
}
