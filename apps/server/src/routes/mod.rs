//! HTTP route table.
//!
//! ## Surface
//! ```text
//! POST   /api/login                                    issue a token
//! POST   /api/register                                 create a principal (admin)
//! POST   /api/logout                                   revoke the presented token
//! GET    /api/stock                                    list the ledger
//! POST   /api/stock                                    apply a stock action
//! POST   /api/sales                                    record a direct sale
//! POST   /api/sales/transfer-to-weekly                 roll the daily bucket over
//! GET    /api/renditions                               caller's renditions
//! POST   /api/renditions                               create a rendition
//! DELETE /api/renditions                               bulk reset for the caller
//! GET    /api/renditions/check-contrafactura/{client_id}   delinquency probe
//! GET    /api/renditions/check-client/{client_id}          bound identity
//! GET    /api/renditions/pending-contrafacturas            open balances
//! POST   /api/renditions/pay-contrafactura/{id}            post a payment
//! GET    /api/reports/{kind}                           report download (admin)
//! GET    /health                                       liveness probe
//! ```

mod auth;
mod rendition;
mod report;
mod sales;
mod stock;

use axum::extract::{FromRequest, Request};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/login", post(auth::login))
        .route("/api/register", post(auth::register))
        .route("/api/logout", post(auth::logout))
        .route("/api/stock", get(stock::list).post(stock::apply))
        .route("/api/sales", post(sales::record))
        .route("/api/sales/transfer-to-weekly", post(sales::transfer_to_weekly))
        .route(
            "/api/renditions",
            get(rendition::list_own)
                .post(rendition::create)
                .delete(rendition::reset_own),
        )
        .route(
            "/api/renditions/check-contrafactura/{client_id}",
            get(rendition::check_contrafactura),
        )
        .route(
            "/api/renditions/check-client/{client_id}",
            get(rendition::check_client),
        )
        .route(
            "/api/renditions/pending-contrafacturas",
            get(rendition::pending_contrafacturas),
        )
        .route(
            "/api/renditions/pay-contrafactura/{id}",
            post(rendition::pay_contrafactura),
        )
        .route("/api/reports/{kind}", get(report::download))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `Json` wrapper that reports body rejections through the standard
/// error envelope (400 `VALIDATION_ERROR`) instead of axum's default
/// plain-text replies.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::validation(rejection.body_text())),
        }
    }
}
