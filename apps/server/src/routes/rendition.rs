//! Rendition routes: creation, payments, delinquency probes, reset.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use reparto_core::{Money, PaymentMethod, Rendition, RenditionInput};

use super::ApiJson;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

// =============================================================================
// Wire Types
// =============================================================================

/// Creation payload: the rendition fields minus `balance` and `userId`,
/// which the server derives itself.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRenditionRequest {
    pub product_type: String,
    pub client_id: String,
    pub client_details: String,
    pub initial_boxes: i64,
    pub recharge_boxes: i64,
    pub sold_boxes: i64,
    pub return_boxes: i64,
    pub sale_amount_cents: i64,
    pub payment_amount_cents: i64,
    /// Defaults to cash when omitted.
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl From<CreateRenditionRequest> for RenditionInput {
    fn from(req: CreateRenditionRequest) -> Self {
        RenditionInput {
            product_type: req.product_type,
            client_id: req.client_id,
            client_details: req.client_details,
            initial_boxes: req.initial_boxes,
            recharge_boxes: req.recharge_boxes,
            sold_boxes: req.sold_boxes,
            return_boxes: req.return_boxes,
            sale_amount: Money::from_cents(req.sale_amount_cents),
            payment_amount: Money::from_cents(req.payment_amount_cents),
            payment_method: req.payment_method,
        }
    }
}

/// Wire shape for one rendition.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenditionResponse {
    pub id: String,
    pub user_id: String,
    pub product_type: String,
    pub client_id: String,
    pub client_details: String,
    pub initial_boxes: i64,
    pub recharge_boxes: i64,
    pub sold_boxes: i64,
    pub return_boxes: i64,
    pub sale_amount_cents: i64,
    pub payment_amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub balance_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Rendition> for RenditionResponse {
    fn from(r: Rendition) -> Self {
        RenditionResponse {
            id: r.id,
            user_id: r.user_id,
            product_type: r.product_type,
            client_id: r.client_id,
            client_details: r.client_details,
            initial_boxes: r.initial_boxes,
            recharge_boxes: r.recharge_boxes,
            sold_boxes: r.sold_boxes,
            return_boxes: r.return_boxes,
            sale_amount_cents: r.sale_amount_cents,
            payment_amount_cents: r.payment_amount_cents,
            payment_method: r.payment_method,
            balance_cents: r.balance_cents,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContrafacturaCheckResponse {
    pub client_id: String,
    pub delinquent: bool,
    pub outstanding_cents: i64,
    pub pending_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCheckResponse {
    pub client_id: String,
    /// Details bound at the client's first rendition.
    pub client_details: String,
    pub renditions: Vec<RenditionResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingQuery {
    pub client_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub payment_amount_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub deleted: u64,
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/renditions`
pub async fn list_own(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<RenditionResponse>>> {
    let renditions = state.db.renditions().list_for_user(&user.user_id).await?;
    Ok(Json(renditions.into_iter().map(Into::into).collect()))
}

/// `POST /api/renditions`
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateRenditionRequest>,
) -> ApiResult<(StatusCode, Json<RenditionResponse>)> {
    let rendition = state
        .db
        .renditions()
        .create(req.into(), &user.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(rendition.into())))
}

/// `GET /api/renditions/check-contrafactura/{client_id}`
///
/// Answers the pre-sale question: can this client take a new rendition,
/// and if not, how much is outstanding across how many open records.
pub async fn check_contrafactura(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(client_id): Path<String>,
) -> ApiResult<Json<ContrafacturaCheckResponse>> {
    let renditions = state.db.renditions();

    let outstanding_cents = renditions.outstanding_for_client(&client_id).await?;
    let pending = renditions.list_pending(Some(&client_id)).await?;

    Ok(Json(ContrafacturaCheckResponse {
        client_id,
        delinquent: outstanding_cents > 0,
        outstanding_cents,
        pending_count: pending.len(),
    }))
}

/// `GET /api/renditions/check-client/{client_id}`
///
/// Returns the identity bound at the client's first rendition plus their
/// history; 404 for a client the system has never seen.
pub async fn check_client(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(client_id): Path<String>,
) -> ApiResult<Json<ClientCheckResponse>> {
    let renditions = state.db.renditions();

    let client_details = renditions
        .client_details(&client_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Client", &client_id))?;

    let history = renditions.list_for_client(&client_id).await?;

    Ok(Json(ClientCheckResponse {
        client_id,
        client_details,
        renditions: history.into_iter().map(Into::into).collect(),
    }))
}

/// `GET /api/renditions/pending-contrafacturas`
///
/// Every rendition still carrying a balance, optionally scoped to one
/// client via `?clientId=`.
pub async fn pending_contrafacturas(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<PendingQuery>,
) -> ApiResult<Json<Vec<RenditionResponse>>> {
    let pending = state
        .db
        .renditions()
        .list_pending(query.client_id.as_deref())
        .await?;

    Ok(Json(pending.into_iter().map(Into::into).collect()))
}

/// `POST /api/renditions/pay-contrafactura/{id}`
pub async fn pay_contrafactura(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<PayRequest>,
) -> ApiResult<Json<RenditionResponse>> {
    let rendition = state
        .db
        .renditions()
        .post_payment(&id, Money::from_cents(req.payment_amount_cents))
        .await?;

    Ok(Json(rendition.into()))
}

/// `DELETE /api/renditions`
///
/// Removes the caller's renditions only. Stock stays as-is and archived
/// sale records survive; this is a bookkeeping reset, not an undo.
pub async fn reset_own(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ResetResponse>> {
    let deleted = state.db.renditions().reset_for_user(&user.user_id).await?;
    info!(username = %user.username, deleted, "Rendition history reset");

    Ok(Json(ResetResponse { deleted }))
}

// =============================================================================
// Unit Tests
// =============================================================================
