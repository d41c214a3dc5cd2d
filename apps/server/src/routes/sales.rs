//! Sale bucket routes.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reparto_core::Sale;

use super::ApiJson;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleResponse {
    pub id: String,
    pub product: String,
    pub quantity: i64,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Sale> for SaleResponse {
    fn from(sale: Sale) -> Self {
        SaleResponse {
            id: sale.id,
            product: sale.product,
            quantity: sale.quantity,
            user_id: sale.user_id,
            created_at: sale.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordSaleRequest {
    pub product: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub archived: u64,
    pub message: String,
}

/// `POST /api/sales`
///
/// Decrements stock and appends to the daily bucket atomically; the sale
/// is attributed to the caller.
pub async fn record(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<RecordSaleRequest>,
) -> ApiResult<Json<SaleResponse>> {
    let sale = state
        .db
        .sales()
        .record(&req.product, req.quantity, &user.user_id)
        .await?;

    Ok(Json(sale.into()))
}

/// `POST /api/sales/transfer-to-weekly`
///
/// Archiving an empty day is a successful no-op, reported as such.
pub async fn transfer_to_weekly(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Json<TransferResponse>> {
    let archived = state.db.sales().archive_to_weekly().await?;

    let message = if archived == 0 {
        "No daily sales to archive".to_string()
    } else {
        format!("Archived {} daily sales", archived)
    };

    Ok(Json(TransferResponse { archived, message }))
}
