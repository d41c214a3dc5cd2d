//! Stock ledger routes.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use reparto_core::{StockAction, StockItem};

use super::ApiJson;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

/// Wire shape for one ledger row.
#[derive(Debug, Serialize)]
pub struct StockItemResponse {
    pub product: String,
    pub quantity: i64,
}

impl From<StockItem> for StockItemResponse {
    fn from(item: StockItem) -> Self {
        StockItemResponse {
            product: item.product,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StockMutationRequest {
    pub action: StockAction,
    pub product: String,
    pub quantity: i64,
}

/// `GET /api/stock`
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Json<Vec<StockItemResponse>>> {
    let items = state.db.stocks().list().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// `POST /api/stock`
///
/// The `action` tag is a closed set; an unknown tag never reaches this
/// handler because body deserialization already rejected it.
pub async fn apply(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<StockMutationRequest>,
) -> ApiResult<Json<StockItemResponse>> {
    let item = state
        .db
        .stocks()
        .apply(&req.product, req.action, req.quantity, &user.user_id)
        .await?;

    Ok(Json(item.into()))
}
