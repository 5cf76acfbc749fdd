use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiResult, AppState, AuthenticatedUser};
use crate::domain::aggregates::CartItem;

#[derive(Debug, Deserialize)]
pub(super) struct CartBody {
    #[serde(default)]
    items: Vec<CartItem>,
}

pub(super) async fn get(State(s): State<AppState>, user: AuthenticatedUser) -> ApiResult<Json<Value>> {
    let items = s.carts.items(&user.user_id).await?;
    Ok(Json(json!({ "items": items })))
}

pub(super) async fn save(
    State(s): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CartBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;
    s.carts.replace(&user.user_id, body.items).await?;
    Ok(Json(json!({ "success": true })))
}

pub(super) async fn merge(
    State(s): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CartBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;
    let items = s.carts.merge(&user.user_id, body.items).await?;
    Ok(Json(json!({ "items": items })))
}
