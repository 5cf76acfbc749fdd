use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiResult, AppState, AuthenticatedUser};
use crate::services::PlaceOrderRequest;

pub(super) async fn list(State(s): State<AppState>, user: AuthenticatedUser) -> ApiResult<Json<Value>> {
    let orders = s.orders.list_user_orders(&user.user_id).await?;
    Ok(Json(json!({ "orders": orders })))
}

pub(super) async fn create(
    State(s): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(req) = body?;
    let order_id = s.orders.place_order(&user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "orderId": order_id }))))
}

pub(super) async fn get(State(s): State<AppState>, user: AuthenticatedUser, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let order = s.orders.get_order_for_user(&id, &user.user_id).await?;
    Ok(Json(json!({ "order": order })))
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusUpdate {
    #[serde(default)]
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

pub(super) async fn cancel(
    State(s): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(update) = body?;
    s.orders.cancel_order(&id, &user.user_id, &update.status, update.reason).await?;
    Ok(Json(json!({ "success": true })))
}
