use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{AdminUser, ApiResult, AppState};

pub(super) async fn list(State(s): State<AppState>, _admin: AdminUser) -> ApiResult<Json<Value>> {
    let orders = s.orders.admin_list().await?;
    Ok(Json(json!({ "orders": orders })))
}

#[derive(Debug, Deserialize)]
pub(super) struct SetStatus {
    #[serde(default)]
    status: String,
}

pub(super) async fn set_status(
    State(s): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    body: Result<Json<SetStatus>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;
    let order = s.orders.admin_set_status(&id, &body.status).await?;
    tracing::debug!(admin = %admin.user_id, order_id = %id, "status updated");
    Ok(Json(json!({ "success": true, "order": order })))
}
