use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::{ApiResult, AppState, AuthenticatedUser};
use crate::domain::aggregates::ProfileData;
use crate::services::{IdentityEvent, WebhookOutcome};

pub(super) async fn sync(
    State(s): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<ProfileData>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(data) = body?;
    let profile = s.profiles.sync(&user.user_id, data).await?;
    Ok(Json(json!({ "success": true, "user": profile })))
}

pub(super) async fn webhook(State(s): State<AppState>, body: Result<Json<IdentityEvent>, JsonRejection>) -> ApiResult<Json<Value>> {
    let Json(event) = body?;
    let message = match s.profiles.handle_event(event).await? {
        WebhookOutcome::Upserted(_) => "User synced",
        WebhookOutcome::Deactivated(_) => "User deactivated",
        WebhookOutcome::Ignored => "Webhook received",
    };
    Ok(Json(json!({ "success": true, "message": message })))
}
