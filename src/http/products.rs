use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::{ApiError, ApiResult, AppState};

pub(super) async fn list(State(s): State<AppState>) -> Json<Value> {
    Json(json!({ "products": s.catalog.products() }))
}

pub(super) async fn get(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let product = s.catalog.product(&id).ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Product not found"))?;
    let discount = product.discount_percentage();
    Ok(Json(json!({ "product": product, "discountPercentage": discount })))
}
