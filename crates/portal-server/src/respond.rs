//! Success side of the envelope responder. Failures go through
//! [`crate::error::ApiError`].

use axum::Json;
use portal_core::ApiSuccess;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// What every portal route returns.
pub type ApiResult = Result<Json<ApiSuccess>, ApiError>;

/// 200 `{ ok: true, data }`.
pub fn ok(data: Value) -> Json<ApiSuccess> {
    Json(ApiSuccess::new(data))
}

/// 200 `{ ok: true, data }` for a locally produced value.
pub fn ok_serialized<T: Serialize>(value: &T) -> ApiResult {
    let data = serde_json::to_value(value).map_err(|e| ApiError::Internal(e.into()))?;
    Ok(ok(data))
}
