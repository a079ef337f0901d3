use axum::extract::State;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AdminActor;
use crate::error::ApiError;
use crate::respond::{ok, ApiResult};
use crate::state::AppState;
use crate::validation::{FieldErrors, Payload, Validate};

pub const MAX_BROADCAST_CHARS: usize = 500;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BroadcastBody {
    pub message: String,
}

impl Validate for BroadcastBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.text("message", &self.message, MAX_BROADCAST_CHARS);
        errors.finish()
    }
}

/// POST /api/admin/broadcast — announce a message to every student.
pub async fn broadcast(
    State(app): State<AppState>,
    AdminActor(actor): AdminActor,
    Payload(body): Payload<BroadcastBody>,
) -> ApiResult {
    let data = app
        .gateway
        .invoke(
            "admin.broadcast",
            &actor,
            Some(json!({ "message": body.message.trim() })),
        )
        .await?;
    Ok(ok(data))
}
