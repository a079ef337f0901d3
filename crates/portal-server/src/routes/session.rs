use axum::extract::State;
use serde_json::json;

use crate::auth::CurrentActor;
use crate::respond::{ok, ApiResult};
use crate::state::AppState;

/// GET /api/session — the resolved actor. Used by the client session cache.
pub async fn get_session(CurrentActor(actor): CurrentActor) -> ApiResult {
    Ok(ok(json!({
        "email": actor.email(),
        "role": actor.role(),
        "adminCapable": actor.is_admin_capable(),
    })))
}

/// GET /api/dashboard — the student's home summary.
pub async fn get_dashboard(
    State(app): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult {
    let data = app
        .gateway
        .invoke("portal.getDashboard", &actor, None)
        .await?;
    Ok(ok(data))
}
