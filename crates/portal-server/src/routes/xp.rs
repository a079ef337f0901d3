use axum::extract::State;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{AdminActor, CurrentActor};
use crate::error::ApiError;
use crate::respond::{ok, ApiResult};
use crate::state::AppState;
use crate::validation::{FieldErrors, Payload, QueryParams, Validate};

const DEFAULT_LEADERBOARD_SIZE: i64 = 10;
const MAX_GRANT: i64 = 100_000;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

impl Validate for LeaderboardQuery {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(limit) = self.limit {
            errors.range("limit", limit, 1, 100);
        }
        errors.finish()
    }
}

/// GET /api/xp/leaderboard — top students by XP.
pub async fn leaderboard(
    State(app): State<AppState>,
    CurrentActor(actor): CurrentActor,
    QueryParams(query): QueryParams<LeaderboardQuery>,
) -> ApiResult {
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_SIZE);
    let data = app
        .gateway
        .invoke("portal.getLeaderboard", &actor, Some(json!({ "limit": limit })))
        .await?;
    Ok(ok(data))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GrantXpBody {
    pub email: String,
    pub amount: Option<i64>,
    pub reason: String,
}

impl Validate for GrantXpBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.email("email", &self.email);
        match self.amount {
            None => errors.add("amount", "is required"),
            Some(0) => errors.add("amount", "must not be zero"),
            Some(amount) => errors.range("amount", amount, -MAX_GRANT, MAX_GRANT),
        }
        errors.text("reason", &self.reason, 500);
        errors.finish()
    }
}

/// POST /api/admin/xp/grants — award (or claw back) XP manually.
pub async fn grant_xp(
    State(app): State<AppState>,
    AdminActor(actor): AdminActor,
    Payload(body): Payload<GrantXpBody>,
) -> ApiResult {
    let payload = json!({
        "student_email": body.email.trim().to_lowercase(),
        "amount": body.amount,
        "reason": body.reason.trim(),
    });
    let data = app.gateway.invoke("admin.grantXp", &actor, Some(payload)).await?;
    Ok(ok(data))
}
