use axum::extract::State;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{AdminActor, CurrentActor};
use crate::error::ApiError;
use crate::respond::{ok, ApiResult};
use crate::state::AppState;
use crate::validation::{require, FieldErrors, PathParam, Payload, Validate};

/// GET /api/raffles — open and recent raffles.
pub async fn list_raffles(
    State(app): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult {
    let data = app.gateway.invoke("portal.listRaffles", &actor, None).await?;
    Ok(ok(data))
}

/// POST /api/raffles/:raffleId/entries — enter a raffle. The backend
/// enforces one active entry per student.
pub async fn enter_raffle(
    State(app): State<AppState>,
    CurrentActor(actor): CurrentActor,
    PathParam(raffle_id): PathParam,
) -> ApiResult {
    let raffle_id = require(Some(&raffle_id), "RAFFLE_ID")?;
    let data = app
        .gateway
        .invoke(
            "portal.enterRaffle",
            &actor,
            Some(json!({ "raffle_id": raffle_id })),
        )
        .await?;
    Ok(ok(data))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateRaffleBody {
    pub title: String,
    pub prize_description: Option<String>,
    pub closes_at: Option<String>,
}

impl Validate for CreateRaffleBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.text("title", &self.title, 120);
        errors.optional_text("prizeDescription", self.prize_description.as_deref(), 500);
        errors.rfc3339("closesAt", self.closes_at.as_deref());
        errors.finish()
    }
}

/// POST /api/admin/raffles — open a new raffle.
pub async fn create_raffle(
    State(app): State<AppState>,
    AdminActor(actor): AdminActor,
    Payload(body): Payload<CreateRaffleBody>,
) -> ApiResult {
    let payload = json!({
        "title": body.title.trim(),
        "prize_description": body.prize_description.map(|p| p.trim().to_string()),
        "closes_at": body.closes_at,
    });
    let data = app
        .gateway
        .invoke("admin.createRaffle", &actor, Some(payload))
        .await?;
    Ok(ok(data))
}

/// POST /api/admin/raffles/:raffleId/draw — draw the winner.
pub async fn draw_raffle(
    State(app): State<AppState>,
    AdminActor(actor): AdminActor,
    PathParam(raffle_id): PathParam,
) -> ApiResult {
    let raffle_id = require(Some(&raffle_id), "RAFFLE_ID")?;
    tracing::info!(raffle_id = %raffle_id, by = actor.email(), "drawing raffle");
    let data = app
        .gateway
        .invoke(
            "admin.drawRaffle",
            &actor,
            Some(json!({ "raffle_id": raffle_id })),
        )
        .await?;
    Ok(ok(data))
}
