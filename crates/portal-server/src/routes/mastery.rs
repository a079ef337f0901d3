use axum::extract::State;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{AdminActor, CurrentActor};
use crate::error::ApiError;
use crate::respond::{ok, ApiResult};
use crate::state::AppState;
use crate::validation::{is_email, require, FieldErrors, QueryParams, Validate};

/// GET /api/mastery — the caller's mastery analytics.
pub async fn get_mastery(
    State(app): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult {
    let data = app.gateway.invoke("portal.getMastery", &actor, None).await?;
    Ok(ok(data))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportQuery {
    pub email: Option<String>,
}

impl Validate for ReportQuery {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(email) = self.email.as_deref().filter(|e| !e.trim().is_empty()) {
            if !is_email(email) {
                errors.add("email", "must be a valid email address");
            }
        }
        errors.finish()
    }
}

/// GET /api/admin/mastery?email= — mastery report for one student.
pub async fn mastery_report(
    State(app): State<AppState>,
    AdminActor(actor): AdminActor,
    QueryParams(query): QueryParams<ReportQuery>,
) -> ApiResult {
    let email = require(query.email.as_deref(), "EMAIL")?.to_lowercase();
    let data = app
        .gateway
        .invoke(
            "admin.getMasteryReport",
            &actor,
            Some(json!({ "student_email": email })),
        )
        .await?;
    Ok(ok(data))
}
