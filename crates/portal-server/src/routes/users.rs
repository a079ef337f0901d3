use axum::extract::State;
use axum::Json;
use portal_core::identity::UserRecord;
use portal_core::Role;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AdminActor;
use crate::error::ApiError;
use crate::respond::{ok, ApiResult};
use crate::state::AppState;
use crate::validation::{is_email, require, FieldErrors, Payload, Validate};

const RESET_NOTICE: &str = "If your account exists, a reset link has been sent.";
const MAX_DISPLAY_NAME_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Provisioning
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvisionBody {
    pub email: String,
    pub role: String,
    pub display_name: Option<String>,
}

impl Validate for ProvisionBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.email("email", &self.email);
        if Role::parse(&self.role).is_none() {
            errors.add("role", "must be one of STUDENT, INSTRUCTOR, ADMIN");
        }
        errors.optional_text("displayName", self.display_name.as_deref(), MAX_DISPLAY_NAME_CHARS);
        errors.finish()
    }
}

/// POST /api/admin/users — create or update an account, set its role claim
/// and hand back a password-reset link for onboarding.
///
/// Instructors may only provision students.
pub async fn provision_user(
    State(app): State<AppState>,
    AdminActor(actor): AdminActor,
    Payload(body): Payload<ProvisionBody>,
) -> ApiResult {
    let role = Role::parse(&body.role).unwrap_or_default();
    if role != Role::Student && actor.role() != Role::Admin {
        return Err(ApiError::forbidden(format!(
            "Only admins may grant the {role} role"
        )));
    }

    let email = body.email.trim().to_lowercase();
    let display_name = body
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let (user, created): (UserRecord, bool) = match app.identity.lookup_user(&email).await? {
        Some(user) => {
            if let Some(name) = display_name {
                app.identity.update_display_name(&user.uid, name).await?;
            }
            (user, false)
        }
        None => (app.identity.create_user(&email, display_name).await?, true),
    };
    app.identity.set_role_claim(&user.uid, role).await?;

    let login_url = app.config.login_url();
    let reset_link = app
        .identity
        .password_reset_link(&email, login_url.as_deref())
        .await?;

    tracing::info!(
        email = %email,
        role = %role,
        created,
        by = actor.email(),
        "provisioned user"
    );
    Ok(ok(json!({
        "uid": user.uid,
        "email": email,
        "role": role,
        "created": created,
        "resetLink": reset_link,
    })))
}

// ---------------------------------------------------------------------------
// Password reset
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PasswordResetBody {
    pub email: Option<String>,
}

impl Validate for PasswordResetBody {
    // Absence answers MISSING_EMAIL, so only the format is checked here.
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

/// POST /api/auth/password-reset — public. Answers the same way whether or
/// not the account exists.
pub async fn password_reset(
    State(app): State<AppState>,
    Payload(body): Payload<PasswordResetBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let email = require(body.email.as_deref(), "EMAIL")?.to_lowercase();
    let login_url = app.config.login_url();
    if let Err(e) = app
        .identity
        .send_password_reset(&email, login_url.as_deref())
        .await
    {
        tracing::warn!("password reset not sent: {e}");
    }
    Ok(Json(json!({ "ok": true, "message": RESET_NOTICE })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provision_rejects_unknown_role() {
        let body: ProvisionBody = serde_json::from_value(json!({
            "email": "new@school.edu",
            "role": "PRINCIPAL",
        }))
        .unwrap();
        match body.validate().unwrap_err() {
            ApiError::InvalidPayload { details, .. } => {
                assert_eq!(details[0].field, "role");
            }
            other => panic!("expected InvalidPayload, got {other:?}"),
        }
    }

    #[test]
    fn provision_role_is_case_insensitive() {
        let body: ProvisionBody = serde_json::from_value(json!({
            "email": "new@school.edu",
            "role": "instructor",
            "displayName": "Ms. Rivera",
        }))
        .unwrap();
        assert!(body.validate().is_ok());
    }

    #[test]
    fn reset_body_checks_format_only() {
        assert!(PasswordResetBody::default().validate().is_ok());
        let body = PasswordResetBody {
            email: Some("not-an-email".into()),
        };
        assert!(body.validate().is_err());
    }
}
