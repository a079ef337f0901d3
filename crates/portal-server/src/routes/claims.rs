use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{AdminActor, CurrentActor};
use crate::error::ApiError;
use crate::respond::{ok, ApiResult};
use crate::state::AppState;
use crate::validation::{require, FieldErrors, PathParam, Payload, QueryParams, Validate};

const CLAIM_STATUSES: &[&str] = &["PENDING", "APPROVED", "REJECTED"];
const DECISIONS: &[&str] = &["APPROVED", "REJECTED"];
const MAX_XP_AWARD: i64 = 10_000;

// ---------------------------------------------------------------------------
// Student
// ---------------------------------------------------------------------------

/// GET /api/claims — the caller's own claims.
pub async fn list_claims(
    State(app): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult {
    let data = app.gateway.invoke("portal.listClaims", &actor, None).await?;
    Ok(ok(data))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitClaimBody {
    pub quest_id: String,
    pub evidence_url: Option<String>,
    pub note: Option<String>,
}

impl Validate for SubmitClaimBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.text("questId", &self.quest_id, 128);
        errors.http_url("evidenceUrl", self.evidence_url.as_deref());
        errors.optional_text("note", self.note.as_deref(), 1000);
        errors.finish()
    }
}

impl SubmitClaimBody {
    fn into_payload(self) -> Value {
        json!({
            "quest_id": self.quest_id.trim(),
            "evidence_url": self.evidence_url.map(|u| u.trim().to_string()),
            "note": self.note.map(|n| n.trim().to_string()),
        })
    }
}

/// POST /api/claims — submit a quest claim for review.
pub async fn submit_claim(
    State(app): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Payload(body): Payload<SubmitClaimBody>,
) -> ApiResult {
    let data = app
        .gateway
        .invoke("portal.submitClaim", &actor, Some(body.into_payload()))
        .await?;
    Ok(ok(data))
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClaimFilter {
    pub status: Option<String>,
}

impl Validate for ClaimFilter {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(status) = &self.status {
            errors.one_of("status", status, CLAIM_STATUSES);
        }
        errors.finish()
    }
}

/// GET /api/admin/claims — the review queue, optionally filtered by status.
pub async fn admin_list_claims(
    State(app): State<AppState>,
    AdminActor(actor): AdminActor,
    QueryParams(filter): QueryParams<ClaimFilter>,
) -> ApiResult {
    let payload = filter.status.map(|status| json!({ "status": status }));
    let data = app
        .gateway
        .invoke("admin.listClaims", &actor, payload)
        .await?;
    Ok(ok(data))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewClaimBody {
    pub decision: String,
    pub xp_awarded: Option<i64>,
    pub reason: Option<String>,
}

impl Validate for ReviewClaimBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.one_of("decision", &self.decision, DECISIONS);
        if let Some(xp) = self.xp_awarded {
            errors.range("xpAwarded", xp, 0, MAX_XP_AWARD);
        }
        errors.optional_text("reason", self.reason.as_deref(), 500);
        if self.decision == "REJECTED"
            && self.reason.as_deref().map_or(true, |r| r.trim().is_empty())
        {
            errors.add("reason", "is required when rejecting a claim");
        }
        errors.finish()
    }
}

impl ReviewClaimBody {
    fn into_payload(self, claim_id: String) -> Value {
        json!({
            "claim_id": claim_id,
            "decision": self.decision,
            "xp_awarded": self.xp_awarded,
            "reason": self.reason.map(|r| r.trim().to_string()),
        })
    }
}

/// POST /api/admin/claims/:claimId/review — approve or reject a claim.
pub async fn review_claim(
    State(app): State<AppState>,
    AdminActor(actor): AdminActor,
    PathParam(claim_id): PathParam,
    Payload(body): Payload<ReviewClaimBody>,
) -> ApiResult {
    let claim_id = require(Some(&claim_id), "CLAIM_ID")?;
    let data = app
        .gateway
        .invoke("admin.reviewClaim", &actor, Some(body.into_payload(claim_id)))
        .await?;
    Ok(ok(data))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_payload_is_snake_cased() {
        let body: SubmitClaimBody = serde_json::from_value(json!({
            "questId": " q-7 ",
            "evidenceUrl": "https://img.example.org/p.png",
        }))
        .unwrap();
        assert!(body.validate().is_ok());
        assert_eq!(
            body.into_payload(),
            json!({
                "quest_id": "q-7",
                "evidence_url": "https://img.example.org/p.png",
                "note": null,
            })
        );
    }

    #[test]
    fn claim_requires_quest_id() {
        let body: SubmitClaimBody = serde_json::from_value(json!({})).unwrap();
        assert!(body.validate().is_err());
    }

    #[test]
    fn rejection_needs_a_reason() {
        let body: ReviewClaimBody =
            serde_json::from_value(json!({ "decision": "REJECTED" })).unwrap();
        assert!(body.validate().is_err());

        let body: ReviewClaimBody = serde_json::from_value(
            json!({ "decision": "REJECTED", "reason": "photo is blurry" }),
        )
        .unwrap();
        assert!(body.validate().is_ok());
    }

    #[test]
    fn review_rejects_unknown_decision_and_negative_xp() {
        let body: ReviewClaimBody =
            serde_json::from_value(json!({ "decision": "MAYBE", "xpAwarded": -5 })).unwrap();
        match body.validate().unwrap_err() {
            ApiError::InvalidPayload { details, .. } => {
                let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
                assert!(fields.contains(&"decision"));
                assert!(fields.contains(&"xpAwarded"));
            }
            other => panic!("expected InvalidPayload, got {other:?}"),
        }
    }

    #[test]
    fn review_payload_includes_claim_id() {
        let body: ReviewClaimBody =
            serde_json::from_value(json!({ "decision": "APPROVED", "xpAwarded": 50 })).unwrap();
        let payload = body.into_payload("c-1".into());
        assert_eq!(payload["claim_id"], "c-1");
        assert_eq!(payload["xp_awarded"], 50);
    }

    #[test]
    fn claim_filter_checks_status() {
        assert!(ClaimFilter {
            status: Some("PENDING".into())
        }
        .validate()
        .is_ok());
        assert!(ClaimFilter {
            status: Some("LOST".into())
        }
        .validate()
        .is_err());
        assert!(ClaimFilter::default().validate().is_ok());
    }
}
