use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

use crate::actor::Actor;
use crate::error::GatewayError;

// ---------------------------------------------------------------------------
// Action names
// ---------------------------------------------------------------------------

static ACTION_RE: OnceLock<Regex> = OnceLock::new();

fn action_re() -> &'static Regex {
    ACTION_RE.get_or_init(|| {
        Regex::new(r"^[a-z][A-Za-z0-9]*(\.[a-z][A-Za-z0-9]*)+$").expect("static regex")
    })
}

/// Action names are dot-namespaced identifiers such as `portal.submitClaim`.
pub fn validate_action(action: &str) -> Result<(), GatewayError> {
    if action.len() > 128 || !action_re().is_match(action) {
        return Err(GatewayError::InvalidAction(action.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ActionRequest
// ---------------------------------------------------------------------------

/// The body sent to the workflow backend. Built once per route call and sent
/// verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRequest {
    action: String,
    actor: Actor,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl ActionRequest {
    pub fn new(
        action: impl Into<String>,
        actor: Actor,
        data: Option<Value>,
    ) -> Result<Self, GatewayError> {
        let action = action.into();
        validate_action(&action)?;
        Ok(Self {
            action,
            actor,
            data,
        })
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

// ---------------------------------------------------------------------------
// ActionEnvelope
// ---------------------------------------------------------------------------

/// `{ ok, code, message, data }` as answered by the workflow backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    pub ok: bool,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

impl ActionEnvelope {
    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code: code.into(),
            message: message.into(),
            data: Value::Null,
        }
    }

    /// `data` on success; a `Rejected` error carrying code and data otherwise.
    pub fn into_result(self) -> Result<Value, GatewayError> {
        if self.ok {
            Ok(self.data)
        } else {
            let message = if self.message.is_empty() {
                format!("action failed ({})", self.code)
            } else {
                self.message
            };
            Err(GatewayError::Rejected {
                code: self.code,
                message,
                data: self.data,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP wire shapes
// ---------------------------------------------------------------------------

/// Success body every route answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSuccess {
    pub ok: bool,
    pub data: Value,
}

impl ApiSuccess {
    pub fn new(data: Value) -> Self {
        Self { ok: true, data }
    }
}

/// Failure body every route answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
