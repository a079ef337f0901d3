use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use portal_core::{ApiErrorBody, GatewayError, IdentityError, PortalError};
use serde::Serialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// FieldError
// ---------------------------------------------------------------------------

/// One entry of the `details` array on a 400 `INVALID_PAYLOAD`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// ApiError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Every failure a route can answer with. Converts into `{ error, code,
/// details? }` with the matching status.
#[derive(Debug)]
pub enum ApiError {
    Unauthenticated,
    Forbidden(String),
    InvalidPayload {
        message: String,
        details: Vec<FieldError>,
    },
    /// A required path or query value is absent. Holds the upper-snake field
    /// name, e.g. `RAFFLE_ID` → code `MISSING_RAFFLE_ID`.
    Missing(&'static str),
    NotFound(String),
    MethodNotAllowed,
    Gateway(GatewayError),
    Identity(IdentityError),
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn invalid_payload(msg: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self::InvalidPayload {
            message: msg.into(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidPayload { .. } | Self::Missing(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Gateway(e) => match e {
                GatewayError::Rejected { .. } | GatewayError::InvalidAction(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                GatewayError::Transport(_)
                | GatewayError::Status { .. }
                | GatewayError::Decode(_) => StatusCode::BAD_GATEWAY,
                GatewayError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            },
            Self::Identity(IdentityError::UserNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Identity(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> String {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED".into(),
            Self::Forbidden(_) => "FORBIDDEN".into(),
            Self::InvalidPayload { .. } => "INVALID_PAYLOAD".into(),
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED".into(),
            Self::Missing(field) => format!("MISSING_{field}"),
            Self::NotFound(_) | Self::Identity(IdentityError::UserNotFound(_)) => {
                "NOT_FOUND".into()
            }
            Self::Gateway(e) => match e {
                GatewayError::Rejected { .. } => "ACTION_FAILED".into(),
                GatewayError::InvalidAction(_) => "INTERNAL".into(),
                GatewayError::Transport(_)
                | GatewayError::Status { .. }
                | GatewayError::Decode(_) => "UPSTREAM_UNAVAILABLE".into(),
                GatewayError::Timeout => "UPSTREAM_TIMEOUT".into(),
            },
            Self::Identity(_) => "IDENTITY_FAILED".into(),
            Self::Internal(_) => "INTERNAL".into(),
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Unauthenticated => "Unauthorized".into(),
            Self::MethodNotAllowed => "Method not allowed".into(),
            Self::Forbidden(msg) | Self::NotFound(msg) => msg.clone(),
            Self::InvalidPayload { message, .. } => message.clone(),
            Self::Missing(field) => format!("Missing {}", field.to_lowercase().replace('_', " ")),
            // Rejections surface the backend's message; transport failures
            // stay generic.
            Self::Gateway(GatewayError::Rejected { message, .. }) => message.clone(),
            Self::Gateway(GatewayError::Timeout) => "Workflow backend timed out".into(),
            Self::Gateway(GatewayError::InvalidAction(_)) => "Internal error".into(),
            Self::Gateway(_) => "Workflow backend unavailable".into(),
            Self::Identity(e) => e.to_string(),
            Self::Internal(e) => e.to_string(),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            Self::InvalidPayload { details, .. } if !details.is_empty() => {
                serde_json::to_value(details).ok()
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = %self.code(), "request failed: {}", self.log_line());
        }
        let body = ApiErrorBody {
            error: self.message(),
            code: self.code(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}

impl ApiError {
    fn log_line(&self) -> String {
        match self {
            Self::Gateway(GatewayError::Rejected { code, message, .. }) => {
                format!("backend rejected action ({code}): {message}")
            }
            Self::Gateway(e) => e.to_string(),
            Self::Identity(e) => e.to_string(),
            Self::Internal(e) => format!("{e:#}"),
            other => other.message(),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err)
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        Self::Identity(err)
    }
}

impl From<PortalError> for ApiError {
    fn from(err: PortalError) -> Self {
        match err {
            PortalError::MessageNotFound(id) => Self::NotFound(format!("message '{id}' not found")),
            PortalError::EmptyMessage => Self::invalid_payload(
                "Invalid payload",
                vec![FieldError {
                    field: "text".into(),
                    message: "must not be empty".into(),
                }],
            ),
            PortalError::Gateway(e) => Self::Gateway(e),
            PortalError::Identity(e) => Self::Identity(e),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
