//! Request validation: body/query/path extractors that answer 400 with
//! `INVALID_PAYLOAD` and a field-level breakdown.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::Json;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

use crate::error::{ApiError, FieldError};

/// Schema check run after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

// ---------------------------------------------------------------------------
// FieldErrors
// ---------------------------------------------------------------------------

/// Collects every failing field before answering, so clients see all
/// problems at once.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Non-blank after trimming and at most `max` characters.
    pub fn text(&mut self, field: &str, value: &str, max: usize) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, "is required");
        } else if trimmed.chars().count() > max {
            self.add(field, format!("must be at most {max} characters"));
        }
    }

    /// Optional text; when present, at most `max` characters.
    pub fn optional_text(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            if v.trim().chars().count() > max {
                self.add(field, format!("must be at most {max} characters"));
            }
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "is required");
        } else if !is_email(value) {
            self.add(field, "must be a valid email address");
        }
    }

    pub fn one_of(&mut self, field: &str, value: &str, allowed: &[&str]) {
        if !allowed.contains(&value) {
            self.add(field, format!("must be one of {}", allowed.join(", ")));
        }
    }

    pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) {
        if value < min || value > max {
            self.add(field, format!("must be between {min} and {max}"));
        }
    }

    pub fn http_url(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            let v = v.trim();
            if !(v.starts_with("https://") || v.starts_with("http://")) || v.contains(' ') {
                self.add(field, "must be an http(s) URL");
            }
        }
    }

    pub fn rfc3339(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if chrono::DateTime::parse_from_rfc3339(v).is_err() {
                self.add(field, "must be an RFC 3339 timestamp");
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::invalid_payload("Invalid payload", self.0))
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"))
}

pub fn is_email(value: &str) -> bool {
    let value = value.trim();
    value.len() <= 254 && email_re().is_match(value)
}

/// Trimmed path/query value, or `MISSING_<FIELD>`.
pub fn require(value: Option<&str>, field: &'static str) -> Result<String, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ApiError::Missing(field))
}

fn rejection_error(field: &str, text: String) -> ApiError {
    ApiError::invalid_payload(
        "Invalid payload",
        vec![FieldError {
            field: field.into(),
            message: text,
        }],
    )
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = value.split(';').next().unwrap_or_default().trim();
    mime.eq_ignore_ascii_case("application/json")
        || (mime.starts_with("application/") && mime.ends_with("+json"))
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// JSON body that must deserialize and pass [`Validate`].
///
/// An empty body stands for `T::default()`, so routes whose fields are all
/// optional accept a bare POST. A non-empty body must be declared as JSON.
#[derive(Debug)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        let json_declared = is_json_content_type(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| rejection_error("body", rejection.body_text()))?;

        let value = if bytes.iter().all(u8::is_ascii_whitespace) {
            T::default()
        } else if !json_declared {
            return Err(rejection_error(
                "body",
                "Expected request with `Content-Type: application/json`".into(),
            ));
        } else {
            let Json(value) = Json::<T>::from_bytes(&bytes)
                .map_err(|rejection| rejection_error("body", rejection.body_text()))?;
            value
        };
        value.validate()?;
        Ok(Self(value))
    }
}

/// A single path segment. Undecodable segments answer `INVALID_PAYLOAD`
/// instead of a plain-text rejection; blank ones are left to [`require`].
#[derive(Debug)]
pub struct PathParam(pub String);

impl<S> FromRequestParts<S> for PathParam
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, ApiError> {
        let Path(value) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| rejection_error("path", rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string that must deserialize and pass [`Validate`].
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, ApiError> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| rejection_error("query", rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
