use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use portal_core::config::DevConfig;
use portal_core::{Actor, IdentityError, IdentityProvider, Role};

pub use portal_core::actor::{EMAIL_HEADER, ROLE_HEADER};

use crate::error::ApiError;
use crate::state::AppState;

/// One way of turning request headers into an actor.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// `x-portal-email` / `x-portal-role` headers.
    DevHeaders,
    /// A fixed actor configured at process start.
    DevActor(Actor),
    /// `Authorization: Bearer <token>` verified by the identity provider.
    Bearer,
}

/// Resolves the calling actor by trying each strategy in order.
///
/// Evaluation (first match wins):
/// 1. `DevHeaders` → actor when `x-portal-email` is present
/// 2. `DevActor` → always matches
/// 3. `Bearer` → verified token, or no actor
///
/// A rejected token means "no actor". Any other identity-provider failure is
/// returned as an error so an outage is not mistaken for a logout.
///
/// Only `Bearer` is enabled unless the development settings turn the others
/// on, so production needs no code path changes to disable them.
pub struct ActorResolver {
    strategies: Vec<Strategy>,
    identity: Arc<dyn IdentityProvider>,
}

impl ActorResolver {
    pub fn new(strategies: Vec<Strategy>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            strategies,
            identity,
        }
    }

    pub fn from_config(dev: &DevConfig, identity: Arc<dyn IdentityProvider>) -> Self {
        let mut strategies = Vec::new();
        if dev.allow_headers {
            strategies.push(Strategy::DevHeaders);
        }
        if let Some(actor) = dev.actor() {
            strategies.push(Strategy::DevActor(actor));
        }
        strategies.push(Strategy::Bearer);
        Self::new(strategies, identity)
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Actor>, IdentityError> {
        for strategy in &self.strategies {
            let resolved = match strategy {
                Strategy::DevHeaders => actor_from_dev_headers(headers),
                Strategy::DevActor(actor) => Some(actor.clone()),
                Strategy::Bearer => self.actor_from_bearer(headers).await?,
            };
            if resolved.is_some() {
                return Ok(resolved);
            }
        }
        Ok(None)
    }

    async fn actor_from_bearer(&self, headers: &HeaderMap) -> Result<Option<Actor>, IdentityError> {
        let Some(token) = bearer_token(headers) else {
            return Ok(None);
        };
        match self.identity.verify_token(token).await {
            Ok(verified) => {
                let role = verified
                    .role_claim
                    .as_deref()
                    .map(Role::parse_or_student)
                    .unwrap_or_default();
                Ok(Actor::new(&verified.email, role))
            }
            Err(IdentityError::InvalidToken) => {
                tracing::debug!("bearer token rejected");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// Any authenticated actor. Rejects with 401, or 500 when the identity
/// provider cannot be reached.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        if let Some(actor) = parts.extensions.get::<Actor>() {
            return Ok(Self(actor.clone()));
        }
        let actor = state
            .resolver
            .resolve(&parts.headers)
            .await?
            .ok_or(ApiError::Unauthenticated)?;
        tracing::debug!(actor = actor.email(), role = %actor.role(), "actor resolved");
        parts.extensions.insert(actor.clone());
        Ok(Self(actor))
    }
}

/// An ADMIN or INSTRUCTOR actor. Rejects with 401, then 403.
#[derive(Debug, Clone)]
pub struct AdminActor(pub Actor);

impl FromRequestParts<AppState> for AdminActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let CurrentActor(actor) = CurrentActor::from_request_parts(parts, state).await?;
        if !actor.is_admin_capable() {
            return Err(ApiError::forbidden("Forbidden"));
        }
        Ok(Self(actor))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Impersonated actor from the development headers. Role defaults to
/// STUDENT; unknown roles coerce to STUDENT.
pub fn actor_from_dev_headers(headers: &HeaderMap) -> Option<Actor> {
    let email = header_value(headers, EMAIL_HEADER)?;
    let role = header_value(headers, ROLE_HEADER)
        .map(Role::parse_or_student)
        .unwrap_or_default();
    Actor::new(email, role)
}

/// The credential of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = header_value(headers, AUTHORIZATION.as_str())?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
