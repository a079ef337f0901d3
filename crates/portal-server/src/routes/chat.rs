use axum::extract::State;
use portal_core::chat::{DEFAULT_MODERATION_TEXT, MAX_MESSAGE_CHARS};
use serde::Deserialize;

use crate::auth::{AdminActor, CurrentActor};
use crate::error::ApiError;
use crate::respond::{ok_serialized, ApiResult};
use crate::state::AppState;
use crate::validation::{require, FieldErrors, PathParam, Payload, QueryParams, Validate};

const DEFAULT_PAGE: i64 = 50;
const MAX_PAGE: i64 = 200;
const MAX_REPLACEMENT_CHARS: usize = 200;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatQuery {
    pub limit: Option<i64>,
}

impl Validate for ChatQuery {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(limit) = self.limit {
            errors.range("limit", limit, 1, MAX_PAGE);
        }
        errors.finish()
    }
}

/// GET /api/chat/messages — most recent messages, oldest first.
pub async fn list_messages(
    State(app): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    QueryParams(query): QueryParams<ChatQuery>,
) -> ApiResult {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE) as usize;
    let messages = app.chat.recent(limit).await?;
    ok_serialized(&messages)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostMessageBody {
    pub text: String,
}

impl Validate for PostMessageBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.text("text", &self.text, MAX_MESSAGE_CHARS);
        errors.finish()
    }
}

/// POST /api/chat/messages — post to the class chat.
pub async fn post_message(
    State(app): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Payload(body): Payload<PostMessageBody>,
) -> ApiResult {
    let message = app.chat.append(&actor, &body.text).await?;
    ok_serialized(&message)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModerateBody {
    pub replacement: Option<String>,
}

impl Validate for ModerateBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.optional_text("replacement", self.replacement.as_deref(), MAX_REPLACEMENT_CHARS);
        errors.finish()
    }
}

/// POST /api/admin/chat/:messageId/moderate — replace a message's text.
pub async fn moderate_message(
    State(app): State<AppState>,
    AdminActor(actor): AdminActor,
    PathParam(message_id): PathParam,
    Payload(body): Payload<ModerateBody>,
) -> ApiResult {
    let message_id = require(Some(&message_id), "MESSAGE_ID")?;
    let replacement = body
        .replacement
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_MODERATION_TEXT);
    tracing::info!(message_id = %message_id, by = actor.email(), "moderating chat message");
    let message = app.chat.moderate(&message_id, replacement).await?;
    ok_serialized(&message)
}
