use axum::extract::State;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{AdminActor, CurrentActor};
use crate::error::ApiError;
use crate::respond::{ok, ApiResult};
use crate::state::AppState;
use crate::validation::{require, FieldErrors, PathParam, Payload, QueryParams, Validate};

// ---------------------------------------------------------------------------
// Curriculum
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurriculumQuery {
    pub course_id: Option<String>,
}

impl Validate for CurriculumQuery {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.optional_text("courseId", self.course_id.as_deref(), 64);
        errors.finish()
    }
}

/// GET /api/curriculum — published curriculum, optionally for one course.
pub async fn get_curriculum(
    State(app): State<AppState>,
    CurrentActor(actor): CurrentActor,
    QueryParams(query): QueryParams<CurriculumQuery>,
) -> ApiResult {
    let payload = query
        .course_id
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .map(|course_id| json!({ "course_id": course_id }));
    let data = app
        .gateway
        .invoke("portal.getCurriculum", &actor, payload)
        .await?;
    Ok(ok(data))
}

// ---------------------------------------------------------------------------
// Lessons
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompleteLessonBody {
    pub score: Option<i64>,
}

impl Validate for CompleteLessonBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(score) = self.score {
            errors.range("score", score, 0, 100);
        }
        errors.finish()
    }
}

/// POST /api/lessons/:lessonId/complete — mark a lesson complete.
pub async fn complete_lesson(
    State(app): State<AppState>,
    CurrentActor(actor): CurrentActor,
    PathParam(lesson_id): PathParam,
    Payload(body): Payload<CompleteLessonBody>,
) -> ApiResult {
    let lesson_id = require(Some(&lesson_id), "LESSON_ID")?;
    let data = app
        .gateway
        .invoke(
            "portal.completeLesson",
            &actor,
            Some(json!({ "lesson_id": lesson_id, "score": body.score })),
        )
        .await?;
    Ok(ok(data))
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublishBody {
    pub course_id: String,
    pub notes: Option<String>,
}

impl Validate for PublishBody {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.text("courseId", &self.course_id, 64);
        errors.optional_text("notes", self.notes.as_deref(), 2000);
        errors.finish()
    }
}

/// POST /api/admin/curriculum/publish — publish the draft curriculum.
pub async fn publish_curriculum(
    State(app): State<AppState>,
    AdminActor(actor): AdminActor,
    Payload(body): Payload<PublishBody>,
) -> ApiResult {
    let course_id = body.course_id.trim().to_string();
    tracing::info!(course_id = %course_id, by = actor.email(), "publishing curriculum");
    let data = app
        .gateway
        .invoke(
            "admin.publishCurriculum",
            &actor,
            Some(json!({ "course_id": course_id, "notes": body.notes })),
        )
        .await?;
    Ok(ok(data))
}
