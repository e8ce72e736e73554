//! Audio generation endpoints.
//!
//! Three scopes, one response shape. Each handler resolves the billing
//! principal from the request extensions, runs the generation pipeline and
//! returns the artifact locator together with the exact credits charged.
//! Errors map to the structured error body via [`ApiError`]; a failed
//! credit deduction after a persisted artifact is not an error here by
//! contract.

use axum::{
    Extension,
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::auth::Principal;
use crate::core::generation::GenerationOutcome;
use crate::errors::ApiResult;
use crate::state::AppState;

/// Request body for chapter and project generation.
///
/// With a `snapshot_id` the provider-side snapshot is streamed directly;
/// without one a fresh conversion is started first.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub snapshot_id: Option<String>,
}

/// Handler for `POST /studios/{studio_id}/chapters/{chapter_id}/blocks/{block_id}/audio`
pub async fn generate_block_audio(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path((studio_id, chapter_id, block_id)): Path<(String, String, String)>,
) -> ApiResult<Json<GenerationOutcome>> {
    info!(
        principal = %principal.id,
        studio = %studio_id,
        block = %block_id,
        "block audio generation requested"
    );

    let outcome = state
        .orchestrator
        .generate_block(&principal.id, &studio_id, &chapter_id, &block_id)
        .await?;

    Ok(Json(outcome))
}

/// Handler for `POST /studios/{studio_id}/chapters/{chapter_id}/audio`
pub async fn generate_chapter_audio(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path((studio_id, chapter_id)): Path<(String, String)>,
    body: Option<Json<GenerateRequest>>,
) -> ApiResult<Json<GenerationOutcome>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    info!(
        principal = %principal.id,
        studio = %studio_id,
        chapter = %chapter_id,
        snapshot = ?request.snapshot_id,
        "chapter audio generation requested"
    );

    let outcome = state
        .orchestrator
        .generate_chapter(
            &principal.id,
            &studio_id,
            &chapter_id,
            request.snapshot_id.as_deref(),
        )
        .await?;

    Ok(Json(outcome))
}

/// Handler for `POST /studios/{studio_id}/audio`
pub async fn generate_project_audio(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(studio_id): Path<String>,
    body: Option<Json<GenerateRequest>>,
) -> ApiResult<Json<GenerationOutcome>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    info!(
        principal = %principal.id,
        studio = %studio_id,
        snapshot = ?request.snapshot_id,
        "complete audiobook generation requested"
    );

    let outcome = state
        .orchestrator
        .generate_project(&principal.id, &studio_id, request.snapshot_id.as_deref())
        .await?;

    Ok(Json(outcome))
}
