//! Cast roster endpoints.
//!
//! Thin wrappers over [`CastVoiceCoordinator`]: validate nothing beyond
//! deserialization, run the roster operation and return the resulting
//! roster. Voice revert propagation on delete happens inside the
//! coordinator.

use axum::{
    extract::{Path, State},
    response::Json,
};
use std::sync::Arc;
use tracing::info;

use crate::core::cast::{CastMemberDraft, CastMemberUpdate, RosterState};
use crate::errors::ApiResult;
use crate::state::AppState;

/// Handler for `POST /studios/{studio_id}/cast`
pub async fn add_cast_member(
    State(state): State<Arc<AppState>>,
    Path(studio_id): Path<String>,
    Json(draft): Json<CastMemberDraft>,
) -> ApiResult<Json<RosterState>> {
    info!(studio = %studio_id, nickname = %draft.nickname, "cast member add requested");

    let roster = state.cast.add_member(&studio_id, draft).await?;
    Ok(Json(roster))
}

/// Handler for `PATCH /studios/{studio_id}/cast/{cast_id}`
pub async fn edit_cast_member(
    State(state): State<Arc<AppState>>,
    Path((studio_id, cast_id)): Path<(String, String)>,
    Json(update): Json<CastMemberUpdate>,
) -> ApiResult<Json<RosterState>> {
    info!(studio = %studio_id, member = %cast_id, "cast member edit requested");

    let roster = state.cast.edit_member(&studio_id, &cast_id, update).await?;
    Ok(Json(roster))
}

/// Handler for `DELETE /studios/{studio_id}/cast/{cast_id}`
pub async fn delete_cast_member(
    State(state): State<Arc<AppState>>,
    Path((studio_id, cast_id)): Path<(String, String)>,
) -> ApiResult<Json<RosterState>> {
    info!(studio = %studio_id, member = %cast_id, "cast member delete requested");

    let roster = state.cast.delete_member(&studio_id, &cast_id).await?;
    Ok(Json(roster))
}
