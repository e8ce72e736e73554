use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, cast, generation};
use crate::state::AppState;
use std::sync::Arc;

pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Protected routes (auth required)
        .route("/credits", get(api::get_credits))
        .route("/studios/{studio_id}/generations", get(api::get_generation_record))
        .route(
            "/studios/{studio_id}/chapters/{chapter_id}/blocks/{block_id}/audio",
            post(generation::generate_block_audio),
        )
        .route(
            "/studios/{studio_id}/chapters/{chapter_id}/audio",
            post(generation::generate_chapter_audio),
        )
        .route("/studios/{studio_id}/audio", post(generation::generate_project_audio))
        .route("/studios/{studio_id}/cast", post(cast::add_cast_member))
        .route(
            "/studios/{studio_id}/cast/{cast_id}",
            patch(cast::edit_cast_member).delete(cast::delete_cast_member),
        )
        .layer(TraceLayer::new_for_http())
}
