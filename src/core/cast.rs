//! Cast roster management.
//!
//! A studio's cast maps narrators and characters to provider voices. The
//! coordinator owns the roster lifecycle and keeps the two voice fields
//! honest: `original_voice_id` is pinned when a member is added and
//! `voice_id` is what edits move around. Removing a member is the
//! compensating action, every node still speaking with the member's
//! current voice is reverted to the original voice, chapter by chapter.
//!
//! Provider-side pushes (voice settings on add, reverted chapter content
//! on delete) are best-effort. Roster and document changes are the source
//! of truth and never wait on the provider.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::documents::{CastMember, DocumentStore, StoreError};
use crate::core::tts::{SynthesisProvider, VoiceSettings};

/// Errors that can occur during cast operations.
#[derive(Error, Debug)]
pub enum CastError {
    /// The request is malformed.
    #[error("{0}")]
    Validation(String),

    /// The studio or cast member does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The document store failed.
    #[error("document store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for cast operations.
pub type Result<T> = std::result::Result<T, CastError>;

/// Fields for a new cast member.
#[derive(Debug, Clone, Deserialize)]
pub struct CastMemberDraft {
    pub nickname: String,
    pub voice_id: String,
    #[serde(default)]
    pub override_globally: bool,
    #[serde(default)]
    pub override_settings: Option<VoiceSettings>,
}

/// Partial update for an existing cast member. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CastMemberUpdate {
    pub nickname: Option<String>,
    pub voice_id: Option<String>,
    pub override_globally: Option<bool>,
    pub override_settings: Option<VoiceSettings>,
}

/// The roster after a cast operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterState {
    pub cast: Vec<CastMember>,
}

/// Coordinates roster changes with chapter content and the provider.
pub struct CastVoiceCoordinator {
    documents: Arc<dyn DocumentStore>,
    synthesis: Arc<dyn SynthesisProvider>,
}

impl CastVoiceCoordinator {
    pub fn new(documents: Arc<dyn DocumentStore>, synthesis: Arc<dyn SynthesisProvider>) -> Self {
        Self {
            documents,
            synthesis,
        }
    }

    /// Adds a member to the studio's cast.
    ///
    /// The member starts with `original_voice_id` equal to the assigned
    /// voice. Existing chapter content is never rewritten here; override
    /// propagation happens when content is rendered. Voice settings, when
    /// given, are pushed to the provider but a push failure only logs.
    pub async fn add_member(
        &self,
        studio_id: &str,
        draft: CastMemberDraft,
    ) -> Result<RosterState> {
        if draft.nickname.trim().is_empty() {
            return Err(CastError::Validation("nickname must not be empty".to_string()));
        }
        if draft.voice_id.trim().is_empty() {
            return Err(CastError::Validation("voice_id must not be empty".to_string()));
        }

        let mut studio = self.load_studio(studio_id).await?;

        if let Some(settings) = &draft.override_settings
            && let Err(e) = self
                .synthesis
                .update_voice_settings(&draft.voice_id, settings)
                .await
        {
            warn!(voice = %draft.voice_id, error = %e, "failed to push voice settings to provider");
        }

        let member = CastMember {
            id: Uuid::new_v4().to_string(),
            nickname: draft.nickname,
            original_voice_id: draft.voice_id.clone(),
            voice_id: draft.voice_id,
            override_globally: draft.override_globally,
            override_settings: draft.override_settings,
        };

        info!(studio = %studio_id, member = %member.id, voice = %member.voice_id, "adding cast member");

        studio.cast.push(member);
        self.documents.put_studio(&studio).await?;
        Ok(RosterState { cast: studio.cast })
    }

    /// Edits a member in place.
    ///
    /// Only the roster entry changes. `original_voice_id` is immutable,
    /// already-rendered content keeps its voices, and nothing is pushed to
    /// the provider.
    pub async fn edit_member(
        &self,
        studio_id: &str,
        cast_id: &str,
        update: CastMemberUpdate,
    ) -> Result<RosterState> {
        let mut studio = self.load_studio(studio_id).await?;
        let member = studio
            .cast
            .iter_mut()
            .find(|m| m.id == cast_id)
            .ok_or_else(|| CastError::NotFound(format!("cast member {cast_id}")))?;

        if let Some(nickname) = update.nickname {
            if nickname.trim().is_empty() {
                return Err(CastError::Validation("nickname must not be empty".to_string()));
            }
            member.nickname = nickname;
        }
        if let Some(voice_id) = update.voice_id {
            if voice_id.trim().is_empty() {
                return Err(CastError::Validation("voice_id must not be empty".to_string()));
            }
            member.voice_id = voice_id;
        }
        if let Some(override_globally) = update.override_globally {
            member.override_globally = override_globally;
        }
        if let Some(settings) = update.override_settings {
            member.override_settings = Some(settings);
        }

        info!(studio = %studio_id, member = %cast_id, "editing cast member");

        self.documents.put_studio(&studio).await?;
        Ok(RosterState { cast: studio.cast })
    }

    /// Removes a member and reverts its voice across all chapters.
    ///
    /// Every node currently assigned the member's voice goes back to the
    /// member's original voice. Reverted chapters are persisted before the
    /// roster entry disappears, and each one is pushed to the provider in
    /// the background; a push failure for one chapter never blocks the
    /// others or the removal.
    pub async fn delete_member(&self, studio_id: &str, cast_id: &str) -> Result<RosterState> {
        let mut studio = self.load_studio(studio_id).await?;
        let position = studio
            .cast
            .iter()
            .position(|m| m.id == cast_id)
            .ok_or_else(|| CastError::NotFound(format!("cast member {cast_id}")))?;
        let member = studio.cast[position].clone();

        let chapters = self.documents.chapters(studio_id).await?;
        let mut reverted_chapters = 0;
        for mut chapter in chapters {
            let mut reverted_nodes = 0;
            for block in &mut chapter.blocks {
                for node in &mut block.nodes {
                    if node.voice_id() == member.voice_id {
                        node.set_voice_id(member.original_voice_id.clone());
                        reverted_nodes += 1;
                    }
                }
            }
            if reverted_nodes == 0 {
                continue;
            }
            reverted_chapters += 1;

            self.documents.put_chapter(studio_id, &chapter).await?;

            let synthesis = Arc::clone(&self.synthesis);
            let project_id = studio.project_id.clone();
            let chapter_id = chapter.id.clone();
            let blocks = chapter.blocks.clone();
            tokio::spawn(async move {
                if let Err(e) = synthesis
                    .update_chapter_content(&project_id, &chapter_id, &blocks)
                    .await
                {
                    warn!(
                        chapter = %chapter_id,
                        error = %e,
                        "failed to push reverted chapter content to provider"
                    );
                }
            });
        }

        info!(
            studio = %studio_id,
            member = %cast_id,
            voice = %member.voice_id,
            chapters_reverted = reverted_chapters,
            "removing cast member"
        );

        studio.cast.remove(position);
        self.documents.put_studio(&studio).await?;
        Ok(RosterState { cast: studio.cast })
    }

    async fn load_studio(&self, studio_id: &str) -> Result<crate::core::documents::Studio> {
        self.documents
            .studio(studio_id)
            .await?
            .ok_or_else(|| CastError::NotFound(format!("studio {studio_id}")))
    }
}
