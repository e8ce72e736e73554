//! Content model for audiobook studios.
//!
//! A studio is the audiobook workspace for a single project. Its narrative
//! content lives in chapters, each an ordered list of blocks; blocks contain
//! the typed nodes that carry synthesizable text. The wire shape of these
//! types is shared between the document store and the synthesis provider, so
//! a chapter read from storage can be pushed upstream without translation.

use serde::{Deserialize, Serialize};

use crate::core::tts::VoiceSettings;

/// The audiobook workspace for one project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Studio {
    /// Unique studio identifier.
    pub id: String,
    /// Identifier of the synthesis provider project backing this studio.
    pub project_id: String,
    /// Display name.
    pub name: String,
    /// Voice cast roster. Order is insertion order.
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

impl Studio {
    /// Looks up a cast member by id.
    pub fn cast_member(&self, cast_id: &str) -> Option<&CastMember> {
        self.cast.iter().find(|member| member.id == cast_id)
    }
}

/// A narrator or character voice assigned within a studio.
///
/// `original_voice_id` is fixed when the member is added and never changes
/// afterwards; it is the revert target when the member is removed.
/// `voice_id` starts equal to it and diverges when the member is edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    /// Unique roster entry identifier.
    pub id: String,
    /// Display name shown in the cast list.
    pub nickname: String,
    /// The voice this member was created with. Immutable after creation.
    pub original_voice_id: String,
    /// The voice currently assigned to this member.
    pub voice_id: String,
    /// Whether this member's voice replaces the original across all content.
    #[serde(default)]
    pub override_globally: bool,
    /// Provider-side voice settings pushed when the member was added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_settings: Option<VoiceSettings>,
}

/// One chapter of the audiobook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chapter {
    /// Unique chapter identifier within the studio.
    pub id: String,
    /// Chapter title.
    pub title: String,
    /// Ordered content blocks.
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// A paragraph-level unit of chapter content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    /// Unique block identifier within the chapter.
    pub block_id: String,
    /// Structural role of the block.
    pub sub_type: BlockKind,
    /// Ordered nodes carrying the block's text.
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// Structural role of a block.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading,
    Paragraph,
}

/// A typed content node.
///
/// Serialized with an explicit `type` tag, so a text-to-speech node reads
/// `{"type":"tts_node","text":...,"voice_id":...}` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Text spoken by a specific voice.
    TtsNode { text: String, voice_id: String },
}

impl Node {
    pub fn text(&self) -> &str {
        match self {
            Node::TtsNode { text, .. } => text,
        }
    }

    pub fn voice_id(&self) -> &str {
        match self {
            Node::TtsNode { voice_id, .. } => voice_id,
        }
    }

    /// Reassigns the node to a different voice.
    pub fn set_voice_id(&mut self, new_voice_id: String) {
        match self {
            Node::TtsNode { voice_id, .. } => *voice_id = new_voice_id,
        }
    }
}
