//! Practice phrases ("chunks") and the user's custom chunk library.

mod repository;

pub use repository::{CustomChunkRepository, CustomChunkStore, CUSTOM_CHUNKS_KEY};

use serde::{Deserialize, Serialize};

/// Where a chunk comes from. Persisted as the `isCustom` flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum ChunkOrigin {
    /// Seeded from the curriculum; never edited or deleted.
    #[default]
    Builtin,
    /// Written by the learner.
    Custom,
}

impl From<bool> for ChunkOrigin {
    fn from(is_custom: bool) -> Self {
        if is_custom {
            ChunkOrigin::Custom
        } else {
            ChunkOrigin::Builtin
        }
    }
}

impl From<ChunkOrigin> for bool {
    fn from(origin: ChunkOrigin) -> Self {
        origin == ChunkOrigin::Custom
    }
}

/// A short target-language phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(rename = "isCustom", default)]
    pub origin: ChunkOrigin,
}

impl Chunk {
    pub fn builtin(id: &str, text: &str, translation: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            translation: translation.to_string(),
            phonetic: None,
            origin: ChunkOrigin::Builtin,
        }
    }

    pub fn is_custom(&self) -> bool {
        self.origin == ChunkOrigin::Custom
    }

    /// Copy of this chunk tagged with `origin`.
    pub fn tagged(&self, origin: ChunkOrigin) -> Self {
        Self {
            origin,
            ..self.clone()
        }
    }

    /// Whether the record is usable: id, text and translation all non-blank.
    pub fn is_well_formed(&self) -> bool {
        !self.id.trim().is_empty()
            && !self.text.trim().is_empty()
            && !self.translation.trim().is_empty()
    }
}

/// Input for adding a custom chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkDraft {
    pub text: String,
    pub translation: String,
    pub phonetic: Option<String>,
}

impl ChunkDraft {
    pub fn new(text: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translation: translation.into(),
            phonetic: None,
        }
    }

    pub fn with_phonetic(mut self, phonetic: impl Into<String>) -> Self {
        self.phonetic = Some(phonetic.into());
        self
    }
}

/// Partial update for a custom chunk. `None` leaves a field untouched;
/// an empty `phonetic` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkPatch {
    pub text: Option<String>,
    pub translation: Option<String>,
    pub phonetic: Option<String>,
}

impl ChunkPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.translation.is_none() && self.phonetic.is_none()
    }
}
