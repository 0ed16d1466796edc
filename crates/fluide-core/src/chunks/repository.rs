//! CRUD over the learner's custom chunks, grouped by theme.
//!
//! Every mutation builds the next store, writes the whole record, and only
//! then replaces the in-memory copy. A failed write leaves the repository as
//! it was. Themes never map to an empty list.

use chrono::{Utc, Weekday};
use indexmap::IndexMap;

use super::{Chunk, ChunkDraft, ChunkOrigin, ChunkPatch};
use crate::curriculum::{self, Curriculum};
use crate::error::StorageError;
use crate::storage::{json, KeyValueStore};

/// Store key of the custom chunk record.
pub const CUSTOM_CHUNKS_KEY: &str = "fluideCustomChunks";

/// Theme name -> custom chunks, both in insertion order.
pub type CustomChunkStore = IndexMap<String, Vec<Chunk>>;

pub struct CustomChunkRepository<S: KeyValueStore> {
    store: S,
    chunks: CustomChunkStore,
}

impl<S: KeyValueStore> CustomChunkRepository<S> {
    /// Load the record from `store`. Corrupt data loads as an empty library.
    pub fn load(store: S) -> Self {
        let raw: IndexMap<String, serde_json::Value> =
            json::read_or(&store, CUSTOM_CHUNKS_KEY, IndexMap::new());
        let chunks = sanitize(raw);
        tracing::debug!(themes = chunks.len(), "loaded custom chunks");
        Self { store, chunks }
    }

    pub fn store(&self) -> &CustomChunkStore {
        &self.chunks
    }

    pub fn themes(&self) -> impl Iterator<Item = &str> {
        self.chunks.keys().map(String::as_str)
    }

    pub fn chunks(&self, theme: &str) -> &[Chunk] {
        self.chunks.get(theme).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find(&self, theme: &str, id: &str) -> Option<&Chunk> {
        self.chunks(theme).iter().find(|c| c.id == id)
    }

    /// Append a new custom chunk to `theme`.
    ///
    /// Returns `Ok(None)` without touching the store when the text or the
    /// translation is blank.
    pub fn add(&mut self, theme: &str, draft: ChunkDraft) -> Result<Option<Chunk>, StorageError> {
        let text = draft.text.trim();
        let translation = draft.translation.trim();
        if text.is_empty() || translation.is_empty() {
            tracing::debug!(theme, "rejected chunk with blank text or translation");
            return Ok(None);
        }

        let chunk = Chunk {
            id: self.generate_id(theme),
            text: text.to_string(),
            translation: translation.to_string(),
            phonetic: normalize_phonetic(draft.phonetic.as_deref()),
            origin: ChunkOrigin::Custom,
        };

        let mut next = self.chunks.clone();
        next.entry(theme.to_string()).or_default().push(chunk.clone());
        self.commit(next)?;
        tracing::info!(theme, id = %chunk.id, "added custom chunk");
        Ok(Some(chunk))
    }

    /// Merge the provided fields into chunk `id` of `theme`.
    ///
    /// No-op when the chunk is unknown, when the patch would blank the text or
    /// translation, or when nothing would change.
    pub fn update(&mut self, theme: &str, id: &str, patch: ChunkPatch) -> Result<bool, StorageError> {
        let Some(index) = self.position(theme, id) else {
            return Ok(false);
        };
        let blank = |field: &Option<String>| field.as_deref().is_some_and(|v| v.trim().is_empty());
        if blank(&patch.text) || blank(&patch.translation) {
            tracing::debug!(theme, id, "ignored update that would blank a required field");
            return Ok(false);
        }

        let current = &self.chunks[theme][index];
        let mut updated = current.clone();
        if let Some(text) = &patch.text {
            updated.text = text.trim().to_string();
        }
        if let Some(translation) = &patch.translation {
            updated.translation = translation.trim().to_string();
        }
        if let Some(phonetic) = &patch.phonetic {
            updated.phonetic = normalize_phonetic(Some(phonetic));
        }
        if &updated == current {
            return Ok(false);
        }

        let mut next = self.chunks.clone();
        next[theme][index] = updated;
        self.commit(next)?;
        tracing::info!(theme, id, "updated custom chunk");
        Ok(true)
    }

    /// Remove chunk `id` from `theme`, dropping the theme once it is empty.
    pub fn delete(&mut self, theme: &str, id: &str) -> Result<bool, StorageError> {
        let Some(index) = self.position(theme, id) else {
            return Ok(false);
        };

        let mut next = self.chunks.clone();
        if take_chunk(&mut next, theme, index).is_none() {
            return Ok(false);
        }
        self.commit(next)?;
        tracing::info!(theme, id, "deleted custom chunk");
        Ok(true)
    }

    /// Move chunk `id` from `from` to the end of `to`.
    pub fn move_to_theme(&mut self, from: &str, id: &str, to: &str) -> Result<bool, StorageError> {
        if from == to {
            return Ok(false);
        }
        let Some(index) = self.position(from, id) else {
            return Ok(false);
        };

        let mut next = self.chunks.clone();
        let Some(chunk) = take_chunk(&mut next, from, index) else {
            return Ok(false);
        };
        next.entry(to.to_string()).or_default().push(chunk);
        self.commit(next)?;
        tracing::info!(from, to, id, "moved custom chunk");
        Ok(true)
    }

    /// Chunks to offer on `day`, builtin first.
    pub fn list_for_day<C: Curriculum + ?Sized>(&self, day: Weekday, curriculum: &C) -> Vec<Chunk> {
        curriculum::list_for_day(day, &self.chunks, curriculum)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn position(&self, theme: &str, id: &str) -> Option<usize> {
        self.chunks(theme).iter().position(|c| c.id == id)
    }

    fn commit(&mut self, next: CustomChunkStore) -> Result<(), StorageError> {
        json::write(&self.store, CUSTOM_CHUNKS_KEY, &next)?;
        self.chunks = next;
        Ok(())
    }

    fn generate_id(&self, theme: &str) -> String {
        let slug: String = theme
            .chars()
            .map(|c| if c.is_whitespace() { '-' } else { c })
            .collect();
        let mut stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        loop {
            let id = format!("custom-{slug}-{stamp}");
            if !self.chunks.values().flatten().any(|c| c.id == id) {
                return id;
            }
            stamp += 1;
        }
    }
}

fn take_chunk(store: &mut CustomChunkStore, theme: &str, index: usize) -> Option<Chunk> {
    let list = store.get_mut(theme)?;
    if index >= list.len() {
        return None;
    }
    let chunk = list.remove(index);
    if list.is_empty() {
        store.shift_remove(theme);
    }
    Some(chunk)
}

fn normalize_phonetic(phonetic: Option<&str>) -> Option<String> {
    phonetic
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

/// Keep only chunk-shaped entries with unique ids; prune themes left empty.
fn sanitize(raw: IndexMap<String, serde_json::Value>) -> CustomChunkStore {
    let mut seen = std::collections::HashSet::new();
    let mut out = CustomChunkStore::new();
    for (theme, value) in raw {
        let Some(entries) = value.as_array() else {
            tracing::warn!(theme = %theme, "dropping theme whose chunks are not a list");
            continue;
        };
        let mut list = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<Chunk>(entry.clone()) {
                Ok(chunk) if chunk.is_well_formed() && seen.insert(chunk.id.clone()) => {
                    list.push(chunk.tagged(ChunkOrigin::Custom));
                }
                _ => tracing::warn!(theme = %theme, "dropping malformed custom chunk"),
            }
        }
        if !list.is_empty() {
            out.insert(theme, list);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn repo() -> CustomChunkRepository<MemoryStore> {
        CustomChunkRepository::load(MemoryStore::new())
    }

    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::WriteFailed {
                key: key.into(),
                message: "quota exceeded".into(),
            })
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
    }

    #[test]
    fn add_appends_and_persists() {
        let mut repo = repo();
        let a = repo
            .add("Opinions", ChunkDraft::new(" Pour moi ", "For me").with_phonetic("pour mwa"))
            .unwrap()
            .unwrap();
        let b = repo.add("Opinions", ChunkDraft::new("Bof", "Meh")).unwrap().unwrap();

        assert_eq!(a.text, "Pour moi");
        assert_eq!(a.phonetic.as_deref(), Some("pour mwa"));
        assert!(a.is_custom());
        assert!(a.id.starts_with("custom-Opinions-"));
        assert_ne!(a.id, b.id);
        let ids: Vec<&str> = repo.chunks("Opinions").iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), b.id.as_str()]);

        let raw = repo.store.get(CUSTOM_CHUNKS_KEY).unwrap().unwrap();
        assert!(raw.contains("Pour moi"));
    }

    #[test]
    fn add_rejects_blank_fields() {
        let mut repo = repo();
        assert!(repo.add("Opinions", ChunkDraft::new("   ", "x")).unwrap().is_none());
        assert!(repo.add("Opinions", ChunkDraft::new("x", "\t")).unwrap().is_none());
        assert!(repo.store().is_empty());
        assert!(repo.store.get(CUSTOM_CHUNKS_KEY).unwrap().is_none());
    }

    #[test]
    fn ids_stay_unique_under_rapid_adds() {
        let mut repo = repo();
        for i in 0..50 {
            repo.add("Desires & Intentions", ChunkDraft::new(format!("t{i}"), "x"))
                .unwrap();
        }
        let mut ids: Vec<&str> = repo
            .chunks("Desires & Intentions")
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert!(ids[0].starts_with("custom-Desires-&-Intentions-"));
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn update_merges_only_given_fields() {
        let mut repo = repo();
        let c = repo
            .add("Obligations", ChunkDraft::new("Il faut", "Must").with_phonetic("il fo"))
            .unwrap()
            .unwrap();

        let patch = ChunkPatch {
            translation: Some("One must".into()),
            ..Default::default()
        };
        assert!(repo.update("Obligations", &c.id, patch).unwrap());
        let updated = repo.find("Obligations", &c.id).unwrap();
        assert_eq!(updated.text, "Il faut");
        assert_eq!(updated.translation, "One must");
        assert_eq!(updated.phonetic.as_deref(), Some("il fo"));
        assert_eq!(updated.id, c.id);
        assert!(updated.is_custom());

        let clear = ChunkPatch {
            phonetic: Some(String::new()),
            ..Default::default()
        };
        assert!(repo.update("Obligations", &c.id, clear).unwrap());
        assert!(repo.find("Obligations", &c.id).unwrap().phonetic.is_none());
    }

    #[test]
    fn update_unknown_or_blank_is_noop() {
        let mut repo = repo();
        let c = repo.add("Obligations", ChunkDraft::new("a", "b")).unwrap().unwrap();
        let before = repo.store().clone();

        let patch = ChunkPatch {
            text: Some("z".into()),
            ..Default::default()
        };
        assert!(!repo.update("Obligations", "nope", patch.clone()).unwrap());
        assert!(!repo.update("Opinions", &c.id, patch).unwrap());
        let blank = ChunkPatch {
            text: Some("  ".into()),
            ..Default::default()
        };
        assert!(!repo.update("Obligations", &c.id, blank).unwrap());
        assert_eq!(repo.store(), &before);
        assert!(!repo.store().contains_key("Opinions"));
    }

    #[test]
    fn delete_prunes_empty_theme() {
        let mut repo = repo();
        let a = repo.add("Interaction", ChunkDraft::new("a", "b")).unwrap().unwrap();
        repo.add("Opinions", ChunkDraft::new("c", "d")).unwrap();

        assert!(repo.delete("Interaction", &a.id).unwrap());
        assert!(!repo.store().contains_key("Interaction"));
        assert!(!repo.delete("Interaction", &a.id).unwrap());

        let reloaded = CustomChunkRepository::load(&repo.store);
        assert_eq!(reloaded.themes().collect::<Vec<_>>(), vec!["Opinions"]);
    }

    #[test]
    fn move_to_theme_prunes_source_and_appends() {
        let mut repo = repo();
        let a = repo.add("Opinions", ChunkDraft::new("a", "b")).unwrap().unwrap();
        let existing = repo.add("Difficulties", ChunkDraft::new("c", "d")).unwrap().unwrap();

        assert!(repo.move_to_theme("Opinions", &a.id, "Difficulties").unwrap());
        assert!(!repo.store().contains_key("Opinions"));
        let ids: Vec<&str> = repo.chunks("Difficulties").iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![existing.id.as_str(), a.id.as_str()]);
    }

    #[test]
    fn move_unknown_or_same_theme_is_noop() {
        let mut repo = repo();
        let a = repo.add("Opinions", ChunkDraft::new("a", "b")).unwrap().unwrap();
        repo.add("Opinions", ChunkDraft::new("c", "d")).unwrap();
        let before = repo.store().clone();

        assert!(!repo.move_to_theme("Opinions", "ghost", "Interaction").unwrap());
        assert!(!repo.move_to_theme("Interaction", &a.id, "Opinions").unwrap());
        assert!(!repo.move_to_theme("Opinions", &a.id, "Opinions").unwrap());
        assert_eq!(repo.store(), &before);
    }

    #[test]
    fn invalid_json_loads_empty() {
        let store = MemoryStore::new();
        store.set(CUSTOM_CHUNKS_KEY, "{\"Opinions\": [").unwrap();
        assert!(CustomChunkRepository::load(store).store().is_empty());
    }

    #[test]
    fn malformed_entries_are_dropped() {
        let store = MemoryStore::new();
        store
            .set(
                CUSTOM_CHUNKS_KEY,
                r#"{
                    "Opinions": [
                        {"id": "a", "text": "Pour moi", "translation": "For me"},
                        {"id": "b", "text": ""},
                        42,
                        {"id": "a", "text": "dup", "translation": "dup"}
                    ],
                    "Obligations": "oops",
                    "Interaction": [{"text": "no id", "translation": "x"}]
                }"#,
            )
            .unwrap();
        let repo = CustomChunkRepository::load(store);
        assert_eq!(repo.themes().collect::<Vec<_>>(), vec!["Opinions"]);
        assert_eq!(repo.chunks("Opinions").len(), 1);
        assert!(repo.chunks("Opinions")[0].is_custom());
    }

    #[test]
    fn failed_write_leaves_repository_unchanged() {
        let mut repo = CustomChunkRepository::load(ReadOnlyStore(MemoryStore::new()));
        let err = repo.add("Opinions", ChunkDraft::new("a", "b")).unwrap_err();
        assert!(matches!(err, StorageError::WriteFailed { .. }));
        assert!(repo.store().is_empty());
    }
}
