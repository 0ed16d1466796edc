//! Property tests for the custom chunk library and the history ledger.

use chrono::{Duration, NaiveDate};
use fluide_core::chunks::CUSTOM_CHUNKS_KEY;
use fluide_core::history::HISTORY_KEY;
use fluide_core::{ChunkDraft, ChunkPatch, CustomChunkRepository, HistoryLedger, KeyValueStore, MemoryStore, Session};
use proptest::prelude::*;

const THEMES: [&str; 3] = ["Opinions", "Obligations", "Interaction"];

#[derive(Debug, Clone)]
enum Op {
    Add { theme: usize, text: String, translation: String },
    Update { theme: usize, pick: usize, text: String },
    Delete { theme: usize, pick: usize },
    Move { from: usize, pick: usize, to: usize },
}

fn text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        "[a-zé ]{1,12}",
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, text(), text()).prop_map(|(theme, text, translation)| Op::Add { theme, text, translation }),
        (0..3usize, 0..4usize, text()).prop_map(|(theme, pick, text)| Op::Update { theme, pick, text }),
        (0..3usize, 0..4usize).prop_map(|(theme, pick)| Op::Delete { theme, pick }),
        (0..3usize, 0..4usize, 0..3usize).prop_map(|(from, pick, to)| Op::Move { from, pick, to }),
    ]
}

fn pick_id(repo: &CustomChunkRepository<&MemoryStore>, theme: &str, pick: usize) -> String {
    let chunks = repo.chunks(theme);
    if chunks.is_empty() {
        "missing".to_string()
    } else {
        chunks[pick % chunks.len()].id.clone()
    }
}

fn apply(repo: &mut CustomChunkRepository<&MemoryStore>, op: &Op) {
    match op {
        Op::Add { theme, text, translation } => {
            repo.add(THEMES[*theme], ChunkDraft::new(text.clone(), translation.clone())).unwrap();
        }
        Op::Update { theme, pick, text } => {
            let id = pick_id(repo, THEMES[*theme], *pick);
            let patch = ChunkPatch {
                text: Some(text.clone()),
                ..ChunkPatch::default()
            };
            repo.update(THEMES[*theme], &id, patch).unwrap();
        }
        Op::Delete { theme, pick } => {
            let id = pick_id(repo, THEMES[*theme], *pick);
            repo.delete(THEMES[*theme], &id).unwrap();
        }
        Op::Move { from, pick, to } => {
            let id = pick_id(repo, THEMES[*from], *pick);
            repo.move_to_theme(THEMES[*from], &id, THEMES[*to]).unwrap();
        }
    }
}

proptest! {
    #[test]
    fn library_invariants_hold_after_any_sequence(ops in prop::collection::vec(op(), 0..40)) {
        let store = MemoryStore::new();
        let mut repo = CustomChunkRepository::load(&store);

        for op in &ops {
            apply(&mut repo, op);

            let mut ids = Vec::new();
            for (theme, chunks) in repo.store() {
                prop_assert!(!chunks.is_empty(), "theme {theme} left empty");
                for chunk in chunks {
                    prop_assert!(chunk.is_custom());
                    prop_assert!(!chunk.text.trim().is_empty());
                    prop_assert!(!chunk.translation.trim().is_empty());
                    ids.push(chunk.id.clone());
                }
            }
            let total = ids.len();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), total, "duplicate ids");
        }

        let reloaded = CustomChunkRepository::load(&store);
        prop_assert_eq!(reloaded.store(), repo.store());
    }

    #[test]
    fn blank_add_leaves_store_untouched(blank in "[ \t]{0,4}", theme in 0..3usize) {
        let store = MemoryStore::new();
        let mut repo = CustomChunkRepository::load(&store);
        repo.add("Opinions", ChunkDraft::new("Je pense que", "I think that")).unwrap();
        let before = store.get(CUSTOM_CHUNKS_KEY).unwrap();

        prop_assert!(repo.add(THEMES[theme], ChunkDraft::new(blank.clone(), "ok")).unwrap().is_none());
        prop_assert!(repo.add(THEMES[theme], ChunkDraft::new("ok", blank)).unwrap().is_none());
        prop_assert_eq!(store.get(CUSTOM_CHUNKS_KEY).unwrap(), before);
    }

    #[test]
    fn ledger_stays_sorted_and_unique(offsets in prop::collection::vec(0i64..30, 1..25)) {
        let store = MemoryStore::new();
        let mut ledger = HistoryLedger::load(&store);
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        for (i, offset) in offsets.iter().enumerate() {
            let date = base + Duration::days(*offset);
            ledger.record_session(Session::new(date, format!("run {i}"))).unwrap();
        }

        let sessions = ledger.list_all();
        for pair in sessions.windows(2) {
            prop_assert!(pair[0].date > pair[1].date);
        }

        let mut distinct: Vec<i64> = offsets.clone();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(sessions.len(), distinct.len());

        let reloaded = HistoryLedger::load(&store);
        prop_assert_eq!(reloaded.list_all(), sessions);
        prop_assert!(store.get(HISTORY_KEY).unwrap().is_some());
    }
}
