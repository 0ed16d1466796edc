//! Practice history: one recorded session per calendar date, newest first.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::chunks::Chunk;
use crate::error::StorageError;
use crate::storage::{json, KeyValueStore};

/// Store key of the history record.
pub const HISTORY_KEY: &str = "fluideHistory";

/// One completed run of the daily routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub date: NaiveDate,
    pub theme: String,
    #[serde(default)]
    pub selected_chunks: Vec<Chunk>,
    /// Chunk id -> sentence the learner wrote with it.
    #[serde(default)]
    pub sentences: BTreeMap<String, String>,
    #[serde(default)]
    pub monologue_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monologue_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_above_target_minutes: Option<f64>,
}

impl Session {
    pub fn new(date: NaiveDate, theme: impl Into<String>) -> Self {
        Self {
            date,
            theme: theme.into(),
            selected_chunks: Vec::new(),
            sentences: BTreeMap::new(),
            monologue_prompt: String::new(),
            monologue_text: None,
            time_above_target_minutes: None,
        }
    }

    /// Number of chunks that got a non-blank sentence.
    pub fn sentence_count(&self) -> usize {
        self.sentences.values().filter(|s| !s.trim().is_empty()).count()
    }
}

/// Append/replace-by-date log of sessions, kept sorted newest first.
pub struct HistoryLedger<S: KeyValueStore> {
    store: S,
    sessions: Vec<Session>,
}

impl<S: KeyValueStore> HistoryLedger<S> {
    /// Load the record from `store`. Corrupt data loads as an empty history.
    pub fn load(store: S) -> Self {
        let raw: Vec<serde_json::Value> = json::read_or(&store, HISTORY_KEY, Vec::new());
        let mut sessions: Vec<Session> = Vec::with_capacity(raw.len());
        for entry in raw {
            match serde_json::from_value::<Session>(entry) {
                Ok(session) if sessions.iter().all(|s| s.date != session.date) => {
                    sessions.push(session)
                }
                Ok(session) => {
                    tracing::warn!(date = %session.date, "dropping duplicate history entry")
                }
                Err(e) => tracing::warn!(error = %e, "dropping malformed history entry"),
            }
        }
        sort_newest_first(&mut sessions);
        tracing::debug!(sessions = sessions.len(), "loaded history");
        Self { store, sessions }
    }

    /// Record `session`, replacing any entry with the same date.
    ///
    /// # Errors
    /// Propagates the store's write failure; the ledger is unchanged then.
    pub fn record_session(&mut self, session: Session) -> Result<(), StorageError> {
        let mut next = self.sessions.clone();
        match next.iter().position(|s| s.date == session.date) {
            Some(index) => next[index] = session.clone(),
            None => next.insert(0, session.clone()),
        }
        sort_newest_first(&mut next);

        json::write(&self.store, HISTORY_KEY, &next)?;
        self.sessions = next;
        tracing::info!(date = %session.date, theme = %session.theme, "recorded session");
        Ok(())
    }

    /// All sessions, newest first.
    pub fn list_all(&self) -> &[Session] {
        &self.sessions
    }

    pub fn get(&self, date: NaiveDate) -> Option<&Session> {
        self.sessions.iter().find(|s| s.date == date)
    }
}

fn sort_newest_first(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| b.date.cmp(&a.date));
}
