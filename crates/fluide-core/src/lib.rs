//! # Fluide Core Library
//!
//! Core logic for Fluide, a daily French speaking routine built around short
//! reusable phrases ("chunks"). The CLI binary is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Chunks**: the learner's own chunks, grouped by theme and merged with the
//!   builtin weekly plan
//! - **History**: one recorded practice session per calendar date
//! - **Timers**: tick-driven countdowns that require the caller to advance
//!   them, plus a repeating alert that sounds when one reaches zero
//! - **Storage**: a SQLite key-value table holding JSON records, and TOML
//!   configuration
//! - **Grammar**: sentence checks through the Gemini API
//!
//! ## Key Components
//!
//! - [`CustomChunkRepository`]: add, edit, delete and move custom chunks
//! - [`HistoryLedger`]: per-date session log
//! - [`CountdownTimer`] and [`AlertScheduler`]: drill and monologue timing
//! - [`PracticeSession`]: the phase machine of the daily routine
//! - [`Database`]: persistent key-value store
//! - [`Config`]: application configuration management

pub mod alert;
pub mod audio;
pub mod chunks;
pub mod credentials;
pub mod curriculum;
pub mod error;
pub mod events;
pub mod grammar;
pub mod history;
pub mod practice;
pub mod storage;
pub mod timer;

pub use alert::{Alarm, AlertScheduler};
pub use audio::{AudioContext, Cue, ToneSink};
pub use chunks::{Chunk, ChunkDraft, ChunkOrigin, ChunkPatch, CustomChunkRepository, CustomChunkStore};
pub use credentials::{CredentialStore, Provider};
pub use curriculum::{Curriculum, DayContent, DayPlan, Theme, WeeklyPlan};
pub use error::{AudioError, ConfigError, CoreError, GrammarError, StorageError, ValidationError};
pub use events::Event;
pub use grammar::{Feedback, GeminiClient, GrammarChecker};
pub use history::{HistoryLedger, Session};
pub use practice::{PracticePhase, PracticeSession};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
pub use timer::{CountdownState, CountdownTimer, PhaseTarget};
