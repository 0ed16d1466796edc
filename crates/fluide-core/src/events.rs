use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::practice::PracticePhase;

/// Every state change of a countdown, alert or practice run produces an Event.
/// The CLI prints them; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    CountdownStarted {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    CountdownTick {
        remaining_secs: u32,
        elapsed_secs: u32,
    },
    CountdownPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// Remaining time hit zero; the alert has already been started.
    CountdownExpired {
        elapsed_secs: u32,
        at: DateTime<Utc>,
    },
    CountdownReset {
        remaining_secs: u32,
        elapsed_secs: u32,
        at: DateTime<Utc>,
    },
    AlertStarted {
        at: DateTime<Utc>,
    },
    AlertRepeated {
        play: u32,
        at: DateTime<Utc>,
    },
    /// The repeat budget ran out and the alert stopped by itself.
    AlertFinished {
        plays: u32,
        at: DateTime<Utc>,
    },
    AlertStopped {
        plays: u32,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: PracticePhase,
        to: PracticePhase,
        at: DateTime<Utc>,
    },
    SessionRecorded {
        date: NaiveDate,
        theme: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn is_countdown_expired(&self) -> bool {
        matches!(self, Event::CountdownExpired { .. })
    }
}
