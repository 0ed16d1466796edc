//! Repeating alert: sound a cue now, then again every interval until stopped
//! or until the play budget is spent.
//!
//! There is no internal thread. The pending repeat is a single deadline and
//! the caller is responsible for calling `poll_at()` periodically; `stop()`
//! clears the deadline synchronously, so nothing can sound after it returns.
//!
//! ## Usage
//!
//! ```ignore
//! let mut alert = AlertScheduler::new(AudioContext::shared());
//! alert.start_at(now_ms());
//! // In a loop:
//! alert.poll_at(now_ms()); // plays when a repeat is due
//! ```

use chrono::Utc;

use crate::audio::{Cue, ToneSink};
use crate::events::Event;
use crate::storage::AlertConfig;

/// What a countdown needs from an alert.
pub trait Alarm {
    /// Prepare output ahead of time.
    fn warm_up(&mut self);

    /// Start sounding. Restarts if already sounding.
    fn start(&mut self, now_ms: u64);

    /// Silence and cancel any pending repeat. No-op when silent.
    fn stop(&mut self);
}

pub struct AlertScheduler<S: ToneSink> {
    sink: S,
    cue: Cue,
    enabled: bool,
    interval_ms: u64,
    max_plays: u32,
    plays: u32,
    /// Deadline of the next repeat; `None` when not sounding.
    pending_at_ms: Option<u64>,
}

impl<S: ToneSink> AlertScheduler<S> {
    /// One-second cadence, ten plays.
    pub fn new(sink: S) -> Self {
        Self::from_config(sink, &AlertConfig::default())
    }

    pub fn from_config(sink: S, config: &AlertConfig) -> Self {
        Self {
            sink,
            cue: Cue::default().with_peak(config.volume),
            enabled: config.enabled,
            interval_ms: config.repeat_interval_ms.max(1),
            max_plays: config.max_plays.max(1),
            plays: 0,
            pending_at_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_active(&self) -> bool {
        self.pending_at_ms.is_some()
    }

    /// Plays so far in the current chain.
    pub fn plays(&self) -> u32 {
        self.plays
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending_at_ms
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Play immediately and schedule repeats. A running chain is stopped
    /// first, so two chains never overlap.
    pub fn start_at(&mut self, now_ms: u64) -> Option<Event> {
        if !self.enabled {
            return None;
        }
        if self.is_active() {
            self.stop();
        }

        self.play_once();
        self.plays = 1;
        if self.plays >= self.max_plays {
            self.plays = 0;
        } else {
            self.pending_at_ms = Some(now_ms + self.interval_ms);
        }
        tracing::debug!(max_plays = self.max_plays, "alert started");
        Some(Event::AlertStarted { at: Utc::now() })
    }

    /// Cancel the pending repeat and reset the counter.
    pub fn stop(&mut self) -> Option<Event> {
        if self.pending_at_ms.is_none() && self.plays == 0 {
            return None;
        }
        let plays = self.plays;
        self.pending_at_ms = None;
        self.plays = 0;
        tracing::debug!(plays, "alert stopped");
        Some(Event::AlertStopped {
            plays,
            at: Utc::now(),
        })
    }

    /// Call periodically. Plays at most once per call; a late call re-bases
    /// the next deadline on `now_ms`.
    pub fn poll_at(&mut self, now_ms: u64) -> Option<Event> {
        let due = self.pending_at_ms?;
        if now_ms < due {
            return None;
        }

        self.play_once();
        self.plays += 1;
        if self.plays >= self.max_plays {
            let plays = self.plays;
            self.pending_at_ms = None;
            self.plays = 0;
            tracing::debug!(plays, "alert budget spent");
            return Some(Event::AlertFinished {
                plays,
                at: Utc::now(),
            });
        }

        self.pending_at_ms = Some(now_ms + self.interval_ms);
        Some(Event::AlertRepeated {
            play: self.plays,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn play_once(&self) {
        if let Err(e) = self.sink.play(&self.cue) {
            tracing::warn!(error = %e, "alert cue failed to play");
        }
    }
}

impl<S: ToneSink> Alarm for AlertScheduler<S> {
    fn warm_up(&mut self) {
        if let Err(e) = self.sink.warm_up() {
            tracing::warn!(error = %e, "audio warm-up failed");
        }
    }

    fn start(&mut self, now_ms: u64) {
        self.start_at(now_ms);
    }

    fn stop(&mut self) {
        AlertScheduler::stop(self);
    }
}
