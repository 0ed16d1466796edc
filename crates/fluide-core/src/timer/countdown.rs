//! Countdown used by the drill and monologue phases.
//!
//! A tick-driven state machine. It does not use internal threads - the caller
//! either calls `tick()` once per elapsed second or `advance_to()` with the
//! current time and lets the countdown work out how many seconds passed.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Expired
//!  ^         |          |
//!  +- pause -+          +- start (re-arm) -> Running
//! ```
//!
//! The countdown does not own its alert. Operations that touch the alert take
//! it as an argument, so several countdowns can share one.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::alert::Alarm;
use crate::events::Event;

const TICK_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownState {
    Idle,
    Running,
    Expired,
}

#[derive(Debug, Clone)]
pub struct CountdownTimer {
    duration_secs: u32,
    remaining_secs: u32,
    state: CountdownState,
    /// Seconds spent running in this phase, across pauses and re-arms.
    elapsed_secs: u32,
    /// Deadline of the next one-second tick; set only while running.
    next_tick_at_ms: Option<u64>,
}

impl CountdownTimer {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            remaining_secs: duration_secs,
            state: CountdownState::Idle,
            elapsed_secs: 0,
            next_tick_at_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn next_tick_at_ms(&self) -> Option<u64> {
        self.next_tick_at_ms
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or re-arm. Silences the alert and warms up audio output.
    pub fn start(&mut self, now_ms: u64, alarm: &mut impl Alarm) -> Option<Event> {
        if self.state == CountdownState::Running {
            return None;
        }
        if self.remaining_secs == 0 || self.state == CountdownState::Expired {
            self.remaining_secs = self.duration_secs;
        }
        alarm.warm_up();
        alarm.stop();
        self.state = CountdownState::Running;
        self.next_tick_at_ms = Some(now_ms + TICK_MS);
        Some(Event::CountdownStarted {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Stop ticking, keeping remaining and elapsed time.
    pub fn pause(&mut self) -> Option<Event> {
        if self.state != CountdownState::Running {
            return None;
        }
        self.state = CountdownState::Idle;
        self.next_tick_at_ms = None;
        Some(Event::CountdownPaused {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Back to the full duration. Logged time is kept for overshoot math.
    pub fn reset(&mut self, alarm: &mut impl Alarm) -> Event {
        alarm.stop();
        self.state = CountdownState::Idle;
        self.next_tick_at_ms = None;
        self.remaining_secs = self.duration_secs;
        Event::CountdownReset {
            remaining_secs: self.remaining_secs,
            elapsed_secs: self.elapsed_secs,
            at: Utc::now(),
        }
    }

    /// Full reset when a phase starts over: also clears logged time.
    pub fn reset_phase(&mut self, alarm: &mut impl Alarm) -> Event {
        self.elapsed_secs = 0;
        self.reset(alarm)
    }

    /// Leaving the phase: silence the alert and stop ticking, whatever the state.
    pub fn halt(&mut self, alarm: &mut impl Alarm) {
        alarm.stop();
        self.next_tick_at_ms = None;
        if self.state == CountdownState::Running {
            self.state = CountdownState::Idle;
        }
    }

    /// One elapsed second. Reaching zero starts the alert, then expires.
    pub fn tick(&mut self, now_ms: u64, alarm: &mut impl Alarm) -> Option<Event> {
        if self.state != CountdownState::Running {
            return None;
        }
        if self.remaining_secs > 0 {
            self.remaining_secs -= 1;
            self.elapsed_secs += 1;
        }
        if self.remaining_secs == 0 {
            alarm.start(now_ms);
            self.state = CountdownState::Expired;
            self.next_tick_at_ms = None;
            return Some(Event::CountdownExpired {
                elapsed_secs: self.elapsed_secs,
                at: Utc::now(),
            });
        }
        self.next_tick_at_ms = self.next_tick_at_ms.map(|t| t + TICK_MS);
        Some(Event::CountdownTick {
            remaining_secs: self.remaining_secs,
            elapsed_secs: self.elapsed_secs,
        })
    }

    /// Run every tick whose deadline is at or before `now_ms`.
    pub fn advance_to(&mut self, now_ms: u64, alarm: &mut impl Alarm) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(due) = self.next_tick_at_ms {
            if due > now_ms {
                break;
            }
            if let Some(event) = self.tick(due, alarm) {
                events.push(event);
            }
        }
        events
    }
}
