//! The daily practice routine.
//!
//! ## Phases
//!
//! ```text
//! Home -> Select -> Drill -> Integrate -> Monologue -> Complete
//!           (mixed days skip Select)
//! ```
//!
//! Every phase change halts both countdowns and silences the alert, so a
//! countdown left running in one phase can never sound in the next.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, Utc, Weekday};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::alert::AlertScheduler;
use crate::audio::ToneSink;
use crate::chunks::{Chunk, CustomChunkStore};
use crate::curriculum::{self, Curriculum};
use crate::error::{CoreError, ValidationError};
use crate::events::Event;
use crate::grammar::{Feedback, GrammarChecker};
use crate::history::{HistoryLedger, Session};
use crate::storage::{KeyValueStore, TimerConfig};
use crate::timer::{CountdownTimer, PhaseTarget};

/// Most chunks one session works with.
pub const MAX_SELECTED: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PracticePhase {
    Home,
    Select,
    Drill,
    Integrate,
    Monologue,
    Complete,
}

impl PracticePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PracticePhase::Home => "home",
            PracticePhase::Select => "select",
            PracticePhase::Drill => "drill",
            PracticePhase::Integrate => "integrate",
            PracticePhase::Monologue => "monologue",
            PracticePhase::Complete => "complete",
        }
    }

    /// The numbered step this phase corresponds to, if any.
    pub fn step(&self) -> Option<&'static StepInfo> {
        let index = match self {
            PracticePhase::Select => 0,
            PracticePhase::Drill => 1,
            PracticePhase::Integrate => 2,
            PracticePhase::Monologue => 3,
            PracticePhase::Home | PracticePhase::Complete => return None,
        };
        STEPS.get(index)
    }
}

impl fmt::Display for PracticePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInfo {
    pub id: u8,
    pub title: &'static str,
    pub time: &'static str,
    pub target_minutes: u32,
}

impl StepInfo {
    pub fn target(&self) -> PhaseTarget {
        PhaseTarget::from_minutes(self.target_minutes)
    }
}

pub const STEPS: [StepInfo; 4] = [
    StepInfo { id: 1, title: "Selection", time: "2 min", target_minutes: 2 },
    StepInfo { id: 2, title: "The Drill", time: "3 min", target_minutes: 3 },
    StepInfo { id: 3, title: "Integration", time: "5 min", target_minutes: 5 },
    StepInfo { id: 4, title: "Monologue", time: "2-5 min", target_minutes: 5 },
];

pub struct PracticeSession<S: ToneSink> {
    day: Weekday,
    theme: String,
    phase: PracticePhase,
    selected: Vec<Chunk>,
    sentences: BTreeMap<String, String>,
    feedback: BTreeMap<String, Feedback>,
    monologue_prompt: String,
    monologue_text: Option<String>,
    drill_index: usize,
    drill: CountdownTimer,
    monologue: CountdownTimer,
    alert: AlertScheduler<S>,
}

impl<S: ToneSink> PracticeSession<S> {
    pub fn new(alert: AlertScheduler<S>, timers: &TimerConfig) -> Self {
        Self {
            day: Weekday::Mon,
            theme: String::new(),
            phase: PracticePhase::Home,
            selected: Vec::new(),
            sentences: BTreeMap::new(),
            feedback: BTreeMap::new(),
            monologue_prompt: String::new(),
            monologue_text: None,
            drill_index: 0,
            drill: CountdownTimer::new(timers.drill_seconds),
            monologue: CountdownTimer::new(timers.monologue_seconds),
            alert,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> PracticePhase {
        self.phase
    }

    pub fn day(&self) -> Weekday {
        self.day
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn selected(&self) -> &[Chunk] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|c| c.id == id)
    }

    pub fn drill_index(&self) -> usize {
        self.drill_index
    }

    pub fn drill_chunk(&self) -> Option<&Chunk> {
        self.selected.get(self.drill_index)
    }

    pub fn sentence(&self, id: &str) -> Option<&str> {
        self.sentences.get(id).map(String::as_str)
    }

    pub fn feedback(&self, id: &str) -> Option<&Feedback> {
        self.feedback.get(id)
    }

    pub fn monologue_prompt(&self) -> &str {
        &self.monologue_prompt
    }

    pub fn drill_timer(&self) -> &CountdownTimer {
        &self.drill
    }

    pub fn monologue_timer(&self) -> &CountdownTimer {
        &self.monologue
    }

    pub fn alert(&self) -> &AlertScheduler<S> {
        &self.alert
    }

    pub fn drill_target(&self) -> PhaseTarget {
        STEPS[1].target()
    }

    pub fn monologue_target(&self) -> PhaseTarget {
        STEPS[3].target()
    }

    /// The session as it would be recorded on `date`.
    pub fn to_session(&self, date: NaiveDate) -> Session {
        let above = self.monologue_target().minutes_above(self.monologue.elapsed_secs());
        Session {
            date,
            theme: self.theme.clone(),
            selected_chunks: self.selected.clone(),
            sentences: self.sentences.clone(),
            monologue_prompt: self.monologue_prompt.clone(),
            monologue_text: self.monologue_text.clone(),
            time_above_target_minutes: (above > 0.0).then_some(above),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start today's routine. Mixed days draw three random chunks from the
    /// pooled themes and go straight to the drill.
    pub fn begin<C, R>(
        &mut self,
        day: Weekday,
        curriculum: &C,
        custom: &CustomChunkStore,
        rng: &mut R,
    ) -> Result<Vec<Event>, ValidationError>
    where
        C: Curriculum + ?Sized,
        R: Rng + ?Sized,
    {
        if self.phase != PracticePhase::Home {
            return Err(self.wrong_phase("routine already started"));
        }

        let plan = curriculum.plan(day);
        self.day = day;
        self.theme = plan.map_or_else(|| weekday_name(day).to_string(), |p| p.theme.clone());
        self.selected.clear();

        if plan.is_some_and(|p| p.is_mixed()) {
            let pool = curriculum::list_for_day(day, custom, curriculum);
            self.selected = pool
                .choose_multiple(rng, MAX_SELECTED)
                .cloned()
                .collect();
            if !self.selected.is_empty() {
                self.drill_index = 0;
                self.drill.reset_phase(&mut self.alert);
                tracing::info!(%day, chunks = self.selected.len(), "mixed day drill drawn");
                return Ok(self.enter(PracticePhase::Drill));
            }
            tracing::warn!(%day, "mixed day has no chunks to draw from");
        }

        Ok(self.enter(PracticePhase::Select))
    }

    /// Select or deselect a chunk. Selecting a fourth is a no-op.
    pub fn toggle_chunk(&mut self, chunk: &Chunk) -> Result<bool, ValidationError> {
        if self.phase != PracticePhase::Select {
            return Err(self.wrong_phase("chunks are chosen during selection"));
        }
        if let Some(pos) = self.selected.iter().position(|c| c.id == chunk.id) {
            self.selected.remove(pos);
            return Ok(true);
        }
        if self.selected.len() >= MAX_SELECTED {
            return Ok(false);
        }
        self.selected.push(chunk.clone());
        Ok(true)
    }

    /// Move to another phase. `Home` resets the routine; `Complete` is only
    /// reachable through [`finish`](Self::finish).
    pub fn go_to(&mut self, to: PracticePhase) -> Result<Vec<Event>, ValidationError> {
        match to {
            PracticePhase::Home => return Ok(self.reset_to_home()),
            PracticePhase::Complete => {
                return Err(self.wrong_phase("finish the monologue to complete"));
            }
            _ => {}
        }
        if self.phase == PracticePhase::Home {
            return Err(self.wrong_phase("begin the routine first"));
        }
        if to != PracticePhase::Select && self.selected.is_empty() {
            return Err(self.wrong_phase("select at least one chunk"));
        }
        Ok(self.enter(to))
    }

    pub fn next_chunk(&mut self) -> bool {
        if self.drill_index + 1 >= self.selected.len() {
            return false;
        }
        self.drill_index += 1;
        true
    }

    pub fn previous_chunk(&mut self) -> bool {
        if self.drill_index == 0 {
            return false;
        }
        self.drill_index -= 1;
        true
    }

    pub fn start_drill(&mut self, now_ms: u64) -> Result<Option<Event>, ValidationError> {
        self.require(PracticePhase::Drill)?;
        Ok(self.drill.start(now_ms, &mut self.alert))
    }

    pub fn pause_drill(&mut self) -> Option<Event> {
        self.drill.pause()
    }

    pub fn reset_drill(&mut self) -> Event {
        self.drill.reset(&mut self.alert)
    }

    pub fn start_monologue(&mut self, now_ms: u64) -> Result<Option<Event>, ValidationError> {
        self.require(PracticePhase::Monologue)?;
        Ok(self.monologue.start(now_ms, &mut self.alert))
    }

    pub fn pause_monologue(&mut self) -> Option<Event> {
        self.monologue.pause()
    }

    pub fn reset_monologue(&mut self) -> Event {
        self.monologue.reset(&mut self.alert)
    }

    /// Drive the countdowns and the alert up to `now_ms`.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = self.drill.advance_to(now_ms, &mut self.alert);
        events.extend(self.monologue.advance_to(now_ms, &mut self.alert));
        events.extend(self.alert.poll_at(now_ms));
        events
    }

    /// Store the sentence written for a selected chunk. Clears its feedback.
    pub fn set_sentence(&mut self, chunk_id: &str, text: &str) -> Result<(), ValidationError> {
        if !self.is_selected(chunk_id) {
            return Err(ValidationError::NotFound {
                kind: "chunk".into(),
                id: chunk_id.into(),
            });
        }
        self.sentences.insert(chunk_id.to_string(), text.to_string());
        self.feedback.remove(chunk_id);
        Ok(())
    }

    /// Ask `checker` about the sentence written for `chunk_id`.
    pub async fn check_sentence<G: GrammarChecker>(
        &mut self,
        checker: &G,
        chunk_id: &str,
    ) -> Result<Feedback, CoreError> {
        let chunk_text = self
            .selected
            .iter()
            .find(|c| c.id == chunk_id)
            .map(|c| c.text.clone())
            .ok_or_else(|| ValidationError::NotFound {
                kind: "chunk".into(),
                id: chunk_id.into(),
            })?;
        let sentence = self
            .sentences
            .get(chunk_id)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ValidationError::EmptyField {
                field: "sentence".into(),
            })?;

        self.feedback.remove(chunk_id);
        let feedback = checker.check(&chunk_text, &sentence).await?;
        self.feedback.insert(chunk_id.to_string(), feedback.clone());
        Ok(feedback)
    }

    pub fn set_monologue_prompt(&mut self, prompt: &str) {
        self.monologue_prompt = prompt.trim().to_string();
    }

    pub fn set_monologue_text(&mut self, text: &str) {
        let text = text.trim();
        self.monologue_text = (!text.is_empty()).then(|| text.to_string());
    }

    /// Record the session for `today` and move to `Complete`.
    ///
    /// A failed write keeps the routine where it is, so finishing can be retried.
    pub fn finish<K: KeyValueStore>(
        &mut self,
        today: NaiveDate,
        ledger: &mut HistoryLedger<K>,
    ) -> Result<Vec<Event>, CoreError> {
        self.require(PracticePhase::Monologue)?;

        let session = self.to_session(today);
        let theme = session.theme.clone();
        ledger.record_session(session)?;

        let mut events = vec![Event::SessionRecorded {
            date: today,
            theme,
            at: Utc::now(),
        }];
        events.extend(self.enter(PracticePhase::Complete));
        Ok(events)
    }

    /// Back to `Home` with everything cleared.
    pub fn reset_to_home(&mut self) -> Vec<Event> {
        let events = self.enter(PracticePhase::Home);
        self.selected.clear();
        self.sentences.clear();
        self.feedback.clear();
        self.monologue_prompt.clear();
        self.monologue_text = None;
        self.drill_index = 0;
        self.drill.reset_phase(&mut self.alert);
        self.monologue.reset_phase(&mut self.alert);
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter(&mut self, to: PracticePhase) -> Vec<Event> {
        let mut events: Vec<Event> = self.alert.stop().into_iter().collect();
        self.drill.halt(&mut self.alert);
        self.monologue.halt(&mut self.alert);

        if self.phase != to {
            tracing::debug!(from = %self.phase, %to, "phase changed");
            events.push(Event::PhaseChanged {
                from: self.phase,
                to,
                at: Utc::now(),
            });
            self.phase = to;
        }
        if self.drill_index >= self.selected.len() {
            self.drill_index = 0;
        }
        events
    }

    fn require(&self, phase: PracticePhase) -> Result<(), ValidationError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(self.wrong_phase(&format!("only allowed during {phase}")))
        }
    }

    fn wrong_phase(&self, message: &str) -> ValidationError {
        ValidationError::WrongPhase {
            phase: self.phase.to_string(),
            message: message.to_string(),
        }
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
