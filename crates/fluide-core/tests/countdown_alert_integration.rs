//! A countdown wired to a real alert scheduler, driven the way the CLI drives
//! it: a coarse poll loop calling `advance_to` and `poll_at`.

use std::cell::Cell;

use fluide_core::alert::AlertScheduler;
use fluide_core::audio::{Cue, ToneSink};
use fluide_core::error::AudioError;
use fluide_core::{CountdownState, CountdownTimer, Event};

#[derive(Default)]
struct CountingSink {
    plays: Cell<u32>,
}

impl ToneSink for CountingSink {
    fn warm_up(&self) -> Result<(), AudioError> {
        Ok(())
    }

    fn play(&self, _cue: &Cue) -> Result<(), AudioError> {
        self.plays.set(self.plays.get() + 1);
        Ok(())
    }
}

/// Poll every 250 ms from `from_ms` to `to_ms`, collecting events.
fn drive(
    timer: &mut CountdownTimer,
    alert: &mut AlertScheduler<CountingSink>,
    from_ms: u64,
    to_ms: u64,
) -> Vec<Event> {
    let mut events = Vec::new();
    let mut now = from_ms;
    while now <= to_ms {
        events.extend(timer.advance_to(now, alert));
        events.extend(alert.poll_at(now));
        now += 250;
    }
    events
}

#[test]
fn thirty_second_drill_alerts_once_and_repeats_ten_times() {
    let mut alert = AlertScheduler::new(CountingSink::default());
    let mut timer = CountdownTimer::new(30);
    timer.start(0, &mut alert);

    drive(&mut timer, &mut alert, 0, 29_750);
    assert_eq!(alert.sink().plays.get(), 0);
    assert_eq!(timer.remaining_secs(), 1);

    let events = drive(&mut timer, &mut alert, 30_000, 60_000);
    let expired = events.iter().filter(|e| e.is_countdown_expired()).count();
    assert_eq!(expired, 1);
    assert_eq!(timer.state(), CountdownState::Expired);
    assert_eq!(alert.sink().plays.get(), 10);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::AlertFinished { plays: 10, .. })));
    assert!(!alert.is_active());
}

#[test]
fn reset_before_zero_means_no_alert() {
    let mut alert = AlertScheduler::new(CountingSink::default());
    let mut timer = CountdownTimer::new(30);
    timer.start(0, &mut alert);
    drive(&mut timer, &mut alert, 0, 15_000);
    timer.reset(&mut alert);

    drive(&mut timer, &mut alert, 15_250, 90_000);
    assert_eq!(alert.sink().plays.get(), 0);
    assert_eq!(timer.state(), CountdownState::Idle);
}

#[test]
fn restarting_the_countdown_silences_the_alert() {
    let mut alert = AlertScheduler::new(CountingSink::default());
    let mut timer = CountdownTimer::new(5);
    timer.start(0, &mut alert);
    drive(&mut timer, &mut alert, 0, 7_000);
    assert!(alert.is_active());
    let plays = alert.sink().plays.get();
    assert_eq!(plays, 3);

    timer.start(7_100, &mut alert);
    assert!(!alert.is_active());
    drive(&mut timer, &mut alert, 7_250, 11_750);
    assert_eq!(alert.sink().plays.get(), plays);
    assert_eq!(timer.state(), CountdownState::Running);
}

#[test]
fn two_countdowns_share_one_alert() {
    let mut alert = AlertScheduler::new(CountingSink::default());
    let mut drill = CountdownTimer::new(2);
    let mut monologue = CountdownTimer::new(3);
    drill.start(0, &mut alert);
    monologue.start(0, &mut alert);

    let mut now = 0;
    while now <= 3_000 {
        drill.advance_to(now, &mut alert);
        monologue.advance_to(now, &mut alert);
        alert.poll_at(now);
        now += 250;
    }

    // Drill expiry at 2s, repeat at 3s is superseded by the monologue's
    // expiry at 3s restarting the chain.
    assert_eq!(drill.state(), CountdownState::Expired);
    assert_eq!(monologue.state(), CountdownState::Expired);
    assert!(alert.is_active());
    assert_eq!(alert.plays(), 1);
}
