use std::io::Write;
use std::time::Duration;

use clap::Subcommand;
use fluide_core::practice::STEPS;
use fluide_core::timer::{format_clock, now_ms};
use fluide_core::{AlertScheduler, AudioContext, Config, CountdownState, CountdownTimer, Event, PhaseTarget};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use super::{runtime, CliResult};

/// How often the driver wakes up. Countdowns keep their own one-second
/// deadlines, so this only bounds latency.
const POLL_MS: u64 = 250;

#[derive(Subcommand)]
pub enum TimerAction {
    /// The drill countdown (30 s by default)
    Drill {
        /// Override the configured duration
        #[arg(long)]
        seconds: Option<u32>,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// The monologue countdown (60 s by default)
    Monologue {
        #[arg(long)]
        seconds: Option<u32>,
        #[arg(long)]
        json: bool,
    },
}

pub type Input = Lines<BufReader<Stdin>>;

pub fn stdin_lines() -> Input {
    BufReader::new(tokio::io::stdin()).lines()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The countdown expired and the alert ran out.
    Finished,
    /// The user pressed Enter.
    Interrupted,
}

/// Call `step` with the current time every [`POLL_MS`] until it reports done
/// or a line arrives on `input`. `step` returns the events it produced and
/// whether it is done. Once `input` is closed it is no longer read and only
/// `step` can end the loop.
pub async fn drive<F, R>(mut step: F, input: &mut Lines<R>, json: bool) -> std::io::Result<DriveOutcome>
where
    F: FnMut(u64) -> (Vec<Event>, bool),
    R: AsyncBufRead + Unpin,
{
    let mut interval = tokio::time::interval(Duration::from_millis(POLL_MS));
    let mut input_open = true;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let (events, done) = step(now_ms());
                for event in &events {
                    print_event(event, json)?;
                }
                if done {
                    return Ok(DriveOutcome::Finished);
                }
            }
            line = input.next_line(), if input_open => {
                match line? {
                    Some(_) => return Ok(DriveOutcome::Interrupted),
                    None => {
                        tracing::debug!("input closed, countdown keeps running");
                        input_open = false;
                    }
                }
            }
        }
    }
}

pub fn print_event(event: &Event, json: bool) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string(event)?)?;
        return out.flush();
    }
    match event {
        Event::CountdownStarted { remaining_secs, .. } => {
            write!(out, "\r  {}  (Enter to stop) ", format_clock(*remaining_secs))?
        }
        Event::CountdownTick { remaining_secs, .. } => {
            write!(out, "\r  {}  (Enter to stop) ", format_clock(*remaining_secs))?
        }
        Event::CountdownExpired { .. } => writeln!(out, "\r  0:00  time's up!          ")?,
        Event::AlertStopped { .. } | Event::CountdownPaused { .. } => writeln!(out)?,
        _ => {}
    }
    out.flush()
}

/// "Logged toward 3 min: 2:10", plus the reached/overshoot note.
pub fn logged_summary(target: PhaseTarget, logged_secs: u32) -> String {
    let mut line = format!(
        "Logged toward {}: {}",
        format_clock(target.target_secs),
        format_clock(target.display_logged_secs(logged_secs))
    );
    if target.reached(logged_secs) {
        line.push_str(" (target reached)");
    }
    let above = target.minutes_above(logged_secs);
    if above > 0.0 {
        line.push_str(&format!(", {above} min above target"));
    }
    line
}

pub fn run(action: TimerAction) -> CliResult {
    let config = Config::load();
    let (seconds, json, target) = match action {
        TimerAction::Drill { seconds, json } => (
            seconds.unwrap_or(config.timers.drill_seconds),
            json,
            STEPS[1].target(),
        ),
        TimerAction::Monologue { seconds, json } => (
            seconds.unwrap_or(config.timers.monologue_seconds),
            json,
            STEPS[3].target(),
        ),
    };

    let mut alert = AlertScheduler::from_config(AudioContext::shared(), &config.alert);
    let mut timer = CountdownTimer::new(seconds);

    let rt = runtime()?;
    let outcome = rt.block_on(async {
        let mut input = stdin_lines();
        if let Some(event) = timer.start(now_ms(), &mut alert) {
            print_event(&event, json)?;
        }
        drive(
            |now| {
                let mut events = timer.advance_to(now, &mut alert);
                events.extend(alert.poll_at(now));
                let done = timer.state() == CountdownState::Expired && !alert.is_active();
                (events, done)
            },
            &mut input,
            json,
        )
        .await
    })?;

    if outcome == DriveOutcome::Interrupted {
        if let Some(event) = alert.stop() {
            print_event(&event, json)?;
        }
        timer.halt(&mut alert);
    }
    if !json {
        println!("{}", logged_summary(target, timer.elapsed_secs()));
    }
    Ok(())
}
