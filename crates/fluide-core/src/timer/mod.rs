mod countdown;
mod target;

pub use countdown::{CountdownState, CountdownTimer};
pub use target::{format_clock, PhaseTarget};

/// Milliseconds since the Unix epoch, for driving countdowns and alerts.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
