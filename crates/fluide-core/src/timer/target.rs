/// Target time for a phase, and the overshoot math against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTarget {
    pub target_secs: u32,
}

impl PhaseTarget {
    pub fn from_minutes(minutes: u32) -> Self {
        Self {
            target_secs: minutes * 60,
        }
    }

    pub fn reached(&self, logged_secs: u32) -> bool {
        logged_secs >= self.target_secs
    }

    /// Minutes beyond the target, rounded to one decimal.
    pub fn minutes_above(&self, logged_secs: u32) -> f64 {
        let over = logged_secs.saturating_sub(self.target_secs) as f64;
        (over / 60.0 * 10.0).round() / 10.0
    }

    /// Logged time for display, capped at the target.
    pub fn display_logged_secs(&self, logged_secs: u32) -> u32 {
        logged_secs.min(self.target_secs)
    }
}

/// `m:ss`
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
