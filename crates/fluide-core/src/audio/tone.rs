use std::f32::consts::PI;
use std::time::Duration;

pub const SAMPLE_RATE: u32 = 44_100;

/// Two short sine tones played one after the other.
///
/// Defaults to A5 then C#6 (a major third) with a quick linear attack and
/// release on each tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cue {
    pub frequencies: [f32; 2],
    pub tone: Duration,
    pub gap: Duration,
    pub attack: Duration,
    pub release: Duration,
    pub peak: f32,
}

impl Default for Cue {
    fn default() -> Self {
        Self {
            frequencies: [880.0, 1108.73],
            tone: Duration::from_millis(150),
            gap: Duration::from_millis(80),
            attack: Duration::from_millis(10),
            release: Duration::from_millis(30),
            peak: 0.3,
        }
    }
}

impl Cue {
    pub fn with_peak(mut self, peak: f32) -> Self {
        self.peak = peak.clamp(0.0, 1.0);
        self
    }

    /// Total length: every tone plus the gaps between them.
    pub fn duration(&self) -> Duration {
        let tones = self.frequencies.len() as u32;
        self.tone * tones + self.gap * tones.saturating_sub(1)
    }

    pub fn samples(&self) -> CueSamples {
        CueSamples::new(*self)
    }

    /// Gain at `t` seconds into a tone.
    fn envelope(&self, t: f32) -> f32 {
        let tone = self.tone.as_secs_f32();
        let attack = self.attack.as_secs_f32();
        let release_start = tone - self.release.as_secs_f32();
        if t < 0.0 || t >= tone {
            0.0
        } else if t < attack {
            self.peak * t / attack
        } else if t < release_start {
            self.peak
        } else {
            self.peak * (tone - t) / (tone - release_start)
        }
    }
}

/// Mono f32 samples of a [`Cue`] at [`SAMPLE_RATE`].
#[derive(Debug, Clone)]
pub struct CueSamples {
    cue: Cue,
    index: usize,
    total: usize,
}

impl CueSamples {
    fn new(cue: Cue) -> Self {
        let total = (cue.duration().as_secs_f64() * SAMPLE_RATE as f64).round() as usize;
        Self {
            cue,
            index: 0,
            total,
        }
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl Iterator for CueSamples {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.total {
            return None;
        }
        let t = self.index as f32 / SAMPLE_RATE as f32;
        self.index += 1;

        let slot = (self.cue.tone + self.cue.gap).as_secs_f32();
        let which = (t / slot) as usize;
        let Some(freq) = self.cue.frequencies.get(which) else {
            return Some(0.0);
        };
        let local = t - which as f32 * slot;
        let gain = self.cue.envelope(local);
        Some(gain * (2.0 * PI * freq * local).sin())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total - self.index;
        (left, Some(left))
    }
}

#[cfg(feature = "sound")]
impl rodio::Source for CueSamples {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total - self.index)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.cue.duration())
    }
}
