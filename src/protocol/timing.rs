//! Inter-report pacing windows.
//!
//! The EC silently drops reports that arrive faster than it can process
//! them, so every write is followed by a pause. Windows are given as
//! `[min, max]` in microseconds; the host sleeps at least `min`.

use std::time::Duration;

/// Pause window after a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub min: Duration,
    pub max: Duration,
}

impl Pacing {
    /// No pause, for steps the firmware is known to process immediately.
    pub const NONE: Self = Self::from_micros(0, 0);

    /// Configuration steps (markers, RPM and boost values).
    pub const SHORT: Self = Self::from_micros(3_400, 3_800);

    /// Mode switches, which reload the EC fan profile.
    pub const LONG: Self = Self::from_micros(204_000, 205_000);

    /// Keyboard matrix rows and the display trigger.
    pub const MATRIX: Self = Self::from_micros(1_000, 2_000);

    pub const fn from_micros(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_micros(min),
            max: Duration::from_micros(max),
        }
    }

    pub fn is_none(&self) -> bool {
        self.max.is_zero()
    }
}

impl std::fmt::Display for Pacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}us",
            self.min.as_micros(),
            self.max.as_micros()
        )
    }
}
