use std::time::{Duration, Instant};

use crate::definitions::timer::INTERVAL_NANOS;

/// Represents a timer inside of the chip infrastructure, it counts down to zero from what ever
/// number it was set to. It never wraps below zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    value: u8,
}

impl Timer {
    /// Will create a new timer with the given value.
    pub fn new(value: u8) -> Self {
        Self { value }
    }

    /// Will set the value from which the timer shall count down from.
    pub fn set_value(&mut self, value: u8) {
        self.value = value;
    }

    /// Will get the value that the counter is currently at.
    pub fn get_value(&self) -> u8 {
        self.value
    }

    pub fn is_active(&self) -> bool {
        self.value > 0
    }

    /// Counts down by one, returns if the timer was active before.
    pub fn tick(&mut self) -> bool {
        let active = self.is_active();
        if active {
            self.value -= 1;
        }
        active
    }
}

/// Keeps track of wall clock time so that a host can tick the timers at 60 Hz, independent of
/// how fast the instructions are executed.
#[derive(Debug)]
pub struct TimerClock {
    interval: Duration,
    last: Instant,
}

impl TimerClock {
    pub fn new() -> Self {
        Self::with_interval(Duration::from_nanos(INTERVAL_NANOS))
    }

    pub fn with_interval(interval: Duration) -> Self {
        assert!(!interval.is_zero(), "The timer interval has to be positive.");
        Self {
            interval,
            last: Instant::now(),
        }
    }

    /// The amount of ticks that are due since the last call.
    pub fn due(&mut self) -> u32 {
        self.due_at(Instant::now())
    }

    pub(crate) fn due_at(&mut self, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.last);
        let ticks = (elapsed.as_nanos() / self.interval.as_nanos()) as u32;
        // keep the remainder so that no time is lost between the calls
        self.last += self.interval * ticks;
        ticks
    }
}

impl Default for TimerClock {
    fn default() -> Self {
        Self::new()
    }
}
