//! Runtime configuration of the interpreter quirks.

/// Which register the shift instructions (`8XY6` and `8XYE`) read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftSource {
    /// `VX` is shifted in place, `VY` is ignored.
    #[default]
    Vx,
    /// `VY` is shifted and the result stored into `VX` (original COSMAC VIP behaviour).
    Vy,
}

/// Who drives the delay and sound timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerMode {
    /// Every executed instruction decrements the timers by one.
    #[default]
    PerCycle,
    /// The host calls [`Machine::tick_timers`](crate::chip8::Machine::tick_timers) at 60 Hz,
    /// the instruction loop leaves the timers alone.
    External,
}

/// The configuration of a single machine. The default reproduces the reference behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    pub shift: ShiftSource,
    pub timers: TimerMode,
    /// How often the input hook may be polled during a single `FX0A` before giving up.
    /// `None` waits forever.
    pub key_wait_limit: Option<usize>,
}

impl Config {
    pub fn with_shift(mut self, shift: ShiftSource) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_timers(mut self, timers: TimerMode) -> Self {
        self.timers = timers;
        self
    }

    pub fn with_key_wait_limit(mut self, limit: usize) -> Self {
        self.key_wait_limit = Some(limit);
        self
    }
}
