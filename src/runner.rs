//! Drives a [`Machine`] with the host collaborators.
use crate::{
    chip8::Machine,
    config::TimerMode,
    devices::{DisplayCommands, KeyboardCommands, SoundCommands},
    opcode::Operation,
    timer::TimerClock,
    ProcessError,
};

pub struct Runner<D, K, S>
where
    D: DisplayCommands,
    K: KeyboardCommands,
    S: SoundCommands,
{
    machine: Machine,
    display: D,
    keyboard: K,
    sound: S,
    /// only used if the timers are driven externally
    clock: TimerClock,
}

impl<D, K, S> Runner<D, K, S>
where
    D: DisplayCommands,
    K: KeyboardCommands,
    S: SoundCommands,
{
    pub fn new(machine: Machine, display: D, keyboard: K, sound: S) -> Self {
        Runner {
            machine,
            display,
            keyboard,
            sound,
            clock: TimerClock::new(),
        }
    }

    /// Replaces the clock that ticks the timers in [`TimerMode::External`].
    pub fn with_clock(mut self, clock: TimerClock) -> Self {
        self.clock = clock;
        self
    }

    /// Runs a single instruction including all the host interaction around it.
    pub fn cycle(&mut self) -> Result<Operation, ProcessError> {
        self.keyboard.poll(self.machine.get_keyboard_mut());

        let external = self.machine.get_config().timers == TimerMode::External;
        // only the ticks of this cycle may ring
        let mut sound = false;
        if external {
            for _ in 0..self.clock.due() {
                sound |= self.machine.tick_timers();
            }
        }

        let keyboard = &mut self.keyboard;
        let operation = self
            .machine
            .step(|keys| keyboard.poll(keys))
            .map_err(|err| {
                log::warn!(
                    "execution stopped at {:#06X}: {}",
                    self.machine.get_program_counter(),
                    err
                );
                err
            })?;

        if self.machine.needs_redraw() {
            self.display.display(self.machine.get_display());
        }
        if !external {
            sound = self.machine.sound_active();
        }
        if sound {
            self.sound.beep();
        }
        Ok(operation)
    }

    /// Cycles until the keyboard reports that it was closed. Returns the amount of cycles run.
    pub fn run(&mut self) -> Result<usize, ProcessError> {
        let mut cycles = 0;
        while !self.keyboard.is_closed() {
            self.cycle()?;
            cycles += 1;
        }
        log::debug!("stopped after {} cycles", cycles);
        Ok(cycles)
    }

    /// Like [`Runner::run`], but stops after at most `limit` cycles.
    pub fn run_for(&mut self, limit: usize) -> Result<usize, ProcessError> {
        let mut cycles = 0;
        while cycles < limit && !self.keyboard.is_closed() {
            self.cycle()?;
            cycles += 1;
        }
        log::debug!("stopped after {} cycles", cycles);
        Ok(cycles)
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn into_machine(self) -> Machine {
        self.machine
    }
}
