use rand::RngCore;
use tinyvec::ArrayVec;

use crate::{
    config::{Config, TimerMode},
    definitions::{cpu, display, memory},
    devices::{Framebuffer, Keyboard},
    opcode::{self, ChipOpcodes, Instruction, Opcode, Operation, ProgramCounter, ProgramCounterStep},
    resources::Rom,
    timer::Timer,
    LoadError, ProcessError, StackError,
};

/// The Machine struct represents the current state of the system, it contains all the
/// structures needed for emulating an instance of the Chip8 CPU.
pub struct Machine {
    /// The quirks this machine runs with
    pub(super) config: Config,
    /// all two bytes long and stored big-endian
    pub(super) opcode: Opcode,
    /// - `0x000-0x1FF` - Chip 8 interpreter (contains font set in emu)
    /// - `0x000-0x04F` - Used for the built in `4x5` pixel font set (`0-F`)
    /// - `0x200-0xFFF` - Program ROM and work RAM
    pub(super) memory: Vec<u8>,
    /// `8-bit` data registers named `V0` to `VF`. The `VF` register doubles as a flag for some
    /// instructions; thus, it should be avoided. In an addition operation, `VF` is the carry flag,
    /// while in subtraction, it is the "no borrow" flag. In the draw instruction `VF` is set upon
    /// pixel collision.
    pub(super) registers: [u8; cpu::register::SIZE],
    /// The index for the register, this is a special register entry called index `I`
    pub(super) index_register: u16,
    /// The program counter has the address of the next instruction to be executed from memory.
    pub(super) program_counter: usize,
    /// The stack is only used to store return addresses when subroutines are called. The original
    /// [RCA 1802](https://de.wikipedia.org/wiki/RCA1802) version allocated `48` bytes for up to
    /// `12` levels of nesting; modern implementations usually have more.
    /// (here we are using `16`)
    pub(super) stack: ArrayVec<[usize; cpu::stack::SIZE]>,
    /// Delay timer: This timer is intended to be used for timing the events of games. Its value
    /// can be set and read.
    pub(super) delay_timer: Timer,
    /// Sound timer: This timer is used for sound effects. When its value is nonzero, a beeping
    /// sound is made.
    pub(super) sound_timer: Timer,
    /// The graphics of the Chip 8 are black and white and the screen has a total of `2048` pixels
    /// `(64 x 32)`.
    pub(super) display: Framebuffer,
    /// The hex keypad
    pub(super) keyboard: Keyboard,
    /// Set if the display changed during the last step
    pub(super) redraw: bool,
    /// Set if the sound timer counted down during the last timer tick
    pub(super) sound: bool,
    /// This stores the random number generator, used by the chipset.
    /// It is stored into the chipset, so as to enable simple mocking
    /// of the given type.
    pub(super) rng: Box<dyn RngCore + Send>,
}

impl Machine {
    /// will create a new, initialized machine running the reference behaviour
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut machine = Self {
            config,
            opcode: 0,
            memory: vec![0; memory::SIZE],
            registers: [0; cpu::register::SIZE],
            index_register: 0,
            program_counter: cpu::PROGRAM_COUNTER,
            stack: ArrayVec::new(),
            delay_timer: Timer::default(),
            sound_timer: Timer::default(),
            display: [[false; display::HEIGHT]; display::WIDTH],
            keyboard: Keyboard::new(),
            redraw: false,
            sound: false,
            rng: Box::new(rand::rngs::OsRng),
        };
        machine.initialize();
        machine
    }

    /// Replaces the random number generator used by `CXNN`.
    pub fn with_rng<R>(mut self, rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        self.rng = Box::new(rng);
        self
    }

    /// Resets the whole machine, only the font set stays in memory.
    pub fn initialize(&mut self) {
        self.memory.fill(0);
        // load fonts
        let font = display::fontset::LOCATION;
        self.memory[font..(font + display::fontset::FONTSET.len())]
            .copy_from_slice(&display::fontset::FONTSET);

        self.opcode = 0;
        self.registers = [0; cpu::register::SIZE];
        self.index_register = 0;
        self.program_counter = cpu::PROGRAM_COUNTER;
        self.stack.clear();
        self.delay_timer.set_value(0);
        self.sound_timer.set_value(0);
        self.display = [[false; display::HEIGHT]; display::WIDTH];
        self.keyboard.reset();
        self.redraw = false;
        self.sound = false;
    }

    /// Writes the program into memory at the program start. A program that doesn't fit leaves
    /// the machine untouched.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), LoadError> {
        if program.len() > cpu::MAX_PROGRAM_SIZE {
            return Err(LoadError::OversizedProgram {
                len: program.len(),
                max: cpu::MAX_PROGRAM_SIZE,
            });
        }

        // write the rom data into memory
        self.memory[cpu::PROGRAM_COUNTER..(cpu::PROGRAM_COUNTER + program.len())]
            .copy_from_slice(program);
        log::debug!("loaded program with {} bytes", program.len());
        Ok(())
    }

    pub fn load_rom(&mut self, rom: &Rom) -> Result<(), LoadError> {
        log::debug!("loading rom '{}'", rom.get_name());
        self.load_program(rom.get_data())
    }

    /// will get the next opcode from memory
    pub(super) fn set_opcode(&mut self) -> Result<(), ProcessError> {
        // will build the opcode given from the pointer
        self.opcode = opcode::build_opcode(&self.memory, self.program_counter)?;
        Ok(())
    }

    /// Will advance the program by a single fetch, decode and execute cycle.
    ///
    /// `wait_for_input` is only called by `FX0A`, it shall process pending input and write it
    /// into the given keyboard. It is called until a key is pressed.
    pub fn step<F>(&mut self, mut wait_for_input: F) -> Result<Operation, ProcessError>
    where
        F: FnMut(&mut Keyboard),
    {
        self.redraw = false;
        if self.config.timers == TimerMode::PerCycle {
            self.sound = false;
        }

        self.set_opcode()?;
        log::trace!("{:#06X}: opcode {:#06X}", self.program_counter, self.opcode);

        let instruction = Instruction::try_from(self.opcode)?;
        let operation = self.calc(&instruction, &mut wait_for_input)?;

        if self.config.timers == TimerMode::PerCycle {
            self.tick_timers();
        }
        Ok(operation)
    }

    /// Counts both timers down by one, returns if the sound timer was active.
    pub fn tick_timers(&mut self) -> bool {
        self.delay_timer.tick();
        self.sound = self.sound_timer.tick();
        self.sound
    }

    /// If the display changed during the last step.
    pub fn needs_redraw(&self) -> bool {
        self.redraw
    }

    /// If the sound timer was active during the last timer tick.
    pub fn sound_active(&self) -> bool {
        self.sound
    }

    /// Will write keyboard data into internal keyboard representation.
    pub fn set_keyboard(&mut self, keys: &[bool]) {
        self.keyboard.set_mult(keys);
    }

    /// Will set the value of the given key, only the lower nibble of `key` is used
    pub fn set_key(&mut self, key: usize, to: bool) {
        self.keyboard.set_key(key, to)
    }

    pub fn get_keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn get_keyboard_mut(&mut self) -> &mut Keyboard {
        &mut self.keyboard
    }

    /// will return the sound timer
    pub fn get_sound_timer(&self) -> u8 {
        self.sound_timer.get_value()
    }

    /// will return the delay timer
    pub fn get_delay_timer(&self) -> u8 {
        self.delay_timer.get_value()
    }

    /// Will return the current display configuration
    pub fn get_display(&self) -> &Framebuffer {
        &self.display
    }

    pub fn get_registers(&self) -> &[u8] {
        &self.registers
    }

    pub fn get_index_register(&self) -> u16 {
        self.index_register
    }

    pub fn get_program_counter(&self) -> usize {
        self.program_counter
    }

    pub fn get_memory(&self) -> &[u8] {
        &self.memory
    }

    /// The return addresses, the last entry is the most recent call.
    pub fn get_stack(&self) -> &[usize] {
        &self.stack
    }

    /// The last opcode that was fetched
    pub fn get_opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    /// Will push the current pointer to the stack
    pub(super) fn push_stack(&mut self, pointer: usize) -> Result<(), StackError> {
        match self.stack.try_push(pointer) {
            None => {
                log::debug!("push {:#06X} depth {}", pointer, self.stack.len());
                Ok(())
            }
            Some(_) => Err(StackError::Full),
        }
    }

    /// Will pop from the stack
    pub(super) fn pop_stack(&mut self) -> Result<usize, StackError> {
        let pointer = self.stack.pop().ok_or(StackError::Empty)?;
        log::debug!("pop {:#06X} depth {}", pointer, self.stack.len());
        Ok(pointer)
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramCounter for Machine {
    fn advance(&mut self, step: ProgramCounterStep) {
        self.program_counter = if let ProgramCounterStep::Jump(_) = step {
            step.step()
        } else {
            self.program_counter + step.step()
        }
    }
}
