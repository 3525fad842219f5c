//! The hardware the chipset talks to and the traits hosts implement to provide it.
use crate::definitions::{display, keyboard};

/// The pixel grid, addressed `[x][y]`. A lit pixel is `true`.
pub type Framebuffer = [[bool; display::HEIGHT]; display::WIDTH];

#[cfg_attr(test, mockall::automock)]
/// The traits responsible for the display based code
pub trait DisplayCommands {
    /// Will display all from the pixels
    fn display(&mut self, pixels: &Framebuffer);
}

#[cfg_attr(test, mockall::automock)]
/// The trait responsible for writing the keyboard data
pub trait KeyboardCommands {
    /// Processes pending input and writes it into the keypad.
    fn poll(&mut self, keyboard: &mut Keyboard);

    /// Signals that the host wants the emulation to stop.
    fn is_closed(&self) -> bool;
}

#[cfg_attr(test, mockall::automock)]
/// The trait responsible for the audible cue of the sound timer
pub trait SoundCommands {
    /// Called once for every cycle the sound timer is active.
    fn beep(&mut self);
}

/// Input is done with a hex keyboard that has 16 keys ranging `0-F`. The `8`, `4`, `6`, and
/// `2` keys are typically used for directional input. Three opcodes are used to detect input.
/// One skips an instruction if a specific key is pressed, while another does the same if a
/// specific key is not pressed. The third waits for a key press, and then stores it in one of
/// the data registers.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    keys: [bool; keyboard::SIZE],
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    pub fn reset(&mut self) {
        self.keys = [false; keyboard::SIZE];
    }

    /// Only the lower nibble addresses a key, the keypad has no more keys.
    #[inline]
    fn index(key: usize) -> usize {
        key & (keyboard::SIZE - 1)
    }

    pub fn toggle_key(&mut self, key: usize) {
        let key = Self::index(key);
        self.keys[key] = !self.keys[key];
    }

    pub fn set_key(&mut self, key: usize, to: bool) {
        self.keys[Self::index(key)] = to;
    }

    /// Overrides all the keys at once.
    pub fn set_mult(&mut self, keys: &[bool]) {
        assert!(keys.len() == self.keys.len());
        self.keys.copy_from_slice(keys);
    }

    pub fn is_pressed(&self, key: usize) -> bool {
        self.keys[Self::index(key)]
    }

    /// The lowest index of all the currently pressed keys.
    pub fn first_pressed(&self) -> Option<usize> {
        self.keys.iter().position(|&pressed| pressed)
    }

    pub fn get_keys(&self) -> &[bool] {
        &self.keys
    }
}
