//! The crossterm frontend of the binary.
use std::{
    io::{self, Stdout, Write},
    time::{Duration, Instant},
};

use chip::{
    definitions::keyboard,
    devices::{DisplayCommands, Framebuffer, Keyboard, KeyboardCommands, SoundCommands},
};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    style, terminal,
};

const PIXEL_ON: &str = "██";
const PIXEL_OFF: &str = "  ";

/// Most terminals never report a key release, a press counts as held for this long.
const KEY_HOLD: Duration = Duration::from_millis(120);

/// The keypad on the left hand side of a qwerty keyboard.
///
/// ```text
/// |1|2|3|C|     |1|2|3|4|
/// |4|5|6|D|     |Q|W|E|R|
/// |7|8|9|E|     |A|S|D|F|
/// |A|0|B|F|     |Z|X|C|V|
/// ```
const KEYMAP: [(char, usize); keyboard::SIZE] = [
    ('1', 0x1),
    ('2', 0x2),
    ('3', 0x3),
    ('4', 0xC),
    ('q', 0x4),
    ('w', 0x5),
    ('e', 0x6),
    ('r', 0xD),
    ('a', 0x7),
    ('s', 0x8),
    ('d', 0x9),
    ('f', 0xE),
    ('z', 0xA),
    ('x', 0x0),
    ('c', 0xB),
    ('v', 0xF),
];

/// Maps a terminal key onto the hex keypad.
fn map_key(code: KeyCode) -> Option<usize> {
    match code {
        KeyCode::Char(c) => {
            let c = c.to_ascii_lowercase();
            KEYMAP
                .iter()
                .find(|(key, _)| *key == c)
                .map(|(_, index)| *index)
        }
        _ => None,
    }
}

/// Renders the framebuffer on the alternate screen. The terminal is restored on drop.
pub struct TerminalDisplay {
    out: Stdout,
}

impl TerminalDisplay {
    pub fn new() -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        crossterm::execute!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All)
        )?;
        Ok(TerminalDisplay { out })
    }

    fn render(&mut self, pixels: &Framebuffer) -> io::Result<()> {
        let height = pixels.first().map_or(0, |column| column.len());

        for y in 0..height {
            crossterm::queue!(self.out, cursor::MoveTo(0, y as u16))?;
            for column in pixels.iter() {
                let pixel = if column[y] { PIXEL_ON } else { PIXEL_OFF };
                crossterm::queue!(self.out, style::Print(pixel))?;
            }
        }
        self.out.flush()
    }
}

impl DisplayCommands for TerminalDisplay {
    fn display(&mut self, pixels: &Framebuffer) {
        if let Err(err) = self.render(pixels) {
            log::warn!("unable to render the frame: {}", err);
        }
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let restored = crossterm::execute!(self.out, cursor::Show, terminal::LeaveAlternateScreen)
            .and_then(|_| terminal::disable_raw_mode());
        if let Err(err) = restored {
            log::warn!("unable to restore the terminal: {}", err);
        }
    }
}

/// Reads the keypad from the terminal events. `Esc` or `Ctrl+C` close the emulator.
#[derive(Debug, Default)]
pub struct TerminalKeyboard {
    /// when each key was last seen pressed
    held: [Option<Instant>; keyboard::SIZE],
    closed: bool,
}

impl TerminalKeyboard {
    pub fn new() -> Self {
        TerminalKeyboard::default()
    }

    /// Applies a single key event at the given point in time.
    fn handle(&mut self, key: KeyEvent, now: Instant) {
        let ctrl_c =
            key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
        if key.code == KeyCode::Esc || ctrl_c {
            log::debug!("close requested");
            self.closed = true;
            return;
        }

        if let Some(index) = map_key(key.code) {
            self.held[index] = match key.kind {
                KeyEventKind::Press | KeyEventKind::Repeat => Some(now),
                KeyEventKind::Release => None,
            };
        }
    }

    /// Writes the keys still held at `now` into the keypad.
    fn apply(&mut self, keys: &mut Keyboard, now: Instant) {
        for (index, held) in self.held.iter_mut().enumerate() {
            if matches!(held, Some(since) if now.duration_since(*since) > KEY_HOLD) {
                *held = None;
            }
            keys.set_key(index, held.is_some());
        }
    }

    fn read_events(&mut self) -> io::Result<()> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                self.handle(key, Instant::now());
            }
        }
        Ok(())
    }
}

impl KeyboardCommands for TerminalKeyboard {
    fn poll(&mut self, keys: &mut Keyboard) {
        if let Err(err) = self.read_events() {
            log::warn!("unable to read the terminal input: {}", err);
            self.closed = true;
        }
        self.apply(keys, Instant::now());
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Rings the terminal bell.
pub struct TerminalBell;

impl SoundCommands for TerminalBell {
    fn beep(&mut self) {
        let mut out = io::stdout();
        let rung = crossterm::execute!(out, style::Print('\x07'));
        if let Err(err) = rung {
            log::warn!("unable to ring the bell: {}", err);
        }
    }
}
