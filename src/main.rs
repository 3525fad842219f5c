//! Runs a CHIP-8 rom inside of the terminal.
//!
//! ```bash
//! chip8 roms/PONG.ch8 --cycles 2000 --dump
//! ```
//!
//! The keypad is mapped onto `1234`, `QWER`, `ASDF` and `ZXCV`, `Esc` quits.
mod terminal;

use anyhow::Context;
use chip::{
    chip8::Machine,
    config::{Config, ShiftSource, TimerMode},
    resources::Rom,
    Runner,
};
use clap::Parser;
use terminal::{TerminalBell, TerminalDisplay, TerminalKeyboard};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(help = "Path to the ROM file to run")]
    rom: String,

    #[arg(short, long, help = "Stop after this many instructions, runs until Esc if omitted")]
    cycles: Option<usize>,

    #[arg(long, help = "Shift instructions read VY instead of VX")]
    shift_vy: bool,

    #[arg(long, help = "Tick the timers at 60 Hz wall clock instead of once per instruction")]
    external_timers: bool,

    #[arg(long, help = "Give up waiting for a key after this many polls")]
    key_wait_limit: Option<usize>,

    #[arg(short, long, help = "Print the machine state after the run")]
    dump: bool,
}

impl Args {
    fn config(&self) -> Config {
        let mut config = Config::default();
        if self.shift_vy {
            config = config.with_shift(ShiftSource::Vy);
        }
        if self.external_timers {
            config = config.with_timers(TimerMode::External);
        }
        if let Some(limit) = self.key_wait_limit {
            config = config.with_key_wait_limit(limit);
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rom = Rom::from_path(&args.rom).with_context(|| format!("loading {}", args.rom))?;
    let mut machine = Machine::with_config(args.config());
    machine.load_rom(&rom)?;
    log::info!("running '{}' with {:?}", rom.get_name(), machine.get_config());

    let display = TerminalDisplay::new().context("setting up the terminal")?;
    let mut runner = Runner::new(machine, display, TerminalKeyboard::new(), TerminalBell);
    let result = match args.cycles {
        Some(limit) => runner.run_for(limit),
        None => runner.run(),
    };
    // restores the terminal before anything else is printed
    let machine = runner.into_machine();

    if args.dump {
        println!("{}", machine);
    }

    let cycles = result?;
    log::info!("executed {} cycles", cycles);
    Ok(())
}
