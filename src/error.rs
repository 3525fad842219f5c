use thiserror::Error;

use crate::opcode::Opcode;

/// Everything that can go wrong while the machine executes a single cycle.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProcessError {
    #[error("Invalid opcode state '{0}'.")]
    Opcode(#[from] OpcodeError),
    #[error("Invalid stack state '{0}'.")]
    Stack(#[from] StackError),
    #[error("There is no font glyph for the value {0:#04X}, only 0x0 to 0xF are available.")]
    InvalidDigit(u8),
    #[error("No key was pressed after polling for input {0} times.")]
    KeyWaitLimit(usize),
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum OpcodeError {
    #[error("An unsupported opcode was used {0:#06X?}.")]
    UnknownOpcode(Opcode),
    #[error("Pointer location invalid there can not be an opcode at {pointer:#06X}, if data len is {len}")]
    MemoryInvalid { pointer: usize, len: usize },
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum StackError {
    #[error("Stack is full!")]
    Full,
    #[error("Stack is empty!")]
    Empty,
}

/// Errors raised while getting a program into the machine.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("The program is {len} bytes long, but only {max} bytes fit into memory.")]
    OversizedProgram { len: usize, max: usize },
    #[error("Unable to read the rom: {0}")]
    Io(#[from] std::io::Error),
}
