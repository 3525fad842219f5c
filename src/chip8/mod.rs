//! The full implementation of the chip8 interpreter, from the opcodes to an option to pretty
//! print the machine state.
mod machine;
mod opcodes;
mod print;

/// reexport machine structs and data for simpler usage
pub use machine::*;

/// split up tests into an other file for simpler implementation
#[cfg(test)]
mod tests;
