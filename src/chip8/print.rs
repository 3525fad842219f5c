//! The pretty print implementation of the [`Machine`](super::Machine), used to dump the whole
//! state of the machine for debugging.

use super::Machine;
use crate::definitions::cpu;
use once_cell::sync::Lazy;
use std::fmt;

/// The amount of entries printed per line.
const HEX_PRINT_STEP: usize = 8;

const END_OF_LINE: char = '\n';
const INDENT_FILLAMENT: char = '\t';
const INDENT_SIZE: usize = 2;

/// Will add an indent post processing
fn indent_helper(text: &mut String, indent: usize) {
    for _ in 0..indent {
        text.push(INDENT_FILLAMENT);
    }
}

macro_rules! intformat {
    () => {
        // The formatted string will be 2 symbols for the prefix (0x) and 4 for the rest long.
        "{:#06X}"
    };
}

static POINTER_LEN: Lazy<usize> = Lazy::new(|| {
    let mut line = String::with_capacity(20);
    // If there was an error panicking here is correct, as some essential component of
    // printing went wrongly.
    pointer_print::formatter(&mut line, 0, 0).unwrap();
    line.len()
});

static INTEGER_LEN: Lazy<usize> = Lazy::new(|| {
    let mut string = String::new();
    integer_print::formatter(&mut string, 0u8).unwrap();
    string.len()
});

/// a line length (This is a bit bigger then the actual line will be)
static LENLINE: Lazy<usize> =
    Lazy::new(|| INDENT_SIZE + HEX_PRINT_STEP * (*INTEGER_LEN + 1) + 1 + *POINTER_LEN);

/// Handles all the printing of the pointer values.
mod pointer_print {
    use std::fmt::Write;

    /// will format the pointers according to definition
    pub(super) fn formatter(line: &mut String, from: usize, to: usize) -> std::fmt::Result {
        write!(line, concat!(intformat!(), " - ", intformat!(), " :"), from, to)
    }
}

/// handles printing of any and all of integers.
mod integer_print {
    use super::{pointer_print, HEX_PRINT_STEP};
    use num_traits::Unsigned;
    use std::fmt::{self, Write};

    /// will format all integer types
    pub(super) fn formatter<T>(line: &mut String, data: T) -> fmt::Result
    where
        T: fmt::UpperHex + Unsigned + Copy,
    {
        write!(line, intformat!(), data)
    }

    /// will pretty print all the integer data given
    pub(super) fn printer<T>(data: &[T], indent: usize) -> Result<String, fmt::Error>
    where
        T: fmt::UpperHex + Unsigned + Copy,
    {
        let mut res = String::with_capacity(*super::LENLINE * (data.len() / HEX_PRINT_STEP + 1));
        for (block, chunk) in data.chunks(HEX_PRINT_STEP).enumerate() {
            let from = block * HEX_PRINT_STEP;
            super::indent_helper(&mut res, indent);
            pointer_print::formatter(&mut res, from, from + chunk.len() - 1)?;

            for entry in chunk {
                res.push(' ');
                formatter(&mut res, *entry)?;
            }
            res.push(super::END_OF_LINE);
        }

        // Remove unneeded new line
        res.pop();
        Ok(res)
    }
}

/// Handles all the opcode prints
mod memory_print {
    use super::{integer_print, pointer_print, HEX_PRINT_STEP};
    use crate::{definitions::memory, opcode};
    use once_cell::sync::Lazy;
    use std::fmt::{self, Write};

    /// The amount of bytes a single row covers
    const POINTER_INCREMENT: usize = HEX_PRINT_STEP * memory::opcodes::SIZE;
    /// The values that are used when there are at least two rows of zeros.
    const FILLER_BASE: &str = "...";

    /// Prepares the line that will be used, in the case that there is at least two lines of
    /// only zeros.
    static ZERO_FILLER: Lazy<String> = Lazy::new(|| {
        let mut formatted = String::new();
        integer_print::formatter(&mut formatted, 0u16).unwrap();
        let length =
            formatted.len() * (HEX_PRINT_STEP - 2) + (HEX_PRINT_STEP - 1) - FILLER_BASE.len();
        let filler = " ".repeat(length / 2);
        format!("{0}{1}{2}{1}{0}", formatted, filler, FILLER_BASE)
    });

    /// a single row of opcodes (only in this context)
    struct Row {
        from: usize,
        to: usize,
        data: [opcode::Opcode; HEX_PRINT_STEP],
        only_null: bool,
    }

    impl fmt::Display for Row {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let mut res = String::with_capacity(*super::LENLINE);
            pointer_print::formatter(&mut res, self.from, self.to)?;
            res.push(' ');

            if self.only_null {
                res.push_str(&ZERO_FILLER);
            } else {
                for (index, entry) in self.data.iter().enumerate() {
                    if index > 0 {
                        res.push(' ');
                    }
                    integer_print::formatter(&mut res, *entry)?;
                }
            }
            write!(f, "{}", res)
        }
    }

    /// will pretty print the content of the raw memory, consecutive rows of zeros are merged
    pub(super) fn printer(memory: &[u8], indent: usize) -> Result<String, fmt::Error> {
        let mut rows: Vec<Row> = Vec::with_capacity(memory.len() / POINTER_INCREMENT);

        for (block, chunk) in memory.chunks(POINTER_INCREMENT).enumerate() {
            let from = block * POINTER_INCREMENT;
            let mut data = [0; HEX_PRINT_STEP];
            for (entry, pair) in data.iter_mut().zip(chunk.chunks(memory::opcodes::SIZE)) {
                *entry = match *pair {
                    [high, low] => opcode::Opcode::from_be_bytes([high, low]),
                    [high] => opcode::Opcode::from_be_bytes([high, 0]),
                    _ => 0,
                };
            }
            let only_null = data.iter().all(|entry| *entry == 0);

            let mut row = Row {
                from,
                to: from + chunk.len() - 1,
                data,
                only_null,
            };

            if only_null {
                if let Some(last_row) = rows.last() {
                    if last_row.only_null {
                        row.from = last_row.from;
                        rows.pop();
                    }
                }
            }
            rows.push(row)
        }

        let mut string = String::with_capacity((*super::LENLINE + 1) * rows.len());
        for row in rows {
            super::indent_helper(&mut string, indent);
            write!(string, "{}{}", row, super::END_OF_LINE)?;
        }
        string.pop();
        Ok(string)
    }
}

/// Handles all the boolean data types.
mod bool_print {
    use super::{pointer_print, END_OF_LINE, HEX_PRINT_STEP};
    use std::fmt;

    /// will pretty print all the boolean data given, padded to the integer width
    pub(super) fn printer(data: &[bool], indent: usize) -> Result<String, fmt::Error> {
        let mut res = String::with_capacity(*super::LENLINE * (data.len() / HEX_PRINT_STEP + 1));

        for (block, chunk) in data.chunks(HEX_PRINT_STEP).enumerate() {
            let from = block * HEX_PRINT_STEP;
            super::indent_helper(&mut res, indent);
            pointer_print::formatter(&mut res, from, from + chunk.len() - 1)?;

            for value in chunk {
                res.push(' ');
                let text = if *value { "true" } else { "false" };
                res.push_str(&format!("{:<width$}", text, width = *super::INTEGER_LEN));
            }
            // the last column doesn't need padding
            res.truncate(res.trim_end().len());
            res.push(END_OF_LINE);
        }
        res.pop();
        Ok(res)
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut scalars = String::new();
        for (name, value) in [
            ("Opcode", self.opcode),
            ("Program Counter", self.program_counter as u16),
            ("Index Register", self.index_register),
            ("Delay Timer", self.delay_timer.get_value() as u16),
            ("Sound Timer", self.sound_timer.get_value() as u16),
        ] {
            indent_helper(&mut scalars, 1);
            scalars.push_str(name);
            scalars.push_str(" :\n");
            indent_helper(&mut scalars, INDENT_SIZE);
            integer_print::formatter(&mut scalars, value)?;
            scalars.push(END_OF_LINE);
        }

        // handle stack specially as it needs to be filled up if empty
        let mut stack = [0usize; cpu::stack::SIZE];
        stack[..self.stack.len()].copy_from_slice(&self.stack);

        let mem = memory_print::printer(&self.memory, INDENT_SIZE)?;
        let key = bool_print::printer(self.keyboard.get_keys(), INDENT_SIZE)?;
        let sta = integer_print::printer(&stack, INDENT_SIZE)?;
        let reg = integer_print::printer(&self.registers, INDENT_SIZE)?;

        write!(
            f,
            "Machine {{\n\
                {}\
                \tMemory :\n{}\n\
                \tKeyboard :\n{}\n\
                \tStack :\n{}\n\
                \tRegister :\n{}\n\
                }}",
            scalars, mem, key, sta, reg
        )
    }
}
