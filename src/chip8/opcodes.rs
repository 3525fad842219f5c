use crate::{
    config::ShiftSource,
    definitions::{cpu, display, memory},
    opcode::{
        AddConst, Arithmetic, ArithmeticOpcode, Call, ChipOpcodes, Draw, InputHook, Jump,
        JumpOffset, Key, KeyOpcode, Load, LoadIndex, Misc, MiscOpcode, Operation,
        ProgramCounterStep, Random, SkipIfEqual, SkipIfNotEqual, SkipIfRegistersEqual,
        SkipIfRegistersNotEqual, System,
    },
    ProcessError,
};

use super::Machine;

/// The width of a sprite row in pixels
const SPRITE_WIDTH: usize = 8;

impl Machine {
    /// The address `offset` bytes after `I`, kept inside of the address space
    #[inline]
    fn index_address(&self, offset: usize) -> usize {
        memory::wrap(self.index_register as usize + offset)
    }

    #[inline]
    fn set_flag(&mut self, flag: bool) {
        self.registers[cpu::register::LAST] = flag as u8;
    }
}

impl ChipOpcodes for Machine {
    fn system(&mut self, opcode: &System) -> Result<(ProgramCounterStep, Operation), ProcessError> {
        match opcode {
            System::Clear => {
                // 00E0
                // clear display
                for column in self.display.iter_mut() {
                    column.fill(false);
                }
                self.redraw = true;
                Ok((ProgramCounterStep::Next, Operation::Draw))
            }
            System::Return => {
                // 00EE
                // Return from sub routine => pop from stack
                let pc = self.pop_stack()?;
                Ok((ProgramCounterStep::Jump(pc), Operation::None))
            }
        }
    }

    fn jump(&self, opcode: &Jump) -> Result<ProgramCounterStep, ProcessError> {
        // 1NNN
        // Jumps to address NNN.
        Ok(ProgramCounterStep::Jump(opcode.nnn))
    }

    fn call(&mut self, opcode: &Call) -> Result<ProgramCounterStep, ProcessError> {
        // 2NNN
        // Calls subroutine at NNN, the address of the following opcode is the return address
        self.push_stack(self.program_counter + ProgramCounterStep::Next.step())?;
        Ok(ProgramCounterStep::Jump(opcode.nnn))
    }

    fn skip_if_equal(&self, opcode: &SkipIfEqual) -> Result<ProgramCounterStep, ProcessError> {
        // 3XNN
        // Skips the next instruction if VX equals NN.
        Ok(ProgramCounterStep::cond(self.registers[opcode.x] == opcode.nn))
    }

    fn skip_if_not_equal(
        &self,
        opcode: &SkipIfNotEqual,
    ) -> Result<ProgramCounterStep, ProcessError> {
        // 4XNN
        // Skips the next instruction if VX doesn't equal NN.
        Ok(ProgramCounterStep::cond(self.registers[opcode.x] != opcode.nn))
    }

    fn skip_if_registers_equal(
        &self,
        opcode: &SkipIfRegistersEqual,
    ) -> Result<ProgramCounterStep, ProcessError> {
        // 5XY0
        // Skips the next instruction if VX equals VY.
        Ok(ProgramCounterStep::cond(
            self.registers[opcode.x] == self.registers[opcode.y],
        ))
    }

    fn load(&mut self, opcode: &Load) -> Result<ProgramCounterStep, ProcessError> {
        // 6XNN
        // Sets VX to NN.
        self.registers[opcode.x] = opcode.nn;
        Ok(ProgramCounterStep::Next)
    }

    fn add_const(&mut self, opcode: &AddConst) -> Result<ProgramCounterStep, ProcessError> {
        // 7XNN
        // Adds NN to VX. (Carry flag is not changed)
        self.registers[opcode.x] = self.registers[opcode.x].wrapping_add(opcode.nn);
        Ok(ProgramCounterStep::Next)
    }

    fn arithmetic(&mut self, opcode: &Arithmetic) -> Result<ProgramCounterStep, ProcessError> {
        let Arithmetic { ops, x, y } = *opcode;
        let vx = self.registers[x];
        let vy = self.registers[y];
        let shift_source = match self.config.shift {
            ShiftSource::Vx => vx,
            ShiftSource::Vy => vy,
        };

        match ops {
            ArithmeticOpcode::Assign => self.registers[x] = vy,
            ArithmeticOpcode::Or => self.registers[x] = vx | vy,
            ArithmeticOpcode::And => self.registers[x] = vx & vy,
            ArithmeticOpcode::Xor => self.registers[x] = vx ^ vy,
            ArithmeticOpcode::Add => {
                let (res, carry) = vx.overflowing_add(vy);
                self.registers[x] = res;
                self.set_flag(carry);
            }
            ArithmeticOpcode::Sub => {
                self.registers[x] = vx.wrapping_sub(vy);
                self.set_flag(vx >= vy);
            }
            ArithmeticOpcode::ShiftRight => {
                self.set_flag(shift_source & 0x01 == 0x01);
                self.registers[x] = shift_source >> 1;
            }
            ArithmeticOpcode::SubReverse => {
                self.registers[x] = vy.wrapping_sub(vx);
                self.set_flag(vy >= vx);
            }
            ArithmeticOpcode::ShiftLeft => {
                self.set_flag(shift_source & 0x80 == 0x80);
                self.registers[x] = shift_source << 1;
            }
        }
        Ok(ProgramCounterStep::Next)
    }

    fn skip_if_registers_not_equal(
        &self,
        opcode: &SkipIfRegistersNotEqual,
    ) -> Result<ProgramCounterStep, ProcessError> {
        // 9XY0
        // Skips the next instruction if VX doesn't equal VY.
        Ok(ProgramCounterStep::cond(
            self.registers[opcode.x] != self.registers[opcode.y],
        ))
    }

    fn load_index(&mut self, opcode: &LoadIndex) -> Result<ProgramCounterStep, ProcessError> {
        // ANNN
        // Sets I to the address NNN.
        self.index_register = opcode.nnn as u16;
        Ok(ProgramCounterStep::Next)
    }

    fn jump_offset(&self, opcode: &JumpOffset) -> Result<ProgramCounterStep, ProcessError> {
        // BNNN
        // Jumps to the address NNN plus V0.
        let v0 = self.registers[0] as usize;
        Ok(ProgramCounterStep::Jump(opcode.nnn + v0))
    }

    fn random(&mut self, opcode: &Random) -> Result<ProgramCounterStep, ProcessError> {
        // CXNN
        // Sets VX to the result of a bitwise and operation on a random number and NN.

        // using a fill bytes call here, as the trait RngCore does not support random u8.
        let mut rand = [0u8; 1];
        self.rng.fill_bytes(&mut rand);
        self.registers[opcode.x] = opcode.nn & rand[0];
        Ok(ProgramCounterStep::Next)
    }

    fn draw(&mut self, opcode: &Draw) -> Result<(ProgramCounterStep, Operation), ProcessError> {
        // DXYN
        // Draws a sprite at coordinate (VX, VY) that has a width of 8 pixels and a height of N
        // pixels. Each row of 8 pixels is read as bit-coded starting from memory location I; I
        // value doesn't change after the execution of this instruction. VF is set to 1 if any
        // screen pixels are flipped from set to unset when the sprite is drawn, and to 0 if that
        // doesn't happen. Pixels leaving the screen wrap around to the other side.
        let coorx = self.registers[opcode.x] as usize;
        let coory = self.registers[opcode.y] as usize;

        let mut collision = false;
        for row in 0..opcode.n {
            let sprite = self.memory[self.index_address(row)];
            let y = (coory + row) % display::HEIGHT;

            for column in 0..SPRITE_WIDTH {
                let mask = 0x80 >> column;
                if sprite & mask == 0 {
                    continue;
                }

                let x = (coorx + column) % display::WIDTH;
                let pixel = &mut self.display[x][y];
                collision |= *pixel;
                *pixel = !*pixel;
            }
        }

        self.set_flag(collision);
        self.redraw = true;
        Ok((ProgramCounterStep::Next, Operation::Draw))
    }

    fn key(&self, opcode: &Key) -> Result<ProgramCounterStep, ProcessError> {
        // only the lower nibble addresses a key
        let key = (self.registers[opcode.x] & 0x0F) as usize;
        let pressed = self.keyboard.is_pressed(key);
        let step = match opcode.ops {
            // EX9E
            // Skips the next instruction if the key stored in VX is pressed.
            KeyOpcode::Pressed => ProgramCounterStep::cond(pressed),
            // EXA1
            // Skips the next instruction if the key stored in VX isn't pressed.
            KeyOpcode::NotPressed => ProgramCounterStep::cond(!pressed),
        };
        Ok(step)
    }

    fn misc(
        &mut self,
        opcode: &Misc,
        wait_for_input: &mut InputHook<'_>,
    ) -> Result<ProgramCounterStep, ProcessError> {
        let x = opcode.x;
        match opcode.ops {
            MiscOpcode::GetDelayTimer => {
                // FX07
                // Sets VX to the value of the delay timer.
                self.registers[x] = self.delay_timer.get_value();
            }
            MiscOpcode::AwaitKeyPress => {
                // FX0A
                // A key press is awaited, and then stored in VX. (Blocking Operation. All
                // instruction halted until next key event)
                log::debug!("waiting for a key press into V{:X}", x);
                let mut polls = 0;
                let key = loop {
                    wait_for_input(&mut self.keyboard);
                    polls += 1;

                    if let Some(key) = self.keyboard.first_pressed() {
                        break key;
                    }
                    if matches!(self.config.key_wait_limit, Some(limit) if polls >= limit) {
                        log::warn!("no key was pressed after {} polls", polls);
                        return Err(ProcessError::KeyWaitLimit(polls));
                    }
                };
                log::debug!("key {:#X} pressed after {} polls", key, polls);
                self.registers[x] = key as u8;
            }
            MiscOpcode::SetDelayTimer => {
                // FX15
                // Sets the delay timer to VX.
                self.delay_timer.set_value(self.registers[x]);
            }
            MiscOpcode::SetSoundTimer => {
                // FX18
                // Sets the sound timer to VX.
                self.sound_timer.set_value(self.registers[x]);
            }
            MiscOpcode::AddVxToI => {
                // FX1E
                // Adds VX to I. VF is not affected.
                self.index_register = self.index_register.wrapping_add(self.registers[x] as u16);
            }
            MiscOpcode::SetIToSprite => {
                // FX29
                // Sets I to the location of the sprite for the character in VX. Characters 0-F (in
                // hexadecimal) are represented by a 4x5 font.
                let digit = self.registers[x];
                if digit > 0xF {
                    return Err(ProcessError::InvalidDigit(digit));
                }
                let glyph = display::fontset::GLYPH_SIZE * digit as usize;
                self.index_register = (display::fontset::LOCATION + glyph) as u16;
            }
            MiscOpcode::StoreBCD => {
                // FX33
                // Stores the binary-coded decimal representation of VX, with the hundreds digit
                // at I, the tens digit at I+1 and the ones digit at I+2.
                let r = self.registers[x];
                let digits = [r / 100, r / 10 % 10, r % 10];
                for (offset, digit) in digits.into_iter().enumerate() {
                    let address = self.index_address(offset);
                    self.memory[address] = digit;
                }
            }
            MiscOpcode::StoreV0ToVx => {
                // FX55
                // Stores V0 to VX (including VX) in memory starting at address I. I itself is
                // left unmodified.
                for offset in 0..=x {
                    let address = self.index_address(offset);
                    self.memory[address] = self.registers[offset];
                }
            }
            MiscOpcode::FillV0ToVx => {
                // FX65
                // Fills V0 to VX (including VX) with values from memory starting at address I.
                // I itself is left unmodified.
                for offset in 0..=x {
                    self.registers[offset] = self.memory[self.index_address(offset)];
                }
            }
        }
        Ok(ProgramCounterStep::Next)
    }
}
