use rand::rngs::mock::StepRng;

use super::Machine;
use crate::{
    config::{Config, ShiftSource, TimerMode},
    definitions::{cpu, display, memory},
    devices::Keyboard,
    opcode::{Opcode, Operation, ProgramCounter, ProgramCounterStep},
    LoadError, OpcodeError, ProcessError, StackError,
};

/// clear, I = 0x20A, V0 = 5, I = sprite(V0), jump to self
pub(super) const TEST_PROGRAM: [u8; 10] = [0x00, 0xE0, 0xA2, 0x0A, 0x60, 0x05, 0xF0, 0x29, 0x12, 0x08];

/// the byte the mocked random number generator yields
const RANDOM_BYTE: u8 = 0xAB;

/// will setup the default configured chip
pub(super) fn get_default_chip() -> Machine {
    setup_chip(Config::default())
}

pub(super) fn setup_chip(config: Config) -> Machine {
    let mut chip = Machine::with_config(config).with_rng(StepRng::new(RANDOM_BYTE as u64, 0));
    chip.load_program(&TEST_PROGRAM)
        .expect("The test program fits into memory.");
    chip
}

#[inline]
/// Will write the opcode to the memory location specified
pub(super) fn write_opcode_to_memory(memory: &mut [u8], from: usize, opcode: Opcode) {
    write_slice_to_memory(memory, from, &opcode.to_be_bytes());
}

#[inline]
/// Will write the slice to the memory location specified
pub(super) fn write_slice_to_memory(memory: &mut [u8], from: usize, data: &[u8]) {
    memory[from..(from + data.len())].copy_from_slice(data);
}

/// the input hook for all the instructions that never wait
fn no_input(_: &mut Keyboard) {}

/// writes the opcode at the program counter and executes it
fn run(chip: &mut Machine, opcode: Opcode) -> Result<Operation, ProcessError> {
    write_opcode_to_memory(&mut chip.memory, chip.program_counter, opcode);
    chip.step(no_input)
}

#[test]
fn test_initialize() {
    let chip = Machine::new();

    assert_eq!(
        &chip.memory[..display::fontset::FONTSET.len()],
        &display::fontset::FONTSET[..]
    );
    assert!(chip.memory[display::fontset::FONTSET.len()..]
        .iter()
        .all(|byte| *byte == 0));
    assert_eq!(chip.program_counter, cpu::PROGRAM_COUNTER);
    assert_eq!(chip.index_register, 0);
    assert!(chip.stack.is_empty());
    assert_eq!(chip.registers, [0; cpu::register::SIZE]);
    assert!(!chip.needs_redraw());
}

#[test]
fn test_initialize_resets_state() {
    let mut chip = get_default_chip();
    chip.registers[0x3] = 0x42;
    chip.index_register = 0x123;
    chip.program_counter = 0x300;
    chip.delay_timer.set_value(9);
    chip.display[3][4] = true;
    chip.set_key(0x4, true);
    chip.push_stack(0x204).unwrap();

    chip.initialize();

    assert_eq!(chip.registers, [0; cpu::register::SIZE]);
    assert_eq!(chip.index_register, 0);
    assert_eq!(chip.program_counter, cpu::PROGRAM_COUNTER);
    assert_eq!(chip.get_delay_timer(), 0);
    assert!(!chip.display[3][4]);
    assert!(!chip.get_keyboard().is_pressed(0x4));
    assert!(chip.stack.is_empty());
    // the program is gone, but the fonts stay
    assert_eq!(chip.memory[cpu::PROGRAM_COUNTER], 0);
    assert_eq!(chip.memory[0], display::fontset::FONTSET[0]);
}

#[test]
fn test_load_program_largest() {
    let mut chip = Machine::new();
    let program = vec![0xAA; cpu::MAX_PROGRAM_SIZE];

    assert!(chip.load_program(&program).is_ok());
    assert_eq!(chip.memory[cpu::PROGRAM_COUNTER], 0xAA);
    assert_eq!(chip.memory[memory::LAST], 0xAA);
}

#[test]
fn test_load_program_oversized() {
    let mut chip = Machine::new();
    let program = vec![0xAA; cpu::MAX_PROGRAM_SIZE + 1];

    let err = chip.load_program(&program).unwrap_err();
    assert!(matches!(
        err,
        LoadError::OversizedProgram { len, max } if len == 3585 && max == 3584
    ));

    // the state is untouched
    let fresh = Machine::new();
    assert_eq!(chip.memory, fresh.memory);
    assert_eq!(chip.program_counter, fresh.program_counter);
}

#[test]
fn test_step_starts_at_program_start() {
    let mut chip = get_default_chip();
    assert_eq!(chip.step(no_input), Ok(Operation::Draw));
    assert_eq!(chip.get_opcode(), 0x00E0);
    assert_eq!(chip.program_counter, cpu::PROGRAM_COUNTER + memory::opcodes::SIZE);
}

#[test]
fn test_run_test_program() {
    let mut chip = get_default_chip();
    for _ in 0..4 {
        chip.step(no_input).unwrap();
    }
    // the glyph of digit 5
    assert_eq!(chip.index_register, 5 * 5);
    assert_eq!(chip.program_counter, 0x208);

    // the program ends in an endless loop
    chip.step(no_input).unwrap();
    assert_eq!(chip.program_counter, 0x208);
}

#[test]
fn test_set_opcode() {
    let mut chip = get_default_chip();
    let opcode = 0xA00A;
    write_opcode_to_memory(&mut chip.memory, chip.program_counter, opcode);

    assert!(chip.set_opcode().is_ok());

    assert_eq!(chip.opcode, opcode);
}

#[test]
fn test_fetch_outside_of_memory() {
    let mut chip = get_default_chip();
    chip.advance(ProgramCounterStep::Jump(memory::LAST));

    assert_eq!(
        chip.step(no_input),
        Err(ProcessError::Opcode(OpcodeError::MemoryInvalid {
            pointer: memory::LAST,
            len: memory::SIZE,
        }))
    );
}

#[test]
/// testing internal functionality of popping and pushing into the stack
fn test_push_pop_stack() {
    let mut chip = get_default_chip();

    // check empty initial stack
    assert!(chip.stack.is_empty());

    let next_counter = 0x0133 + cpu::PROGRAM_COUNTER;

    for i in 0..cpu::stack::SIZE {
        assert_eq!(Ok(()), chip.push_stack(next_counter + i * 8));
    }
    // check for the correct error
    assert_eq!(Err(StackError::Full), chip.push_stack(next_counter));

    assert_eq!(cpu::stack::SIZE, chip.stack.len());
    // pop the stack
    for i in (0..cpu::stack::SIZE).rev() {
        assert_eq!(Ok(next_counter + i * 8), chip.pop_stack());
    }
    assert!(chip.stack.is_empty());
    assert_eq!(Err(StackError::Empty), chip.pop_stack());
}

#[test]
fn test_advance() {
    let mut chip = get_default_chip();
    let mut pc = chip.program_counter;

    let data = &[
        (ProgramCounterStep::Next, 1),
        (ProgramCounterStep::Skip, 2),
    ];

    for (pcs, by) in data.iter() {
        pc += by * memory::opcodes::SIZE;
        chip.advance(*pcs);
        assert_eq!(chip.program_counter, pc);
    }

    pc += 8 * memory::opcodes::SIZE;
    chip.advance(ProgramCounterStep::Jump(pc));
    assert_eq!(chip.program_counter, pc);
}

mod zero {
    use super::*;

    #[test]
    /// `0x00E0`
    fn test_clear_display_opcode() {
        let mut chip = get_default_chip();
        chip.display[0][0] = true;
        chip.display[63][31] = true;

        let curr_pc = chip.program_counter;

        assert_eq!(run(&mut chip, 0x00E0), Ok(Operation::Draw));

        assert!(chip.needs_redraw());
        assert!(chip.display.iter().flatten().all(|pixel| !pixel));
        assert_eq!(curr_pc + memory::opcodes::SIZE, chip.program_counter);
    }

    #[test]
    /// `0x2NNN` followed by `0x00EE`
    fn test_return_subroutine() {
        let mut chip = get_default_chip();
        let curr_pc = chip.program_counter;
        let base = 0x234;

        assert_eq!(run(&mut chip, 0x2000 ^ base as Opcode), Ok(Operation::None));
        assert_eq!(chip.program_counter, base);

        assert_eq!(run(&mut chip, 0x00EE), Ok(Operation::None));

        // continue right after the call
        assert_eq!(curr_pc + memory::opcodes::SIZE, chip.program_counter);
        assert!(chip.stack.is_empty());
    }

    #[test]
    fn test_return_on_empty_stack() {
        let mut chip = get_default_chip();
        let curr_pc = chip.program_counter;

        assert_eq!(
            run(&mut chip, 0x00EE),
            Err(ProcessError::Stack(StackError::Empty))
        );
        assert_eq!(curr_pc, chip.program_counter);
    }

    #[test]
    fn test_illegal_zero_opcode() {
        let mut chip = get_default_chip();
        for opcode in [0x00EA, 0x0123, 0x0000] {
            assert_eq!(
                run(&mut chip, opcode),
                Err(ProcessError::Opcode(OpcodeError::UnknownOpcode(opcode)))
            );
            assert_eq!(chip.program_counter, cpu::PROGRAM_COUNTER);
        }
    }
}

mod one {
    use super::*;

    #[test]
    /// `1NNN`
    fn test_jump_address() {
        let mut chip = get_default_chip();
        let base = 0x0234;

        assert_eq!(run(&mut chip, 0x1000 ^ base as Opcode), Ok(Operation::None));

        assert_eq!(base, chip.program_counter);
    }
}

mod two {
    use super::*;

    #[test]
    /// `2NNN`
    fn test_call_subroutine() {
        let mut chip = get_default_chip();
        let base = 0x234;
        let curr_pc = chip.program_counter;

        assert_eq!(Ok(Operation::None), run(&mut chip, 0x2000 ^ base as Opcode));

        assert_eq!(base, chip.program_counter);
        assert_eq!(curr_pc + memory::opcodes::SIZE, chip.stack[0]);
    }

    #[test]
    fn test_call_stack_overflow() {
        let mut chip = get_default_chip();
        // calls itself over and over again
        let opcode = 0x2000 ^ cpu::PROGRAM_COUNTER as Opcode;
        write_opcode_to_memory(&mut chip.memory, cpu::PROGRAM_COUNTER, opcode);

        for _ in 0..cpu::stack::SIZE {
            assert_eq!(chip.step(no_input), Ok(Operation::None));
        }
        assert_eq!(
            chip.step(no_input),
            Err(ProcessError::Stack(StackError::Full))
        );
        assert_eq!(chip.stack.len(), cpu::stack::SIZE);
        assert_eq!(chip.program_counter, cpu::PROGRAM_COUNTER);
    }
}

mod skip {
    use super::*;

    fn assert_skip(chip: &mut Machine, opcode: Opcode, skip: bool) {
        let curr_pc = chip.program_counter;
        assert_eq!(Ok(Operation::None), run(chip, opcode));
        let by = if skip { 2 } else { 1 };
        assert_eq!(chip.program_counter, curr_pc + by * memory::opcodes::SIZE);
    }

    #[test]
    /// `3XNN`
    fn test_skip_instruction_if_const_equals() {
        let mut chip = get_default_chip();
        chip.registers[0x1] = 0x2;
        assert_skip(&mut chip, 0x3103, false);

        chip.registers[0x1] = 0x3;
        assert_skip(&mut chip, 0x3103, true);
    }

    #[test]
    /// `4XNN`
    fn test_skip_instruction_if_const_not_equals() {
        let mut chip = get_default_chip();
        chip.registers[0x1] = 0x3;
        assert_skip(&mut chip, 0x4103, false);

        chip.registers[0x1] = 0x66;
        assert_skip(&mut chip, 0x4103, true);
    }

    #[test]
    /// `5XY0`
    fn test_skip_instruction_if_register_equals() {
        let mut chip = get_default_chip();
        chip.registers[0x2] = 0x6;
        chip.registers[0x1] = 0x66;
        assert_skip(&mut chip, 0x5210, false);

        chip.registers[0x2] = 0x66;
        assert_skip(&mut chip, 0x5210, true);
    }

    #[test]
    /// `9XY0`
    fn test_skip_instruction_if_register_not_equals() {
        let mut chip = get_default_chip();
        chip.registers[0x2] = 0x66;
        chip.registers[0x1] = 0x66;
        assert_skip(&mut chip, 0x9210, false);

        chip.registers[0x2] = 0x6;
        assert_skip(&mut chip, 0x9210, true);
    }

    #[test]
    fn test_register_compare_false_opcode() {
        let mut chip = get_default_chip();
        let pc = chip.program_counter;
        for group in [0x5000, 0x9000] {
            for i in 1..16 {
                let opcode = group ^ 0x0210 ^ i;

                assert_eq!(
                    run(&mut chip, opcode),
                    Err(ProcessError::Opcode(OpcodeError::UnknownOpcode(opcode)))
                );
                // assert that there was no movement
                assert_eq!(pc, chip.program_counter);
            }
        }
        assert_eq!(
            run(&mut chip, 0x5001),
            Err(ProcessError::Opcode(OpcodeError::UnknownOpcode(0x5001)))
        );
    }
}

mod six {
    use super::*;

    #[test]
    /// `6XNN`
    fn test_set_vx_to_nn() {
        let mut chip = get_default_chip();
        for register in 0..cpu::register::SIZE {
            for value in 0..=u8::MAX {
                let curr_pc = chip.program_counter;
                let opcode = 0x6000 ^ ((register as Opcode) << 8) ^ value as Opcode;
                assert_eq!(Ok(Operation::None), run(&mut chip, opcode));
                assert_eq!(value, chip.registers[register]);
                assert_eq!(chip.program_counter, curr_pc + memory::opcodes::SIZE);
                chip.program_counter = cpu::PROGRAM_COUNTER;
            }
        }
    }
}

mod seven {
    use super::*;

    #[test]
    /// `7XNN`
    fn test_add_nn_to_vx() {
        let mut chip = get_default_chip();
        chip.registers[0x1] = 0xFA;
        chip.registers[cpu::register::LAST] = 0x7;

        assert_eq!(Ok(Operation::None), run(&mut chip, 0x7166));
        assert_eq!(0x60, chip.registers[0x1]);

        chip.registers[0x1] = 0xFF;
        assert_eq!(Ok(Operation::None), run(&mut chip, 0x7102));
        assert_eq!(0x01, chip.registers[0x1]);

        // the carry flag is not changed
        assert_eq!(0x7, chip.registers[cpu::register::LAST]);
    }
}

mod eight {
    use super::*;

    const REG_X: usize = 0x1;
    const REG_Y: usize = 0x2;

    /// runs `8XYN` with the given register values, returns `(VX, VF)`
    fn calc(chip: &mut Machine, command: Opcode, vx: u8, vy: u8) -> (u8, u8) {
        chip.registers[REG_X] = vx;
        chip.registers[REG_Y] = vy;
        let curr_pc = chip.program_counter;
        let opcode = 0x8000 ^ (REG_X as Opcode) << 8 ^ (REG_Y as Opcode) << 4 ^ command;

        assert_eq!(Ok(Operation::None), run(chip, opcode));
        assert_eq!(chip.program_counter, curr_pc + memory::opcodes::SIZE);
        (chip.registers[REG_X], chip.registers[cpu::register::LAST])
    }

    #[test]
    /// `8XY0` to `8XY3`
    fn test_assign_and_bitwise() {
        let mut chip = get_default_chip();
        assert_eq!(calc(&mut chip, 0x0, 0x14, 0xFA).0, 0xFA);
        assert_eq!(calc(&mut chip, 0x1, 0x14, 0xFA).0, 0xFE);
        assert_eq!(calc(&mut chip, 0x2, 0x14, 0xFA).0, 0x10);
        assert_eq!(calc(&mut chip, 0x3, 0x14, 0xFA).0, 0xEE);
    }

    #[test]
    /// `8XY4`
    fn test_addition_with_carry() {
        let mut chip = get_default_chip();
        assert_eq!(calc(&mut chip, 0x4, 0xFF, 0x01), (0x00, 1));
        assert_eq!(calc(&mut chip, 0x4, 0x01, 0x01), (0x02, 0));
        assert_eq!(calc(&mut chip, 0x4, 0x14, 0xFA), (0x0E, 1));
    }

    #[test]
    /// `8XY5`
    fn test_subtraction_with_borrow() {
        let mut chip = get_default_chip();
        assert_eq!(calc(&mut chip, 0x5, 0x01, 0x02), (0xFF, 0));
        assert_eq!(calc(&mut chip, 0x5, 0x02, 0x01), (0x01, 1));
        // equal values don't borrow
        assert_eq!(calc(&mut chip, 0x5, 0x33, 0x33), (0x00, 1));
    }

    #[test]
    /// `8XY6`
    fn test_least_sig_bit_and_shift_right() {
        let mut chip = get_default_chip();
        assert_eq!(calc(&mut chip, 0x6, 0x11, 0xFF), (0x08, 1));
        assert_eq!(calc(&mut chip, 0x6, 0x10, 0xFF), (0x08, 0));
    }

    #[test]
    /// `8XY7`
    fn test_reverse_subtraction() {
        let mut chip = get_default_chip();
        assert_eq!(calc(&mut chip, 0x7, 0xFA, 0x14), (0x1A, 0));
        assert_eq!(calc(&mut chip, 0x7, 0x14, 0xFA), (0xE6, 1));
        assert_eq!(calc(&mut chip, 0x7, 0x20, 0x20), (0x00, 1));
    }

    #[test]
    /// `8XYE`
    fn test_most_sig_bit_and_shift_left() {
        let mut chip = get_default_chip();
        assert_eq!(calc(&mut chip, 0xE, 0xF1, 0x00), (0xE2, 1));
        assert_eq!(calc(&mut chip, 0xE, 0x71, 0xFF), (0xE2, 0));
    }

    #[test]
    fn test_shift_reads_vy() {
        let mut chip = setup_chip(Config::default().with_shift(ShiftSource::Vy));
        assert_eq!(calc(&mut chip, 0x6, 0x00, 0x03), (0x01, 1));
        assert_eq!(calc(&mut chip, 0xE, 0x00, 0x81), (0x02, 1));
        assert_eq!(chip.registers[REG_Y], 0x81);
    }

    /// runs `8FYN` with `VF` as target, returns `VF`
    fn calc_into_flag(chip: &mut Machine, command: Opcode, vf: u8, vy: u8) -> u8 {
        chip.registers[cpu::register::LAST] = vf;
        chip.registers[REG_Y] = vy;
        let opcode = 0x8F00 ^ (REG_Y as Opcode) << 4 ^ command;

        assert_eq!(Ok(Operation::None), run(chip, opcode));
        chip.registers[cpu::register::LAST]
    }

    #[test]
    /// the flag overwrites the result
    fn test_arithmetic_into_flag_register() {
        let mut chip = get_default_chip();
        // 0xFF + 0x01 = 0x00, carry
        assert_eq!(calc_into_flag(&mut chip, 0x4, 0xFF, 0x01), 1);
        // 0x10 + 0x01 = 0x11, no carry
        assert_eq!(calc_into_flag(&mut chip, 0x4, 0x10, 0x01), 0);
        // 0x01 - 0x02 = 0xFF, borrow
        assert_eq!(calc_into_flag(&mut chip, 0x5, 0x01, 0x02), 0);
        // 0x05 - 0x02 = 0x03, no borrow
        assert_eq!(calc_into_flag(&mut chip, 0x5, 0x05, 0x02), 1);
        // 0x01 - 0x02 = 0xFF, borrow
        assert_eq!(calc_into_flag(&mut chip, 0x7, 0x02, 0x01), 0);
    }

    #[test]
    /// the shifted value overwrites the flag
    fn test_shift_into_flag_register() {
        let mut chip = get_default_chip();
        assert_eq!(calc_into_flag(&mut chip, 0xE, 0x81, 0x00), 0x02);
        assert_eq!(calc_into_flag(&mut chip, 0x6, 0x06, 0x00), 0x03);
        assert_eq!(calc_into_flag(&mut chip, 0x6, 0x03, 0x00), 0x01);
    }

    #[test]
    fn test_eight_wrong_opcode() {
        let mut chip = get_default_chip();
        let curr_pc = chip.program_counter;

        for opcode in [0x8008, 0x800A, 0x800F] {
            assert_eq!(
                run(&mut chip, opcode),
                Err(ProcessError::Opcode(OpcodeError::UnknownOpcode(opcode)))
            );
        }

        assert_eq!(chip.program_counter, curr_pc);
    }
}

mod a {
    use super::*;

    #[test]
    /// `ANNN`
    fn test_set_index_register() {
        let mut chip = get_default_chip();
        assert_eq!(Ok(Operation::None), run(&mut chip, 0xA123));
        assert_eq!(chip.index_register, 0x123);
    }
}

mod b {
    use super::*;

    #[test]
    /// `BNNN`
    fn test_jump_with_offset() {
        let mut chip = get_default_chip();
        chip.registers[0x0] = 0x12;
        assert_eq!(Ok(Operation::None), run(&mut chip, 0xB300));
        assert_eq!(chip.program_counter, 0x312);
    }
}

mod c {
    use super::*;

    #[test]
    /// `CXNN`
    fn test_random_masked() {
        let mut chip = get_default_chip();
        assert_eq!(Ok(Operation::None), run(&mut chip, 0xC50F));
        assert_eq!(chip.registers[0x5], RANDOM_BYTE & 0x0F);

        assert_eq!(Ok(Operation::None), run(&mut chip, 0xC500));
        assert_eq!(chip.registers[0x5], 0);
    }
}

mod d {
    use super::*;

    /// draws the font glyph of `0` at the given position
    fn draw_zero(chip: &mut Machine, x: u8, y: u8) -> Result<Operation, ProcessError> {
        chip.registers[0x1] = x;
        chip.registers[0x2] = y;
        chip.index_register = display::fontset::LOCATION as u16;
        chip.program_counter = cpu::PROGRAM_COUNTER;
        run(chip, 0xD125)
    }

    /// the lit pixels of a rendered `0` glyph, relative to its origin
    fn zero_glyph() -> Vec<(usize, usize)> {
        let mut pixels = Vec::new();
        for (row, byte) in display::fontset::FONTSET[..5].iter().enumerate() {
            for column in 0..8 {
                if byte & (0x80 >> column) != 0 {
                    pixels.push((column, row));
                }
            }
        }
        pixels
    }

    #[test]
    /// `DXYN`
    fn test_draw_sprite() {
        let mut chip = get_default_chip();
        assert_eq!(draw_zero(&mut chip, 10, 5), Ok(Operation::Draw));
        assert!(chip.needs_redraw());
        assert_eq!(chip.registers[cpu::register::LAST], 0);

        let expected = zero_glyph();
        for x in 0..display::WIDTH {
            for y in 0..display::HEIGHT {
                let lit = x >= 10 && y >= 5 && expected.contains(&(x - 10, y - 5));
                assert_eq!(chip.display[x][y], lit, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_draw_twice_collides() {
        let mut chip = get_default_chip();
        chip.display[0][0] = true;
        let before = chip.display;

        draw_zero(&mut chip, 20, 10).unwrap();
        assert_eq!(chip.registers[cpu::register::LAST], 0);
        assert_ne!(chip.display, before);

        draw_zero(&mut chip, 20, 10).unwrap();
        assert_eq!(chip.registers[cpu::register::LAST], 1);
        assert_eq!(chip.display, before);
    }

    #[test]
    fn test_draw_wraps_around() {
        let mut chip = get_default_chip();
        // a full row of pixels
        write_slice_to_memory(&mut chip.memory, 0x300, &[0xFF, 0x81]);
        chip.index_register = 0x300;
        chip.registers[0x1] = 63;
        chip.registers[0x2] = 31;

        assert_eq!(run(&mut chip, 0xD122), Ok(Operation::Draw));

        // first row at the bottom of the screen
        assert!(chip.display[63][31]);
        for x in 0..7 {
            assert!(chip.display[x][31], "column {} has to wrap", x);
        }
        assert!(!chip.display[7][31]);
        // second row wrapped to the top
        assert!(chip.display[63][0]);
        assert!(chip.display[6][0]);
        assert!(!chip.display[0][0]);
    }

    #[test]
    fn test_draw_coordinates_wrap() {
        let mut chip = get_default_chip();
        draw_zero(&mut chip, 64 + 2, 32 + 1).unwrap();
        // top left corner of the zero glyph
        assert!(chip.display[2][1]);
    }

    #[test]
    fn test_redraw_is_cleared_on_next_step() {
        let mut chip = get_default_chip();
        draw_zero(&mut chip, 0, 0).unwrap();
        assert!(chip.needs_redraw());

        assert_eq!(run(&mut chip, 0x6000), Ok(Operation::None));
        assert!(!chip.needs_redraw());
    }
}

mod e {
    use super::*;

    #[test]
    /// `EX9E` and `EXA1`
    fn test_skip_on_key() {
        let mut chip = get_default_chip();
        chip.registers[0x3] = 0xB;

        for (pressed, skip_pressed, skip_not_pressed) in [(false, 1, 2), (true, 2, 1)] {
            chip.set_key(0xB, pressed);

            chip.program_counter = cpu::PROGRAM_COUNTER;
            assert_eq!(Ok(Operation::None), run(&mut chip, 0xE39E));
            assert_eq!(
                chip.program_counter,
                cpu::PROGRAM_COUNTER + skip_pressed * memory::opcodes::SIZE
            );

            chip.program_counter = cpu::PROGRAM_COUNTER;
            assert_eq!(Ok(Operation::None), run(&mut chip, 0xE3A1));
            assert_eq!(
                chip.program_counter,
                cpu::PROGRAM_COUNTER + skip_not_pressed * memory::opcodes::SIZE
            );
        }
    }

    #[test]
    fn test_host_key_out_of_range() {
        let mut chip = get_default_chip();
        chip.registers[0x3] = 0xB;
        chip.set_key(0x1B, true);

        assert_eq!(Ok(Operation::None), run(&mut chip, 0xE39E));
        assert_eq!(
            chip.program_counter,
            cpu::PROGRAM_COUNTER + 2 * memory::opcodes::SIZE
        );
    }

    #[test]
    fn test_skip_on_key_wrong_opcode() {
        let mut chip = get_default_chip();
        assert_eq!(
            run(&mut chip, 0xE111),
            Err(ProcessError::Opcode(OpcodeError::UnknownOpcode(0xE111)))
        );
    }
}

mod f {
    use super::*;

    #[test]
    /// `FX07`
    fn test_get_delay_timer() {
        let mut chip = get_default_chip();
        chip.delay_timer.set_value(0x10);
        assert_eq!(Ok(Operation::None), run(&mut chip, 0xF407));
        assert_eq!(chip.registers[0x4], 0x10);
        assert_eq!(chip.get_delay_timer(), 0x0F);
    }

    #[test]
    /// `FX0A`
    fn test_await_key_press() {
        let mut chip = get_default_chip();
        let mut polls = 0;
        write_opcode_to_memory(&mut chip.memory, chip.program_counter, 0xF50A);

        let res = chip.step(|keyboard: &mut Keyboard| {
            polls += 1;
            if polls == 3 {
                keyboard.set_key(0xC, true);
                keyboard.set_key(0xE, true);
            }
        });

        assert_eq!(res, Ok(Operation::None));
        assert_eq!(polls, 3);
        assert_eq!(chip.registers[0x5], 0xC);
        assert_eq!(chip.program_counter, cpu::PROGRAM_COUNTER + memory::opcodes::SIZE);
    }

    #[test]
    fn test_await_key_press_limit() {
        let mut chip = setup_chip(Config::default().with_key_wait_limit(4));
        let mut polls = 0;
        write_opcode_to_memory(&mut chip.memory, chip.program_counter, 0xF50A);

        let res = chip.step(|_: &mut Keyboard| polls += 1);
        assert_eq!(res, Err(ProcessError::KeyWaitLimit(4)));
        assert_eq!(polls, 4);
        assert_eq!(chip.program_counter, cpu::PROGRAM_COUNTER);

        // the next step picks the instruction up again
        let res = chip.step(|keyboard: &mut Keyboard| keyboard.set_key(0x1, true));
        assert_eq!(res, Ok(Operation::None));
        assert_eq!(chip.registers[0x5], 0x1);
        assert_eq!(chip.program_counter, cpu::PROGRAM_COUNTER + memory::opcodes::SIZE);
    }

    #[test]
    /// `FX15` and `FX18`
    fn test_set_timers() {
        let mut chip = get_default_chip();
        chip.registers[0x2] = 0x20;

        assert_eq!(Ok(Operation::None), run(&mut chip, 0xF215));
        // the timer counts down right after the instruction
        assert_eq!(chip.get_delay_timer(), 0x1F);
        assert!(!chip.sound_active());

        assert_eq!(Ok(Operation::None), run(&mut chip, 0xF218));
        assert_eq!(chip.get_sound_timer(), 0x1F);
        assert!(chip.sound_active());
    }

    #[test]
    /// `FX1E`
    fn test_add_vx_to_index() {
        let mut chip = get_default_chip();
        chip.index_register = 0x0FFE;
        chip.registers[0x7] = 0x05;
        chip.registers[cpu::register::LAST] = 0x0;

        assert_eq!(Ok(Operation::None), run(&mut chip, 0xF71E));
        assert_eq!(chip.index_register, 0x1003);
        assert_eq!(chip.registers[cpu::register::LAST], 0x0);
    }

    #[test]
    /// `FX29`
    fn test_sprite_location() {
        let mut chip = get_default_chip();
        for digit in 0..=0xF {
            chip.registers[0x3] = digit;
            chip.program_counter = cpu::PROGRAM_COUNTER;
            assert_eq!(Ok(Operation::None), run(&mut chip, 0xF329));
            assert_eq!(
                chip.index_register as usize,
                display::fontset::LOCATION + digit as usize * display::fontset::GLYPH_SIZE
            );
        }
    }

    #[test]
    fn test_sprite_location_invalid_digit() {
        let mut chip = get_default_chip();
        chip.registers[0x3] = 0x10;
        assert_eq!(
            run(&mut chip, 0xF329),
            Err(ProcessError::InvalidDigit(0x10))
        );
        assert_eq!(chip.program_counter, cpu::PROGRAM_COUNTER);
    }

    #[test]
    /// `FX33`
    fn test_store_bcd() {
        let mut chip = get_default_chip();
        chip.index_register = 0x300;

        for (value, digits) in [(246u8, [2u8, 4, 6]), (7, [0, 0, 7]), (90, [0, 9, 0])] {
            chip.registers[0x8] = value;
            chip.program_counter = cpu::PROGRAM_COUNTER;
            assert_eq!(Ok(Operation::None), run(&mut chip, 0xF833));
            assert_eq!(&chip.memory[0x300..0x303], &digits);
        }
    }

    #[test]
    /// `FX55`
    fn test_store_registers() {
        let mut chip = get_default_chip();
        chip.index_register = 0x300;
        for (index, register) in chip.registers.iter_mut().enumerate() {
            *register = index as u8 + 1;
        }

        assert_eq!(Ok(Operation::None), run(&mut chip, 0xF355));
        assert_eq!(&chip.memory[0x300..0x305], &[1, 2, 3, 4, 0]);
        assert_eq!(chip.index_register, 0x300);
    }

    #[test]
    /// `FX65`
    fn test_fill_registers() {
        let mut chip = get_default_chip();
        chip.index_register = 0x300;
        write_slice_to_memory(&mut chip.memory, 0x300, &[9, 8, 7, 6, 5]);

        assert_eq!(Ok(Operation::None), run(&mut chip, 0xF365));
        assert_eq!(&chip.registers[..5], &[9, 8, 7, 6, 0]);
        assert_eq!(chip.index_register, 0x300);
    }

    #[test]
    fn test_register_block_wraps_memory() {
        let mut chip = get_default_chip();
        chip.index_register = memory::LAST as u16;
        chip.registers[0x0] = 0x11;
        chip.registers[0x1] = 0x22;

        assert_eq!(Ok(Operation::None), run(&mut chip, 0xF155));
        assert_eq!(chip.memory[memory::LAST], 0x11);
        assert_eq!(chip.memory[0x000], 0x22);
    }

    #[test]
    fn test_f_wrong_opcode() {
        let mut chip = get_default_chip();
        assert_eq!(
            run(&mut chip, 0xF0AA),
            Err(ProcessError::Opcode(OpcodeError::UnknownOpcode(0xF0AA)))
        );
    }
}

mod timers {
    use super::*;

    #[test]
    fn test_delay_timer_counts_down_per_step() {
        let mut chip = get_default_chip();
        chip.delay_timer.set_value(3);
        // jump to self
        write_opcode_to_memory(&mut chip.memory, cpu::PROGRAM_COUNTER, 0x1200);

        for expected in [2, 1, 0, 0, 0] {
            chip.step(no_input).unwrap();
            assert_eq!(chip.get_delay_timer(), expected);
        }
    }

    #[test]
    fn test_sound_active_exactly_while_counting() {
        let mut chip = get_default_chip();
        chip.sound_timer.set_value(2);
        write_opcode_to_memory(&mut chip.memory, cpu::PROGRAM_COUNTER, 0x1200);

        for expected in [true, true, false] {
            chip.step(no_input).unwrap();
            assert_eq!(chip.sound_active(), expected);
        }
    }

    #[test]
    fn test_timers_untouched_on_error() {
        let mut chip = get_default_chip();
        chip.delay_timer.set_value(3);
        assert!(run(&mut chip, 0x5001).is_err());
        assert_eq!(chip.get_delay_timer(), 3);
    }

    #[test]
    fn test_external_timers() {
        let mut chip = setup_chip(Config::default().with_timers(TimerMode::External));
        chip.delay_timer.set_value(3);
        chip.sound_timer.set_value(1);
        write_opcode_to_memory(&mut chip.memory, cpu::PROGRAM_COUNTER, 0x1200);

        chip.step(no_input).unwrap();
        assert_eq!(chip.get_delay_timer(), 3);
        assert_eq!(chip.get_sound_timer(), 1);

        assert!(chip.tick_timers());
        assert!(chip.sound_active());
        assert_eq!(chip.get_delay_timer(), 2);

        // the flag survives the instruction loop
        chip.step(no_input).unwrap();
        assert!(chip.sound_active());

        assert!(!chip.tick_timers());
        assert!(!chip.sound_active());
        assert_eq!(chip.get_delay_timer(), 1);
    }
}
