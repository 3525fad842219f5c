//! Opcode abstractions, decoding and the execution contract of the chipset.
use crate::{
    definitions::memory,
    devices::Keyboard,
    OpcodeError, ProcessError,
};

/// the base mask used for generating all the other sub masks
pub(crate) const OPCODE_MASK_FFFF: u16 = u16::MAX;

/// the mask for the first twelve bits
pub(crate) const OPCODE_MASK_FFF0: u16 = OPCODE_MASK_FFFF << 4;

/// the mask for the first eight bits
pub(crate) const OPCODE_MASK_FF00: u16 = OPCODE_MASK_FFFF << 8;

/// the mask for the first four bits
pub(crate) const OPCODE_MASK_F000: u16 = OPCODE_MASK_FFFF << 12;

/// the mask for the last four bits
pub(crate) const OPCODE_MASK_000F: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FFF0;

/// the mask for the last eight bits
pub(crate) const OPCODE_MASK_00FF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FF00;

/// the mask for the last twelve bits
pub(crate) const OPCODE_MASK_0FFF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_F000;

/// the size of a single byte
const BYTE_SIZE: u16 = 0x8;

/// a wrapper type for u16 to make it clear what is meant to be used
pub type Opcode = u16;

/// will build an opcode from data and the given point
/// # Arguments
///
/// - `data` - A slice of u8 data entries used to generate the opcodes
/// - `pointer` - Where in the data the opcode shall be extracted, so `pointer` and `pointer + 1` make
/// the opcode up
///
/// # Example
/// ```rust
/// # use chip::opcode::*;
/// # use chip::OpcodeError;
///  const OPCODES: [Opcode; 2] = [0x00EE, 0x1EDA];
///  const SPLIT_OPCODE: [u8; 4] = [0x00, 0xEE, 0x1E, 0xDA];
///  for (i, val) in OPCODES.iter().enumerate() {
///      let opcode = build_opcode(&SPLIT_OPCODE, i * 2).expect("This will work.");
///      assert_eq!(opcode, *val);
///  }
/// # let pointer = 3;
/// # let err = OpcodeError::MemoryInvalid { pointer, len: SPLIT_OPCODE.len() };
/// # assert_eq!(Err(err), build_opcode(&SPLIT_OPCODE, pointer));
/// ```
pub fn build_opcode(data: &[u8], pointer: usize) -> Result<Opcode, OpcodeError> {
    // controlling that there is no illegal access here
    if pointer + 1 < data.len() {
        Ok(Opcode::from_be_bytes([data[pointer], data[pointer + 1]]))
    } else {
        Err(OpcodeError::MemoryInvalid {
            pointer,
            len: data.len(),
        })
    }
}

/// Splits an opcode into the fields used by the instruction set.
pub trait OpcodeTrait {
    /// The high nibble, selecting the instruction group
    fn t(&self) -> u8;

    /// The lowest 12 bits, an address
    fn nnn(&self) -> usize;

    /// The second nibble and the lowest byte
    fn xnn(&self) -> (usize, u8);

    /// The second, third and lowest nibble
    fn xyn(&self) -> (usize, usize, usize);

    /// The second and third nibble
    fn xy(&self) -> (usize, usize);

    /// The second nibble
    fn x(&self) -> usize;
}

impl OpcodeTrait for Opcode {
    fn t(&self) -> u8 {
        ((self & OPCODE_MASK_F000) >> (BYTE_SIZE + BYTE_SIZE / 2)) as u8
    }

    fn nnn(&self) -> usize {
        (self & OPCODE_MASK_0FFF) as usize
    }

    fn xnn(&self) -> (usize, u8) {
        let x = self.x();
        let nn = (self & OPCODE_MASK_00FF) as u8;
        (x, nn)
    }

    fn xyn(&self) -> (usize, usize, usize) {
        let (x, y) = self.xy();
        let n = (self & OPCODE_MASK_000F) as usize;
        (x, y, n)
    }

    fn xy(&self) -> (usize, usize) {
        let x = self.x();
        const MASK: u16 = OPCODE_MASK_00FF ^ OPCODE_MASK_000F;
        const NIBBLE: u16 = BYTE_SIZE / 2;
        let y = ((self & MASK) >> NIBBLE) as usize;
        (x, y)
    }

    fn x(&self) -> usize {
        ((self & OPCODE_MASK_0FFF & OPCODE_MASK_FF00) >> BYTE_SIZE) as usize
    }
}

/// How the program counter moves after an instruction was executed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProgramCounterStep {
    /// continue with the following instruction
    Next,
    /// jump over the following instruction
    Skip,
    /// continue at the given address
    Jump(usize),
}

impl ProgramCounterStep {
    #[inline]
    pub fn cond(cond: bool) -> Self {
        if cond {
            ProgramCounterStep::Skip
        } else {
            ProgramCounterStep::Next
        }
    }

    /// The amount of bytes the counter moves, or the new address for a jump
    #[inline]
    pub fn step(&self) -> usize {
        match *self {
            ProgramCounterStep::Next => memory::opcodes::SIZE,
            ProgramCounterStep::Skip => 2 * memory::opcodes::SIZE,
            ProgramCounterStep::Jump(pointer) => pointer,
        }
    }
}

macro_rules! implTryFromInner {
    ( $type_name:ty : $type_from:ty : $inner:expr) => {
        impl TryFrom<$type_from> for $type_name {
            type Error = ();

            fn try_from(value: $type_from) -> Result<Self, Self::Error> {
                $inner(value)
            }
        }
    };
}

macro_rules! implTryFromEnum {
    ($type_name:ty : $type_from:ty : $( $key:literal => $val:expr ),+ $(,)? ) => {
        implTryFromInner!(
            $type_name : $type_from :
            |value: $type_from| {
                match value {
                    $(
                        $key => Ok($val),
                    )+
                    _ => Err(()),
                }
            }
        );
    };
}

macro_rules! implTryFromXNN {
    ($type_name:ident) => {
        implTryFromInner!(
            $type_name : Opcode :
            |value: Opcode| {
                let (x, nn) = value.xnn();
                Ok($type_name { x, nn })
            }
        );
    };
}

macro_rules! implTryFromNNN {
    ($type_name:ident) => {
        implTryFromInner! {
            $type_name: Opcode :
            |value: Opcode| {
                let nnn = value.nnn();
                Ok($type_name { nnn })
            }
        }
    };
}

macro_rules! implTryFromXY0 {
    ($type_name:ident) => {
        implTryFromInner! {
            $type_name: Opcode :
            |value: Opcode| {
                match value.xyn() {
                    (x, y, 0) => Ok($type_name { x, y }),
                    _ => Err(()),
                }
            }
        }
    };
}

macro_rules! implTryFromXNNE {
    ($type_name:ident) => {
        implTryFromInner! {
            $type_name: Opcode :
            |value: Opcode| {
                let (x, nn) = value.xnn();
                let ops = TryFrom::try_from(nn)?;
                Ok($type_name { ops, x })
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum System {
    Clear,
    Return,
}

implTryFromEnum!(System : Opcode :
    // 00E0
    // clear display
    0x00E0 => System::Clear,
    // 00EE
    // Return from sub routine => pop from stack
    0x00EE => System::Return,
);

/// 1NNN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jump {
    pub nnn: usize,
}

implTryFromNNN!(Jump);

/// 2NNN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub nnn: usize,
}

implTryFromNNN!(Call);

/// 3XNN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipIfEqual {
    pub x: usize,
    pub nn: u8,
}

implTryFromXNN!(SkipIfEqual);

/// 4XNN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipIfNotEqual {
    pub x: usize,
    pub nn: u8,
}

implTryFromXNN!(SkipIfNotEqual);

/// 5XY0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipIfRegistersEqual {
    pub x: usize,
    pub y: usize,
}

implTryFromXY0!(SkipIfRegistersEqual);

/// 6XNN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Load {
    pub x: usize,
    pub nn: u8,
}

implTryFromXNN!(Load);

/// 7XNN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddConst {
    pub x: usize,
    pub nn: u8,
}

implTryFromXNN!(AddConst);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOpcode {
    Assign,
    Or,
    And,
    Xor,
    Add,
    Sub,
    ShiftRight,
    SubReverse,
    ShiftLeft,
}

implTryFromEnum!(ArithmeticOpcode : u8 :
    // 8XY0
    // Sets VX to the value of VY.
    0x0 => ArithmeticOpcode::Assign,
    // 8XY1
    // Sets VX to VX or VY.
    0x1 => ArithmeticOpcode::Or,
    // 8XY2
    // Sets VX to VX and VY.
    0x2 => ArithmeticOpcode::And,
    // 8XY3
    // Sets VX to VX xor VY.
    0x3 => ArithmeticOpcode::Xor,
    // 8XY4
    // Adds VY to VX. VF is set to 1 when there's a carry, and to 0 when there isn't.
    0x4 => ArithmeticOpcode::Add,
    // 8XY5
    // VY is subtracted from VX. VF is set to 0 when there's a borrow, and 1 when there
    // isn't.
    0x5 => ArithmeticOpcode::Sub,
    // 8XY6
    // Stores the least significant bit in VF and then shifts VX to the right by 1.
    0x6 => ArithmeticOpcode::ShiftRight,
    // 8XY7
    // Sets VX to VY minus VX. VF is set to 0 when there's a borrow, and 1 when there
    // isn't.
    0x7 => ArithmeticOpcode::SubReverse,
    // 8XYE
    // Stores the most significant bit in VF and then shifts VX to the left by 1.
    0xE => ArithmeticOpcode::ShiftLeft,
);

/// 8XYN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arithmetic {
    pub ops: ArithmeticOpcode,
    pub x: usize,
    pub y: usize,
}

implTryFromInner! {
    Arithmetic: Opcode :
    |value: Opcode| {
        let (x, y, n) = value.xyn();
        let ops = ArithmeticOpcode::try_from(n as u8)?;
        Ok(Arithmetic { ops, x, y })
    }
}

/// 9XY0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipIfRegistersNotEqual {
    pub x: usize,
    pub y: usize,
}

implTryFromXY0!(SkipIfRegistersNotEqual);

/// ANNN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadIndex {
    pub nnn: usize,
}

implTryFromNNN!(LoadIndex);

/// BNNN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpOffset {
    pub nnn: usize,
}

implTryFromNNN!(JumpOffset);

/// CXNN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Random {
    pub x: usize,
    pub nn: u8,
}

implTryFromXNN!(Random);

/// DXYN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw {
    pub x: usize,
    pub y: usize,
    pub n: usize,
}

implTryFromInner! {
    Draw: Opcode :
    |value: Opcode| {
        let (x, y, n) = value.xyn();
        Ok(Draw { x, y, n })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOpcode {
    Pressed,
    NotPressed,
}

implTryFromEnum!(KeyOpcode : u8 :
    // EX9E
    // Skips the next instruction if the key stored in VX is pressed.
    0x9E => KeyOpcode::Pressed,
    // EXA1
    // Skips the next instruction if the key stored in VX isn't pressed.
    0xA1 => KeyOpcode::NotPressed,
);

/// EXNN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub ops: KeyOpcode,
    pub x: usize,
}

implTryFromXNNE!(Key);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiscOpcode {
    GetDelayTimer,
    AwaitKeyPress,
    SetDelayTimer,
    SetSoundTimer,
    AddVxToI,
    SetIToSprite,
    StoreBCD,
    StoreV0ToVx,
    FillV0ToVx,
}

implTryFromEnum!(MiscOpcode : u8 :
    // FX07
    // Sets VX to the value of the delay timer.
    0x07 => MiscOpcode::GetDelayTimer,
    // FX0A
    // A key press is awaited, and then stored in VX.
    0x0A => MiscOpcode::AwaitKeyPress,
    // FX15
    // Sets the delay timer to VX.
    0x15 => MiscOpcode::SetDelayTimer,
    // FX18
    // Sets the sound timer to VX.
    0x18 => MiscOpcode::SetSoundTimer,
    // FX1E
    // Adds VX to I. VF is not affected.
    0x1E => MiscOpcode::AddVxToI,
    // FX29
    // Sets I to the location of the sprite for the character in VX.
    0x29 => MiscOpcode::SetIToSprite,
    // FX33
    // Stores the binary-coded decimal representation of VX at I, I+1 and I+2.
    0x33 => MiscOpcode::StoreBCD,
    // FX55
    // Stores V0 to VX (including VX) in memory starting at address I.
    0x55 => MiscOpcode::StoreV0ToVx,
    // FX65
    // Fills V0 to VX (including VX) with values from memory starting at address I.
    0x65 => MiscOpcode::FillV0ToVx,
);

/// FXNN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Misc {
    pub ops: MiscOpcode,
    pub x: usize,
}

implTryFromXNNE!(Misc);

/// A fully decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    System(System),
    Jump(Jump),
    Call(Call),
    SkipIfEqual(SkipIfEqual),
    SkipIfNotEqual(SkipIfNotEqual),
    SkipIfRegistersEqual(SkipIfRegistersEqual),
    Load(Load),
    AddConst(AddConst),
    Arithmetic(Arithmetic),
    SkipIfRegistersNotEqual(SkipIfRegistersNotEqual),
    LoadIndex(LoadIndex),
    JumpOffset(JumpOffset),
    Random(Random),
    Draw(Draw),
    Key(Key),
    Misc(Misc),
}

impl TryFrom<Opcode> for Instruction {
    type Error = OpcodeError;

    fn try_from(value: Opcode) -> Result<Self, Self::Error> {
        let decoded = match value.t() {
            0x0 => System::try_from(value).map(Instruction::System),
            0x1 => Jump::try_from(value).map(Instruction::Jump),
            0x2 => Call::try_from(value).map(Instruction::Call),
            0x3 => SkipIfEqual::try_from(value).map(Instruction::SkipIfEqual),
            0x4 => SkipIfNotEqual::try_from(value).map(Instruction::SkipIfNotEqual),
            0x5 => SkipIfRegistersEqual::try_from(value).map(Instruction::SkipIfRegistersEqual),
            0x6 => Load::try_from(value).map(Instruction::Load),
            0x7 => AddConst::try_from(value).map(Instruction::AddConst),
            0x8 => Arithmetic::try_from(value).map(Instruction::Arithmetic),
            0x9 => {
                SkipIfRegistersNotEqual::try_from(value).map(Instruction::SkipIfRegistersNotEqual)
            }
            0xA => LoadIndex::try_from(value).map(Instruction::LoadIndex),
            0xB => JumpOffset::try_from(value).map(Instruction::JumpOffset),
            0xC => Random::try_from(value).map(Instruction::Random),
            0xD => Draw::try_from(value).map(Instruction::Draw),
            0xE => Key::try_from(value).map(Instruction::Key),
            0xF => Misc::try_from(value).map(Instruction::Misc),
            _ => Err(()),
        };
        decoded.map_err(|_| OpcodeError::UnknownOpcode(value))
    }
}

pub trait ProgramCounter {
    fn advance(&mut self, step: ProgramCounterStep);
}

/// What the host has to do after an instruction ran.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Operation {
    None,
    Draw,
}

/// The hook invoked while the machine waits for a key press (`FX0A`).
pub type InputHook<'a> = dyn FnMut(&mut Keyboard) + 'a;

pub trait ChipOpcodes: ProgramCounter {
    /// Executes the instruction and moves the program counter accordingly. On error the program
    /// counter stays where it is.
    fn calc(
        &mut self,
        instruction: &Instruction,
        wait_for_input: &mut InputHook<'_>,
    ) -> Result<Operation, ProcessError> {
        let mut operation = Operation::None;
        let step_op = |(step, op)| {
            operation = op;
            step
        };

        let step = match instruction {
            Instruction::System(opcode) => self.system(opcode).map(step_op),
            Instruction::Jump(opcode) => self.jump(opcode),
            Instruction::Call(opcode) => self.call(opcode),
            Instruction::SkipIfEqual(opcode) => self.skip_if_equal(opcode),
            Instruction::SkipIfNotEqual(opcode) => self.skip_if_not_equal(opcode),
            Instruction::SkipIfRegistersEqual(opcode) => self.skip_if_registers_equal(opcode),
            Instruction::Load(opcode) => self.load(opcode),
            Instruction::AddConst(opcode) => self.add_const(opcode),
            Instruction::Arithmetic(opcode) => self.arithmetic(opcode),
            Instruction::SkipIfRegistersNotEqual(opcode) => {
                self.skip_if_registers_not_equal(opcode)
            }
            Instruction::LoadIndex(opcode) => self.load_index(opcode),
            Instruction::JumpOffset(opcode) => self.jump_offset(opcode),
            Instruction::Random(opcode) => self.random(opcode),
            Instruction::Draw(opcode) => self.draw(opcode).map(step_op),
            Instruction::Key(opcode) => self.key(opcode),
            Instruction::Misc(opcode) => self.misc(opcode, wait_for_input),
        }?;

        self.advance(step);
        Ok(operation)
    }

    fn system(&mut self, opcode: &System) -> Result<(ProgramCounterStep, Operation), ProcessError>;

    fn jump(&self, opcode: &Jump) -> Result<ProgramCounterStep, ProcessError>;

    fn call(&mut self, opcode: &Call) -> Result<ProgramCounterStep, ProcessError>;

    fn skip_if_equal(&self, opcode: &SkipIfEqual) -> Result<ProgramCounterStep, ProcessError>;

    fn skip_if_not_equal(&self, opcode: &SkipIfNotEqual)
        -> Result<ProgramCounterStep, ProcessError>;

    fn skip_if_registers_equal(
        &self,
        opcode: &SkipIfRegistersEqual,
    ) -> Result<ProgramCounterStep, ProcessError>;

    fn load(&mut self, opcode: &Load) -> Result<ProgramCounterStep, ProcessError>;

    fn add_const(&mut self, opcode: &AddConst) -> Result<ProgramCounterStep, ProcessError>;

    fn arithmetic(&mut self, opcode: &Arithmetic) -> Result<ProgramCounterStep, ProcessError>;

    fn skip_if_registers_not_equal(
        &self,
        opcode: &SkipIfRegistersNotEqual,
    ) -> Result<ProgramCounterStep, ProcessError>;

    fn load_index(&mut self, opcode: &LoadIndex) -> Result<ProgramCounterStep, ProcessError>;

    fn jump_offset(&self, opcode: &JumpOffset) -> Result<ProgramCounterStep, ProcessError>;

    fn random(&mut self, opcode: &Random) -> Result<ProgramCounterStep, ProcessError>;

    fn draw(&mut self, opcode: &Draw) -> Result<(ProgramCounterStep, Operation), ProcessError>;

    fn key(&self, opcode: &Key) -> Result<ProgramCounterStep, ProcessError>;

    fn misc(
        &mut self,
        opcode: &Misc,
        wait_for_input: &mut InputHook<'_>,
    ) -> Result<ProgramCounterStep, ProcessError>;
}
