use core::convert::TryFrom;

use crate::error::Error;

/// A raw 16-bit instruction split into its fields
///
/// ```
/// use ember8::opcode::Instruction;
///
/// let ins = Instruction::decode(0xABCD);
/// assert_eq!((ins.op, ins.x, ins.y, ins.n), (0xA, 0xB, 0xC, 0xD));
/// assert_eq!((ins.nn, ins.nnn), (0xCD, 0xBCD));
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Instruction {
    pub raw: u16,
    /// bits 15..12
    pub op: u8,
    /// bits 11..8
    pub x: u8,
    /// bits 7..4
    pub y: u8,
    /// bits 3..0
    pub n: u8,
    /// bits 7..0
    pub nn: u8,
    /// bits 11..0
    pub nnn: u16,
}

impl Instruction {
    pub fn decode(raw: u16) -> Self {
        Self {
            raw,
            op: (raw >> 12 & 0x000Fu16) as u8,
            x: (raw >> 8 & 0x000Fu16) as u8,
            y: (raw >> 4 & 0x000Fu16) as u8,
            n: (raw & 0x000Fu16) as u8,
            nn: (raw & 0x00FFu16) as u8,
            nnn: raw & 0x0FFFu16,
        }
    }
}

/// An enum representing the 35 opcodes of chip-8 architecture
///
/// Examples:
/// ```
/// use core::convert::TryFrom;
/// use ember8::opcode::OpCode;
///
/// assert_eq!(OpCode::try_from(0x8AB4u16), Ok(OpCode::_8XY4 { x: 0xA, y: 0xB }));
/// assert!(OpCode::try_from(0x0ABCu16).is_err());
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OpCode {
    /// Clear the screen
    _00E0,
    /// Return from a subroutine
    _00EE,
    /// Jump to address NNN
    _1NNN { nnn: u16 },
    /// Execute subroutine starting at address NNN
    _2NNN { nnn: u16 },
    /// Skip the following instruction if the value of register VX equals NN
    _3XNN { x: u8, nn: u8 },
    /// Skip the following instruction if the value of register VX is not equal to NN
    _4XNN { x: u8, nn: u8 },
    /// Skip the following instruction if the value of register VX is equal to the value of register VY
    _5XY0 { x: u8, y: u8 },
    /// Store number NN in register VX
    _6XNN { x: u8, nn: u8 },
    /// Add the value NN to register VX
    _7XNN { x: u8, nn: u8 },
    /// Store the value of register VY in register VX
    _8XY0 { x: u8, y: u8 },
    /// Set VX to VX OR VY
    _8XY1 { x: u8, y: u8 },
    /// Set VX to VX AND VY
    _8XY2 { x: u8, y: u8 },
    /// Set VX to VX XOR VY
    _8XY3 { x: u8, y: u8 },
    /// Add the value of register VY to register VX, Set VF to 01 if a carry occurs, Set VF to 00 if a carry does not occur
    _8XY4 { x: u8, y: u8 },
    /// Subtract the value of register VY from register VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    _8XY5 { x: u8, y: u8 },
    /// Shift VX right one bit, Set register VF to the least significant bit prior to the shift
    _8XY6 { x: u8, y: u8 },
    /// Set register VX to the value of VY minus VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    _8XY7 { x: u8, y: u8 },
    /// Shift VX left one bit, Set register VF to the most significant bit prior to the shift
    _8XYE { x: u8, y: u8 },
    /// Skip the following instruction if the value of register VX is not equal to the value of register VY
    _9XY0 { x: u8, y: u8 },
    /// Store memory address NNN in register I
    _ANNN { nnn: u16 },
    /// Jump to address NNN + V0
    _BNNN { nnn: u16 },
    /// Set VX to a random number with a mask of NN
    _CXNN { x: u8, nn: u8 },
    /// Draw a sprite at position VX, VY with N bytes of sprite data starting at the address stored in I, Set VF to 01 if any set pixels are changed to unset, and 00 otherwise
    _DXYN { x: u8, y: u8, n: u8 },
    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is pressed
    _EX9E { x: u8 },
    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is not pressed
    _EXA1 { x: u8 },
    /// Store the current value of the delay timer in register VX
    _FX07 { x: u8 },
    /// Wait for a keypress and store the result in register VX
    _FX0A { x: u8 },
    /// Set the delay timer to the value of register VX
    _FX15 { x: u8 },
    /// Set the sound timer to the value of register VX
    _FX18 { x: u8 },
    /// Add the value stored in register VX to register I, Set VF to 01 if the result leaves the address space
    _FX1E { x: u8 },
    /// Set I to the memory address of the sprite data corresponding to the hexadecimal digit stored in register VX
    _FX29 { x: u8 },
    /// Store the binary-coded decimal equivalent of the value stored in register VX at addresses I, I+1, and I+2
    _FX33 { x: u8 },
    /// Store the values of registers V0 to VX inclusive in memory starting at address I
    _FX55 { x: u8 },
    /// Fill registers V0 to VX inclusive with the values stored in memory starting at address I
    _FX65 { x: u8 },
}

impl TryFrom<Instruction> for OpCode {
    type Error = Error;

    fn try_from(ins: Instruction) -> Result<Self, Self::Error> {
        let Instruction { x, y, n, nn, nnn, .. } = ins;
        let opcode = match (ins.op, n) {
            (0x0, _) => match nn {
                0xE0 => OpCode::_00E0,
                0xEE => OpCode::_00EE,
                _ => return Err(Error::UnknownInstruction(ins.raw)),
            },
            (0x1, _) => OpCode::_1NNN { nnn },
            (0x2, _) => OpCode::_2NNN { nnn },
            (0x3, _) => OpCode::_3XNN { x, nn },
            (0x4, _) => OpCode::_4XNN { x, nn },
            (0x5, 0x0) => OpCode::_5XY0 { x, y },
            (0x6, _) => OpCode::_6XNN { x, nn },
            (0x7, _) => OpCode::_7XNN { x, nn },
            (0x8, 0x0) => OpCode::_8XY0 { x, y },
            (0x8, 0x1) => OpCode::_8XY1 { x, y },
            (0x8, 0x2) => OpCode::_8XY2 { x, y },
            (0x8, 0x3) => OpCode::_8XY3 { x, y },
            (0x8, 0x4) => OpCode::_8XY4 { x, y },
            (0x8, 0x5) => OpCode::_8XY5 { x, y },
            (0x8, 0x6) => OpCode::_8XY6 { x, y },
            (0x8, 0x7) => OpCode::_8XY7 { x, y },
            (0x8, 0xE) => OpCode::_8XYE { x, y },
            (0x9, 0x0) => OpCode::_9XY0 { x, y },
            (0xA, _) => OpCode::_ANNN { nnn },
            (0xB, _) => OpCode::_BNNN { nnn },
            (0xC, _) => OpCode::_CXNN { x, nn },
            (0xD, _) => OpCode::_DXYN { x, y, n },
            (0xE, _) => match nn {
                0x9E => OpCode::_EX9E { x },
                0xA1 => OpCode::_EXA1 { x },
                _ => return Err(Error::UnknownInstruction(ins.raw)),
            },
            (0xF, _) => match nn {
                0x07 => OpCode::_FX07 { x },
                0x0A => OpCode::_FX0A { x },
                0x15 => OpCode::_FX15 { x },
                0x18 => OpCode::_FX18 { x },
                0x1E => OpCode::_FX1E { x },
                0x29 => OpCode::_FX29 { x },
                0x33 => OpCode::_FX33 { x },
                0x55 => OpCode::_FX55 { x },
                0x65 => OpCode::_FX65 { x },
                _ => return Err(Error::UnknownInstruction(ins.raw)),
            },
            _ => return Err(Error::UnknownInstruction(ins.raw)),
        };
        Ok(opcode)
    }
}

impl TryFrom<u16> for OpCode {
    type Error = Error;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        OpCode::try_from(Instruction::decode(raw))
    }
}
