//! Decoding of instruction words.

use crate::{Error, Result};

/// An instruction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Add,
    Multiply,
    Input,
    Output,
    JumpNonZero,
    JumpZero,
    LessThan,
    Equal,
    AdjustRelativeBase,
    Halt,
}

/// A parameter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Positional,
    Immediate,
    Relative,
}

impl Opcode {
    pub fn from_value(v: i64) -> Result<Self> {
        Ok(match v {
            1 => Self::Add,
            2 => Self::Multiply,
            3 => Self::Input,
            4 => Self::Output,
            5 => Self::JumpNonZero,
            6 => Self::JumpZero,
            7 => Self::LessThan,
            8 => Self::Equal,
            9 => Self::AdjustRelativeBase,
            99 => Self::Halt,
            opcode => return Err(Error::UnknownOpcode { opcode }),
        })
    }
}

impl Mode {
    pub fn from_value(v: i64) -> Result<Self> {
        Ok(match v {
            0 => Self::Positional,
            1 => Self::Immediate,
            2 => Self::Relative,
            mode => return Err(Error::UnknownMode { mode }),
        })
    }
}

/// Splits an instruction word into its opcode.
pub fn opcode(word: i64) -> Result<Opcode> {
    Opcode::from_value(word % 100)
}

/// Returns the mode of the `i`th parameter (one-based) of an instruction word.
pub fn mode(word: i64, i: usize) -> Result<Mode> {
    let divs = [100, 1_000, 10_000];
    Mode::from_value(word / divs[i - 1] % 10)
}
