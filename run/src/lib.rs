//! An Intcode computer.
//!
//! The [`Computer`] executes one instruction per [`Machine::step`] and suspends
//! whenever it wants input that hasn't been fed to it yet.

mod decode;
mod mem;

use std::collections::VecDeque;
use std::num::ParseIntError;
use std::result;

use log::{debug, trace};
use thiserror::Error;

pub use crate::decode::{Mode, Opcode};
pub use crate::mem::Memory;
use crate::mem::cast;

pub type Result<T> = result::Result<T, Error>;

/// A fatal execution fault.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown opcode `{}`", .opcode)]
    UnknownOpcode { opcode: i64 },
    #[error("unknown mode `{}`", .mode)]
    UnknownMode { mode: i64 },
    #[error("negative address `{}`", .addr)]
    NegativeAddress { addr: i64 },
    #[error("integer overflow in instruction at `{}`", .ptr)]
    Overflow { ptr: usize },
}

/// The state of the computer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// The next instruction can be executed.
    Running,
    /// Waiting for input, the input instruction has not been consumed.
    NeedsInput,
    /// Program execution has finished.
    Halted,
}

/// The operations a host uses to drive an Intcode machine.
pub trait Machine {
    /// Reset the machine and load a new program at address zero.
    fn load(&mut self, program: Vec<i64>);

    /// Append values to the input queue.
    fn feed<I: IntoIterator<Item = i64>>(&mut self, input: I);

    /// Execute a single instruction.
    ///
    /// Returns the new state and the output value if the instruction was an
    /// output instruction. If the machine isn't running this does nothing.
    fn step(&mut self) -> Result<(State, Option<i64>)>;

    /// The current state.
    fn state(&self) -> State;

    /// Step until the machine halts or needs input, collecting all outputs.
    fn run_until_blocked(&mut self) -> Result<Vec<i64>> {
        let mut outputs = Vec::new();
        loop {
            let (state, output) = self.step()?;
            outputs.extend(output);
            if state != State::Running {
                break Ok(outputs);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Computer {
    mem: Memory,
    ptr: usize,
    relative_base: i64,
    input: VecDeque<i64>,
    state: State,
}

/// Parse a comma separated Intcode program.
pub fn parse_program(input: &str) -> result::Result<Vec<i64>, ParseIntError> {
    input.trim().split(',').map(|s| s.trim().parse()).collect()
}

impl Computer {
    pub fn new(program: Vec<i64>) -> Self {
        Self::restore(program, 0, 0, Vec::new())
    }

    /// Construct a computer from previously saved parts.
    pub fn restore(mem: Vec<i64>, ptr: usize, relative_base: i64, input: Vec<i64>) -> Self {
        Self {
            mem: Memory::new(mem),
            ptr,
            relative_base,
            input: input.into(),
            state: State::Running,
        }
    }

    /// The instruction pointer.
    pub fn ip(&self) -> usize {
        self.ptr
    }

    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    /// Input that has been fed but not yet consumed, oldest first.
    pub fn pending_input(&self) -> impl Iterator<Item = i64> + '_ {
        self.input.iter().copied()
    }

    fn param_addr(&self, i: usize) -> Result<usize> {
        let word = self.mem.read(self.ptr);
        let ptr = self.ptr + i;
        match decode::mode(word, i)? {
            Mode::Positional => cast(self.mem.read(ptr)),
            Mode::Immediate => Ok(ptr),
            Mode::Relative => {
                let addr = self
                    .relative_base
                    .checked_add(self.mem.read(ptr))
                    .ok_or(Error::Overflow { ptr: self.ptr })?;
                cast(addr)
            }
        }
    }

    fn param(&self, i: usize) -> Result<i64> {
        self.param_addr(i).map(|addr| self.mem.read(addr))
    }

    fn set_param(&mut self, i: usize, value: i64) -> Result<()> {
        let addr = self.param_addr(i)?;
        self.mem.write(addr, value);
        Ok(())
    }

    fn overflow(&self) -> Error {
        Error::Overflow { ptr: self.ptr }
    }

    fn transition(&mut self, state: State) {
        if self.state != state {
            debug!("computer at `{}` is now {:?}", self.ptr, state);
            self.state = state;
        }
    }
}

impl Machine for Computer {
    fn load(&mut self, program: Vec<i64>) {
        *self = Self::new(program);
    }

    fn feed<I: IntoIterator<Item = i64>>(&mut self, input: I) {
        self.input.extend(input);
        if self.state == State::NeedsInput && !self.input.is_empty() {
            self.transition(State::Running);
        }
    }

    fn step(&mut self) -> Result<(State, Option<i64>)> {
        if self.state != State::Running {
            return Ok((self.state, None));
        }

        let word = self.mem.read(self.ptr);
        let opcode = decode::opcode(word)?;
        trace!("{:>6}: {:?} ({})", self.ptr, opcode, word);

        let mut output = None;
        match opcode {
            Opcode::Add => {
                let value = self
                    .param(1)?
                    .checked_add(self.param(2)?)
                    .ok_or_else(|| self.overflow())?;
                self.set_param(3, value)?;
                self.ptr += 4;
            }
            Opcode::Multiply => {
                let value = self
                    .param(1)?
                    .checked_mul(self.param(2)?)
                    .ok_or_else(|| self.overflow())?;
                self.set_param(3, value)?;
                self.ptr += 4;
            }
            Opcode::Input => {
                let addr = self.param_addr(1)?;
                match self.input.pop_front() {
                    Some(value) => {
                        self.mem.write(addr, value);
                        self.ptr += 2;
                    }
                    None => self.transition(State::NeedsInput),
                }
            }
            Opcode::Output => {
                output = Some(self.param(1)?);
                self.ptr += 2;
            }
            Opcode::JumpNonZero => {
                if self.param(1)? != 0 {
                    self.ptr = cast(self.param(2)?)?;
                } else {
                    self.ptr += 3;
                }
            }
            Opcode::JumpZero => {
                if self.param(1)? == 0 {
                    self.ptr = cast(self.param(2)?)?;
                } else {
                    self.ptr += 3;
                }
            }
            Opcode::LessThan => {
                let value = (self.param(1)? < self.param(2)?) as i64;
                self.set_param(3, value)?;
                self.ptr += 4;
            }
            Opcode::Equal => {
                let value = (self.param(1)? == self.param(2)?) as i64;
                self.set_param(3, value)?;
                self.ptr += 4;
            }
            Opcode::AdjustRelativeBase => {
                self.relative_base = self
                    .relative_base
                    .checked_add(self.param(1)?)
                    .ok_or_else(|| self.overflow())?;
                self.ptr += 2;
            }
            Opcode::Halt => {
                self.transition(State::Halted);
            }
        }
        Ok((self.state, output))
    }

    fn state(&self) -> State {
        self.state
    }
}
