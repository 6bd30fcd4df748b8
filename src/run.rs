//! Run a program to completion against a reader and a writer.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use intcode_run::{parse_program, Computer, Machine, State};

use crate::log;

pub fn basic(c: &mut Computer, mut r: impl BufRead, mut w: impl Write) -> Result<()> {
    loop {
        match c.step()? {
            (_, Some(value)) => {
                writeln!(w, "{}", value)?;
            }
            (State::Running, None) => {}
            (State::NeedsInput, None) => {
                w.flush()?;
                let mut line = String::new();
                if r.read_line(&mut line)? == 0 {
                    bail!("program wants input but there is none left");
                }
                c.feed(parse_program(&line).context("invalid input")?);
            }
            (State::Halted, None) => {
                break Ok(w.flush()?);
            }
        }
    }
}

pub fn utf8(c: &mut Computer, mut r: impl BufRead, mut w: impl Write) -> Result<()> {
    loop {
        match c.step()? {
            (_, Some(value)) => {
                let byte: u8 = value
                    .try_into()
                    .with_context(|| format!("output `{}` is not a byte", value))?;
                w.write_all(&[byte])?;
            }
            (State::Running, None) => {}
            (State::NeedsInput, None) => {
                w.flush()?;
                let mut line = String::new();
                if r.read_line(&mut line)? == 0 {
                    bail!("program wants input but there is none left");
                }
                c.feed(line.bytes().map(i64::from));
            }
            (State::Halted, None) => {
                break Ok(w.flush()?);
            }
        }
    }
}

/// Find the noun and verb that make the program leave `target` at address
/// zero, returning `100 * noun + verb`.
pub fn calibrate(program: &[i64], target: i64) -> Result<Option<i64>> {
    for noun in 0..=99 {
        for verb in 0..=99 {
            let mut c = Computer::new(program.to_vec());
            c.memory_mut().write(1, noun);
            c.memory_mut().write(2, verb);
            c.run_until_blocked()?;
            if c.state() != State::Halted {
                bail!("program wants input while calibrating");
            }
            if c.memory().read(0) == target {
                log::debug!("found noun `{}` and verb `{}`", noun, verb);
                return Ok(Some(100 * noun + verb));
            }
        }
    }
    Ok(None)
}
