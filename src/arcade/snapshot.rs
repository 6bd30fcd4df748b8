//! Save and restore a cabinet as six lines of text.
//!
//! 1. instruction pointer
//! 2. memory dump
//! 3. relative base
//! 4. pending joystick input, oldest first
//! 5. screen tiles, row-major
//! 6. score

use std::io::prelude::*;
use std::str::FromStr;

use intcode_run::{parse_program, Computer};

use crate::arcade::{Cabinet, Error, Result, Screen, Tile, COLS, ROWS};
use crate::log;

const LINES: usize = 6;

fn join(values: impl Iterator<Item = i64>) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}

fn invalid(line: usize, msg: impl Into<String>) -> Error {
    Error::Snapshot {
        line,
        msg: msg.into(),
    }
}

fn number<T: FromStr>(lines: &[String], line: usize) -> Result<T> {
    let text = lines[line - 1].trim();
    text.parse()
        .map_err(|_| invalid(line, format!("expected a number, found `{}`", text)))
}

fn list(lines: &[String], line: usize) -> Result<Vec<i64>> {
    let text = lines[line - 1].trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    parse_program(text).map_err(|err| invalid(line, err.to_string()))
}

impl Cabinet {
    /// Write the complete state of the cabinet.
    pub fn save(&self, mut w: impl Write) -> Result<()> {
        if !self.pending.is_empty() {
            log::warn!("discarding {} undrawn output values", self.pending.len());
        }
        let c = self.computer();
        if let Some((addr, _)) = c.memory().far().next() {
            return Err(Error::FarMemory { addr });
        }
        writeln!(w, "{}", c.ip())?;
        writeln!(w, "{}", join(c.memory().dump().iter().copied()))?;
        writeln!(w, "{}", c.relative_base())?;
        writeln!(w, "{}", join(c.pending_input()))?;
        writeln!(w, "{}", join(self.screen().tiles().iter().map(|t| t.value())))?;
        writeln!(w, "{}", self.score())?;
        Ok(())
    }

    /// Read a cabinet written by [`Cabinet::save`].
    pub fn load(r: impl BufRead) -> Result<Self> {
        let mut lines = r.lines().collect::<std::io::Result<Vec<_>>>()?;
        while lines.len() > LINES && lines.last().map_or(false, |l| l.trim().is_empty()) {
            lines.pop();
        }
        if lines.len() < LINES {
            return Err(invalid(lines.len() + 1, "unexpected end of snapshot"));
        }
        if lines.len() > LINES {
            return Err(invalid(LINES + 1, "unexpected trailing data"));
        }

        let ptr = number(&lines, 1)?;
        let mem = list(&lines, 2)?;
        if mem.is_empty() {
            return Err(invalid(2, "memory is empty"));
        }
        let relative_base = number(&lines, 3)?;
        let input = list(&lines, 4)?;
        let tiles = list(&lines, 5)?
            .into_iter()
            .map(Tile::from_value)
            .collect::<Result<Vec<_>>>()
            .map_err(|err| invalid(5, err.to_string()))?;
        let len = tiles.len();
        let screen = Screen::from_tiles(tiles).ok_or_else(|| {
            invalid(5, format!("expected {} tiles, found {}", ROWS * COLS, len))
        })?;
        let score = number(&lines, 6)?;

        let computer = Computer::restore(mem, ptr, relative_base, input);
        Ok(Self::from_parts(computer, screen, score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use intcode_run::{Machine, State};
    use pretty_assertions::assert_eq;

    fn saved(c: &Cabinet) -> String {
        let mut w = Vec::new();
        c.save(&mut w).unwrap();
        String::from_utf8(w).unwrap()
    }

    fn playing() -> Cabinet {
        // Draw a paddle and a score, then read the joystick into the score.
        let intcode = "104,1,104,2,104,3,104,-1,104,0,104,42,3,50,104,-1,104,0,4,50,99";
        let mut c = Cabinet::new(parse_program(intcode).unwrap());
        assert_eq!(c.update().unwrap(), State::NeedsInput);
        c
    }

    #[test]
    fn save_format() {
        let mut c = playing();
        c.joystick(-1);
        let text = saved(&c);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "12");
        assert_eq!(
            lines[1],
            "104,1,104,2,104,3,104,-1,104,0,104,42,3,50,104,-1,104,0,4,50,99"
        );
        assert_eq!(lines[2], "0");
        assert_eq!(lines[3], "-1");
        assert_eq!(lines[4].split(',').count(), ROWS * COLS);
        assert_eq!(lines[5], "42");
    }

    #[test]
    fn round_trip() {
        let mut c = playing();
        c.joystick(1);
        let mut restored = Cabinet::load(saved(&c).as_bytes()).unwrap();

        assert_eq!(restored.computer().ip(), c.computer().ip());
        assert_eq!(restored.computer().memory(), c.computer().memory());
        assert_eq!(
            restored.computer().relative_base(),
            c.computer().relative_base()
        );
        assert_eq!(
            restored.computer().pending_input().collect::<Vec<_>>(),
            vec![1]
        );
        assert_eq!(restored.screen(), c.screen());
        assert_eq!(restored.screen().get(2, 1), Tile::Paddle);
        assert_eq!(restored.score(), 42);
        assert_eq!(saved(&restored), saved(&c));

        // The restored game carries on from where it was saved.
        assert_eq!(restored.update().unwrap(), State::Halted);
        assert_eq!(restored.score(), 1);
        assert_eq!(restored.computer().state(), State::Halted);
    }

    #[test]
    fn round_trip_without_input() {
        let c = playing();
        let text = saved(&c);
        assert_eq!(text.lines().nth(3), Some(""));
        let restored = Cabinet::load(text.as_bytes()).unwrap();
        assert_eq!(restored.computer().pending_input().count(), 0);
    }

    #[test]
    fn far_memory_is_not_saved() {
        let mut c = playing();
        c.computer.memory_mut().write(1 << 62, 1);
        let mut w = Vec::new();
        assert!(matches!(
            c.save(&mut w),
            Err(Error::FarMemory { addr }) if addr == 1 << 62
        ));
        assert!(w.is_empty());
    }

    #[track_caller]
    fn assert_invalid(text: &str, line: usize) {
        match Cabinet::load(text.as_bytes()) {
            Err(Error::Snapshot { line: l, .. }) => assert_eq!(l, line),
            r => panic!("expected a snapshot error, got {:?}", r.map(|_| ())),
        }
    }

    #[test]
    fn malformed() {
        let good = saved(&playing());
        let lines: Vec<_> = good.lines().collect();

        assert_invalid("", 1);
        assert_invalid(&lines[..5].join("\n"), 6);
        assert_invalid(&format!("{}\n7\n", good.trim_end()), 7);

        let mut bad = lines.clone();
        bad[0] = "twelve";
        assert_invalid(&bad.join("\n"), 1);

        let mut bad = lines.clone();
        bad[1] = "";
        assert_invalid(&bad.join("\n"), 2);

        let mut bad = lines.clone();
        let short = lines[4].splitn(2, ',').nth(1).unwrap();
        bad[4] = short;
        assert_invalid(&bad.join("\n"), 5);

        let unknown = lines[4].replacen('0', "7", 1);
        let mut bad = lines.clone();
        bad[4] = unknown.as_str();
        assert_invalid(&bad.join("\n"), 5);

        let mut bad = lines;
        bad[5] = "";
        assert_invalid(&bad.join("\n"), 6);
    }

    #[test]
    fn trailing_blank_lines() {
        let text = format!("{}\n\n\n", saved(&playing()));
        assert!(Cabinet::load(text.as_bytes()).is_ok());
    }
}
