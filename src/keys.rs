//! Keystrokes read from a line buffered terminal.

use std::collections::VecDeque;
use std::io;
use std::io::prelude::*;

/// A single keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Left,
    Right,
}

/// Split a line of input into keystrokes.
///
/// ANSI arrow key escapes and the `←` and `→` characters are recognized. An
/// empty line is a single newline keystroke.
pub fn parse(line: &str) -> Vec<Key> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    if line.is_empty() {
        return vec![Key::Char('\n')];
    }
    let mut keys = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        let key = match c {
            '\x1b' if chars.peek() == Some(&'[') => {
                chars.next();
                match chars.next() {
                    Some('D') => Key::Left,
                    Some('C') => Key::Right,
                    Some(c) => Key::Char(c),
                    None => Key::Char('\x1b'),
                }
            }
            '←' => Key::Left,
            '→' => Key::Right,
            c => Key::Char(c),
        };
        keys.push(key);
    }
    keys
}

/// A source of keystrokes.
#[derive(Debug)]
pub struct Keys<R> {
    r: R,
    buffered: VecDeque<Key>,
}

impl<R: BufRead> Keys<R> {
    pub fn new(r: R) -> Self {
        Self {
            r,
            buffered: VecDeque::new(),
        }
    }

    /// The next keystroke, reading another line if needed. Returns `None` at
    /// the end of the input.
    pub fn next_key(&mut self) -> io::Result<Option<Key>> {
        while self.buffered.is_empty() {
            let mut line = String::new();
            if self.r.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.buffered.extend(parse(&line));
        }
        Ok(self.buffered.pop_front())
    }
}
