//! An arcade cabinet running an Intcode game.
//!
//! The game draws by emitting `(x, y, tile)` triples and reads the joystick
//! whenever it needs input. A triple with `x == -1` updates the score instead.

mod snapshot;

use std::fmt;
use std::io;
use std::io::prelude::*;

use intcode_run::{Computer, Machine, State};
use thiserror::Error;

use crate::keys::{Key, Keys};
use crate::log;

pub type Result<T> = std::result::Result<T, Error>;

/// The number of rows on the screen.
pub const ROWS: usize = 26;

/// The number of columns on the screen.
pub const COLS: usize = 40;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Computer(#[from] intcode_run::Error),
    #[error("unknown tile `{}`", .value)]
    UnknownTile { value: i64 },
    #[error("cell at x `{}` y `{}` is outside of the screen", .x, .y)]
    OutOfBounds { x: i64, y: i64 },
    #[error("cannot save memory written at address `{}`", .addr)]
    FarMemory { addr: usize },
    #[error("invalid snapshot on line {}: {}", .line, .msg)]
    Snapshot { line: usize, msg: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A tile on the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Empty,
    Wall,
    Block,
    Paddle,
    Ball,
}

/// The fixed size screen of the cabinet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    tiles: Vec<Tile>,
}

/// Why the game loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The program halted.
    GameOver { score: i64 },
    /// The player pressed the quit key or ran out of keys.
    Quit,
}

/// What a keystroke means to the cabinet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move the joystick.
    Tilt(i64),
    /// Save the game and stop playing.
    Quit,
}

#[derive(Debug, Clone)]
pub struct Cabinet {
    computer: Computer,
    screen: Screen,
    score: i64,
    /// Output values that don't form a complete triple yet.
    pending: Vec<i64>,
}

impl From<Key> for Command {
    fn from(key: Key) -> Self {
        match key {
            Key::Char('q') => Self::Quit,
            Key::Char('a') | Key::Char('j') | Key::Left => Self::Tilt(-1),
            Key::Char('d') | Key::Char('l') | Key::Right => Self::Tilt(1),
            _ => Self::Tilt(0),
        }
    }
}

impl Tile {
    pub fn from_value(value: i64) -> Result<Self> {
        Ok(match value {
            0 => Self::Empty,
            1 => Self::Wall,
            2 => Self::Block,
            3 => Self::Paddle,
            4 => Self::Ball,
            value => return Err(Error::UnknownTile { value }),
        })
    }

    pub fn value(self) -> i64 {
        match self {
            Self::Empty => 0,
            Self::Wall => 1,
            Self::Block => 2,
            Self::Paddle => 3,
            Self::Ball => 4,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Empty => "  ",
            Self::Wall => "==",
            Self::Block => "[]",
            Self::Paddle => "--",
            Self::Ball => "()",
        }
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            tiles: vec![Tile::Empty; ROWS * COLS],
        }
    }
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a screen from row-major tiles.
    pub(crate) fn from_tiles(tiles: Vec<Tile>) -> Option<Self> {
        (tiles.len() == ROWS * COLS).then(|| Self { tiles })
    }

    pub fn get(&self, row: usize, col: usize) -> Tile {
        self.tiles[row * COLS + col]
    }

    fn set(&mut self, x: i64, y: i64, tile: Tile) -> Result<()> {
        let col = usize::try_from(x).ok().filter(|&c| c < COLS);
        let row = usize::try_from(y).ok().filter(|&r| r < ROWS);
        match (row, col) {
            (Some(row), Some(col)) => {
                self.tiles[row * COLS + col] = tile;
                Ok(())
            }
            _ => Err(Error::OutOfBounds { x, y }),
        }
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// The column of the first occurrence of the given tile.
    fn column_of(&self, tile: Tile) -> Option<usize> {
        self.tiles.iter().position(|&t| t == tile).map(|i| i % COLS)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..ROWS {
            for col in 0..COLS {
                f.write_str(self.get(row, col).symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Cabinet {
    pub fn new(program: Vec<i64>) -> Self {
        Self::from_parts(Computer::new(program), Screen::new(), 0)
    }

    pub(crate) fn from_parts(computer: Computer, screen: Screen, score: i64) -> Self {
        Self {
            computer,
            screen,
            score,
            pending: Vec::new(),
        }
    }

    /// Set the game to free play.
    pub fn insert_quarters(&mut self) {
        self.computer.memory_mut().write(0, 2);
    }

    pub fn computer(&self) -> &Computer {
        &self.computer
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    /// Run the game until it needs joystick input or halts, drawing
    /// everything it outputs.
    pub fn update(&mut self) -> Result<State> {
        loop {
            let (state, output) = self.computer.step()?;
            if let Some(value) = output {
                self.pending.push(value);
                if let [x, y, value] = self.pending[..] {
                    self.pending.clear();
                    self.draw(x, y, value)?;
                }
            }
            if state != State::Running {
                break Ok(state);
            }
        }
    }

    fn draw(&mut self, x: i64, y: i64, value: i64) -> Result<()> {
        if x == -1 {
            log::debug!("score is now `{}`", value);
            self.score = value;
            Ok(())
        } else {
            self.screen.set(x, y, Tile::from_value(value)?)
        }
    }

    /// Tilt the joystick left (-1), right (1) or leave it neutral (0).
    pub fn joystick(&mut self, tilt: i64) {
        self.computer.feed([tilt.signum()]);
    }

    /// A joystick position that moves the paddle towards the ball.
    pub fn autopilot(&self) -> i64 {
        match (
            self.screen.column_of(Tile::Ball),
            self.screen.column_of(Tile::Paddle),
        ) {
            (Some(ball), Some(paddle)) => (ball as i64 - paddle as i64).signum(),
            _ => 0,
        }
    }
}

impl fmt::Display for Cabinet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\nCurrent Score: {}", self.screen, self.score)
    }
}

/// Play the game, reading keystrokes from `keys` and rendering to `w`.
///
/// With `autoplay` the joystick follows the ball and no keys are read.
pub fn play(
    cabinet: &mut Cabinet,
    keys: impl BufRead,
    mut w: impl Write,
    autoplay: bool,
) -> Result<Outcome> {
    let mut keys = Keys::new(keys);
    loop {
        match cabinet.update()? {
            State::Running => {}
            State::NeedsInput if autoplay => {
                cabinet.joystick(cabinet.autopilot());
            }
            State::NeedsInput => {
                writeln!(w, "{}", cabinet)?;
                w.flush()?;
                match keys.next_key()?.map(Command::from) {
                    Some(Command::Tilt(tilt)) => cabinet.joystick(tilt),
                    Some(Command::Quit) | None => break Ok(Outcome::Quit),
                }
            }
            State::Halted => {
                writeln!(w, "{}", cabinet)?;
                w.flush()?;
                break Ok(Outcome::GameOver {
                    score: cabinet.score,
                });
            }
        }
    }
}
