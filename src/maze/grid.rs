//! The map the robot builds while moving around.

use std::collections::VecDeque;

/// What is known about a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Unknown,
    Wall,
    Open,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub tile: Tile,
    /// The fewest moves the current search needed to get here.
    pub depth: Option<usize>,
}

/// A location on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

/// A movement command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    North,
    South,
    West,
    East,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            tile: Tile::Unknown,
            depth: None,
        }
    }
}

impl Pos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Where this position is after the grid grew by `margin` on every side.
    pub fn shift(self, margin: usize) -> Self {
        Self::new(self.row + margin, self.col + margin)
    }
}

impl Move {
    /// The order in which a search tries moves.
    pub const ALL: [Move; 4] = [Move::North, Move::South, Move::West, Move::East];

    /// The value the robot expects as input.
    pub fn code(self) -> i64 {
        match self {
            Self::North => 1,
            Self::South => 2,
            Self::West => 3,
            Self::East => 4,
        }
    }

    /// The move that undoes this one.
    pub fn reverse(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::East => Self::West,
        }
    }
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::default(); rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    fn index(&self, pos: Pos) -> usize {
        pos.row * self.cols + pos.col
    }

    pub fn get(&self, pos: Pos) -> Cell {
        self.cells[self.index(pos)]
    }

    pub fn get_mut(&mut self, pos: Pos) -> &mut Cell {
        let i = self.index(pos);
        &mut self.cells[i]
    }

    /// The position one move away, if it is on the grid.
    pub fn neighbor(&self, pos: Pos, mv: Move) -> Option<Pos> {
        let Pos { row, col } = pos;
        let (row, col) = match mv {
            Move::North => (row.checked_sub(1)?, col),
            Move::South => (row + 1, col),
            Move::West => (row, col.checked_sub(1)?),
            Move::East => (row, col + 1),
        };
        (row < self.rows && col < self.cols).then(|| Pos::new(row, col))
    }

    /// Grow the grid by `margin` cells on every side.
    ///
    /// Every cell moves to `pos.shift(margin)`, callers must shift any
    /// positions they hold the same way.
    pub fn expand(&mut self, margin: usize) {
        let mut grid = Self::new(self.rows + 2 * margin, self.cols + 2 * margin);
        for row in 0..self.rows {
            for col in 0..self.cols {
                let pos = Pos::new(row, col);
                *grid.get_mut(pos.shift(margin)) = self.get(pos);
            }
        }
        *self = grid;
    }

    pub fn clear_depths(&mut self) {
        for cell in &mut self.cells {
            cell.depth = None;
        }
    }

    /// The fewest moves from `from` to every position, walking only over
    /// known open cells, in row-major order.
    pub fn distances(&self, from: Pos) -> Vec<Option<usize>> {
        let mut distances = vec![None; self.cells.len()];
        distances[self.index(from)] = Some(0);
        let mut queue = VecDeque::from([(from, 0)]);
        while let Some((pos, d)) = queue.pop_front() {
            for mv in Move::ALL {
                if let Some(next) = self.neighbor(pos, mv) {
                    let i = self.index(next);
                    let open = matches!(self.cells[i].tile, Tile::Open | Tile::Target);
                    if open && distances[i].is_none() {
                        distances[i] = Some(d + 1);
                        queue.push_back((next, d + 1));
                    }
                }
            }
        }
        distances
    }

    /// The fewest moves from `from` to `to` over known open cells.
    pub fn distance(&self, from: Pos, to: Pos) -> Option<usize> {
        self.distances(from)[self.index(to)]
    }

    /// Every position on the grid, row by row.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Pos::new(row, col)))
    }
}
