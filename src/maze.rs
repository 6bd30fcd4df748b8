//! A repair robot exploring an unknown maze.
//!
//! Each input is a move and each move produces a single status: the robot hit
//! a wall, moved, or moved onto the target.

mod grid;

use std::fmt;
use std::io;
use std::io::prelude::*;

use intcode_run::{Machine, State};
use thiserror::Error;

pub use crate::maze::grid::{Grid, Move, Pos, Tile};
use crate::keys::{Key, Keys};
use crate::log;

pub type Result<T> = std::result::Result<T, Error>;

/// How far the grid grows on each side when the robot reaches its edge.
pub const MARGIN: usize = 10;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Computer(#[from] intcode_run::Error),
    #[error("robot halted")]
    Halted,
    #[error("expected a single status after moving, found {:?}", .outputs)]
    Outputs { outputs: Vec<i64> },
    #[error("unknown status `{}`", .status)]
    UnknownStatus { status: i64 },
    #[error("robot could not retrace its steps")]
    Lost,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The result of a single move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Wall,
    Moved,
    Target,
}

/// Whether a search may enter a cell it has already reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Revisit {
    /// Each cell is entered at most once.
    Never,
    /// A cell is entered again when a shorter path to it turns up.
    WhenCloser,
}

/// A pending search node.
#[derive(Debug)]
struct Frame {
    depth: usize,
    /// Index into `Move::ALL` of the next move to try.
    next: usize,
    /// The move that returns to the parent node.
    back: Option<Move>,
}

#[derive(Debug)]
pub struct Maze<M> {
    robot: M,
    grid: Grid,
    pos: Pos,
    origin: Pos,
}

impl Status {
    fn from_value(status: i64) -> Result<Self> {
        Ok(match status {
            0 => Self::Wall,
            1 => Self::Moved,
            2 => Self::Target,
            status => return Err(Error::UnknownStatus { status }),
        })
    }

    fn tile(self) -> Tile {
        match self {
            Self::Wall => Tile::Wall,
            Self::Moved => Tile::Open,
            Self::Target => Tile::Target,
        }
    }
}

impl<M: Machine> Maze<M> {
    pub fn new(robot: M) -> Self {
        Self::with_size(robot, 40, 40)
    }

    /// Start with a grid of the given size with the robot in the middle.
    pub fn with_size(robot: M, rows: usize, cols: usize) -> Self {
        let mut grid = Grid::new(rows.max(1), cols.max(1));
        let pos = Pos::new(grid.rows() / 2, grid.cols() / 2);
        grid.get_mut(pos).tile = Tile::Open;
        Self {
            robot,
            grid,
            pos,
            origin: pos,
        }
    }

    /// The position one move away, growing the grid if it is off the edge.
    fn neighbor(&mut self, mv: Move) -> Pos {
        loop {
            match self.grid.neighbor(self.pos, mv) {
                Some(pos) => break pos,
                None => self.expand(),
            }
        }
    }

    fn expand(&mut self) {
        self.grid.expand(MARGIN);
        self.pos = self.pos.shift(MARGIN);
        self.origin = self.origin.shift(MARGIN);
        log::debug!(
            "expanded grid to {}x{}",
            self.grid.rows(),
            self.grid.cols()
        );
    }

    /// Send a single move to the robot and read back its status.
    fn drive(&mut self, mv: Move) -> Result<Status> {
        self.robot.feed([mv.code()]);
        let outputs = self.robot.run_until_blocked()?;
        if let [status] = outputs[..] {
            return Status::from_value(status);
        }
        if outputs.is_empty() && self.robot.state() == State::Halted {
            return Err(Error::Halted);
        }
        Err(Error::Outputs { outputs })
    }

    /// Move the robot and record what it finds.
    pub fn go(&mut self, mv: Move) -> Result<Status> {
        let next = self.neighbor(mv);
        let status = self.drive(mv)?;
        self.grid.get_mut(next).tile = status.tile();
        if status != Status::Wall {
            self.pos = next;
        }
        Ok(status)
    }

    /// Undo a move made by the search.
    fn retreat(&mut self, mv: Move) -> Result<()> {
        let next = self.neighbor(mv);
        match self.drive(mv)? {
            Status::Wall => Err(Error::Lost),
            _ => {
                self.pos = next;
                Ok(())
            }
        }
    }

    /// Whether a search at `depth` should step into `pos`.
    fn should_enter(&self, pos: Pos, depth: usize, revisit: Revisit) -> bool {
        let cell = self.grid.get(pos);
        if cell.tile == Tile::Wall {
            return false;
        }
        match (cell.depth, revisit) {
            (None, _) => true,
            (Some(_), Revisit::Never) => false,
            (Some(d), Revisit::WhenCloser) => depth < d,
        }
    }

    /// Whether a search that stopped at `depth` left anything unexplored.
    fn can_go_deeper(&self, depth: usize, revisit: Revisit) -> bool {
        Move::ALL.iter().any(|&mv| match self.grid.neighbor(self.pos, mv) {
            Some(pos) => self.should_enter(pos, depth + 1, revisit),
            None => true,
        })
    }

    /// The fewest known moves from the robot to the target.
    fn distance_to_target(&self) -> Option<usize> {
        let target = self
            .grid
            .positions()
            .find(|&pos| self.grid.get(pos).tile == Tile::Target)?;
        self.grid.distance(self.pos, target)
    }

    /// Depth first search from the robot's position, returning the shortest
    /// distance to the target found and whether any path was cut short by
    /// `max_depth`.
    ///
    /// Known walls are never probed again and the robot always ends up back
    /// where it started. With [`Revisit::WhenCloser`] every cell within `max_depth`
    /// is reached at its true distance unless the search stops at the target.
    fn dfs(
        &mut self,
        max_depth: usize,
        stop_at_target: bool,
        revisit: Revisit,
    ) -> Result<(Option<usize>, bool)> {
        self.grid.clear_depths();
        self.grid.get_mut(self.pos).depth = Some(0);
        let mut best = (self.grid.get(self.pos).tile == Tile::Target).then(|| 0);
        if stop_at_target && best.is_some() {
            return Ok((best, false));
        }

        let mut cut_off = false;
        let mut stack = vec![Frame {
            depth: 0,
            next: 0,
            back: None,
        }];

        while let Some(frame) = stack.last_mut() {
            let found = stop_at_target && best.is_some();
            if found || frame.depth == max_depth || frame.next == Move::ALL.len() {
                if !found && frame.depth == max_depth {
                    cut_off |= self.can_go_deeper(frame.depth, revisit);
                }
                let back = frame.back;
                stack.pop();
                if let Some(mv) = back {
                    self.retreat(mv)?;
                }
                continue;
            }

            let mv = Move::ALL[frame.next];
            frame.next += 1;
            let depth = frame.depth + 1;

            let next = self.neighbor(mv);
            if !self.should_enter(next, depth, revisit) {
                continue;
            }
            let status = self.go(mv)?;
            if status == Status::Wall {
                continue;
            }
            self.grid.get_mut(self.pos).depth = Some(depth);
            if status == Status::Target {
                log::debug!("found target {} moves away", depth);
                best = Some(best.map_or(depth, |b: usize| b.min(depth)));
            }
            stack.push(Frame {
                depth,
                next: 0,
                back: Some(mv.reverse()),
            });
        }

        Ok((best, cut_off))
    }

    /// Search at most `max_depth` moves away from the robot.
    ///
    /// With `stop_at_target` the search ends as soon as the target is found,
    /// otherwise everything within reach is explored. Returns the fewest moves
    /// to the target over everything mapped so far, once the target was found.
    pub fn search(&mut self, max_depth: usize, stop_at_target: bool) -> Result<Option<usize>> {
        let (best, _) = self.dfs(max_depth, stop_at_target, Revisit::WhenCloser)?;
        Ok(best.map(|b| self.distance_to_target().map_or(b, |d| d.min(b))))
    }

    /// Search with a growing depth limit until the target is found or there is
    /// nowhere left to look.
    ///
    /// Each pass explores everything within its limit, so the distance found
    /// is the shortest one.
    pub fn find_target(&mut self) -> Result<Option<usize>> {
        let mut limit = 0;
        loop {
            limit += 10;
            let (best, cut_off) = self.dfs(limit, false, Revisit::WhenCloser)?;
            if best.is_some() || !cut_off {
                break Ok(best);
            }
            log::debug!("no target within {} moves", limit);
        }
    }

    /// Map the entire reachable area, entering every cell once, and return
    /// the shortest distance to the target.
    pub fn explore(&mut self) -> Result<Option<usize>> {
        self.dfs(usize::MAX, false, Revisit::Never)?;
        Ok(self.distance_to_target())
    }

    /// The largest distance from the target to any known open location.
    pub fn fill_time(&self) -> Option<usize> {
        let target = self
            .grid
            .positions()
            .find(|&pos| self.grid.get(pos).tile == Tile::Target)?;
        self.grid.distances(target).into_iter().flatten().max()
    }

    /// Drive the robot by hand: `i`, `k`, `j` and `l` move north, south, west
    /// and east, `q` stops.
    pub fn interactive(&mut self, keys: impl BufRead, mut w: impl Write) -> Result<()> {
        let mut keys = Keys::new(keys);
        loop {
            writeln!(w, "{}", self)?;
            w.flush()?;
            let mv = match keys.next_key()? {
                Some(Key::Char('i')) => Move::North,
                Some(Key::Char('k')) => Move::South,
                Some(Key::Char('j')) | Some(Key::Left) => Move::West,
                Some(Key::Char('l')) | Some(Key::Right) => Move::East,
                Some(Key::Char('q')) | None => break Ok(()),
                Some(_) => continue,
            };
            let status = self.go(mv)?;
            log::debug!("moved {:?}: {:?}", mv, status);
        }
    }
}

impl<M> fmt::Display for Maze<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.grid.rows() {
            for col in 0..self.grid.cols() {
                let pos = Pos::new(row, col);
                let c = if pos == self.pos {
                    'D'
                } else {
                    match self.grid.get(pos).tile {
                        Tile::Unknown => '.',
                        Tile::Wall => '#',
                        Tile::Open => ' ',
                        Tile::Target => 'O',
                    }
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;

    use pretty_assertions::assert_eq;

    /// A fake robot walking around a fixed map.
    struct Robot {
        map: Vec<Vec<char>>,
        start: (usize, usize),
        at: (usize, usize),
        input: VecDeque<i64>,
        state: State,
        /// Every successful move.
        moves: Vec<i64>,
    }

    impl Robot {
        fn new(map: &[&str]) -> Self {
            let map: Vec<Vec<char>> = map.iter().map(|row| row.chars().collect()).collect();
            let start = map
                .iter()
                .enumerate()
                .find_map(|(r, row)| row.iter().position(|&c| c == 'S').map(|c| (r, c)))
                .unwrap();
            Self {
                map,
                start,
                at: start,
                input: VecDeque::new(),
                state: State::Running,
                moves: Vec::new(),
            }
        }

        fn count(&self, code: i64) -> usize {
            self.moves.iter().filter(|&&m| m == code).count()
        }
    }

    impl Machine for Robot {
        fn load(&mut self, _: Vec<i64>) {
            self.at = self.start;
            self.input.clear();
            self.state = State::Running;
            self.moves.clear();
        }

        fn feed<I: IntoIterator<Item = i64>>(&mut self, input: I) {
            self.input.extend(input);
            if self.state == State::NeedsInput && !self.input.is_empty() {
                self.state = State::Running;
            }
        }

        fn step(&mut self) -> intcode_run::Result<(State, Option<i64>)> {
            if self.state != State::Running {
                return Ok((self.state, None));
            }
            let code = match self.input.pop_front() {
                Some(code) => code,
                None => {
                    self.state = State::NeedsInput;
                    return Ok((self.state, None));
                }
            };
            let (r, c) = self.at;
            let (r, c) = match code {
                1 => (r - 1, c),
                2 => (r + 1, c),
                3 => (r, c - 1),
                4 => (r, c + 1),
                _ => panic!("bad move `{}`", code),
            };
            let status = match self.map[r][c] {
                '#' => 0,
                'T' => 2,
                _ => 1,
            };
            if status != 0 {
                self.at = (r, c);
                self.moves.push(code);
            }
            Ok((self.state, Some(status)))
        }

        fn state(&self) -> State {
            self.state
        }
    }

    const MAZE: &[&str] = &[
        "#####", //
        "#S#T#", //
        "#.#.#", //
        "#...#", //
        "#####", //
    ];

    #[track_caller]
    fn assert_returned(maze: &Maze<Robot>) {
        let robot = &maze.robot;
        assert_eq!(robot.at, robot.start);
        assert_eq!(robot.count(1), robot.count(2));
        assert_eq!(robot.count(3), robot.count(4));
        assert_eq!(maze.pos, maze.origin);
    }

    fn offset(maze: &Maze<Robot>, rows: isize, cols: isize) -> Pos {
        let origin = maze.origin;
        Pos::new(
            (origin.row as isize + rows) as usize,
            (origin.col as isize + cols) as usize,
        )
    }

    #[test]
    fn search_finds_shortest_path() {
        let mut maze = Maze::new(Robot::new(MAZE));
        assert_eq!(maze.search(20, true).unwrap(), Some(6));
        assert_returned(&maze);
        assert_eq!(maze.grid.get(offset(&maze, 0, 2)).tile, Tile::Target);
        assert_eq!(maze.grid.get(offset(&maze, 2, 1)).tile, Tile::Open);
    }

    #[test]
    fn search_exact_depth() {
        let mut maze = Maze::new(Robot::new(MAZE));
        assert_eq!(maze.search(6, true).unwrap(), Some(6));
        assert_returned(&maze);
    }

    #[test]
    fn search_too_shallow() {
        let mut maze = Maze::new(Robot::new(MAZE));
        assert_eq!(maze.search(5, true).unwrap(), None);
        assert_returned(&maze);
        assert_eq!(maze.grid.get(offset(&maze, 0, 2)).tile, Tile::Unknown);
    }

    #[test]
    fn search_grows_grid() {
        let mut maze = Maze::with_size(Robot::new(MAZE), 3, 3);
        assert_eq!(maze.search(20, true).unwrap(), Some(6));
        assert_returned(&maze);
        assert!(maze.grid.rows() > 3);
        assert_eq!(maze.grid.get(offset(&maze, 0, 2)).tile, Tile::Target);
        assert_eq!(maze.grid.get(offset(&maze, 2, 2)).tile, Tile::Open);
        assert_eq!(maze.grid.get(offset(&maze, -1, 0)).tile, Tile::Wall);
    }

    #[test]
    fn find_target() {
        let mut maze = Maze::new(Robot::new(MAZE));
        assert_eq!(maze.find_target().unwrap(), Some(6));
        assert_returned(&maze);
    }

    #[test]
    fn find_unreachable_target() {
        let map = ["#####", "#S#T#", "#.###", "#...#", "#####"];
        let mut maze = Maze::new(Robot::new(&map));
        assert_eq!(maze.find_target().unwrap(), None);
        assert_returned(&maze);
    }

    #[test]
    fn explore_and_fill() {
        let mut maze = Maze::new(Robot::new(MAZE));
        assert_eq!(maze.explore().unwrap(), Some(6));
        assert_returned(&maze);
        let open = maze
            .grid
            .positions()
            .filter(|&pos| maze.grid.get(pos).tile == Tile::Open)
            .count();
        assert_eq!(open, 6);
        assert_eq!(maze.fill_time(), Some(6));
    }

    // The target is next to the start but the first move south leads the
    // robot the long way around.
    const LOOP: &[&str] = &[
        "#####", //
        "#ST.#", //
        "#.#.#", //
        "#...#", //
        "#####", //
    ];

    #[test]
    fn search_takes_shortcut_around_loop() {
        let mut maze = Maze::new(Robot::new(LOOP));
        assert_eq!(maze.search(20, true).unwrap(), Some(1));
        assert_returned(&maze);
    }

    #[test]
    fn find_target_around_loop() {
        let mut maze = Maze::new(Robot::new(LOOP));
        assert_eq!(maze.find_target().unwrap(), Some(1));
        assert_returned(&maze);
    }

    #[test]
    fn shorter_path_reenters_cells() {
        // South first reaches the target in 7 moves, east gets there in 3.
        let map = [
            "######", //
            "#S..T#", //
            "#.##.#", //
            "#....#", //
            "######", //
        ];
        let mut maze = Maze::new(Robot::new(&map));
        assert_eq!(maze.find_target().unwrap(), Some(3));
        assert_returned(&maze);
        assert_eq!(maze.grid.get(offset(&maze, 0, 2)).depth, Some(2));
        assert_eq!(maze.grid.get(offset(&maze, 1, 3)).depth, Some(4));
    }

    #[test]
    fn explore_loop_and_fill() {
        let mut maze = Maze::new(Robot::new(LOOP));
        assert_eq!(maze.explore().unwrap(), Some(1));
        assert_returned(&maze);
        assert_eq!(maze.fill_time(), Some(4));
    }

    #[test]
    fn fill_time_without_target() {
        let maze = Maze::new(Robot::new(MAZE));
        assert_eq!(maze.fill_time(), None);
    }

    #[test]
    fn interactive() {
        let mut maze = Maze::new(Robot::new(MAZE));
        let mut w = Vec::new();
        maze.interactive("k\nk\ni\nl\nx\nq\n".as_bytes(), &mut w).unwrap();
        assert_eq!(maze.robot.at, (2, 1));
        assert_eq!(maze.pos, offset(&maze, 1, 0));
        assert_eq!(maze.grid.get(offset(&maze, 1, 1)).tile, Tile::Wall);

        let rendered = String::from_utf8(w).unwrap();
        let last: Vec<_> = rendered.lines().rev().take(maze.grid.rows()).collect();
        assert!(last.iter().any(|line| line.contains("D#")));
    }

    #[test]
    fn halted_robot() {
        let mut maze = Maze::new(intcode_run::Computer::new(vec![99]));
        assert!(matches!(maze.go(Move::North), Err(Error::Halted)));
    }

    #[test]
    fn chatty_robot() {
        let robot = intcode_run::Computer::new(vec![3, 0, 104, 1, 104, 1, 99]);
        let mut maze = Maze::new(robot);
        assert!(matches!(
            maze.go(Move::North),
            Err(Error::Outputs { outputs }) if outputs == vec![1, 1]
        ));
    }
}
