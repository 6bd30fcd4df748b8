mod arcade;
mod keys;
mod log;
mod maze;
mod run;

use std::fs;
use std::fs::File;
use std::io;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use clap::{AppSettings, ArgAction, Parser, Subcommand};
use intcode_run::{parse_program, Computer};

use crate::arcade::{Cabinet, Outcome};
use crate::maze::Maze;

#[derive(Debug, Parser)]
#[clap(
    author,
    version,
    global_setting = AppSettings::DeriveDisplayOrder,
    global_setting = AppSettings::DisableHelpSubcommand,
)]
struct Opt {
    /// Log more, pass twice to trace every instruction.
    #[clap(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a program using standard input and output.
    Run {
        /// The Intcode program.
        #[clap()]
        input: PathBuf,

        /// Read and write decimal numbers instead of UTF-8 text.
        #[clap(long)]
        basic: bool,

        /// Write to memory before running, as `ADDR=VALUE`.
        #[clap(long, multiple_occurrences(true))]
        set: Vec<Patch>,

        /// Print the value at this address once the program halts.
        #[clap(long, multiple_occurrences(true))]
        dump: Vec<usize>,
    },
    /// Find the noun and verb that produce the target value.
    Calibrate {
        /// The Intcode program.
        #[clap()]
        input: PathBuf,

        /// The value expected at address zero.
        #[clap(long, allow_hyphen_values = true)]
        target: i64,
    },
    /// Play the arcade game.
    Arcade {
        /// The Intcode program.
        #[clap(required_unless_present = "load")]
        input: Option<PathBuf>,

        /// Continue a saved game instead.
        #[clap(long)]
        load: Option<PathBuf>,

        /// Where to save the game when quitting.
        #[clap(long, default_value = "saved_game.txt")]
        save: PathBuf,

        /// Let the joystick follow the ball.
        #[clap(long)]
        autoplay: bool,
    },
    /// Guide the repair robot through the maze.
    Maze {
        /// The Intcode program.
        #[clap()]
        input: PathBuf,

        /// Drive the robot by hand.
        #[clap(long, conflicts_with = "fill")]
        interactive: bool,

        /// Explore the whole maze and time how long it takes to fill.
        #[clap(long)]
        fill: bool,

        /// Search at most this many moves away instead of deepening the search.
        #[clap(long, conflicts_with_all = &["interactive", "fill"])]
        depth: Option<usize>,
    },
}

/// A memory write given on the command line.
#[derive(Debug, Clone)]
struct Patch {
    addr: usize,
    value: i64,
}

impl FromStr for Patch {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, value) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected `ADDR=VALUE`"))?;
        Ok(Self {
            addr: addr.trim().parse()?,
            value: value.trim().parse()?,
        })
    }
}

fn read_program(path: &Path) -> Result<Vec<i64>> {
    let intcode = fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    parse_program(&intcode)
        .with_context(|| format!("`{}` is not an Intcode program", path.display()))
}

fn run(path: PathBuf, basic: bool, patches: Vec<Patch>, dumps: Vec<usize>) -> Result<()> {
    let mut c = Computer::new(read_program(&path)?);
    for Patch { addr, value } in patches {
        log::debug!("setting address `{}` to `{}`", addr, value);
        c.memory_mut().write(addr, value);
    }
    log::info!("running {}", path.display());
    let r = io::stdin().lock();
    let w = BufWriter::new(io::stdout().lock());
    if basic {
        run::basic(&mut c, r, w)?;
    } else {
        run::utf8(&mut c, r, w)?;
    }
    for addr in dumps {
        println!("{}", c.memory().read(addr));
    }
    Ok(())
}

fn calibrate(path: PathBuf, target: i64) -> Result<()> {
    let program = read_program(&path)?;
    log::info!("calibrating {}", path.display());
    match run::calibrate(&program, target)? {
        Some(answer) => println!("{}", answer),
        None => bail!("no noun and verb produce `{}`", target),
    }
    Ok(())
}

fn arcade(input: Option<PathBuf>, load: Option<PathBuf>, save: PathBuf, autoplay: bool) -> Result<()> {
    let mut cabinet = match (load, input) {
        (Some(path), _) => {
            log::info!("loading {}", path.display());
            let f = File::open(&path)
                .with_context(|| format!("failed to open `{}`", path.display()))?;
            Cabinet::load(BufReader::new(f))
                .with_context(|| format!("could not load `{}`", path.display()))?
        }
        (None, Some(path)) => {
            let mut cabinet = Cabinet::new(read_program(&path)?);
            cabinet.insert_quarters();
            cabinet
        }
        (None, None) => bail!("either a program or a saved game is required"),
    };

    match arcade::play(&mut cabinet, io::stdin().lock(), io::stdout().lock(), autoplay)? {
        Outcome::GameOver { score } => {
            log::info!("game over with a score of {}", score);
        }
        Outcome::Quit => {
            let mut w = BufWriter::new(File::create(&save)?);
            cabinet.save(&mut w)?;
            w.flush()?;
            log::info!(
                "saved game with a score of {} to {}",
                cabinet.score(),
                save.display()
            );
        }
    }
    Ok(())
}

fn maze(path: PathBuf, interactive: bool, fill: bool, depth: Option<usize>) -> Result<()> {
    let mut maze = Maze::new(Computer::new(read_program(&path)?));
    if interactive {
        maze.interactive(io::stdin().lock(), io::stdout().lock())?;
        return Ok(());
    }
    if fill {
        log::info!("exploring the maze");
        maze.explore()?;
        log::debug!("explored\n{}", maze);
        match maze.fill_time() {
            Some(minutes) => println!("{}", minutes),
            None => bail!("the robot never found the target"),
        }
    } else {
        log::info!("searching for the target");
        let found = match depth {
            Some(depth) => maze.search(depth, true)?,
            None => maze.find_target()?,
        };
        match found {
            Some(distance) => println!("{}", distance),
            None => bail!("the target is unreachable"),
        }
    }
    Ok(())
}

fn main() {
    let opt = Opt::parse();
    log::init(opt.verbose);
    if let Err(err) = match opt.command {
        Command::Run {
            input,
            basic,
            set,
            dump,
        } => run(input, basic, set, dump),
        Command::Calibrate { input, target } => calibrate(input, target),
        Command::Arcade {
            input,
            load,
            save,
            autoplay,
        } => arcade(input, load, save, autoplay),
        Command::Maze {
            input,
            interactive,
            fill,
            depth,
        } => maze(input, interactive, fill, depth),
    } {
        log::error!("{:#}", err);
        process::exit(1);
    }
}
