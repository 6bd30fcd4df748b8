pub use log::{debug, error, info, warn};
use log::{Level, LevelFilter, Log, Metadata, Record};

static LOGGER: Logger = Logger;

struct Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let header = match record.level() {
            Level::Trace => yansi::Paint::fixed(244, "trace"),
            Level::Debug => yansi::Paint::default("debug"),
            Level::Info => yansi::Paint::green("info"),
            Level::Warn => yansi::Paint::yellow("warn"),
            Level::Error => yansi::Paint::red("error"),
        }
        .bold();
        let colon = yansi::Paint::default(":").bold();
        eprintln!("{}{} {}", header, colon, record.args());
    }

    fn flush(&self) {}
}

/// Install the logger, `verbose` raises the level from info to debug or trace.
pub fn init(verbose: u8) {
    if !atty::is(atty::Stream::Stderr) {
        yansi::Paint::disable();
    }
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(level))
        .unwrap()
}
