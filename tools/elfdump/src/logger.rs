//! Stderr logger for parser diagnostics.
//!
//! Output levels controlled by CLI flags:
//! - **Quiet** (`-q`): errors only
//! - **Default** (no flag): warnings and errors
//! - **Verbose** (`-v`): per-file parse summaries
//! - **Trace** (`-vv`): every decoded header record

use log::{LevelFilter, Log, Metadata, Record};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet = 0,
    Default = 1,
    Verbose = 2,
    Trace = 3,
}

impl Verbosity {
    /// Derives the level from the `-q` flag and the number of `-v` flags.
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Default,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// The most detailed log level shown at this verbosity.
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::Error,
            Self::Default => LevelFilter::Warn,
            Self::Verbose => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "elfdump: {}: {}",
                record.level().as_str().to_ascii_lowercase(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

/// Install the stderr logger for the current process.
pub fn init(verbosity: Verbosity) {
    // A second call keeps the first logger; only the level changes.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(verbosity.level_filter());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_levels() {
        assert_eq!(Verbosity::from_flags(true, 0), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, 3), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Default);
        assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Trace);
    }

    #[test]
    fn levels_widen_with_verbosity() {
        assert_eq!(Verbosity::Quiet.level_filter(), LevelFilter::Error);
        assert_eq!(Verbosity::Default.level_filter(), LevelFilter::Warn);
        assert_eq!(Verbosity::Verbose.level_filter(), LevelFilter::Debug);
        assert_eq!(Verbosity::Trace.level_filter(), LevelFilter::Trace);
        assert!(Verbosity::Quiet < Verbosity::Trace);
    }
}
