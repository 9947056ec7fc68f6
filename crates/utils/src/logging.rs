//! provides logging helpers

use std::io::IsTerminal;

use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// Logger verbosity as passed on the command line.
///
/// `0` only shows errors, every further level unlocks one more severity,
/// anything above `4` is treated as trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Verbosity(pub u8);

impl Verbosity {
    pub const DEFAULT: Verbosity = Verbosity(2);

    pub fn level_filter(self) -> filter::LevelFilter {
        match self.0 {
            0 => filter::LevelFilter::ERROR,
            1 => filter::LevelFilter::WARN,
            2 => filter::LevelFilter::INFO,
            3 => filter::LevelFilter::DEBUG,
            _ => filter::LevelFilter::TRACE,
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Options for the global subscriber.
#[derive(Debug, Clone, Copy)]
pub struct LogOptions {
    pub verbosity: Verbosity,
    /// Prefix every line with a timestamp.
    pub timestamps: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::DEFAULT,
            timestamps: true,
        }
    }
}

/// initiate the global tracing subscriber
///
/// `RUST_LOG` directives, when set, take precedence over the verbosity level.
/// Colors are only used when stderr is a terminal.
pub fn init(options: LogOptions) {
    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(options.verbosity.level_filter().into())
        .from_env_lossy();

    let fmt_layer = layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false);

    if options.timestamps {
        registry()
            .with(fmt_layer.with_filter(env_filter))
            .init();
    } else {
        registry()
            .with(fmt_layer.without_time().with_filter(env_filter))
            .init();
    }
}
