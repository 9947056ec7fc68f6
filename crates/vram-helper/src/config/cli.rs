use clap::{Parser, Subcommand};
use utils::logging::{LogOptions, Verbosity};
use utils::version;

use crate::config::start::StartArgs;

#[derive(Parser, Debug)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(
        short,
        long,
        global = true,
        default_value_t = Verbosity::DEFAULT.0,
        help = "Logger verbosity: 0 errors, 1 warnings, 2 info, 3 debug, 4 trace"
    )]
    pub verbosity: u8,

    #[arg(
        short = 'n',
        long,
        global = true,
        help = "Don't autodetect GPU information, use the configured values as-is"
    )]
    pub noauto: bool,

    #[arg(
        short = 't',
        long = "no-time",
        global = true,
        help = "Disable showing time for every log entry"
    )]
    pub no_time: bool,
}

impl Cli {
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            verbosity: Verbosity(self.verbosity),
            timestamps: !self.no_time,
        }
    }

    pub fn autodetect(&self) -> bool {
        !self.noauto
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start monitoring VRAM usage and GPU temperature
    Start(Box<StartArgs>),
}
