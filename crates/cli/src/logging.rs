//! Logger setup for the CLI.
//!
//! Library crates log through the `log` facade; this installs `env_logger`
//! writing to stderr so stdout stays reserved for command output.
//!
//! - 0 (no `-v`): warn
//! - 1 (`-v`): info
//! - 2 (`-vv`): debug
//! - 3+ (`-vvv`): trace
//!
//! `RUST_LOG` directives take precedence over the verbosity flag.

use log::LevelFilter;

pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init_logging(verbosity: u8) {
    let result = env_logger::Builder::new()
        .filter_level(level_from_verbosity(verbosity))
        .parse_env(env_logger::Env::default())
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .try_init();

    // A second init (tests) keeps the first logger.
    if let Err(e) = result {
        eprintln!("warning: logger already initialized: {e}");
    }
}
