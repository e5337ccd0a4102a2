//! Logging setup on top of the `log` facade and `env_logger`.
//!
//! Level precedence:
//!
//! 1. `RUST_LOG`, when set
//! 2. `--quiet` (errors only) or `-v` / `-vv` (debug / trace)
//! 3. info
//!
//! Debug builds prefix every line with a timestamp, and with the module path
//! once verbose output is requested. Release builds print level and message.
//!
//! ```rust,no_run
//! arcdupe::logging::init_logging(1, false);
//! log::debug!("visible at -v");
//! ```

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Dependencies that are chatty at debug level.
const QUIET_DEPENDENCIES: &[&str] = &["jwalk", "ignore::walk"];

/// Install the global logger.
///
/// A second call is ignored with a debug message rather than panicking.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();
    let from_env = env::var("RUST_LOG").is_ok();

    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
        for dependency in QUIET_DEPENDENCIES {
            builder.filter_module(dependency, LevelFilter::Info);
        }
    }
    configure_format(&mut builder, verbose);

    match builder.try_init() {
        Ok(()) if from_env => log::debug!("Logging configured from RUST_LOG"),
        Ok(()) => log::debug!("Logging at {}", current_level_name()),
        Err(e) => log::debug!("Logger already installed: {}", e),
    }
}

fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

#[cfg(debug_assertions)]
fn configure_format(builder: &mut Builder, verbose: u8) {
    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        let timestamp = buf.timestamp_seconds();
        if verbose >= 1 {
            writeln!(
                buf,
                "{timestamp} {style}{level:<5}{style:#} [{}] {}",
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(buf, "{timestamp} {style}{level:<5}{style:#} {}", record.args())
        }
    });
}

#[cfg(not(debug_assertions))]
fn configure_format(builder: &mut Builder, _verbose: u8) {
    builder.format(|buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        writeln!(buf, "{style}{level:<5}{style:#} {}", record.args())
    });
}

/// Name of the currently active maximum level.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
