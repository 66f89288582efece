//! Console logger with timestamped, level-tagged lines
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

use crate::loader::LogLevel;

fn level_filter(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

/// Initialize the logging system
///
/// `RUST_LOG`, when set, overrides `level`. Calling this more than once
/// leaves the first logger in place.
pub fn init(level: &LogLevel) {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level_filter(level))
        .parse_default_env();

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}
