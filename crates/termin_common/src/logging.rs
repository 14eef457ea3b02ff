//! Logging utilities for the Termin application.
//!
//! This module provides a standardized approach to logging across all crates.
//! It includes functions for initializing the tracing subscriber, optionally
//! with a daily-rolling log file.

use termin_config::LoggingConfig;
use tracing::{error, info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn env_filter(level: Level) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match format!("termin={}", level).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Initialize the tracing subscriber with a specific log level.
///
/// Uses `try_init`, so calling this after a subscriber is installed is a no-op.
pub fn init_with_level(level: Level) {
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .with(env_filter(level))
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Initialize logging to stdout plus a daily-rolling file in `directory`.
///
/// The returned guard must be kept alive for the lifetime of the program,
/// dropping it flushes and stops the background writer.
pub fn init_with_file(level: Level, directory: &str) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(directory, "termin.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true),
        )
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(env_filter(level))
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {} (files in {})", level, directory);
    }
    guard
}

/// Initialize logging from the optional `[logging]` config section.
pub fn init_from_config(config: Option<&LoggingConfig>) -> Option<WorkerGuard> {
    let level = config
        .and_then(|c| c.level.as_deref())
        .and_then(|l| l.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    match config.and_then(|c| c.directory.as_deref()) {
        Some(directory) => Some(init_with_file(level, directory)),
        None => {
            init_with_level(level);
            None
        }
    }
}

/// Log an error with context at the ERROR level.
pub fn log_error<E: std::fmt::Display>(error: E, context: &str) {
    error!("{}: {}", context, error);
}

