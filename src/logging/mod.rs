//! Logging: `tracing-subscriber` registry with an env filter, a console
//! sink and an optional rolling file sink.

pub mod config;
mod filters;
mod formatter;
pub mod handle;

use std::{error::Error, fs};

pub use self::config::{ConsoleConfig, FileConfig, LogFormat, LoggingConfig, Rotation};
pub use handle::LoggingHandle;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use self::formatter::{build_formatter, FormatOptions};

/// Installs the global subscriber described by `config`.
///
/// Fails if the configuration is invalid, the log directory cannot be
/// created or a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingHandle, Box<dyn Error + Send + Sync>> {
    config.validate()?;

    let env_filter = filters::build_filter_from_config(config);
    let mut layers = Vec::new();

    if config.console.enabled {
        let options = FormatOptions {
            format: config.console.format,
            with_ansi: config.console.with_ansi,
            with_target: config.console.with_target,
            with_line_numbers: config.console.with_line_numbers,
        };
        layers.push(build_formatter(options, std::io::stdout));
    }

    let file_guard = if config.file.enabled {
        fs::create_dir_all(&config.file.dir)?;
        let appender = match config.file.rotation {
            Rotation::Hourly => rolling::hourly(&config.file.dir, &config.file.prefix),
            Rotation::Daily => rolling::daily(&config.file.dir, &config.file.prefix),
            Rotation::Never => rolling::never(&config.file.dir, &config.file.prefix),
        };
        let (writer, guard) = non_blocking(appender);
        let options = FormatOptions {
            format: config.file.format,
            with_ansi: false,
            with_target: true,
            with_line_numbers: true,
        };
        layers.push(build_formatter(options, writer));
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        console_enabled = config.console.enabled,
        file_enabled = config.file.enabled,
        log_dir = %config.file.dir.display(),
        "Logging system initialized"
    );

    Ok(LoggingHandle::new(file_guard))
}
