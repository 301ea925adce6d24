//! Logging setup for `deployconf`.
//!
//! Everything is written to stderr so that stdout stays clean for command
//! output (`deployconf get binary php` is meant to be captured by scripts).

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Environment variable holding an `EnvFilter` directive.
///
/// Takes precedence over `-v` flags when set and parseable.
pub const LOG_LEVEL_ENV: &str = "DEPLOYCONF_LOG_LEVEL";

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Plain text, colored on terminals.
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

/// `-v` count to filter directive; saturates at `trace`.
#[must_use]
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn filter_for(verbosity: u8) -> EnvFilter {
    match EnvFilter::try_from_env(LOG_LEVEL_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(verbosity_to_directive(verbosity)),
    }
}

/// Whether log lines should carry ANSI escapes.
fn ansi_enabled(color: ColorChoice, stderr_is_terminal: bool) -> bool {
    match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => stderr_is_terminal && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Installs the global subscriber.
///
/// A second call is a no-op: the subscriber from the first call stays in place.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbosity))
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Human => builder
            .with_ansi(ansi_enabled(color, std::io::stderr().is_terminal()))
            .try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if installed.is_err() {
        tracing::trace!("global subscriber already installed");
    }
}
