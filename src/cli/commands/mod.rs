//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod get;
pub mod info;
pub mod show;
pub mod validate;

use serde::Serialize;

use crate::cli::args::{Cli, Commands, DocumentFormat};
use crate::error::DeployConfError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub fn dispatch(cli: Cli) -> Result<(), DeployConfError> {
    match cli.command {
        Commands::Validate(args) => validate::run(&args),
        Commands::Show(args) => show::run(&args),
        Commands::Get(args) => get::run(&args),
        Commands::Completions(args) => {
            info::completions(&args);
            Ok(())
        }
        Commands::Version(args) => info::version(&args),
    }
}

/// Serializes `value` as YAML or pretty JSON.
fn render<T: Serialize + ?Sized>(
    value: &T,
    format: DocumentFormat,
) -> Result<String, DeployConfError> {
    Ok(match format {
        DocumentFormat::Yaml => serde_yaml::to_string(value)?,
        DocumentFormat::Json => serde_json::to_string_pretty(value)? + "\n",
    })
}
