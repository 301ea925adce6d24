//! `show` command handler

use crate::cli::args::ShowArgs;
use crate::cli::commands::render;
use crate::config::{Config, Section};
use crate::error::DeployConfError;

/// Print the loaded configuration, or a single section of it.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or serialized.
pub fn run(args: &ShowArgs) -> Result<(), DeployConfError> {
    let config = Config::load(&args.config.config)?;

    let output = match args.section.map(Section::from) {
        None => render(&config, args.format)?,
        Some(Section::Binaries) => render(config.binaries(), args.format)?,
        Some(Section::Sites) => render(config.sites(), args.format)?,
        Some(Section::Permissions) => render(config.permissions(), args.format)?,
        Some(Section::Acls) => render(config.acls(), args.format)?,
    };
    print!("{output}");
    Ok(())
}
