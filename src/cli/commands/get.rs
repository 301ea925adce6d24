//! `get` command handler
//!
//! Human output prints bare values so the command is usable from shell
//! scripts (`$(deployconf get binary php)`).

use serde_yaml::Value;

use crate::cli::args::{DocumentFormat, EntryKind, GetArgs, OutputFormat};
use crate::cli::commands::render;
use crate::config::schema::closest;
use crate::config::{Config, Section};
use crate::error::{DeployConfError, LookupError};

/// Look up one entry and print it.
///
/// # Errors
///
/// Returns a lookup error if the entry does not exist, or a config error if
/// the file cannot be loaded.
pub fn run(args: &GetArgs) -> Result<(), DeployConfError> {
    let config = Config::load(&args.config.config)?;
    let key = args.key.as_str();

    let output = match (args.kind, args.format) {
        (EntryKind::Binary, OutputFormat::Human) => format!("{}\n", config.binary(key)?),
        (EntryKind::Binary, OutputFormat::Json) => json(&config.binary(key)?)?,
        (EntryKind::Permission, OutputFormat::Human) => format!("{}\n", config.permission(key)?),
        (EntryKind::Permission, OutputFormat::Json) => json(&config.permission(key)?)?,
        (EntryKind::Acl, OutputFormat::Human) => {
            let mut out = String::new();
            for rule in config.acl(key)? {
                out.push_str(&rule_line(rule)?);
                out.push('\n');
            }
            out
        }
        (EntryKind::Acl, OutputFormat::Json) => json(config.acl(key)?)?,
        (EntryKind::Site, format) => {
            let site = config.site(key).ok_or_else(|| missing_site(&config, key))?;
            match format {
                OutputFormat::Human => render(site.definition(), DocumentFormat::Yaml)?,
                OutputFormat::Json => json(site)?,
            }
        }
    };

    print!("{output}");
    Ok(())
}

fn json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, DeployConfError> {
    render(value, DocumentFormat::Json)
}

/// Strings print as-is; structured rules print as inline YAML.
fn rule_line(rule: &Value) -> Result<String, DeployConfError> {
    Ok(match rule {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)?.trim_end().to_string(),
    })
}

/// `Config::site` is null-safe; the CLI still reports a miss as a lookup error.
fn missing_site(config: &Config, key: &str) -> DeployConfError {
    LookupError::NotFound {
        section: Section::Sites,
        key: key.to_string(),
        suggestion: closest(key, config.site_names()).map(str::to_string),
    }
    .into()
}
