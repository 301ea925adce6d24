//! CLI argument definitions
//!
//! All Clap derive structs for `deployconf` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::config::Section;
use crate::observability::LogFormat;

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG: &str = "deploy.yml";

// ============================================================================
// Root CLI
// ============================================================================

/// Validate and inspect deployment configuration files.
#[derive(Parser, Debug)]
#[command(name = "deployconf", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "DEPLOYCONF_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(long, default_value = "human", global = true)]
    pub log_format: LogFormat,
}

// ============================================================================
// Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration files.
    Validate(ValidateArgs),

    /// Print the loaded configuration.
    Show(ShowArgs),

    /// Look up a single binary, site, permission or ACL.
    Get(GetArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

/// Path to the configuration file used by `show` and `get`.
#[derive(Args, Debug)]
pub struct ConfigArg {
    /// Path to YAML configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG, env = "DEPLOYCONF_CONFIG")]
    pub config: PathBuf,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Enable strict validation (warnings become errors).
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Only print this section.
    #[arg(short, long)]
    pub section: Option<SectionArg>,

    /// Output format.
    #[arg(short, long, default_value = "yaml")]
    pub format: DocumentFormat,
}

/// Arguments for `get`.
#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// What kind of entry to look up.
    pub kind: EntryKind,

    /// Name (or type) of the entry.
    pub key: String,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Serialization format for `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DocumentFormat {
    /// YAML, as it would appear in a config file.
    #[default]
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

/// Section selector for `show --section`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SectionArg {
    /// `binaries`
    Binaries,
    /// `sites`
    Sites,
    /// `permissions`
    Permissions,
    /// `acls`
    Acls,
}

impl From<SectionArg> for Section {
    fn from(arg: SectionArg) -> Self {
        match arg {
            SectionArg::Binaries => Self::Binaries,
            SectionArg::Sites => Self::Sites,
            SectionArg::Permissions => Self::Permissions,
            SectionArg::Acls => Self::Acls,
        }
    }
}

/// Entry kind for `get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntryKind {
    /// A binary path.
    Binary,
    /// A site definition.
    Site,
    /// A permission value.
    Permission,
    /// An ACL rule list.
    Acl,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_files() {
        let cli = Cli::try_parse_from(["deployconf", "validate"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_validate_multiple_files() {
        let cli = Cli::try_parse_from(["deployconf", "validate", "a.yml", "b.yml", "--strict"])
            .unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("Expected ValidateArgs");
        };
        assert_eq!(args.files.len(), 2);
        assert!(args.strict);
        assert_eq!(args.format, OutputFormat::Human);
    }

    #[test]
    fn test_show_defaults() {
        let cli = Cli::try_parse_from(["deployconf", "show", "--config", "prod.yml"]).unwrap();
        let Commands::Show(args) = cli.command else {
            panic!("Expected ShowArgs");
        };
        assert_eq!(args.config.config, PathBuf::from("prod.yml"));
        assert_eq!(args.format, DocumentFormat::Yaml);
        assert!(args.section.is_none());
    }

    #[test]
    fn test_show_section() {
        let cli = Cli::try_parse_from(["deployconf", "show", "--section", "acls"]).unwrap();
        let Commands::Show(args) = cli.command else {
            panic!("Expected ShowArgs");
        };
        assert_eq!(args.section.map(Section::from), Some(Section::Acls));
    }

    #[test]
    fn test_get_binary() {
        let cli = Cli::try_parse_from(["deployconf", "get", "binary", "php"]).unwrap();
        let Commands::Get(args) = cli.command else {
            panic!("Expected GetArgs");
        };
        assert_eq!(args.kind, EntryKind::Binary);
        assert_eq!(args.key, "php");
    }

    #[test]
    fn test_get_rejects_unknown_kind() {
        let cli = Cli::try_parse_from(["deployconf", "get", "hook", "php"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_global_verbosity() {
        let cli = Cli::try_parse_from(["deployconf", "-vv", "validate", "a.yml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, LogFormat::Human);
    }

    #[test]
    fn test_help_output() {
        let err = Cli::try_parse_from(["deployconf", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_output() {
        let err = Cli::try_parse_from(["deployconf", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
