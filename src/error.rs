//! Error types for `deployconf`
//!
//! Loading failures, schema validation failures and lookup misses each get
//! their own enum; [`DeployConfError`] aggregates them for the CLI and maps
//! every variant to a process exit code.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::schema::Section;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `deployconf` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (unparsable YAML, validation failure, bad import)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Requested binary, site, permission or ACL does not exist
    pub const LOOKUP_ERROR: i32 = 4;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `deployconf` operations.
#[derive(Debug, Error)]
pub enum DeployConfError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Lookup of a missing key
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// `validate` rejected at least one file; the issues are in its report
    #[error("{invalid} of {total} file(s) failed validation")]
    ValidationFailed {
        /// Files that failed
        invalid: usize,
        /// Files checked
        total: usize,
        /// Exit code of the first failure
        exit_code: i32,
    },
}

impl DeployConfError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(ConfigError::MissingFile { .. } | ConfigError::Unreadable { .. })
            | Self::Io(_) => ExitCode::IO_ERROR,
            Self::Config(_) => ExitCode::CONFIG_ERROR,
            Self::Lookup(_) => ExitCode::LOOKUP_ERROR,
            // Only output rendering serializes, so these are not config problems
            Self::Json(_) | Self::Yaml(_) => ExitCode::ERROR,
            Self::ValidationFailed { exit_code, .. } => *exit_code,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
///
/// Every variant is fatal: the loader never hands back a partially
/// populated configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration or imported file does not exist
    #[error("file not found: {}", .path.display())]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// File exists but could not be read
    #[error("cannot read {}: {source}", .path.display())]
    Unreadable {
        /// Path to the unreadable file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing failed
    #[error("parse error in {}{}: {message}", .path.display(), line_suffix(.line.as_ref()))]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Document does not conform to the schema
    #[error("validation failed for {path}: {}", join_issues(.errors))]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// Every error-level issue found
        errors: Vec<ValidationIssue>,
    },

    /// Import chain loops back onto a file already being loaded
    #[error("circular import detected: {}", format_chain(.cycle))]
    CircularImport {
        /// Files forming the loop, ending with the repeated one
        cycle: Vec<PathBuf>,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Environment variable referenced with `${VAR:?message}` is not set
    #[error("environment variable '{var}' not set: {message}")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Message supplied after `:?`
        message: String,
    },
}

fn line_suffix(line: Option<&usize>) -> String {
    line.map_or_else(String::new, |l| format!(" (line {l})"))
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

// ============================================================================
// Lookup Errors
// ============================================================================

/// Raised by the keyed accessors on [`crate::config::Config`].
///
/// `Config::site` is the exception: it returns `None` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Key is not present in the section
    #[error("unknown {} '{key}'{}", .section.singular(), suggestion_suffix(.suggestion.as_deref()))]
    NotFound {
        /// Section that was searched
        section: Section,
        /// Key that was requested
        key: String,
        /// Closest existing key, if any is near enough
        suggestion: Option<String>,
    },
}

fn suggestion_suffix(suggestion: Option<&str>) -> String {
    suggestion.map_or_else(String::new, |s| format!(" (did you mean '{s}'?)"))
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path to the problematic node (e.g. `acls.ssh[2]`), empty for the root
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        if self.path.is_empty() {
            write!(f, "{prefix}: {}", self.message)
        } else {
            write!(f, "{prefix}: {} at {}", self.message, self.path)
        }
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Prevents the configuration from being used
    Error,
    /// Reported but does not block loading
    Warning,
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `deployconf` operations.
pub type Result<T> = std::result::Result<T, DeployConfError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::LOOKUP_ERROR, 4);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
    }

    #[test]
    fn test_missing_file_exit_code() {
        let err: DeployConfError = ConfigError::MissingFile {
            path: PathBuf::from("/test"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_validation_error_exit_code() {
        let err: DeployConfError = ConfigError::ValidationError {
            path: "deploy.yml".to_string(),
            errors: Vec::new(),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_render_failure_is_a_general_error() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = DeployConfError::from(source);
        assert_eq!(err.exit_code(), ExitCode::ERROR);
    }

    #[test]
    fn test_validation_failed_keeps_first_exit_code() {
        let err = DeployConfError::ValidationFailed {
            invalid: 2,
            total: 3,
            exit_code: ExitCode::IO_ERROR,
        };
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
        assert_eq!(err.to_string(), "2 of 3 file(s) failed validation");
    }

    #[test]
    fn test_lookup_error_exit_code() {
        let err: DeployConfError = LookupError::NotFound {
            section: Section::Binaries,
            key: "php".to_string(),
            suggestion: None,
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::LOOKUP_ERROR);
    }

    #[test]
    fn test_lookup_error_display_with_suggestion() {
        let err = LookupError::NotFound {
            section: Section::Permissions,
            key: "usr".to_string(),
            suggestion: Some("user".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "unknown permission 'usr' (did you mean 'user'?)"
        );
    }

    #[test]
    fn test_lookup_error_display_without_suggestion() {
        let err = LookupError::NotFound {
            section: Section::Acls,
            key: "ftp".to_string(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "unknown acl 'ftp'");
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "binaries.php".to_string(),
            message: "expected string, found sequence".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(
            issue.to_string(),
            "error: expected string, found sequence at binaries.php"
        );
    }

    #[test]
    fn test_validation_issue_root_display() {
        let issue = ValidationIssue {
            path: String::new(),
            message: "expected mapping, found sequence".to_string(),
            severity: Severity::Warning,
        };
        assert_eq!(issue.to_string(), "warning: expected mapping, found sequence");
    }

    #[test]
    fn test_validation_error_lists_every_issue() {
        let err = ConfigError::ValidationError {
            path: "deploy.yml".to_string(),
            errors: vec![
                ValidationIssue {
                    path: "acls".to_string(),
                    message: "missing required section 'acls'".to_string(),
                    severity: Severity::Error,
                },
                ValidationIssue {
                    path: "binaries.php".to_string(),
                    message: "expected string, found integer".to_string(),
                    severity: Severity::Error,
                },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("deploy.yml"));
        assert!(text.contains("missing required section 'acls'"));
        assert!(text.contains("binaries.php"));
    }

    #[test]
    fn test_parse_error_display() {
        let err = ConfigError::ParseError {
            path: PathBuf::from("deploy.yml"),
            line: Some(42),
            message: "unexpected token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "parse error in deploy.yml (line 42): unexpected token"
        );
    }

    #[test]
    fn test_circular_import_display() {
        let err = ConfigError::CircularImport {
            cycle: vec![
                PathBuf::from("a.yml"),
                PathBuf::from("b.yml"),
                PathBuf::from("a.yml"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "circular import detected: a.yml -> b.yml -> a.yml"
        );
    }

    #[test]
    fn test_env_var_display() {
        let err = ConfigError::EnvVarNotSet {
            var: "DEPLOY_USER".to_string(),
            message: "set the deploy user".to_string(),
        };
        assert!(err.to_string().contains("DEPLOY_USER"));
        assert!(err.to_string().contains("set the deploy user"));
    }
}
