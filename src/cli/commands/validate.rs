//! `validate` command handler
//!
//! Loads each file with a fresh loader and reports every issue, in human or
//! JSON form. The first failing file determines the exit code.

use std::path::Path;

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::{ConfigLoader, LoadWarning};
use crate::error::{ConfigError, DeployConfError, Severity, ValidationIssue};

#[derive(Debug, Serialize)]
struct Report {
    files: Vec<FileReport>,
    summary: Summary,
}

#[derive(Debug, Serialize)]
struct FileReport {
    path: String,
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total: usize,
    valid: usize,
    invalid: usize,
}

/// Validate configuration files.
///
/// # Errors
///
/// Returns [`DeployConfError::ValidationFailed`] if any file fails to load,
/// or has warnings under `--strict`. Its exit code is that of the first
/// failing file; the individual issues are only printed in the report.
pub fn run(args: &ValidateArgs) -> Result<(), DeployConfError> {
    let mut files = Vec::with_capacity(args.files.len());
    let mut first_failure: Option<ConfigError> = None;

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let (report, failure) = check_file(path, args.strict);
        if let Some(err) = failure {
            first_failure.get_or_insert(err);
        }
        files.push(report);
    }

    let valid = files.iter().filter(|f| f.valid).count();
    let report = Report {
        summary: Summary {
            total: files.len(),
            valid,
            invalid: files.len() - valid,
        },
        files,
    };

    match args.format {
        OutputFormat::Human => print_human(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    match first_failure {
        None => Ok(()),
        Some(err) => Err(DeployConfError::ValidationFailed {
            invalid: report.summary.invalid,
            total: report.summary.total,
            exit_code: DeployConfError::from(err).exit_code(),
        }),
    }
}

fn check_file(path: &Path, strict: bool) -> (FileReport, Option<ConfigError>) {
    let display = path.display().to_string();

    match ConfigLoader::with_defaults().load(path) {
        Ok(result) => {
            let warnings: Vec<String> = result.warnings.iter().map(format_warning).collect();
            for warning in &result.warnings {
                tracing::warn!(
                    location = warning.location.as_deref().unwrap_or("<unknown>"),
                    "{}",
                    warning.message
                );
            }

            let failure = (strict && !warnings.is_empty()).then(|| ConfigError::ValidationError {
                path: display.clone(),
                errors: result.warnings.iter().map(strict_issue).collect(),
            });
            let report = FileReport {
                path: display,
                valid: failure.is_none(),
                errors: Vec::new(),
                warnings,
            };
            (report, failure)
        }
        Err(err) => {
            let errors = match &err {
                ConfigError::ValidationError { errors, .. } => {
                    errors.iter().map(ToString::to_string).collect()
                }
                other => vec![other.to_string()],
            };
            let report = FileReport {
                path: display,
                valid: false,
                errors,
                warnings: Vec::new(),
            };
            (report, Some(err))
        }
    }
}

fn format_warning(warning: &LoadWarning) -> String {
    match &warning.location {
        Some(location) => format!("warning: {} at {location}", warning.message),
        None => format!("warning: {}", warning.message),
    }
}

/// Promotes a warning to an error for `--strict`.
fn strict_issue(warning: &LoadWarning) -> ValidationIssue {
    ValidationIssue {
        path: warning.location.clone().unwrap_or_default(),
        message: warning.message.clone(),
        severity: Severity::Error,
    }
}

fn print_human(report: &Report) {
    for file in &report.files {
        let status = if file.valid { "valid" } else { "invalid" };
        println!("{}: {status}", file.path);
        for line in file.errors.iter().chain(&file.warnings) {
            println!("  {line}");
        }
    }
    println!(
        "{} file(s) checked, {} valid, {} invalid",
        report.summary.total, report.summary.valid, report.summary.invalid
    );
}
