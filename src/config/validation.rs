//! Schema validation
//!
//! Checks the raw YAML tree, after imports have been merged, against the
//! fixed four-section schema. Validation runs before anything is
//! deserialized so that every issue can name the exact node it concerns.
//!
//! Validation collects ALL errors (doesn't stop at first) to provide
//! comprehensive feedback to users.

use serde_yaml::{Mapping, Value};

use crate::config::schema::{Section, closest};
use crate::error::{Severity, ValidationIssue};

// ============================================================================
// Public API
// ============================================================================

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Schema validator for configuration documents.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a document root and returns every issue found.
    pub fn validate(&mut self, root: &Value) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        match root {
            Value::Mapping(map) => {
                self.validate_root_keys(map);
                for section in Section::ALL {
                    match map.get(section.as_str()) {
                        Some(value) => self.validate_section(section, value),
                        None => self.add_error(
                            section.as_str(),
                            &format!("missing required section '{section}'"),
                        ),
                    }
                }
            }
            other => self.add_error("", &format!("expected mapping, found {}", kind(other))),
        }

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Root
    // ========================================================================

    /// Rejects any top-level key that is not one of the sections.
    fn validate_root_keys(&mut self, map: &Mapping) {
        for key in map.keys() {
            let Some(name) = key.as_str() else {
                self.add_error(
                    &describe_key(key),
                    &format!("top-level keys must be strings, found {}", kind(key)),
                );
                continue;
            };

            if Section::from_key(name).is_some() {
                continue;
            }

            let message = closest(name, Section::ALL.map(Section::as_str)).map_or_else(
                || format!("unknown section '{name}'"),
                |s| format!("unknown section '{name}' (did you mean '{s}'?)"),
            );
            self.add_error(name, &message);
        }
    }

    // ========================================================================
    // Sections
    // ========================================================================

    fn validate_section(&mut self, section: Section, value: &Value) {
        let path = section.as_str();
        let map = match value {
            Value::Null => {
                self.add_warning(path, "section is empty");
                return;
            }
            Value::Mapping(map) => map,
            other => {
                self.add_error(path, &format!("expected mapping, found {}", kind(other)));
                return;
            }
        };

        if map.is_empty() {
            self.add_warning(path, "section is empty");
        }

        for (key, entry) in map {
            let Some(name) = self.entry_name(path, key) else {
                continue;
            };
            let entry_path = format!("{path}.{name}");

            match section {
                Section::Binaries | Section::Permissions => {
                    self.validate_string_entry(&entry_path, entry);
                }
                Section::Sites => self.validate_site(&entry_path, entry),
                Section::Acls => self.validate_acl(&entry_path, entry),
            }
        }
    }

    /// Checks that a section key is a non-empty string and returns it.
    fn entry_name<'a>(&mut self, path: &str, key: &'a Value) -> Option<&'a str> {
        match key.as_str() {
            Some("") => {
                self.add_error(path, "keys cannot be empty");
                None
            }
            Some(name) => Some(name),
            None => {
                self.add_error(
                    &format!("{path}.{}", describe_key(key)),
                    &format!("keys must be strings, found {}", kind(key)),
                );
                None
            }
        }
    }

    fn validate_string_entry(&mut self, path: &str, value: &Value) {
        match value {
            Value::String(s) if s.is_empty() => self.add_warning(path, "value is empty"),
            Value::String(_) => {}
            other => self.add_error(path, &format!("expected string, found {}", kind(other))),
        }
    }

    /// A site definition is a mapping with string keys, or null for an empty one.
    fn validate_site(&mut self, path: &str, value: &Value) {
        match value {
            Value::Null => {}
            Value::Mapping(definition) => {
                for key in definition.keys() {
                    if !key.is_string() {
                        self.add_error(
                            &format!("{path}.{}", describe_key(key)),
                            &format!("site definition keys must be strings, found {}", kind(key)),
                        );
                    }
                }
            }
            other => self.add_error(
                path,
                &format!("expected site definition mapping, found {}", kind(other)),
            ),
        }
    }

    fn validate_acl(&mut self, path: &str, value: &Value) {
        let Value::Sequence(rules) = value else {
            self.add_error(path, &format!("expected sequence, found {}", kind(value)));
            return;
        };

        if rules.is_empty() {
            self.add_warning(path, "rule list is empty");
        }

        for (idx, rule) in rules.iter().enumerate() {
            if rule.is_null() {
                self.add_error(&format!("{path}[{idx}]"), "rule cannot be null");
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

/// Human-readable name of a YAML node kind.
fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Renders a mapping key for use in an issue path.
fn describe_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "~".to_string(),
        other => format!("<{}>", kind(other)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(yaml: &str) -> ValidationResult {
        let root: Value = serde_yaml::from_str(yaml).unwrap();
        Validator::new().validate(&root)
    }

    fn error_paths(result: &ValidationResult) -> Vec<&str> {
        result.errors.iter().map(|e| e.path.as_str()).collect()
    }

    const VALID: &str = r"
binaries:
  php: /usr/bin/php
sites:
  prod:
    host: example.com
permissions:
  user: www-data
acls:
  ssh: [deploy]
";

    #[test]
    fn test_valid_document() {
        let result = validate(VALID);
        assert!(result.is_valid(), "unexpected errors: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_root_must_be_mapping() {
        let result = validate("- binaries\n- sites\n");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "");
        assert_eq!(result.errors[0].message, "expected mapping, found sequence");
    }

    #[test]
    fn test_missing_acls_section() {
        let result = validate(
            r"
binaries: {}
sites: {}
permissions: {}
",
        );
        assert!(result.has_errors());
        assert_eq!(error_paths(&result), ["acls"]);
        assert_eq!(result.errors[0].message, "missing required section 'acls'");
    }

    #[test]
    fn test_all_sections_missing_reports_each() {
        let result = validate("{}");
        assert_eq!(
            error_paths(&result),
            ["binaries", "sites", "permissions", "acls"]
        );
    }

    #[test]
    fn test_non_string_binary_names_the_key() {
        let result = validate(
            r"
binaries:
  php: /usr/bin/php
  node: [a, b]
sites: {}
permissions: {}
acls: {}
",
        );
        assert_eq!(error_paths(&result), ["binaries.node"]);
        assert_eq!(result.errors[0].message, "expected string, found sequence");
    }

    #[test]
    fn test_integer_permission_is_rejected() {
        let result = validate(
            r"
binaries: {}
sites: {}
permissions:
  mode: 755
acls: {}
",
        );
        assert_eq!(error_paths(&result), ["permissions.mode"]);
        assert_eq!(result.errors[0].message, "expected string, found integer");
    }

    #[test]
    fn test_unknown_section_suggests_name() {
        let result = validate(&format!("{VALID}binaires: {{}}\n"));
        assert_eq!(error_paths(&result), ["binaires"]);
        assert!(result.errors[0].message.contains("did you mean 'binaries'"));
    }

    #[test]
    fn test_unknown_section_without_suggestion() {
        let result = validate(&format!("{VALID}hooks: {{}}\n"));
        assert_eq!(result.errors[0].message, "unknown section 'hooks'");
    }

    #[test]
    fn test_section_of_wrong_type() {
        let result = validate(
            r"
binaries: /usr/bin/php
sites: {}
permissions: {}
acls: {}
",
        );
        assert_eq!(error_paths(&result), ["binaries"]);
        assert_eq!(result.errors[0].message, "expected mapping, found string");
    }

    #[test]
    fn test_null_section_is_empty_with_warning() {
        let result = validate(
            r"
binaries:
sites: {}
permissions: {}
acls: {}
",
        );
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 4);
        assert_eq!(result.warnings[0].path, "binaries");
    }

    #[test]
    fn test_malformed_site_definition() {
        let result = validate(
            r"
binaries: {}
sites:
  prod: example.com
  staging: ~
permissions: {}
acls: {}
",
        );
        assert_eq!(error_paths(&result), ["sites.prod"]);
        assert!(result.errors[0].message.contains("site definition"));
    }

    #[test]
    fn test_site_definition_with_non_string_key() {
        let result = validate(
            r"
binaries: {}
sites:
  prod:
    22: ssh
permissions: {}
acls: {}
",
        );
        assert_eq!(error_paths(&result), ["sites.prod.22"]);
    }

    #[test]
    fn test_acl_must_be_sequence() {
        let result = validate(
            r"
binaries: {}
sites: {}
permissions: {}
acls:
  ssh: deploy
",
        );
        assert_eq!(error_paths(&result), ["acls.ssh"]);
        assert_eq!(result.errors[0].message, "expected sequence, found string");
    }

    #[test]
    fn test_null_acl_rule_is_indexed() {
        let result = validate(
            r"
binaries: {}
sites: {}
permissions: {}
acls:
  ssh: [deploy, ~, admin]
",
        );
        assert_eq!(error_paths(&result), ["acls.ssh[1]"]);
    }

    #[test]
    fn test_non_string_section_key() {
        let result = validate(
            r"
binaries:
  1: /usr/bin/php
sites: {}
permissions: {}
acls: {}
",
        );
        assert_eq!(error_paths(&result), ["binaries.1"]);
        assert_eq!(result.errors[0].message, "keys must be strings, found integer");
    }

    #[test]
    fn test_collects_all_errors() {
        let result = validate(
            r"
binaries:
  php: 7
sites:
  prod: [a]
permissions: {}
extra: true
",
        );
        assert_eq!(
            error_paths(&result),
            ["extra", "binaries.php", "sites.prod", "acls"]
        );
    }

    #[test]
    fn test_empty_values_warn() {
        let result = validate(
            r"
binaries:
  php: ''
sites:
  prod: {}
permissions:
  user: www-data
acls:
  ssh: []
",
        );
        assert!(result.is_valid());
        let paths: Vec<_> = result.warnings.iter().map(|w| w.path.as_str()).collect();
        assert_eq!(paths, ["binaries.php", "acls.ssh"]);
    }
}
