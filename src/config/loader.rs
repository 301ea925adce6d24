//! Configuration loader
//!
//! This module implements the configuration loading pipeline:
//! 1. Size check and read (BOM stripped)
//! 2. Environment variable expansion (pre-parse, on raw text)
//! 3. YAML parsing
//! 4. `imports` resolution and merging
//! 5. Schema validation
//! 6. Deserialization and `Site` construction

use crate::config::schema::{Config, Document};
use crate::config::validation::Validator;
use crate::error::ConfigError;

use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Top-level key holding the import list.
const IMPORTS_KEY: &str = "imports";

/// Label used in errors for documents loaded from memory.
const INLINE_SOURCE: &str = "<inline>";

// ============================================================================
// Public API
// ============================================================================

/// Options for the configuration loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Directory against which the root document's relative imports resolve.
    ///
    /// `None` uses the directory containing the configuration file.
    pub import_root: Option<PathBuf>,

    /// Limits for configuration size and import nesting.
    pub limits: ConfigLimits,
}

/// Limits for configuration size to prevent resource exhaustion.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum import nesting depth.
    pub max_import_depth: usize,

    /// Maximum size in bytes of any single configuration file.
    pub max_config_size: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_import_depth: env_or("DEPLOYCONF_MAX_IMPORT_DEPTH", 10),
            max_config_size: env_or("DEPLOYCONF_MAX_CONFIG_SIZE", 1024 * 1024),
        }
    }
}

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: Config,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

/// Configuration loader.
///
/// Handles the full pipeline from YAML file to a validated [`Config`].
/// Parsed import files are cached for the lifetime of the loader.
#[derive(Debug)]
pub struct ConfigLoader {
    options: LoaderOptions,
    import_cache: HashMap<PathBuf, Value>,
}

impl ConfigLoader {
    /// Creates a new configuration loader with the given options.
    #[must_use]
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            options,
            import_cache: HashMap::new(),
        }
    }

    /// Creates a new configuration loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads a configuration file and returns the validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file (or an import) is missing, unreadable or too large
    /// - YAML parsing fails
    /// - Import resolution fails (cycles, depth, malformed entries)
    /// - Schema validation fails
    pub fn load(&mut self, path: &Path) -> Result<LoadResult, ConfigError> {
        tracing::debug!(path = %path.display(), "loading configuration");

        let raw = read_source(path, self.options.limits.max_config_size)?;
        let base_dir = self
            .options
            .import_root
            .clone()
            .unwrap_or_else(|| parent_dir(path));

        // The root file takes part in cycle detection
        let identity = path.canonicalize().map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        self.load_document(&raw, path, &base_dir, Some(identity))
    }

    /// Loads a configuration from in-memory YAML text.
    ///
    /// Relative imports resolve against `LoaderOptions::import_root`, or the
    /// current directory when unset.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`ConfigLoader::load`], minus reading the root file.
    pub fn load_from_str(&mut self, yaml: &str) -> Result<LoadResult, ConfigError> {
        let base_dir = self
            .options
            .import_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let raw = yaml.strip_prefix('\u{feff}').unwrap_or(yaml);
        self.load_document(raw, Path::new(INLINE_SOURCE), &base_dir, None)
    }

    fn load_document(
        &mut self,
        raw: &str,
        source: &Path,
        base_dir: &Path,
        identity: Option<PathBuf>,
    ) -> Result<LoadResult, ConfigError> {
        let mut warnings = Vec::new();

        // Stage 2: Environment variable substitution (before YAML parsing)
        let mut env_sub = EnvSubstitution::new();
        let substituted = env_sub.substitute(raw, source)?;
        warnings.append(&mut env_sub.warnings);

        // Stage 3: YAML parsing
        let root = parse_yaml(&substituted, source)?;
        if root.is_null() {
            return Err(ConfigError::ParseError {
                path: source.to_path_buf(),
                line: None,
                message: "configuration file is empty".to_string(),
            });
        }

        // Stage 4: imports
        let mut resolver = ImportResolver::new(
            self.options.limits.clone(),
            identity.into_iter().collect(),
        );
        let root = resolver.resolve(root, base_dir, &mut self.import_cache)?;
        warnings.append(&mut resolver.warnings);

        // Stage 5: schema validation
        let validation = Validator::new().validate(&root);
        if validation.has_errors() {
            return Err(ConfigError::ValidationError {
                path: source.display().to_string(),
                errors: validation.errors,
            });
        }
        warnings.extend(validation.warnings.into_iter().map(|issue| LoadWarning {
            message: issue.message,
            location: Some(issue.path),
        }));

        // Stage 6: typed sections
        let document: Document =
            serde_yaml::from_value(root).map_err(|e| ConfigError::ParseError {
                path: source.to_path_buf(),
                line: None,
                message: format!("failed to deserialize configuration: {e}"),
            })?;
        let config = Config::from_document(document);

        tracing::info!(
            source = %source.display(),
            binaries = config.binaries().len(),
            sites = config.sites().len(),
            permissions = config.permissions().len(),
            acls = config.acls().len(),
            "configuration loaded"
        );

        Ok(LoadResult { config, warnings })
    }
}

// ============================================================================
// Reading & Parsing
// ============================================================================

/// Reads a configuration file, enforcing the size limit and stripping a BOM.
fn read_source(path: &Path, max_size: usize) -> Result<String, ConfigError> {
    let metadata = std::fs::metadata(path).map_err(|e| io_error(path, e))?;

    let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
    if file_size > max_size {
        return Err(ConfigError::InvalidValue {
            field: "file_size".to_string(),
            value: format!("{file_size} bytes"),
            expected: format!("at most {max_size} bytes"),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    Ok(match content.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => content,
    })
}

fn io_error(path: &Path, source: std::io::Error) -> ConfigError {
    if source.kind() == std::io::ErrorKind::NotFound {
        ConfigError::MissingFile {
            path: path.to_path_buf(),
        }
    } else {
        ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn parse_yaml(text: &str, source: &Path) -> Result<Value, ConfigError> {
    serde_yaml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: source.to_path_buf(),
        line: e.location().map(|l| l.line()),
        message: e.to_string(),
    })
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

// ============================================================================
// Environment Variable Substitution
// ============================================================================

/// Pre-parse environment variable substitution.
///
/// Runs on raw YAML text BEFORE parsing so substituted values take part in
/// YAML type inference.
struct EnvSubstitution {
    warnings: Vec<LoadWarning>,
}

/// What to do when a referenced variable is unset.
enum Fallback {
    Empty,
    Default(String),
    Fail(String),
}

impl EnvSubstitution {
    const fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// Substitutes environment variables in raw YAML text.
    ///
    /// Supports:
    /// - `${VAR}` - expand to value (empty string if unset with warning)
    /// - `${VAR:-default}` - expand to default if unset
    /// - `${VAR:?message}` - fail if unset
    /// - `$$` - literal `$`
    fn substitute(&mut self, raw: &str, source: &Path) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(raw.len());
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                result.push(c);
                continue;
            }

            match chars.peek() {
                Some('$') => {
                    chars.next();
                    result.push('$');
                }
                Some('{') => {
                    chars.next();
                    let body = read_braced(&mut chars).ok_or_else(|| ConfigError::ParseError {
                        path: source.to_path_buf(),
                        line: None,
                        message: "unclosed environment variable reference".to_string(),
                    })?;
                    let (var, fallback) = split_reference(&body);

                    match (std::env::var(var), fallback) {
                        (Ok(value), _) => result.push_str(&value),
                        (Err(_), Fallback::Default(default)) => result.push_str(&default),
                        (Err(_), Fallback::Fail(message)) => {
                            return Err(ConfigError::EnvVarNotSet {
                                var: var.to_string(),
                                message,
                            });
                        }
                        (Err(_), Fallback::Empty) => self.warnings.push(LoadWarning {
                            message: format!(
                                "environment variable '{var}' is not set, using empty string"
                            ),
                            location: Some(source.display().to_string()),
                        }),
                    }
                }
                _ => result.push(c),
            }
        }

        Ok(result)
    }
}

/// Reads up to the matching `}`, allowing nested braces in defaults.
fn read_braced(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let mut body = String::new();
    let mut depth = 1;

    for c in chars.by_ref() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(body);
                }
            }
            _ => {}
        }
        body.push(c);
    }

    None
}

/// Splits `VAR:-default` / `VAR:?message` / `VAR` into name and fallback.
///
/// The split happens at the first `:` followed by `-` or `?`; anything after
/// it belongs to the default or message verbatim.
fn split_reference(body: &str) -> (&str, Fallback) {
    let operator = body.match_indices(':').find_map(|(idx, _)| {
        let kind = *body.as_bytes().get(idx + 1)?;
        matches!(kind, b'-' | b'?').then_some((idx, kind))
    });

    match operator {
        None => (body, Fallback::Empty),
        Some((idx, kind)) => {
            let (var, rest) = (&body[..idx], body[idx + 2..].to_string());
            if kind == b'-' {
                (var, Fallback::Default(rest))
            } else {
                (var, Fallback::Fail(rest))
            }
        }
    }
}

// ============================================================================
// Import Resolution
// ============================================================================

/// One parsed entry of the `imports` list.
struct ImportEntry {
    resource: String,
    ignore_errors: bool,
}

/// Resolves `imports` lists and merges imported documents.
///
/// Imports are merged in declaration order beneath the importing document,
/// so local values always win.
struct ImportResolver {
    limits: ConfigLimits,
    resolution_stack: Vec<PathBuf>,
    /// Nesting level of the document currently being resolved; 0 for the root.
    depth: usize,
    warnings: Vec<LoadWarning>,
}

impl ImportResolver {
    const fn new(limits: ConfigLimits, resolution_stack: Vec<PathBuf>) -> Self {
        Self {
            limits,
            resolution_stack,
            depth: 0,
            warnings: Vec::new(),
        }
    }

    /// Returns `document` with its imports (recursively) merged beneath it.
    fn resolve(
        &mut self,
        document: Value,
        base_dir: &Path,
        cache: &mut HashMap<PathBuf, Value>,
    ) -> Result<Value, ConfigError> {
        let mut map = match document {
            Value::Mapping(map) => map,
            other => return Ok(other),
        };
        let Some(imports) = map.remove(IMPORTS_KEY) else {
            return Ok(Value::Mapping(map));
        };

        let mut merged = Value::Mapping(Mapping::new());
        for (idx, entry) in parse_imports(&imports)?.into_iter().enumerate() {
            let path = resolve_path(base_dir, &entry.resource);
            let identity = match path.canonicalize() {
                Ok(identity) => identity,
                Err(_) if entry.ignore_errors => {
                    self.warnings.push(LoadWarning {
                        message: format!("skipping missing import '{}'", entry.resource),
                        location: Some(path.display().to_string()),
                    });
                    continue;
                }
                Err(e) => return Err(io_error(&path, e)),
            };

            // Cycle detection
            if self.resolution_stack.contains(&identity) {
                let mut cycle = self.resolution_stack.clone();
                cycle.push(identity);
                return Err(ConfigError::CircularImport { cycle });
            }

            // Depth check (the root file is not an import)
            if self.depth >= self.limits.max_import_depth {
                return Err(ConfigError::InvalidValue {
                    field: "imports depth".to_string(),
                    value: format!("{}", self.depth + 1),
                    expected: format!("at most {} levels", self.limits.max_import_depth),
                });
            }

            tracing::debug!(import = %identity.display(), "resolving import");
            let imported = self.load_cached(&identity, cache)?;
            if !imported.is_mapping() {
                return Err(ConfigError::InvalidValue {
                    field: format!("imports[{idx}]"),
                    value: format!("{} ({})", entry.resource, identity.display()),
                    expected: "mapping document".to_string(),
                });
            }

            self.resolution_stack.push(identity.clone());
            self.depth += 1;
            let imported = self.resolve(imported, &parent_dir(&identity), cache);
            self.depth -= 1;
            self.resolution_stack.pop();
            let imported = imported?;

            deep_merge(&mut merged, &imported);
        }

        deep_merge(&mut merged, &Value::Mapping(map));
        Ok(merged)
    }

    /// Loads and parses an import, reusing earlier parses of the same file.
    fn load_cached(
        &mut self,
        path: &Path,
        cache: &mut HashMap<PathBuf, Value>,
    ) -> Result<Value, ConfigError> {
        if let Some(cached) = cache.get(path) {
            return Ok(cached.clone());
        }

        let raw = read_source(path, self.limits.max_config_size)?;

        let mut env_sub = EnvSubstitution::new();
        let substituted = env_sub.substitute(&raw, path)?;
        self.warnings.append(&mut env_sub.warnings);

        let value = match parse_yaml(&substituted, path)? {
            Value::Null => Value::Mapping(Mapping::new()),
            value => value,
        };

        cache.insert(path.to_path_buf(), value.clone());
        Ok(value)
    }
}

/// Parses the `imports` value: a sequence of paths or `{resource, ignore_errors}` mappings.
fn parse_imports(imports: &Value) -> Result<Vec<ImportEntry>, ConfigError> {
    let Value::Sequence(entries) = imports else {
        return Err(ConfigError::InvalidValue {
            field: IMPORTS_KEY.to_string(),
            value: format!("{imports:?}"),
            expected: "sequence of import paths".to_string(),
        });
    };

    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| parse_import_entry(idx, entry))
        .collect()
}

fn parse_import_entry(idx: usize, entry: &Value) -> Result<ImportEntry, ConfigError> {
    let invalid = |field: String, expected: &str| ConfigError::InvalidValue {
        field,
        value: format!("{entry:?}"),
        expected: expected.to_string(),
    };

    match entry {
        Value::String(resource) => Ok(ImportEntry {
            resource: resource.clone(),
            ignore_errors: false,
        }),
        Value::Mapping(map) => {
            for key in map.keys() {
                if !matches!(key.as_str(), Some("resource" | "ignore_errors")) {
                    return Err(invalid(
                        format!("imports[{idx}]"),
                        "only 'resource' and 'ignore_errors' keys",
                    ));
                }
            }

            let resource = map
                .get("resource")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid(format!("imports[{idx}].resource"), "string path"))?;
            let ignore_errors = match map.get("ignore_errors") {
                None => false,
                Some(Value::Bool(b)) => *b,
                Some(_) => {
                    return Err(invalid(format!("imports[{idx}].ignore_errors"), "boolean"));
                }
            };

            Ok(ImportEntry {
                resource: resource.to_string(),
                ignore_errors,
            })
        }
        _ => Err(invalid(
            format!("imports[{idx}]"),
            "string path or mapping with 'resource'",
        )),
    }
}

/// Resolves an import path relative to the importing file's directory.
fn resolve_path(base_dir: &Path, resource: &str) -> PathBuf {
    let path = Path::new(resource);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parses an environment variable with a default value.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Deep merges override into base.
///
/// For mappings: recursively merge keys.
/// For other types: override replaces base.
fn deep_merge(base: &mut Value, override_val: &Value) {
    match (base, override_val) {
        (Value::Mapping(base_map), Value::Mapping(override_map)) => {
            for (key, override_value) in override_map {
                if let Some(base_value) = base_map.get_mut(key) {
                    deep_merge(base_value, override_value);
                } else {
                    base_map.insert(key.clone(), override_value.clone());
                }
            }
        }
        (base, override_val) => {
            *base = override_val.clone();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
