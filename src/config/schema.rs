//! Configuration schema and the materialized [`Config`] object.
//!
//! The document has exactly four required top-level sections:
//!
//! ```yaml
//! binaries:
//!   php: /usr/bin/php
//! sites:
//!   prod:
//!     host: example.com
//! permissions:
//!   user: www-data
//! acls:
//!   ssh: [deploy]
//! ```
//!
//! Shapes are checked by [`crate::config::Validator`] against the raw YAML
//! tree before anything here is constructed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::loader::ConfigLoader;
use crate::config::site::{Site, SiteDefinition};
use crate::error::{ConfigError, LookupError};

/// A single ACL rule. Its shape is owned by whatever consumes the ACL.
pub type AclRule = serde_yaml::Value;

/// Upper bound on the edit distance for "did you mean" suggestions.
pub(crate) const SUGGESTION_DISTANCE: usize = 3;

// ============================================================================
// Sections
// ============================================================================

/// One of the four top-level sections of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// `binaries`: name → executable path
    Binaries,
    /// `sites`: name → site definition
    Sites,
    /// `permissions`: type → value
    Permissions,
    /// `acls`: type → rule list
    Acls,
}

impl Section {
    /// All sections in document order.
    pub const ALL: [Self; 4] = [Self::Binaries, Self::Sites, Self::Permissions, Self::Acls];

    /// Key of the section in the document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binaries => "binaries",
            Self::Sites => "sites",
            Self::Permissions => "permissions",
            Self::Acls => "acls",
        }
    }

    /// Name of a single entry, used in lookup errors.
    #[must_use]
    pub const fn singular(self) -> &'static str {
        match self {
            Self::Binaries => "binary",
            Self::Sites => "site",
            Self::Permissions => "permission",
            Self::Acls => "acl",
        }
    }

    /// Resolves a document key to its section.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == key)
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the candidate closest to `input`, if within [`SUGGESTION_DISTANCE`].
pub(crate) fn closest<'a>(
    input: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    candidates
        .into_iter()
        .map(|c| (c, strsim::damerau_levenshtein(input, c)))
        .filter(|(_, dist)| *dist <= SUGGESTION_DISTANCE)
        .min_by_key(|(_, dist)| *dist)
        .map(|(c, _)| c)
}

// ============================================================================
// Raw Document
// ============================================================================

/// Typed view of a document that has already passed schema validation.
///
/// Null sections and null site definitions deserialize as empty.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Document {
    pub binaries: Option<IndexMap<String, String>>,
    pub sites: Option<IndexMap<String, Option<SiteDefinition>>>,
    pub permissions: Option<IndexMap<String, String>>,
    pub acls: Option<IndexMap<String, Vec<AclRule>>>,
}

// ============================================================================
// Config
// ============================================================================

/// Validated, queryable deployment configuration.
///
/// Built once by [`ConfigLoader`]; every section may afterwards be replaced
/// wholesale through its setter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Config {
    binaries: IndexMap<String, String>,
    sites: IndexMap<String, Site>,
    permissions: IndexMap<String, String>,
    acls: IndexMap<String, Vec<AclRule>>,
}

impl Config {
    /// Loads and validates the configuration at `path` with default loader options.
    ///
    /// Load warnings are emitted as `tracing` warnings.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is missing, unreadable,
    /// unparsable, or does not conform to the schema.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let result = ConfigLoader::with_defaults().load(path.as_ref())?;
        for warning in &result.warnings {
            tracing::warn!(
                location = warning.location.as_deref().unwrap_or("<unknown>"),
                "{}",
                warning.message
            );
        }
        Ok(result.config)
    }

    /// Builds a configuration from a validated document, one `Site` per entry.
    pub(crate) fn from_document(document: Document) -> Self {
        let sites = document
            .sites
            .unwrap_or_default()
            .into_iter()
            .map(|(name, definition)| {
                let site = Site::new(name.clone(), definition.unwrap_or_default());
                (name, site)
            })
            .collect();

        Self {
            binaries: document.binaries.unwrap_or_default(),
            sites,
            permissions: document.permissions.unwrap_or_default(),
            acls: document.acls.unwrap_or_default(),
        }
    }

    // ------------------------------------------------------------------------
    // Binaries
    // ------------------------------------------------------------------------

    /// Returns the path configured for binary `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NotFound`] if no such binary is configured.
    pub fn binary(&self, name: &str) -> Result<&str, LookupError> {
        self.binaries
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| not_found(Section::Binaries, name, self.binaries.keys()))
    }

    /// All configured binaries.
    #[must_use]
    pub const fn binaries(&self) -> &IndexMap<String, String> {
        &self.binaries
    }

    /// Replaces the binaries section.
    pub fn set_binaries(&mut self, binaries: IndexMap<String, String>) -> &mut Self {
        self.binaries = binaries;
        self
    }

    // ------------------------------------------------------------------------
    // Sites
    // ------------------------------------------------------------------------

    /// Returns the named site, or `None` when it is not configured.
    ///
    /// Unlike the other keyed accessors this never fails; callers routinely
    /// branch on whether a site exists.
    #[must_use]
    pub fn site(&self, name: &str) -> Option<&Site> {
        self.sites.get(name)
    }

    /// Returns `true` if a site with this name is configured.
    #[must_use]
    pub fn has_site(&self, name: &str) -> bool {
        self.sites.contains_key(name)
    }

    /// Site names in document order.
    pub fn site_names(&self) -> impl Iterator<Item = &str> {
        self.sites.keys().map(String::as_str)
    }

    /// Inserts or replaces a single site.
    pub fn set_site(&mut self, name: impl Into<String>, site: Site) -> &mut Self {
        self.sites.insert(name.into(), site);
        self
    }

    /// All configured sites.
    #[must_use]
    pub const fn sites(&self) -> &IndexMap<String, Site> {
        &self.sites
    }

    /// Replaces the sites section.
    pub fn set_sites(&mut self, sites: IndexMap<String, Site>) -> &mut Self {
        self.sites = sites;
        self
    }

    // ------------------------------------------------------------------------
    // Permissions
    // ------------------------------------------------------------------------

    /// Returns the value of permission `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NotFound`] if the permission is not configured.
    pub fn permission(&self, kind: &str) -> Result<&str, LookupError> {
        self.permissions
            .get(kind)
            .map(String::as_str)
            .ok_or_else(|| not_found(Section::Permissions, kind, self.permissions.keys()))
    }

    /// All configured permissions.
    #[must_use]
    pub const fn permissions(&self) -> &IndexMap<String, String> {
        &self.permissions
    }

    /// Replaces the permissions section.
    pub fn set_permissions(&mut self, permissions: IndexMap<String, String>) -> &mut Self {
        self.permissions = permissions;
        self
    }

    // ------------------------------------------------------------------------
    // ACLs
    // ------------------------------------------------------------------------

    /// Returns the rules of ACL `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NotFound`] if the ACL is not configured.
    pub fn acl(&self, kind: &str) -> Result<&[AclRule], LookupError> {
        self.acls
            .get(kind)
            .map(Vec::as_slice)
            .ok_or_else(|| not_found(Section::Acls, kind, self.acls.keys()))
    }

    /// All configured ACLs.
    #[must_use]
    pub const fn acls(&self) -> &IndexMap<String, Vec<AclRule>> {
        &self.acls
    }

    /// Replaces the ACLs section.
    pub fn set_acls(&mut self, acls: IndexMap<String, Vec<AclRule>>) -> &mut Self {
        self.acls = acls;
        self
    }
}

fn not_found<'a>(
    section: Section,
    key: &str,
    existing: impl IntoIterator<Item = &'a String>,
) -> LookupError {
    LookupError::NotFound {
        section,
        key: key.to_string(),
        suggestion: closest(key, existing.into_iter().map(String::as_str)).map(str::to_string),
    }
}

// ============================================================================
// Tests
// ============================================================================
