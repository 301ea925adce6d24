//! Configuration module
//!
//! Loads deployment configuration files, validates them against the fixed
//! `binaries` / `sites` / `permissions` / `acls` schema and exposes the
//! result as a queryable [`Config`].

pub mod loader;
pub mod schema;
pub mod site;
pub mod validation;

pub use loader::{ConfigLimits, ConfigLoader, LoadResult, LoadWarning, LoaderOptions};
pub use schema::{AclRule, Config, Section};
pub use site::{Site, SiteDefinition};
pub use validation::{ValidationResult, Validator};
