//! Deployable site entity.

use serde::{Serialize, Serializer};
use serde_yaml::{Mapping, Value};

/// Raw definition block of a site, as written under `sites.<name>`.
pub type SiteDefinition = Mapping;

/// One deployable target, built from its name and raw definition.
///
/// The definition is kept verbatim; interpreting its fields is up to the
/// code that performs the deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    name: String,
    definition: SiteDefinition,
}

impl Site {
    /// Creates a site from its name and definition block.
    #[must_use]
    pub fn new(name: impl Into<String>, definition: SiteDefinition) -> Self {
        Self {
            name: name.into(),
            definition,
        }
    }

    /// Name under which the site was declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw definition block.
    #[must_use]
    pub const fn definition(&self) -> &SiteDefinition {
        &self.definition
    }

    /// Returns the value stored under `key` in the definition.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.definition.get(key)
    }

    /// Returns the value under `key` if it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}

/// Serializes as the bare definition so a dumped [`crate::config::Config`]
/// reads like the file it came from.
impl Serialize for Site {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.definition.serialize(serializer)
    }
}
