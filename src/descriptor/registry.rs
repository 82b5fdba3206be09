//! Output registry: which output attributes each resource kind exposes.
//!
//! The registry is collaborator-supplied configuration. The engine never
//! computes output schemas; it only enumerates them when resolving a
//! descriptor's outputs and validating kind tags.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Built-in resource kinds and the output attributes each exposes once
/// provisioned. Stack files can extend this table with their own entries.
const BUILTIN_KINDS: &[(&str, &[&str])] = &[
    ("identity-pool", &["id", "arn", "provider-url"]),
    ("identity-pool-client", &["id"]),
    ("identity-pool-domain", &["domain"]),
    ("table", &["name", "arn", "stream-arn"]),
    ("function", &["name", "arn"]),
    ("layer", &["arn"]),
    ("rest-api", &["id", "root-resource-id", "execution-arn"]),
    ("api-key", &["id"]),
    ("usage-plan", &["id"]),
    ("authorizer", &["id"]),
    ("method", &["id"]),
];

/// A single registry entry, as written in a stack file's `registry:` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryEntry {
    /// The kind tag.
    pub kind: String,
    /// Output attribute names the kind exposes.
    pub outputs: Vec<String>,
}

/// Finite kind → output-attribute-names mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRegistry {
    /// Output attribute names keyed by kind, in registration order.
    kinds: IndexMap<String, Vec<String>>,
}

impl OutputRegistry {
    /// Creates a registry preloaded with the built-in kinds.
    #[must_use]
    pub fn builtin() -> Self {
        let kinds = BUILTIN_KINDS
            .iter()
            .map(|(kind, outputs)| {
                (
                    (*kind).to_string(),
                    outputs.iter().map(|o| (*o).to_string()).collect(),
                )
            })
            .collect();
        Self { kinds }
    }

    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            kinds: IndexMap::new(),
        }
    }

    /// Registers a kind, replacing any previous entry for the same tag.
    pub fn register(&mut self, kind: impl Into<String>, outputs: Vec<String>) {
        self.kinds.insert(kind.into(), outputs);
    }

    /// Merges stack-file entries into this registry.
    pub fn extend_from_entries(&mut self, entries: impl IntoIterator<Item = RegistryEntry>) {
        for entry in entries {
            self.register(entry.kind, entry.outputs);
        }
    }

    /// Returns true if the kind tag is known.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Returns the output attribute names for a kind.
    #[must_use]
    pub fn outputs(&self, kind: &str) -> Option<&[String]> {
        self.kinds.get(kind).map(Vec::as_slice)
    }

    /// Returns true if the kind exposes the named output attribute.
    #[must_use]
    pub fn has_output(&self, kind: &str, attribute: &str) -> bool {
        self.outputs(kind)
            .is_some_and(|outputs| outputs.iter().any(|o| o == attribute))
    }

    /// Iterates over all registered kinds and their outputs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.kinds.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns the number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns true if no kinds are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for OutputRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_kinds_present() {
        let registry = OutputRegistry::builtin();
        assert!(registry.contains("table"));
        assert!(registry.contains("authorizer"));
        assert!(!registry.contains("quantum-queue"));
    }

    #[test]
    fn test_outputs_enumerated() {
        let registry = OutputRegistry::builtin();
        let outputs = registry.outputs("table").unwrap();
        assert!(outputs.contains(&String::from("name")));
        assert!(outputs.contains(&String::from("arn")));
    }

    #[test]
    fn test_has_output() {
        let registry = OutputRegistry::builtin();
        assert!(registry.has_output("function", "arn"));
        assert!(!registry.has_output("function", "stream-arn"));
        assert!(!registry.has_output("unknown-kind", "arn"));
    }

    #[test]
    fn test_extension_replaces_entry() {
        let mut registry = OutputRegistry::builtin();
        registry.extend_from_entries([RegistryEntry {
            kind: String::from("table"),
            outputs: vec![String::from("name")],
        }]);
        assert_eq!(registry.outputs("table").unwrap(), [String::from("name")]);
    }
}
