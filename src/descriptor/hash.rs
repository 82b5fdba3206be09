//! Descriptor-set fingerprinting for change detection.
//!
//! This module provides deterministic hashing of descriptor sets so that an
//! emitted plan can be tied to the exact input it was synthesized from.
//! Declaration order is part of the fingerprint: it is the planner's
//! tie-break key, so reordering descriptors is a material change.

use sha2::{Digest, Sha256};

use super::model::{DescriptorSet, PropertyValue, ResourceDescriptor};

/// Hasher for computing descriptor-set fingerprints.
#[derive(Debug, Default)]
pub struct DescriptorHasher;

impl DescriptorHasher {
    /// Creates a new descriptor hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes a fingerprint of the entire descriptor set.
    ///
    /// This fingerprint changes when any descriptor changes, or when the
    /// declaration order changes.
    #[must_use]
    pub fn fingerprint(&self, set: &DescriptorSet) -> String {
        let mut hasher = Sha256::new();

        for descriptor in set {
            hasher.update(self.hash_descriptor(descriptor).as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    /// Computes a hash for a single descriptor.
    #[must_use]
    pub fn hash_descriptor(&self, descriptor: &ResourceDescriptor) -> String {
        let mut hasher = Sha256::new();

        hasher.update(descriptor.id.as_bytes());
        hasher.update(descriptor.kind.as_bytes());

        // Properties in declaration order; order is significant input.
        for (name, value) in &descriptor.properties {
            hasher.update(name.as_bytes());
            match value {
                PropertyValue::Literal(literal) => {
                    hasher.update([0u8]);
                    // serde_json renders object keys sorted, so this is stable.
                    hasher.update(literal.to_string().as_bytes());
                }
                PropertyValue::Reference { target, attribute } => {
                    hasher.update([1u8]);
                    hasher.update(target.as_bytes());
                    hasher.update(attribute.as_bytes());
                }
            }
        }

        for predecessor in &descriptor.depends_on {
            hasher.update(predecessor.as_bytes());
        }

        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::model::{DescriptorSet, PropertyValue, ResourceDescriptor};

    fn sample_set() -> DescriptorSet {
        DescriptorSet::from_descriptors([
            ResourceDescriptor::new("users-table", "table")
                .with_property("billing-mode", PropertyValue::literal("pay-per-request")),
            ResourceDescriptor::new("handler", "function")
                .with_property("table-name", PropertyValue::reference("users-table", "name")),
        ])
        .unwrap()
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let hasher = DescriptorHasher::new();
        assert_eq!(
            hasher.fingerprint(&sample_set()),
            hasher.fingerprint(&sample_set())
        );
    }

    #[test]
    fn test_fingerprint_changes_on_property_edit() {
        let hasher = DescriptorHasher::new();
        let edited = DescriptorSet::from_descriptors([
            ResourceDescriptor::new("users-table", "table")
                .with_property("billing-mode", PropertyValue::literal("provisioned")),
            ResourceDescriptor::new("handler", "function")
                .with_property("table-name", PropertyValue::reference("users-table", "name")),
        ])
        .unwrap();

        assert_ne!(
            hasher.fingerprint(&sample_set()),
            hasher.fingerprint(&edited)
        );
    }

    #[test]
    fn test_fingerprint_changes_on_reorder() {
        let hasher = DescriptorHasher::new();
        let reordered = DescriptorSet::from_descriptors([
            ResourceDescriptor::new("handler", "function")
                .with_property("table-name", PropertyValue::reference("users-table", "name")),
            ResourceDescriptor::new("users-table", "table")
                .with_property("billing-mode", PropertyValue::literal("pay-per-request")),
        ])
        .unwrap();

        assert_ne!(
            hasher.fingerprint(&sample_set()),
            hasher.fingerprint(&reordered)
        );
    }

    #[test]
    fn test_literal_and_reference_hash_differently() {
        let hasher = DescriptorHasher::new();
        let literal = ResourceDescriptor::new("a", "table")
            .with_property("value", PropertyValue::literal("x"));
        let reference = ResourceDescriptor::new("a", "table")
            .with_property("value", PropertyValue::reference("x", ""));

        assert_ne!(
            hasher.hash_descriptor(&literal),
            hasher.hash_descriptor(&reference)
        );
    }
}
