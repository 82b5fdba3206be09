//! Attribute resolver for descriptor sets.
//!
//! This module computes, for each descriptor, the resolved view the planner
//! works from: property bindings with references turned into explicit
//! deferred markers, and the output attributes the resource will expose once
//! provisioned. Resolution is a pure function of the descriptor set and the
//! output registry.

use indexmap::IndexMap;
use tracing::debug;

use crate::descriptor::{DescriptorSet, OutputRegistry, PropertyValue};
use crate::error::{DescriptorError, ResolveError, Result, SynthError};

use super::plan::Binding;

/// Engine for resolving descriptor attributes.
#[derive(Debug, Default)]
pub struct AttributeResolver;

/// Read-only resolved view of one descriptor.
///
/// Created per planning pass and discarded after the plan is emitted; never
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedResource {
    /// Resource id.
    pub id: String,
    /// Resource kind tag.
    pub kind: String,
    /// Fully-substituted property bindings.
    pub properties: IndexMap<String, Binding>,
    /// Output attributes, name → placeholder token (`${id.attribute}`).
    /// Real values exist only after the executor provisions the resource.
    pub outputs: IndexMap<String, String>,
}

impl AttributeResolver {
    /// Creates a new attribute resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolves every descriptor in the set, in declaration order.
    ///
    /// # Errors
    ///
    /// Fails fast with the first resolution error encountered:
    /// - [`ResolveError::SelfReference`] if a descriptor references its own id
    /// - [`ResolveError::UnknownReference`] if a reference target is absent
    ///   from the set
    /// - [`ResolveError::UnknownOutput`] if a reference names an output the
    ///   target kind never exposes
    pub fn resolve(
        &self,
        set: &DescriptorSet,
        registry: &OutputRegistry,
    ) -> Result<Vec<ResolvedResource>> {
        let mut resolved = Vec::with_capacity(set.len());

        for descriptor in set {
            resolved.push(Self::resolve_one(descriptor, set, registry)?);
        }

        debug!("Resolved {} descriptors", resolved.len());
        Ok(resolved)
    }

    /// Resolves a single descriptor.
    fn resolve_one(
        descriptor: &crate::descriptor::ResourceDescriptor,
        set: &DescriptorSet,
        registry: &OutputRegistry,
    ) -> Result<ResolvedResource> {
        let mut properties = IndexMap::with_capacity(descriptor.properties.len());

        for (name, value) in &descriptor.properties {
            let binding = match value {
                PropertyValue::Literal(literal) => Binding::Static {
                    value: literal.clone(),
                },
                PropertyValue::Reference { target, attribute } => {
                    Self::resolve_reference(descriptor, target, attribute, set, registry)?
                }
            };
            properties.insert(name.clone(), binding);
        }

        let outputs = Self::enumerate_outputs(descriptor, registry)?;

        Ok(ResolvedResource {
            id: descriptor.id.clone(),
            kind: descriptor.kind.clone(),
            properties,
            outputs,
        })
    }

    /// Resolves one reference property into a deferred binding.
    fn resolve_reference(
        descriptor: &crate::descriptor::ResourceDescriptor,
        target: &str,
        attribute: &str,
        set: &DescriptorSet,
        registry: &OutputRegistry,
    ) -> Result<Binding> {
        // A resource cannot consume its own not-yet-existing output.
        if target == descriptor.id {
            return Err(SynthError::Resolve(ResolveError::SelfReference {
                id: descriptor.id.clone(),
            }));
        }

        let Some(target_descriptor) = set.get(target) else {
            return Err(SynthError::Resolve(ResolveError::UnknownReference {
                id: descriptor.id.clone(),
                target: target.to_string(),
            }));
        };

        if !registry.has_output(&target_descriptor.kind, attribute) {
            return Err(SynthError::Resolve(ResolveError::UnknownOutput {
                id: descriptor.id.clone(),
                target: target.to_string(),
                attribute: attribute.to_string(),
            }));
        }

        Ok(Binding::Deferred {
            source: target.to_string(),
            attribute: attribute.to_string(),
        })
    }

    /// Enumerates the output placeholders for a descriptor's kind.
    fn enumerate_outputs(
        descriptor: &crate::descriptor::ResourceDescriptor,
        registry: &OutputRegistry,
    ) -> Result<IndexMap<String, String>> {
        let Some(names) = registry.outputs(&descriptor.kind) else {
            return Err(SynthError::Descriptor(DescriptorError::UnknownKind {
                id: descriptor.id.clone(),
                kind: descriptor.kind.clone(),
            }));
        };

        Ok(names
            .iter()
            .map(|name| {
                (
                    name.clone(),
                    format!("${{{id}.{name}}}", id = descriptor.id),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{PropertyValue, ResourceDescriptor};

    fn registry() -> OutputRegistry {
        OutputRegistry::builtin()
    }

    #[test]
    fn test_literal_becomes_static_binding() {
        let set = DescriptorSet::from_descriptors([ResourceDescriptor::new(
            "users-table",
            "table",
        )
        .with_property("billing-mode", PropertyValue::literal("pay-per-request"))])
        .unwrap();

        let resolved = AttributeResolver::new().resolve(&set, &registry()).unwrap();
        assert_eq!(
            resolved[0].properties.get("billing-mode"),
            Some(&Binding::Static {
                value: serde_json::json!("pay-per-request")
            })
        );
    }

    #[test]
    fn test_reference_becomes_deferred_binding() {
        let set = DescriptorSet::from_descriptors([
            ResourceDescriptor::new("users-table", "table"),
            ResourceDescriptor::new("handler", "function")
                .with_property("table-name", PropertyValue::reference("users-table", "name")),
        ])
        .unwrap();

        let resolved = AttributeResolver::new().resolve(&set, &registry()).unwrap();
        assert_eq!(
            resolved[1].properties.get("table-name"),
            Some(&Binding::Deferred {
                source: String::from("users-table"),
                attribute: String::from("name"),
            })
        );
    }

    #[test]
    fn test_outputs_enumerated_as_placeholders() {
        let set = DescriptorSet::from_descriptors([ResourceDescriptor::new(
            "users-table",
            "table",
        )])
        .unwrap();

        let resolved = AttributeResolver::new().resolve(&set, &registry()).unwrap();
        assert_eq!(
            resolved[0].outputs.get("name"),
            Some(&String::from("${users-table.name}"))
        );
        assert_eq!(
            resolved[0].outputs.get("arn"),
            Some(&String::from("${users-table.arn}"))
        );
    }

    #[test]
    fn test_self_reference_rejected() {
        let set = DescriptorSet::from_descriptors([ResourceDescriptor::new("api", "rest-api")
            .with_property("self-id", PropertyValue::reference("api", "id"))])
        .unwrap();

        let err = AttributeResolver::new()
            .resolve(&set, &registry())
            .unwrap_err();
        assert!(matches!(
            err,
            SynthError::Resolve(ResolveError::SelfReference { ref id }) if id == "api"
        ));
    }

    #[test]
    fn test_unknown_reference_names_dangling_id() {
        let set = DescriptorSet::from_descriptors([ResourceDescriptor::new(
            "handler",
            "function",
        )
        .with_property("table-name", PropertyValue::reference("ghost-table", "name"))])
        .unwrap();

        let err = AttributeResolver::new()
            .resolve(&set, &registry())
            .unwrap_err();
        assert!(matches!(
            err,
            SynthError::Resolve(ResolveError::UnknownReference { ref target, .. })
                if target == "ghost-table"
        ));
    }

    #[test]
    fn test_unknown_output_rejected() {
        let set = DescriptorSet::from_descriptors([
            ResourceDescriptor::new("users-table", "table"),
            ResourceDescriptor::new("handler", "function").with_property(
                "table-endpoint",
                PropertyValue::reference("users-table", "endpoint"),
            ),
        ])
        .unwrap();

        let err = AttributeResolver::new()
            .resolve(&set, &registry())
            .unwrap_err();
        assert!(matches!(
            err,
            SynthError::Resolve(ResolveError::UnknownOutput { ref attribute, .. })
                if attribute == "endpoint"
        ));
    }

    #[test]
    fn test_empty_set_resolves_to_nothing() {
        let resolved = AttributeResolver::new()
            .resolve(&DescriptorSet::new(), &registry())
            .unwrap();
        assert!(resolved.is_empty());
    }
}
