//! Descriptor model types for declarative resource stacks.
//!
//! This module defines the structs that describe one provisionable resource
//! and the ordered, uniqueness-enforcing collection they live in. These types
//! are declarative and fully describe the desired stack; nothing here knows
//! how any resource is actually provisioned.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, Result, SynthError};

/// Declarative definition of one provisionable resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceDescriptor {
    /// Unique id for the resource within this stack. Assigned at creation,
    /// immutable afterwards.
    pub id: String,
    /// Resource kind tag, validated against the output registry.
    pub kind: String,
    /// Declared properties: literals or references to other resources'
    /// output attributes.
    #[serde(default)]
    pub properties: IndexMap<String, PropertyValue>,
    /// Ids of resources that must deploy strictly before this one.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// A single declared property value.
///
/// References serialize as `{ref: <id>, attribute: <name>}` in stack files;
/// anything else is an opaque literal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Reference to another resource's output attribute.
    Reference {
        /// Id of the referenced resource.
        #[serde(rename = "ref")]
        target: String,
        /// Name of the referenced output attribute.
        attribute: String,
    },
    /// Opaque literal value (string, number, boolean, nested structure).
    Literal(serde_json::Value),
}

impl ResourceDescriptor {
    /// Creates a descriptor with no properties and no explicit predecessors.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            properties: IndexMap::new(),
            depends_on: Vec::new(),
        }
    }

    /// Adds a property to the descriptor.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Adds an explicit predecessor constraint.
    #[must_use]
    pub fn with_predecessor(mut self, id: impl Into<String>) -> Self {
        self.depends_on.push(id.into());
        self
    }

    /// Iterates over the references declared in this descriptor's properties.
    pub fn references(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.values().filter_map(|v| match v {
            PropertyValue::Reference { target, attribute } => {
                Some((target.as_str(), attribute.as_str()))
            }
            PropertyValue::Literal(_) => None,
        })
    }
}

impl PropertyValue {
    /// Creates a literal property value.
    #[must_use]
    pub fn literal(value: impl Into<serde_json::Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Creates a reference to another resource's output attribute.
    #[must_use]
    pub fn reference(target: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::Reference {
            target: target.into(),
            attribute: attribute.into(),
        }
    }

    /// Returns true if this value is a cross-resource reference.
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }
}

/// Ordered collection of resource descriptors with unique ids.
///
/// Declaration order is significant: it is the tie-break key the planner
/// uses for resources with no ordering constraint between them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorSet {
    /// Descriptors keyed by id, in declaration order.
    descriptors: IndexMap<String, ResourceDescriptor>,
}

impl DescriptorSet {
    /// Creates an empty descriptor set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptors: IndexMap::new(),
        }
    }

    /// Inserts a descriptor, preserving declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::DuplicateId`] if a descriptor with the same
    /// id was already inserted. Uniqueness is enforced here, before synthesis
    /// ever begins.
    pub fn insert(&mut self, descriptor: ResourceDescriptor) -> Result<()> {
        if self.descriptors.contains_key(&descriptor.id) {
            return Err(SynthError::Descriptor(DescriptorError::duplicate(
                &descriptor.id,
            )));
        }
        self.descriptors.insert(descriptor.id.clone(), descriptor);
        Ok(())
    }

    /// Builds a set from descriptors in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error on the first duplicate id.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = ResourceDescriptor>,
    ) -> Result<Self> {
        let mut set = Self::new();
        for descriptor in descriptors {
            set.insert(descriptor)?;
        }
        Ok(set)
    }

    /// Looks up a descriptor by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ResourceDescriptor> {
        self.descriptors.get(id)
    }

    /// Returns true if a descriptor with the given id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.descriptors.contains_key(id)
    }

    /// Returns the declaration index of the given id.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.descriptors.get_index_of(id)
    }

    /// Iterates descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.descriptors.values()
    }

    /// Returns the number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if the set holds no descriptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl<'a> IntoIterator for &'a DescriptorSet {
    type Item = &'a ResourceDescriptor;
    type IntoIter = indexmap::map::Values<'a, String, ResourceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.values()
    }
}
