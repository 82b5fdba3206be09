//! Deployment plan types.
//!
//! This module defines the structure of deployment plans: ordered batches of
//! resources safe to provision concurrently, with resolved property bindings
//! marked as static or deferred.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A resolved property binding carried in an emitted plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "binding", rename_all = "lowercase")]
pub enum Binding {
    /// Value known at plan time.
    Static {
        /// The literal value.
        value: serde_json::Value,
    },
    /// Value only knowable after the source resource is provisioned.
    /// Substituted by the executor once the source reports its outputs.
    Deferred {
        /// Id of the resource whose output is consumed.
        source: String,
        /// Name of the consumed output attribute.
        attribute: String,
    },
}

/// One resource entry in a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedResource {
    /// Resource id.
    pub id: String,
    /// Resource kind tag.
    pub kind: String,
    /// Resolved properties with explicit static/deferred markers.
    pub properties: IndexMap<String, Binding>,
    /// Output attribute names this resource will expose once provisioned.
    pub outputs: Vec<String>,
}

/// A set of resources with no ordering dependency among them.
///
/// The executor may provision a batch's members concurrently, but must not
/// begin a later batch until the entire earlier batch completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Batch {
    /// Resources in this batch, in declaration order.
    pub resources: Vec<PlannedResource>,
}

/// A complete deployment plan.
///
/// `plan_id` and `created_at` identify one synthesis run and are excluded
/// from serialization: the emitted document is byte-identical across runs
/// for identical input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentPlan {
    /// Unique id for this synthesis run.
    #[serde(skip, default = "Uuid::new_v4")]
    pub plan_id: Uuid,
    /// When the plan was created.
    #[serde(skip, default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Name of the stack this plan was synthesized from, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Fingerprint of the descriptor set this plan is based on.
    pub fingerprint: String,
    /// Ordered batches; every dependency edge crosses a batch boundary
    /// forwards.
    pub batches: Vec<Batch>,
}

impl Binding {
    /// Returns true if this binding is deferred to execution time.
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred { .. })
    }
}

impl Batch {
    /// Returns the resource ids in this batch.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.id.as_str()).collect()
    }

    /// Returns the number of resources in this batch.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl DeploymentPlan {
    /// Creates an empty plan for the given fingerprint.
    #[must_use]
    pub fn empty(fingerprint: impl Into<String>) -> Self {
        Self {
            plan_id: Uuid::new_v4(),
            created_at: Utc::now(),
            stack: None,
            fingerprint: fingerprint.into(),
            batches: vec![],
        }
    }

    /// Returns true if the plan contains no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Returns the number of batches.
    #[must_use]
    pub const fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Returns the total number of planned resources.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }

    /// Returns the batch index holding the given resource id.
    #[must_use]
    pub fn batch_index_of(&self, id: &str) -> Option<usize> {
        self.batches
            .iter()
            .position(|batch| batch.resources.iter().any(|r| r.id == id))
    }

    /// Iterates over all planned resources in batch order.
    pub fn resources(&self) -> impl Iterator<Item = &PlannedResource> {
        self.batches.iter().flat_map(|b| b.resources.iter())
    }

    /// Returns the number of deferred bindings across the whole plan.
    #[must_use]
    pub fn deferred_count(&self) -> usize {
        self.resources()
            .flat_map(|r| r.properties.values())
            .filter(|b| b.is_deferred())
            .count()
    }
}

impl std::fmt::Display for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static { value } => write!(f, "{value}"),
            Self::Deferred { source, attribute } => write!(f, "${{{source}.{attribute}}}"),
        }
    }
}

impl std::fmt::Display for DeploymentPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.batches.is_empty() {
            return write!(f, "Empty plan (no resources)");
        }

        writeln!(
            f,
            "Deployment plan {} ({} resources in {} batches):",
            self.plan_id,
            self.resource_count(),
            self.batch_count()
        )?;
        for (i, batch) in self.batches.iter().enumerate() {
            writeln!(f, "  Batch {}: {}", i + 1, batch.ids().join(", "))?;
        }
        Ok(())
    }
}
