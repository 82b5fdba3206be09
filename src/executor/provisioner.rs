//! Provisioner seam for plan execution.
//!
//! The synthesis engine never talks to a provider. Anything that can turn a
//! provisioning request into concrete output values plugs in here.

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::Result;

/// Concrete output values reported for one provisioned resource.
pub type ResourceOutputs = IndexMap<String, serde_json::Value>;

/// A fully-substituted provisioning request for one resource.
///
/// By the time a request reaches a provisioner, every deferred binding has
/// been replaced with the concrete value reported by an earlier batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionRequest {
    /// Resource id.
    pub id: String,
    /// Resource kind tag.
    pub kind: String,
    /// Properties with all bindings substituted.
    pub properties: IndexMap<String, serde_json::Value>,
    /// Output attribute names the provisioner is expected to report.
    pub outputs: Vec<String>,
}

/// Provisions one resource and reports its concrete outputs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Provisions the resource described by `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if provisioning fails; the runner marks the batch
    /// failed and starts no later batch.
    async fn provision(&self, request: ProvisionRequest) -> Result<ResourceOutputs>;
}

/// Provisioner that fabricates outputs without touching any provider.
///
/// Used for rehearsing a plan end to end: every expected output attribute is
/// reported as `sim:<id>/<attribute>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedProvisioner;

impl SimulatedProvisioner {
    /// Creates a new simulated provisioner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Provisioner for SimulatedProvisioner {
    async fn provision(&self, request: ProvisionRequest) -> Result<ResourceOutputs> {
        Ok(request
            .outputs
            .iter()
            .map(|attribute| {
                (
                    attribute.clone(),
                    serde_json::Value::String(format!("sim:{}/{attribute}", request.id)),
                )
            })
            .collect())
    }
}
