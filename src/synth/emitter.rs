//! Plan emitter.
//!
//! Serializes a deployment plan into the JSON document consumed by a
//! provisioning executor. The emitter performs no further validation: the
//! planner's output already satisfies all ordering invariants. Batch
//! boundaries are preserved explicitly, and run metadata (plan id,
//! timestamp) is excluded so identical input emits identical bytes.

use std::path::Path;

use tracing::info;

use crate::error::{Result, SynthError};

use super::plan::DeploymentPlan;

/// Emitter for deployment plans.
#[derive(Debug, Clone, Copy)]
pub struct PlanEmitter {
    /// Whether to pretty-print the emitted JSON.
    pretty: bool,
}

impl PlanEmitter {
    /// Creates an emitter producing pretty-printed JSON.
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: true }
    }

    /// Sets whether emitted JSON is pretty-printed.
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Serializes the plan to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn emit_json(&self, plan: &DeploymentPlan) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(plan)
        } else {
            serde_json::to_string(plan)
        };
        json.map_err(|e| SynthError::internal(format!("Failed to serialize plan: {e}")))
    }

    /// Emits the plan to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_file(&self, plan: &DeploymentPlan, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.emit_json(plan)?;
        std::fs::write(path, json)?;
        info!("Emitted plan to {}", path.display());
        Ok(())
    }
}

impl Default for PlanEmitter {
    fn default() -> Self {
        Self::new()
    }
}
