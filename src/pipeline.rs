//! Synthesis pipeline driving descriptors to an emitted plan.
//!
//! This module implements the pipeline state machine:
//! `Collecting` → `Resolving` → `Planned`, with any stage error landing in
//! the terminal `Failed` state. A failed pipeline is never reused; callers
//! rebuild the descriptor set and run a fresh pipeline. A produced plan is
//! never mutated.

use tracing::{debug, error, info};

use crate::descriptor::{
    DescriptorHasher, DescriptorSet, DescriptorValidator, LoadedStack, OutputRegistry,
    ResourceDescriptor,
};
use crate::error::{Result, SynthError};
use crate::synth::{AttributeResolver, BatchPlanner, DependencyGraph, DeploymentPlan};

/// Pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthState {
    /// Descriptors are being added.
    Collecting,
    /// Attribute resolution and planning in progress.
    Resolving,
    /// Plan produced; the pipeline is finished and immutable.
    Planned,
    /// A stage failed; the pipeline is unusable. Rebuild and retry.
    Failed,
}

/// Synthesis pipeline over an ordered descriptor set.
pub struct Synthesizer {
    /// Output registry supplied by configuration.
    registry: OutputRegistry,
    /// Stack name carried onto the plan, if known.
    stack_name: Option<String>,
    /// Collected descriptors, in declaration order.
    set: DescriptorSet,
    /// Current pipeline state.
    state: SynthState,
    /// Descriptor validator.
    validator: DescriptorValidator,
    /// Fingerprint hasher.
    hasher: DescriptorHasher,
    /// Attribute resolver.
    resolver: AttributeResolver,
    /// Batch planner.
    planner: BatchPlanner,
}

impl Synthesizer {
    /// Creates an empty pipeline with the given output registry.
    #[must_use]
    pub fn new(registry: OutputRegistry) -> Self {
        Self {
            registry,
            stack_name: None,
            set: DescriptorSet::new(),
            state: SynthState::Collecting,
            validator: DescriptorValidator::new(),
            hasher: DescriptorHasher::new(),
            resolver: AttributeResolver::new(),
            planner: BatchPlanner::new(),
        }
    }

    /// Creates a pipeline from a loaded stack definition.
    #[must_use]
    pub fn from_stack(stack: LoadedStack) -> Self {
        let mut synthesizer = Self::new(stack.registry);
        synthesizer.stack_name = Some(stack.meta.name);
        synthesizer.set = stack.set;
        synthesizer
    }

    /// Sets the stack name carried onto the plan.
    #[must_use]
    pub fn with_stack_name(mut self, name: impl Into<String>) -> Self {
        self.stack_name = Some(name.into());
        self
    }

    /// Returns the current pipeline state.
    #[must_use]
    pub const fn state(&self) -> SynthState {
        self.state
    }

    /// Adds a descriptor to the set.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline has left the `Collecting` state or
    /// if the id duplicates an existing descriptor.
    pub fn add(&mut self, descriptor: ResourceDescriptor) -> Result<()> {
        if self.state != SynthState::Collecting {
            return Err(SynthError::internal(format!(
                "Cannot add descriptors in state {:?}; rebuild the pipeline",
                self.state
            )));
        }
        self.set.insert(descriptor)
    }

    /// Runs the full synthesis: validate → resolve → build graph → plan.
    ///
    /// Fail-fast: the first error encountered is surfaced and the pipeline
    /// transitions to `Failed`. No partial plan is ever returned.
    ///
    /// # Errors
    ///
    /// Returns any synthesis error from the stages; see [`crate::error`].
    pub fn synthesize(&mut self) -> Result<DeploymentPlan> {
        if self.state != SynthState::Collecting {
            return Err(SynthError::internal(format!(
                "Pipeline already ran (state {:?}); rebuild to resynthesize",
                self.state
            )));
        }

        self.state = SynthState::Resolving;
        info!(
            "Synthesizing plan for {} resources{}",
            self.set.len(),
            self.stack_name
                .as_deref()
                .map(|n| format!(" (stack '{n}')"))
                .unwrap_or_default()
        );

        match self.run_stages() {
            Ok(plan) => {
                self.state = SynthState::Planned;
                info!(
                    "Synthesis complete: {} batches, {} deferred bindings",
                    plan.batch_count(),
                    plan.deferred_count()
                );
                Ok(plan)
            }
            Err(e) => {
                self.state = SynthState::Failed;
                error!("Synthesis failed: {e}");
                Err(e)
            }
        }
    }

    /// Runs the synthesis stages in order.
    fn run_stages(&self) -> Result<DeploymentPlan> {
        let validation = self.validator.validate(&self.set, &self.registry)?;
        for warning in &validation.warnings {
            debug!("Validation warning: {warning}");
        }

        let resolved = self.resolver.resolve(&self.set, &self.registry)?;
        let graph = DependencyGraph::build(&self.set)?;
        let fingerprint = self.hasher.fingerprint(&self.set);

        self.planner
            .plan(&resolved, &graph, fingerprint, self.stack_name.clone())
    }
}

/// Synthesizes a plan from a descriptor set in one call.
///
/// # Errors
///
/// Returns any synthesis error; see [`crate::error`].
pub fn synthesize(set: DescriptorSet, registry: OutputRegistry) -> Result<DeploymentPlan> {
    let mut synthesizer = Synthesizer::new(registry);
    synthesizer.set = set;
    synthesizer.synthesize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PropertyValue;
    use crate::error::{DescriptorError, ResolveError};

    fn registry() -> OutputRegistry {
        OutputRegistry::builtin()
    }

    #[test]
    fn test_pipeline_happy_path() {
        let mut synthesizer = Synthesizer::new(registry()).with_stack_name("ziky");
        synthesizer
            .add(ResourceDescriptor::new("users-table", "table"))
            .unwrap();
        synthesizer
            .add(
                ResourceDescriptor::new("handler", "function").with_property(
                    "table-name",
                    PropertyValue::reference("users-table", "name"),
                ),
            )
            .unwrap();

        assert_eq!(synthesizer.state(), SynthState::Collecting);
        let plan = synthesizer.synthesize().unwrap();
        assert_eq!(synthesizer.state(), SynthState::Planned);
        assert_eq!(plan.stack.as_deref(), Some("ziky"));
        assert_eq!(plan.batch_count(), 2);
    }

    #[test]
    fn test_no_reuse_after_planned() {
        let mut synthesizer = Synthesizer::new(registry());
        synthesizer
            .add(ResourceDescriptor::new("users-table", "table"))
            .unwrap();
        synthesizer.synthesize().unwrap();

        assert!(synthesizer
            .add(ResourceDescriptor::new("other", "table"))
            .is_err());
        assert!(synthesizer.synthesize().is_err());
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut synthesizer = Synthesizer::new(registry());
        synthesizer
            .add(
                ResourceDescriptor::new("api", "rest-api")
                    .with_property("self", PropertyValue::reference("api", "id")),
            )
            .unwrap();

        let err = synthesizer.synthesize().unwrap_err();
        assert!(matches!(
            err,
            SynthError::Resolve(ResolveError::SelfReference { .. })
        ));
        assert_eq!(synthesizer.state(), SynthState::Failed);

        // No transition back to Collecting.
        assert!(synthesizer
            .add(ResourceDescriptor::new("other", "table"))
            .is_err());
    }

    #[test]
    fn test_duplicate_id_rejected_while_collecting() {
        let mut synthesizer = Synthesizer::new(registry());
        synthesizer
            .add(ResourceDescriptor::new("api", "rest-api"))
            .unwrap();
        let err = synthesizer
            .add(ResourceDescriptor::new("api", "rest-api"))
            .unwrap_err();
        assert!(matches!(
            err,
            SynthError::Descriptor(DescriptorError::DuplicateId { .. })
        ));
        // Still collecting; a duplicate add does not poison the pipeline.
        assert_eq!(synthesizer.state(), SynthState::Collecting);
    }

    #[test]
    fn test_empty_pipeline_produces_empty_plan() {
        let plan = synthesize(DescriptorSet::new(), registry()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_resynthesis_determinism() {
        let build = || {
            let mut synthesizer = Synthesizer::new(registry());
            synthesizer
                .add(ResourceDescriptor::new("users-table", "table"))
                .unwrap();
            synthesizer
                .add(
                    ResourceDescriptor::new("handler", "function").with_property(
                        "table-name",
                        PropertyValue::reference("users-table", "name"),
                    ),
                )
                .unwrap();
            synthesizer.synthesize().unwrap()
        };

        let first = build();
        let second = build();
        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.batches, second.batches);
    }
}
