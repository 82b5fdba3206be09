//! Synthesis module: resolution, graph construction, planning, emission.
//!
//! This module turns an ordered descriptor set into a deterministic,
//! correctly-ordered deployment plan.

mod emitter;
mod graph;
mod plan;
mod planner;
mod resolver;

pub use emitter::PlanEmitter;
pub use graph::DependencyGraph;
pub use plan::{Batch, Binding, DeploymentPlan, PlannedResource};
pub use planner::BatchPlanner;
pub use resolver::{AttributeResolver, ResolvedResource};
