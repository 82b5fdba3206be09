//! Topological batch planner.
//!
//! This module orders resolved resources into deployable batches honoring
//! every dependency edge. Layering is Kahn's-style: each round collects all
//! resources whose remaining in-degree is zero into the next batch. Ties
//! within a batch are broken by declaration order, so identical input always
//! produces an identical plan.

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{PlanError, Result, SynthError};

use super::graph::DependencyGraph;
use super::plan::{Batch, DeploymentPlan, PlannedResource};
use super::resolver::ResolvedResource;

/// Node colors for the cycle-extraction walk.
const WHITE: u8 = 0;
const GRAY: u8 = 1;
const BLACK: u8 = 2;

/// Planner producing ordered deployment batches.
#[derive(Debug, Default)]
pub struct BatchPlanner;

impl BatchPlanner {
    /// Creates a new batch planner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Produces a deployment plan from resolved resources and their graph.
    ///
    /// An empty descriptor set is a valid degenerate input and yields an
    /// empty plan.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::CyclicDependency`] carrying the member ids of a
    /// cycle if the graph is not acyclic.
    pub fn plan(
        &self,
        resolved: &[ResolvedResource],
        graph: &DependencyGraph,
        fingerprint: impl Into<String>,
        stack: Option<String>,
    ) -> Result<DeploymentPlan> {
        let batches = Self::layer(resolved, graph)?;

        let plan = DeploymentPlan {
            plan_id: Uuid::new_v4(),
            created_at: Utc::now(),
            stack,
            fingerprint: fingerprint.into(),
            batches,
        };

        debug!(
            "Planned {} resources into {} batches",
            plan.resource_count(),
            plan.batch_count()
        );
        Ok(plan)
    }

    /// Kahn's-style layering into batches.
    fn layer(resolved: &[ResolvedResource], graph: &DependencyGraph) -> Result<Vec<Batch>> {
        let node_count = graph.node_count();
        let mut in_degree = graph.in_degrees();
        let mut remaining = vec![true; node_count];
        let mut remaining_count = node_count;
        let mut batches = Vec::new();

        while remaining_count > 0 {
            // Declaration order doubles as the deterministic tie-break.
            let ready: Vec<usize> = (0..node_count)
                .filter(|&i| remaining[i] && in_degree[i] == 0)
                .collect();

            if ready.is_empty() {
                let cycle = Self::find_cycle(graph, &remaining);
                warn!("Dependency cycle detected: {}", cycle.join(" -> "));
                return Err(SynthError::Plan(PlanError::CyclicDependency { cycle }));
            }

            for &i in &ready {
                remaining[i] = false;
                remaining_count -= 1;
                for &successor in graph.successors(i) {
                    in_degree[successor] -= 1;
                }
            }

            batches.push(Batch {
                resources: ready
                    .iter()
                    .map(|&i| Self::planned_resource(&resolved[i]))
                    .collect(),
            });
        }

        Ok(batches)
    }

    /// Converts a resolved view into a plan entry.
    fn planned_resource(resolved: &ResolvedResource) -> PlannedResource {
        PlannedResource {
            id: resolved.id.clone(),
            kind: resolved.kind.clone(),
            properties: resolved.properties.clone(),
            outputs: resolved.outputs.keys().cloned().collect(),
        }
    }

    /// Extracts one cycle from the unplanned remainder via depth-first
    /// search restricted to the remaining subgraph.
    fn find_cycle(graph: &DependencyGraph, remaining: &[bool]) -> Vec<String> {
        let node_count = graph.node_count();
        let mut color = vec![WHITE; node_count];

        for start in 0..node_count {
            if !remaining[start] || color[start] != WHITE {
                continue;
            }

            let mut path = vec![start];
            let mut cursors = vec![0usize];
            color[start] = GRAY;

            loop {
                let Some(&current) = path.last() else { break };
                let successors = graph.successors(current);
                let Some(cursor) = cursors.last_mut() else { break };

                if *cursor < successors.len() {
                    let next = successors[*cursor];
                    *cursor += 1;

                    if !remaining[next] || color[next] == BLACK {
                        continue;
                    }
                    if color[next] == GRAY {
                        // Back edge: the cycle is the path suffix from `next`.
                        if let Some(pos) = path.iter().position(|&p| p == next) {
                            return path[pos..]
                                .iter()
                                .filter_map(|&i| graph.id_at(i))
                                .map(String::from)
                                .collect();
                        }
                    }
                    color[next] = GRAY;
                    path.push(next);
                    cursors.push(0);
                } else {
                    color[current] = BLACK;
                    path.pop();
                    cursors.pop();
                }
            }
        }

        Vec::new()
    }
}
