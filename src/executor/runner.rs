//! Plan runner enforcing the batch execution contract.
//!
//! Batches run strictly in order. Within a batch, resources provision
//! concurrently on tokio tasks bounded by a concurrency limit; the runner
//! waits for the whole batch before moving on (a full barrier). If any
//! resource in a batch fails, already-started siblings are allowed to
//! finish, but no later batch begins. Deferred bindings are substituted
//! from the outputs collected so far before each batch is dispatched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::{ExecError, Result, SynthError};
use crate::synth::{Binding, DeploymentPlan, PlannedResource};

use super::provisioner::{ProvisionRequest, Provisioner, ResourceOutputs};

/// Default bound on concurrent provisioning tasks within a batch.
const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Runner executing a deployment plan against a provisioner.
pub struct PlanRunner {
    /// The provisioner collaborator.
    provisioner: Arc<dyn Provisioner>,
    /// Concurrency limit within a batch.
    max_concurrency: usize,
}

/// Result of provisioning a single resource.
#[derive(Debug)]
pub struct ResourceResult {
    /// Resource id.
    pub id: String,
    /// Index of the batch the resource belongs to.
    pub batch: usize,
    /// Whether provisioning succeeded.
    pub success: bool,
    /// Whether the resource was skipped because an earlier batch failed.
    pub skipped: bool,
    /// Reported outputs (if successful).
    pub outputs: Option<ResourceOutputs>,
    /// Error message (if failed or skipped).
    pub error: Option<String>,
}

/// Result of executing an entire plan.
#[derive(Debug)]
pub struct ExecutionReport {
    /// When execution started.
    pub started_at: DateTime<Utc>,
    /// When execution finished.
    pub finished_at: DateTime<Utc>,
    /// Individual resource results, in plan order.
    pub results: Vec<ResourceResult>,
    /// Number of batches fully completed.
    pub batches_completed: usize,
    /// Number of successful resources.
    pub successful: usize,
    /// Number of failed resources.
    pub failed: usize,
    /// Number of skipped resources.
    pub skipped: usize,
    /// Whether the entire plan succeeded.
    pub success: bool,
    /// All collected outputs, keyed by resource id.
    pub outputs: IndexMap<String, ResourceOutputs>,
}

impl PlanRunner {
    /// Creates a new plan runner.
    #[must_use]
    pub fn new(provisioner: Arc<dyn Provisioner>) -> Self {
        Self {
            provisioner,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Sets the concurrency limit within a batch.
    ///
    /// A limit of zero is treated as one.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Executes the plan batch by batch.
    ///
    /// Provisioning failures are reported in the [`ExecutionReport`], not as
    /// an `Err`: a failed batch marks the run failed and skips later batches.
    ///
    /// # Errors
    ///
    /// Returns an error only for contract violations between plan and
    /// provisioner, such as a deferred binding whose source output was never
    /// reported ([`ExecError::MissingOutput`]).
    pub async fn execute(&self, plan: &DeploymentPlan) -> Result<ExecutionReport> {
        let started_at = Utc::now();
        info!(
            "Executing plan {}: {} resources in {} batches",
            plan.plan_id,
            plan.resource_count(),
            plan.batch_count()
        );

        let mut outputs: IndexMap<String, ResourceOutputs> = IndexMap::new();
        let mut results: Vec<ResourceResult> = Vec::new();
        let mut batches_completed = 0usize;
        let mut abort_reason: Option<String> = None;

        for (batch_index, batch) in plan.batches.iter().enumerate() {
            if let Some(reason) = &abort_reason {
                for resource in &batch.resources {
                    warn!("Skipping resource '{}': {reason}", resource.id);
                    results.push(ResourceResult {
                        id: resource.id.clone(),
                        batch: batch_index,
                        success: false,
                        skipped: true,
                        outputs: None,
                        error: Some(
                            ExecError::BatchAborted {
                                batch: batch_index,
                                reason: reason.clone(),
                            }
                            .to_string(),
                        ),
                    });
                }
                continue;
            }

            debug!(
                "Dispatching batch {} ({} resources)",
                batch_index,
                batch.resources.len()
            );

            let batch_results = self
                .run_batch(batch_index, &batch.resources, &outputs)
                .await?;

            let mut batch_failed = false;
            for result in batch_results {
                if result.success {
                    if let Some(resource_outputs) = &result.outputs {
                        outputs.insert(result.id.clone(), resource_outputs.clone());
                    }
                } else {
                    batch_failed = true;
                }
                results.push(result);
            }

            if batch_failed {
                error!("Batch {batch_index} failed; later batches will not start");
                abort_reason = Some(format!("batch {batch_index} failed"));
            } else {
                batches_completed += 1;
            }
        }

        let successful = results.iter().filter(|r| r.success).count();
        let skipped = results.iter().filter(|r| r.skipped).count();
        let failed = results.len() - successful - skipped;

        Ok(ExecutionReport {
            started_at,
            finished_at: Utc::now(),
            results,
            batches_completed,
            successful,
            failed,
            skipped,
            success: abort_reason.is_none(),
            outputs,
        })
    }

    /// Dispatches one batch and waits for every member to finish.
    async fn run_batch(
        &self,
        batch_index: usize,
        resources: &[PlannedResource],
        outputs: &IndexMap<String, ResourceOutputs>,
    ) -> Result<Vec<ResourceResult>> {
        // Substitute deferred bindings before anything is dispatched, so a
        // contract violation aborts the batch without side effects.
        let mut requests = Vec::with_capacity(resources.len());
        for resource in resources {
            requests.push(Self::substitute(resource, outputs)?);
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for request in requests {
            let provisioner = Arc::clone(&self.provisioner);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let id = request.id.clone();
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => provisioner.provision(request).await,
                    Err(e) => Err(SynthError::internal(format!("Semaphore closed: {e}"))),
                };
                (id, result)
            });
        }

        let mut finished: IndexMap<String, Result<ResourceOutputs>> = IndexMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (id, result) =
                joined.map_err(|e| SynthError::internal(format!("Provisioning task died: {e}")))?;
            finished.insert(id, result);
        }

        // Report in plan order regardless of completion order.
        let mut results = Vec::with_capacity(resources.len());
        for resource in resources {
            let result = finished.swap_remove(&resource.id).unwrap_or_else(|| {
                Err(SynthError::internal(format!(
                    "No result reported for resource '{}'",
                    resource.id
                )))
            });

            match result {
                Ok(resource_outputs) => {
                    info!("Provisioned resource '{}'", resource.id);
                    results.push(ResourceResult {
                        id: resource.id.clone(),
                        batch: batch_index,
                        success: true,
                        skipped: false,
                        outputs: Some(resource_outputs),
                        error: None,
                    });
                }
                Err(e) => {
                    error!("Failed to provision resource '{}': {e}", resource.id);
                    results.push(ResourceResult {
                        id: resource.id.clone(),
                        batch: batch_index,
                        success: false,
                        skipped: false,
                        outputs: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(results)
    }

    /// Substitutes a resource's bindings from collected outputs.
    fn substitute(
        resource: &PlannedResource,
        outputs: &IndexMap<String, ResourceOutputs>,
    ) -> Result<ProvisionRequest> {
        let mut properties = IndexMap::with_capacity(resource.properties.len());

        for (name, binding) in &resource.properties {
            let value = match binding {
                Binding::Static { value } => value.clone(),
                Binding::Deferred { source, attribute } => outputs
                    .get(source)
                    .and_then(|o| o.get(attribute))
                    .cloned()
                    .ok_or_else(|| {
                        SynthError::Exec(ExecError::MissingOutput {
                            id: resource.id.clone(),
                            source: source.clone(),
                            attribute: attribute.clone(),
                        })
                    })?,
            };
            properties.insert(name.clone(), value);
        }

        Ok(ProvisionRequest {
            id: resource.id.clone(),
            kind: resource.kind.clone(),
            properties,
            outputs: resource.outputs.clone(),
        })
    }
}

impl ExecutionReport {
    /// Returns true if every resource provisioned successfully.
    #[must_use]
    pub const fn all_successful(&self) -> bool {
        self.success && self.failed == 0 && self.skipped == 0
    }
}

impl std::fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Executed {} batches: {} successful, {} failed, {} skipped",
            self.batches_completed, self.successful, self.failed, self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{
        DescriptorHasher, DescriptorSet, OutputRegistry, PropertyValue, ResourceDescriptor,
    };
    use crate::executor::provisioner::{MockProvisioner, SimulatedProvisioner};
    use crate::pipeline::synthesize;
    use crate::synth::Batch;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Provisioner that records request arrival order and can be told to
    /// fail specific resources.
    #[derive(Default)]
    struct RecordingProvisioner {
        seen: Mutex<Vec<ProvisionRequest>>,
        fail_ids: HashSet<String>,
    }

    impl RecordingProvisioner {
        fn failing(ids: &[&str]) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                fail_ids: ids.iter().map(|s| String::from(*s)).collect(),
            }
        }

        fn seen_ids(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.id.clone())
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl Provisioner for RecordingProvisioner {
        async fn provision(&self, request: ProvisionRequest) -> Result<ResourceOutputs> {
            self.seen.lock().unwrap().push(request.clone());
            if self.fail_ids.contains(&request.id) {
                return Err(SynthError::Exec(ExecError::resource_failed(
                    &request.id,
                    "simulated failure",
                )));
            }
            SimulatedProvisioner::new().provision(request).await
        }
    }

    fn sample_plan() -> DeploymentPlan {
        let set = DescriptorSet::from_descriptors([
            ResourceDescriptor::new("users-table", "table"),
            ResourceDescriptor::new("handler", "function")
                .with_property("table-name", PropertyValue::reference("users-table", "name")),
            ResourceDescriptor::new("api", "rest-api").with_predecessor("handler"),
        ])
        .unwrap();
        synthesize(set, OutputRegistry::builtin()).unwrap()
    }

    #[tokio::test]
    async fn test_batches_run_in_order() {
        let provisioner = Arc::new(RecordingProvisioner::default());
        let runner = PlanRunner::new(Arc::clone(&provisioner) as Arc<dyn Provisioner>);

        let report = runner.execute(&sample_plan()).await.unwrap();
        assert!(report.all_successful());
        assert_eq!(report.batches_completed, 3);
        assert_eq!(
            provisioner.seen_ids(),
            ["users-table", "handler", "api"]
        );
    }

    #[tokio::test]
    async fn test_deferred_binding_substituted_from_outputs() {
        let provisioner = Arc::new(RecordingProvisioner::default());
        let runner = PlanRunner::new(Arc::clone(&provisioner) as Arc<dyn Provisioner>);

        runner.execute(&sample_plan()).await.unwrap();

        let seen = provisioner.seen.lock().unwrap();
        let handler = seen.iter().find(|r| r.id == "handler").unwrap();
        assert_eq!(
            handler.properties.get("table-name"),
            Some(&serde_json::json!("sim:users-table/name"))
        );
    }

    #[tokio::test]
    async fn test_failed_batch_stops_later_batches() {
        let provisioner = Arc::new(RecordingProvisioner::failing(&["handler"]));
        let runner = PlanRunner::new(Arc::clone(&provisioner) as Arc<dyn Provisioner>);

        let report = runner.execute(&sample_plan()).await.unwrap();
        assert!(!report.success);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.batches_completed, 1);

        // The api in the last batch was never dispatched.
        assert!(!provisioner.seen_ids().contains(&String::from("api")));
        let api_result = report.results.iter().find(|r| r.id == "api").unwrap();
        assert!(api_result.skipped);
    }

    #[tokio::test]
    async fn test_missing_output_is_contract_violation() {
        let plan = DeploymentPlan {
            batches: vec![
                Batch {
                    resources: vec![PlannedResource {
                        id: String::from("a"),
                        kind: String::from("table"),
                        properties: IndexMap::new(),
                        outputs: vec![String::from("name")],
                    }],
                },
                Batch {
                    resources: vec![PlannedResource {
                        id: String::from("b"),
                        kind: String::from("function"),
                        properties: IndexMap::from([(
                            String::from("x"),
                            Binding::Deferred {
                                source: String::from("a"),
                                attribute: String::from("nonexistent"),
                            },
                        )]),
                        outputs: vec![],
                    }],
                },
            ],
            ..DeploymentPlan::empty(DescriptorHasher::new().fingerprint(&DescriptorSet::new()))
        };

        let runner = PlanRunner::new(Arc::new(SimulatedProvisioner::new()));
        let err = runner.execute(&plan).await.unwrap_err();
        assert!(matches!(
            err,
            SynthError::Exec(ExecError::MissingOutput { ref attribute, .. })
                if attribute == "nonexistent"
        ));
    }

    #[tokio::test]
    async fn test_mock_provisioner_receives_substituted_request() {
        let mut mock = MockProvisioner::new();
        mock.expect_provision()
            .times(1)
            .returning(|request| {
                Ok(request
                    .outputs
                    .iter()
                    .map(|o| (o.clone(), serde_json::json!("mocked")))
                    .collect())
            });

        let set = DescriptorSet::from_descriptors([ResourceDescriptor::new(
            "users-table",
            "table",
        )])
        .unwrap();
        let plan = synthesize(set, OutputRegistry::builtin()).unwrap();

        let runner = PlanRunner::new(Arc::new(mock));
        let report = runner.execute(&plan).await.unwrap();
        assert!(report.all_successful());
        assert_eq!(
            report.outputs.get("users-table").and_then(|o| o.get("name")),
            Some(&serde_json::json!("mocked"))
        );
    }

    #[tokio::test]
    async fn test_empty_plan_executes_trivially() {
        let runner = PlanRunner::new(Arc::new(SimulatedProvisioner::new()));
        let report =
            tokio_test::assert_ok!(runner.execute(&DeploymentPlan::empty("fingerprint")).await);
        assert!(report.all_successful());
        assert_eq!(report.batches_completed, 0);
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_clamped() {
        let runner = PlanRunner::new(Arc::new(SimulatedProvisioner::new()))
            .with_max_concurrency(0);
        assert_eq!(runner.max_concurrency, 1);
    }
}
