//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying plans,
//! validation findings, and rehearsal reports in text or JSON.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::descriptor::{OutputRegistry, ValidationResult};
use crate::executor::ExecutionReport;
use crate::synth::{DeploymentPlan, PlanEmitter};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan entry row for table display.
#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Batch")]
    batch: usize,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Properties")]
    properties: String,
}

/// Registry row for table display.
#[derive(Tabled)]
struct KindRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Outputs")]
    outputs: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a deployment plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &DeploymentPlan) -> String {
        match self.format {
            OutputFormat::Json => PlanEmitter::new().emit_json(plan).unwrap_or_default(),
            OutputFormat::Text => Self::format_plan_text(plan),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(plan: &DeploymentPlan) -> String {
        if plan.is_empty() {
            return format!("{} Empty plan - no resources defined.\n", "✓".green());
        }

        let mut output = String::new();

        let _ = write!(output, "\n📋 Deployment Plan");
        if let Some(stack) = &plan.stack {
            let _ = write!(output, " for '{stack}'");
        }
        let _ = write!(output, "\n   Fingerprint: {}\n\n", &plan.fingerprint[..8]);

        let rows: Vec<PlanRow> = plan
            .batches
            .iter()
            .enumerate()
            .flat_map(|(i, batch)| {
                batch.resources.iter().map(move |resource| PlanRow {
                    batch: i + 1,
                    resource: resource.id.clone(),
                    kind: resource.kind.clone(),
                    properties: Self::summarize_properties(resource),
                })
            })
            .collect();

        if !rows.is_empty() {
            let table = Table::new(rows).to_string();
            output.push_str(&table);
            output.push('\n');
        }

        let _ = write!(
            output,
            "\nPlan: {} resources in {} batches, {} deferred bindings\n",
            plan.resource_count().to_string().green(),
            plan.batch_count(),
            plan.deferred_count().to_string().yellow(),
        );

        output
    }

    /// Renders a short property summary for one plan entry.
    fn summarize_properties(resource: &crate::synth::PlannedResource) -> String {
        let rendered: Vec<String> = resource
            .properties
            .iter()
            .map(|(name, binding)| format!("{name}={binding}"))
            .collect();
        Self::truncate(&rendered.join(", "), 48)
    }

    /// Formats validation findings for display.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => {
                let value = serde_json::json!({
                    "valid": result.is_valid(),
                    "errors": result.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "warnings": result.warnings,
                });
                serde_json::to_string_pretty(&value).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = String::new();
                if result.is_valid() {
                    let _ = writeln!(output, "{} Stack definition is valid.", "✓".green());
                } else {
                    let _ = writeln!(output, "{} Validation failed:", "✗".red());
                    for error in &result.errors {
                        let _ = writeln!(output, "   - {error}");
                    }
                }
                if show_warnings && !result.warnings.is_empty() {
                    let _ = writeln!(output, "\n{} Warnings:", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }
                output
            }
        }
    }

    /// Formats the kind registry for display.
    #[must_use]
    pub fn format_kinds(&self, registry: &OutputRegistry) -> String {
        match self.format {
            OutputFormat::Json => {
                let value: serde_json::Value = registry
                    .iter()
                    .map(|(kind, outputs)| (String::from(kind), serde_json::json!(outputs)))
                    .collect::<serde_json::Map<_, _>>()
                    .into();
                serde_json::to_string_pretty(&value).unwrap_or_default()
            }
            OutputFormat::Text => {
                let rows: Vec<KindRow> = registry
                    .iter()
                    .map(|(kind, outputs)| KindRow {
                        kind: String::from(kind),
                        outputs: outputs.join(", "),
                    })
                    .collect();
                format!("{}\n", Table::new(rows))
            }
        }
    }

    /// Formats a rehearsal report for display.
    #[must_use]
    pub fn format_report(&self, report: &ExecutionReport) -> String {
        match self.format {
            OutputFormat::Json => {
                let value = serde_json::json!({
                    "success": report.success,
                    "batches_completed": report.batches_completed,
                    "successful": report.successful,
                    "failed": report.failed,
                    "skipped": report.skipped,
                    "outputs": report.outputs,
                });
                serde_json::to_string_pretty(&value).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = String::new();
                let marker = if report.success {
                    "✓".green()
                } else {
                    "✗".red()
                };
                let _ = writeln!(output, "{marker} {report}");
                for result in &report.results {
                    let status = if result.success {
                        "ok".green()
                    } else if result.skipped {
                        "skipped".yellow()
                    } else {
                        "failed".red()
                    };
                    let _ = writeln!(output, "   {} {}", status, result.id);
                }
                output
            }
        }
    }

    /// Truncates a string for table display.
    fn truncate(s: &str, max: usize) -> String {
        if s.chars().count() <= max {
            String::from(s)
        } else {
            let prefix: String = s.chars().take(max.saturating_sub(1)).collect();
            format!("{prefix}…")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DescriptorSet, PropertyValue, ResourceDescriptor};
    use crate::pipeline::synthesize;

    fn sample_plan() -> DeploymentPlan {
        let set = DescriptorSet::from_descriptors([
            ResourceDescriptor::new("users-table", "table"),
            ResourceDescriptor::new("handler", "function")
                .with_property("table-name", PropertyValue::reference("users-table", "name")),
        ])
        .unwrap();
        synthesize(set, OutputRegistry::builtin()).unwrap()
    }

    #[test]
    fn test_text_plan_lists_batches() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let text = formatter.format_plan(&sample_plan());
        assert!(text.contains("users-table"));
        assert!(text.contains("2 batches"));
    }

    #[test]
    fn test_json_plan_is_emitted_document() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let json = formatter.format_plan(&sample_plan());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["batches"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(OutputFormatter::truncate("short", 10), "short");
        assert_eq!(OutputFormatter::truncate("0123456789", 5), "0123…");
    }
}
