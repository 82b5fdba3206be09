//! Structural validation for descriptor sets.
//!
//! This module checks descriptor sets before synthesis: id naming, kind tags
//! against the output registry, and suspicious-but-legal shapes that only
//! warrant warnings. Reference and predecessor targets are checked later by
//! the resolver and graph builder, which own those failure modes.

use std::collections::HashSet;
use tracing::debug;

use crate::error::{DescriptorError, Result, SynthError};

use super::model::DescriptorSet;
use super::registry::OutputRegistry;

/// Validator for descriptor sets.
#[derive(Debug, Default)]
pub struct DescriptorValidator;

/// Validation result containing all findings.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
    /// First structured error, surfaced on failure.
    first: Option<DescriptorError>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl DescriptorValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a descriptor set against the output registry.
    ///
    /// All findings are collected, but synthesis is fail-fast: the first
    /// error is surfaced as the returned failure.
    ///
    /// # Errors
    ///
    /// Returns an error if any descriptor has an invalid id or unknown kind.
    pub fn validate(
        &self,
        set: &DescriptorSet,
        registry: &OutputRegistry,
    ) -> Result<ValidationResult> {
        let mut result = self.collect(set, registry);

        if result.errors.is_empty() {
            debug!("Descriptor validation passed");
            Ok(result)
        } else {
            let first = result
                .first
                .take()
                .unwrap_or_else(|| DescriptorError::parse(result.errors[0].message.clone()));
            Err(SynthError::Descriptor(first))
        }
    }

    /// Collects every validation finding without failing.
    #[must_use]
    pub fn collect(&self, set: &DescriptorSet, registry: &OutputRegistry) -> ValidationResult {
        let mut result = ValidationResult::default();

        if set.is_empty() {
            result
                .warnings
                .push(String::from("No resources defined in stack"));
        }

        for (i, descriptor) in set.iter().enumerate() {
            let prefix = format!("resources[{i}]");

            if !is_valid_id(&descriptor.id) {
                result.push_error(
                    format!("{prefix}.id"),
                    format!(
                        "Resource id '{}' is invalid. Must be lowercase alphanumeric with hyphens.",
                        descriptor.id
                    ),
                    DescriptorError::InvalidId {
                        id: descriptor.id.clone(),
                    },
                );
            }

            if !registry.contains(&descriptor.kind) {
                result.push_error(
                    format!("{prefix}.kind"),
                    format!(
                        "Unknown kind '{}' for resource '{}'",
                        descriptor.kind, descriptor.id
                    ),
                    DescriptorError::UnknownKind {
                        id: descriptor.id.clone(),
                        kind: descriptor.kind.clone(),
                    },
                );
            }

            Self::validate_predecessors(descriptor, &prefix, &mut result);
        }

        result
    }

    /// Checks explicit predecessor declarations for duplicates.
    fn validate_predecessors(
        descriptor: &super::model::ResourceDescriptor,
        prefix: &str,
        result: &mut ValidationResult,
    ) {
        let mut seen = HashSet::new();
        for predecessor in &descriptor.depends_on {
            if !seen.insert(predecessor.as_str()) {
                result.warnings.push(format!(
                    "{prefix}.depends_on: duplicate predecessor '{predecessor}' (collapsed to one edge)"
                ));
            }
        }
    }
}

/// Validates that an id follows the naming convention.
/// Ids must be lowercase alphanumeric with hyphens, starting with a letter.
fn is_valid_id(id: &str) -> bool {
    if id.is_empty() {
        return false;
    }

    let mut chars = id.chars();

    // First character must be a letter
    if let Some(first) = chars.next()
        && !first.is_ascii_lowercase()
    {
        return false;
    }

    // Rest must be lowercase alphanumeric or hyphen
    for c in chars {
        if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
            return false;
        }
    }

    // Cannot end with hyphen
    if id.ends_with('-') {
        return false;
    }

    // Cannot have consecutive hyphens
    if id.contains("--") {
        return false;
    }

    true
}

impl ValidationResult {
    /// Records an error, remembering the first structured variant.
    fn push_error(&mut self, field: String, message: String, error: DescriptorError) {
        if self.first.is_none() {
            self.first = Some(error);
        }
        self.errors.push(ValidationError { field, message });
    }

    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
