//! Error types for the Stacksynth synthesis engine.
//!
//! This module provides a comprehensive error hierarchy for all stages of the
//! synthesis pipeline: descriptor collection, attribute resolution, graph
//! construction, planning, and plan execution.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the Stacksynth engine.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Descriptor collection and parsing errors.
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    /// Attribute resolution errors.
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// Dependency graph construction errors.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Planning errors.
    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    /// Plan execution errors.
    #[error("Execution error: {0}")]
    Exec(#[from] ExecError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Descriptor collection and parsing errors.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The stack file was not found.
    #[error("Stack file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The stack file could not be parsed.
    #[error("Failed to parse stack file: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Two descriptors share the same id.
    #[error("Duplicate resource id: {id}")]
    DuplicateId {
        /// The duplicated id.
        id: String,
    },

    /// A resource id does not follow the naming convention.
    #[error("Invalid resource id '{id}': must be lowercase alphanumeric with hyphens")]
    InvalidId {
        /// The offending id.
        id: String,
    },

    /// A descriptor names a kind absent from the output registry.
    #[error("Resource '{id}' has unknown kind '{kind}'")]
    UnknownKind {
        /// Id of the offending descriptor.
        id: String,
        /// The unknown kind tag.
        kind: String,
    },
}

/// Attribute resolution errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A property references a resource id absent from the descriptor set.
    #[error("Resource '{id}' references unknown resource '{target}'")]
    UnknownReference {
        /// Id of the referencing descriptor.
        id: String,
        /// The dangling target id.
        target: String,
    },

    /// A property references an output attribute the target kind never exposes.
    #[error("Resource '{id}' references unknown output '{attribute}' of '{target}'")]
    UnknownOutput {
        /// Id of the referencing descriptor.
        id: String,
        /// Id of the referenced descriptor.
        target: String,
        /// The unknown output attribute name.
        attribute: String,
    },

    /// A descriptor references its own not-yet-existing output.
    #[error("Resource '{id}' references its own output")]
    SelfReference {
        /// Id of the offending descriptor.
        id: String,
    },
}

/// Dependency graph construction errors.
#[derive(Debug, Error)]
pub enum GraphError {
    /// An explicit predecessor id is absent from the descriptor set.
    #[error("Resource '{id}' declares unknown predecessor '{predecessor}'")]
    UnknownPredecessor {
        /// Id of the declaring descriptor.
        id: String,
        /// The dangling predecessor id.
        predecessor: String,
    },
}

/// Planning errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The dependency graph contains a cycle.
    #[error("Cyclic dependency between resources: {}", cycle.join(" -> "))]
    CyclicDependency {
        /// Ids of the resources forming the cycle, in walk order.
        cycle: Vec<String>,
    },
}

/// Plan execution errors.
///
/// These are reported by the execution harness, never by the synthesis
/// stages: a failed provisioning run does not invalidate the plan itself.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Provisioning a single resource failed.
    #[error("Failed to provision resource '{id}': {reason}")]
    ResourceFailed {
        /// Id of the failed resource.
        id: String,
        /// Reason reported by the provisioner.
        reason: String,
    },

    /// A deferred binding could not be substituted.
    #[error("Resource '{id}' needs output '{attribute}' of '{source}' but it was never reported")]
    MissingOutput {
        /// Id of the resource being dispatched.
        id: String,
        /// Id of the resource whose output is missing.
        source: String,
        /// Name of the missing output attribute.
        attribute: String,
    },

    /// Execution stopped before this batch because an earlier batch failed.
    #[error("Batch {batch} aborted: {reason}")]
    BatchAborted {
        /// Index of the aborted batch.
        batch: usize,
        /// Reason for the abort.
        reason: String,
    },
}

/// Result type alias for Stacksynth operations.
pub type Result<T> = std::result::Result<T, SynthError>;

impl SynthError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error was raised during synthesis.
    ///
    /// Synthesis errors are deterministic validation failures: retrying with
    /// the same descriptor set will fail identically. Callers must fix the
    /// descriptor set and resynthesize.
    #[must_use]
    pub const fn is_synthesis(&self) -> bool {
        matches!(
            self,
            Self::Descriptor(_) | Self::Resolve(_) | Self::Graph(_) | Self::Plan(_)
        )
    }

    /// Returns true if this error was raised during plan execution.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Exec(_))
    }
}

impl DescriptorError {
    /// Creates a parse error without a source location.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location: None,
        }
    }

    /// Creates a duplicate-id error.
    #[must_use]
    pub fn duplicate(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }
}

impl ExecError {
    /// Creates a resource-failure error.
    #[must_use]
    pub fn resource_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ResourceFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_classification() {
        let err = SynthError::Resolve(ResolveError::SelfReference {
            id: String::from("api"),
        });
        assert!(err.is_synthesis());
        assert!(!err.is_execution());
    }

    #[test]
    fn test_execution_classification() {
        let err = SynthError::Exec(ExecError::resource_failed("table", "quota exceeded"));
        assert!(err.is_execution());
        assert!(!err.is_synthesis());
    }

    #[test]
    fn test_cycle_message_lists_members() {
        let err = PlanError::CyclicDependency {
            cycle: vec![String::from("a"), String::from("b"), String::from("c")],
        };
        assert_eq!(
            err.to_string(),
            "Cyclic dependency between resources: a -> b -> c"
        );
    }
}
