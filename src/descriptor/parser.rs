//! Stack file parser for loading descriptor sets.
//!
//! This module handles loading a declarative stack definition from YAML,
//! merging its registry extensions over the built-in kind table, and
//! producing the ordered [`DescriptorSet`] the synthesis pipeline consumes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DescriptorError, Result, SynthError};

use super::model::{DescriptorSet, ResourceDescriptor};
use super::registry::{OutputRegistry, RegistryEntry};

/// Default stack file names probed by [`find_stack_file`].
const DEFAULT_STACK_FILES: &[&str] = &["stacksynth.stack.yaml", "stack.yaml", "stack.yml"];

/// Raw shape of a stack file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackFile {
    /// Stack-level metadata.
    pub stack: StackMeta,
    /// Registry extensions (kind → outputs) merged over the built-ins.
    #[serde(default)]
    pub registry: Vec<RegistryEntry>,
    /// Resource descriptors in declaration order.
    #[serde(default)]
    pub resources: Vec<ResourceDescriptor>,
}

/// Stack-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackMeta {
    /// Unique name for the stack.
    pub name: String,
    /// Environment (e.g., "dev", "staging", "prod").
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// A parsed stack ready for synthesis.
#[derive(Debug, Clone)]
pub struct LoadedStack {
    /// Stack metadata.
    pub meta: StackMeta,
    /// Output registry: built-ins plus file extensions.
    pub registry: OutputRegistry,
    /// Ordered descriptor set.
    pub set: DescriptorSet,
}

/// Parser for loading stack definitions.
#[derive(Debug, Default)]
pub struct StackParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

/// Default environment name.
fn default_environment() -> String {
    String::from("dev")
}

impl StackParser {
    /// Creates a new stack parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a `.env` file if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error only for malformed `.env` content; a missing file is
    /// fine.
    pub fn load_dotenv(&self) -> Result<()> {
        let path = self
            .base_path
            .as_deref()
            .map_or_else(|| PathBuf::from(".env"), |base| base.join(".env"));

        match dotenvy::from_path(&path) {
            Ok(()) => {
                debug!("Loaded environment from {}", path.display());
                Ok(())
            }
            Err(dotenvy::Error::Io(_)) => Ok(()),
            Err(e) => Err(SynthError::Descriptor(DescriptorError::ParseError {
                message: format!("Invalid .env file: {e}"),
                location: Some(path.display().to_string()),
            })),
        }
    }

    /// Loads a stack definition from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// descriptor list violates id uniqueness.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<LoadedStack> {
        let path = path.as_ref();
        info!("Loading stack from: {}", path.display());

        if !path.exists() {
            return Err(SynthError::Descriptor(DescriptorError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            SynthError::Descriptor(DescriptorError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses a stack definition from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or a resource id is duplicated.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<LoadedStack> {
        debug!("Parsing YAML stack definition");

        let file: StackFile = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            SynthError::Descriptor(DescriptorError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!("Parsed stack definition for: {}", file.stack.name);
        assemble(file)
    }
}

/// Assembles a raw stack file into a [`LoadedStack`].
///
/// Registry extensions are merged over the built-in kind table; descriptor
/// ids are checked for uniqueness while declaration order is preserved.
///
/// # Errors
///
/// Returns an error on the first duplicate resource id.
pub fn assemble(file: StackFile) -> Result<LoadedStack> {
    let mut registry = OutputRegistry::builtin();
    registry.extend_from_entries(file.registry);

    let set = DescriptorSet::from_descriptors(file.resources)?;

    Ok(LoadedStack {
        meta: file.stack,
        registry,
        set,
    })
}

/// Searches for a stack file in the given directory.
///
/// Probes the default file names in order and returns the first that exists.
#[must_use]
pub fn find_stack_file(dir: impl AsRef<Path>) -> Option<PathBuf> {
    let dir = dir.as_ref();
    DEFAULT_STACK_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.exists())
}
