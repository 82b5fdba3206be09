// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Stacksynth
//!
//! A deterministic dependency-synthesis engine for declarative resource
//! stacks.
//!
//! ## Overview
//!
//! Stacksynth takes an ordered set of resource descriptors - each a kind tag,
//! a property map that may reference other resources' output attributes, and
//! optional explicit predecessor constraints - and produces a deployment
//! plan: ordered batches of resources safe to provision concurrently, with
//! every cross-resource value marked as a static or deferred binding.
//!
//! The engine knows nothing about concrete managed services. Which output
//! attributes a kind exposes comes from a configuration-supplied registry,
//! and actual provisioning happens behind the [`executor::Provisioner`]
//! seam.
//!
//! ## Architecture
//!
//! Synthesis is a pure, single-threaded pipeline:
//!
//! 1. **Descriptors**: collected in declaration order, ids unique
//! 2. **Resolution**: references become explicit deferred bindings
//! 3. **Graph**: implicit (data-flow) and explicit (declared) edges
//! 4. **Planning**: Kahn's-style layering into deterministic batches
//! 5. **Emission**: a byte-stable JSON plan document
//!
//! ## Modules
//!
//! - [`descriptor`]: descriptor model, stack file parsing, registry,
//!   validation, fingerprinting
//! - [`synth`]: attribute resolution, graph construction, planning, emission
//! - [`pipeline`]: the synthesis state machine
//! - [`executor`]: the plan execution harness and provisioner seam
//! - [`cli`]: command-line interface
//!
//! ## Example
//!
//! ```yaml
//! stack:
//!   name: ziky
//!   environment: prod
//!
//! resources:
//!   - id: users-table
//!     kind: table
//!   - id: handler
//!     kind: function
//!     properties:
//!       table-name: {ref: users-table, attribute: name}
//!   - id: api
//!     kind: rest-api
//!     depends_on: [handler]
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod synth;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use descriptor::{
    DescriptorHasher, DescriptorSet, DescriptorValidator, OutputRegistry, PropertyValue,
    ResourceDescriptor, StackParser,
};
pub use error::{Result, SynthError};
pub use executor::{PlanRunner, Provisioner, SimulatedProvisioner};
pub use pipeline::{synthesize, SynthState, Synthesizer};
pub use synth::{
    AttributeResolver, BatchPlanner, Binding, DependencyGraph, DeploymentPlan, PlanEmitter,
};
