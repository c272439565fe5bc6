//! plugin-manifest - plugin descriptor assembly and validation
//!
//! Assembles raw descriptor documents (XML with cross-file includes) into a
//! typed plugin manifest, validates them against a battery of content and
//! structural rules, and resolves optional-dependency configuration files
//! into a tree of descriptors.
//!
//! # Architecture
//!
//! ```text
//! document -> include expansion -> field extraction -> rule set
//!          -> PluginDescriptor -> optional-dependency fan-out -> AssemblyResult
//! ```
//!
//! Validation findings never abort the pipeline by themselves; they are
//! accumulated as [`Problem`]s and classified by severity. Error-level
//! findings fail the invocation, warning-level findings ride along with a
//! success. A failed optional dependency degrades to a warning on the
//! parent rather than failing it.
//!
//! # Example
//!
//! ```no_run
//! use plugin_manifest::{assemble_path, AssembleOptions, AssemblyResult};
//!
//! match assemble_path("plugin.xml".as_ref(), &AssembleOptions::default()) {
//!     AssemblyResult::Success { descriptor, warnings, .. } => {
//!         println!("{} v{} ({} warnings)", descriptor.name, descriptor.version, warnings.len());
//!     }
//!     AssemblyResult::Failure { problems } => {
//!         for problem in &problems {
//!             eprintln!("{}", problem);
//!         }
//!     }
//! }
//! ```

pub mod build_number;
pub mod defaults;
pub mod descriptor;
pub mod pipeline;
pub mod problem;
pub mod raw;
pub mod resolver;
pub mod result;
pub mod rules;
pub mod xml;

// Re-export main types
pub use build_number::is_valid_build_number;
pub use descriptor::{CompatibilityRange, DependencyDecl, PluginDescriptor, Vendor};
pub use pipeline::{AssembleOptions, Assembler};
pub use problem::{Problem, ProblemKind, ProblemLevel};
pub use raw::{RawCompatibility, RawDependency, RawDescriptor, RawVendor};
pub use resolver::{assemble_path, resolve_optional_dependencies};
pub use result::{has_errors, only_descriptor_problems, AssemblyResult, CodeResolver};
pub use xml::{
    ExpandError, FieldExtractor, FileIncludeExpander, IncludeExpander, XmlFieldExtractor,
};
