//! Assembly outcome and success classification

use std::fmt;

use crate::descriptor::PluginDescriptor;
use crate::problem::{Problem, ProblemLevel};

/// Opaque handle to class/byte-code resolution for a successfully built
/// plugin, attached by an external component after validation passes.
pub trait CodeResolver: fmt::Debug {
    /// Whether the resolver can locate the class with the given binary name
    fn contains_class(&self, binary_name: &str) -> bool;
}

/// Outcome of one assembly pipeline invocation.
///
/// The descriptor is only ever exposed through `Success`; a failed
/// invocation discards any partially built record.
#[derive(Debug)]
pub enum AssemblyResult {
    Success {
        descriptor: PluginDescriptor,
        /// Advisory findings; never contains an error-level problem
        warnings: Vec<Problem>,
        /// Code resolution handle, when one was attached
        resolver: Option<Box<dyn CodeResolver>>,
    },
    Failure {
        /// All accumulated findings, errors and warnings alike
        problems: Vec<Problem>,
    },
}

impl AssemblyResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AssemblyResult::Success { .. })
    }

    /// The validated descriptor, when assembly succeeded
    pub fn descriptor(&self) -> Option<&PluginDescriptor> {
        match self {
            AssemblyResult::Success { descriptor, .. } => Some(descriptor),
            AssemblyResult::Failure { .. } => None,
        }
    }

    /// All findings carried by the outcome
    pub fn problems(&self) -> &[Problem] {
        match self {
            AssemblyResult::Success { warnings, .. } => warnings,
            AssemblyResult::Failure { problems } => problems,
        }
    }
}

/// Whether any accumulated problem is error-level. Recomputed from the
/// list on every call; callers must not cache it across mutation.
pub fn has_errors(problems: &[Problem]) -> bool {
    problems.iter().any(|p| p.level() == ProblemLevel::Error)
}

/// Whether every error-level problem originates from descriptor
/// malformation. Callers use this to tell "retryable with relaxed
/// validation" apart from "fundamentally unreadable".
pub fn only_descriptor_problems(problems: &[Problem]) -> bool {
    problems
        .iter()
        .filter(|p| p.level() == ProblemLevel::Error)
        .all(|p| p.is_descriptor_problem())
}
