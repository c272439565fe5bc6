//! Problem types for descriptor validation findings

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::defaults;

/// Severity level of a validation problem
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProblemLevel {
    /// Advisory finding - never fails an assembly
    #[default]
    Warning,
    /// Fatal finding - fails the current assembly
    Error,
}

impl fmt::Display for ProblemLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemLevel::Warning => write!(f, "warning"),
            ProblemLevel::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for ProblemLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warning" | "warn" => Ok(ProblemLevel::Warning),
            "error" | "err" => Ok(ProblemLevel::Error),
            _ => Err(()),
        }
    }
}

/// Classification of a validation finding, carrying its message-relevant fields
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProblemKind {
    /// A required property is missing or blank
    PropertyNotSpecified { property: String },
    /// A property still holds the template placeholder value
    PropertyWithDefaultValue { property: String },
    /// The descriptor name repeats the hosting concept's own word
    RedundantWordInName,
    /// Description is shorter than the minimum length
    ShortDescription,
    /// Description is the template placeholder text
    DefaultDescription,
    /// Description does not contain enough Latin characters
    NonLatinDescription,
    /// Change notes are shorter than the minimum length
    ShortChangeNotes,
    /// Change notes are the template placeholder text
    DefaultChangeNotes,
    /// Compatibility range lacks a since-build
    SinceBuildNotSpecified,
    /// since-build is not a syntactically valid build number
    InvalidSinceBuild { build: String },
    /// until-build is not a syntactically valid build number
    InvalidUntilBuild { build: String },
    /// A dependency declaration has a blank id
    InvalidDependencyId,
    /// A module declaration is blank
    InvalidModuleId,
    /// The descriptor declares no module dependencies at all
    NoModuleDependencies,
    /// Cross-file include directives could not be resolved
    UnresolvedInclude,
    /// The descriptor document could not be read into a field set
    UnreadableDescriptor,
    /// The code files attached to a valid descriptor could not be read
    UnreadableClassFiles { file: String },
    /// An optional dependency's configuration file is missing or invalid
    MissingOptionalDependencyConfig {
        dependency_id: String,
        config_file: String,
    },
    /// An optional dependency's configuration file references its own ancestor
    CyclicOptionalDependency { config_file: String },
}

impl ProblemKind {
    /// Severity of this kind of finding
    pub fn level(&self) -> ProblemLevel {
        match self {
            ProblemKind::PropertyWithDefaultValue { .. }
            | ProblemKind::RedundantWordInName
            | ProblemKind::ShortDescription
            | ProblemKind::DefaultDescription
            | ProblemKind::NonLatinDescription
            | ProblemKind::ShortChangeNotes
            | ProblemKind::DefaultChangeNotes
            | ProblemKind::MissingOptionalDependencyConfig { .. }
            | ProblemKind::CyclicOptionalDependency { .. } => ProblemLevel::Warning,
            ProblemKind::PropertyNotSpecified { .. }
            | ProblemKind::SinceBuildNotSpecified
            | ProblemKind::InvalidSinceBuild { .. }
            | ProblemKind::InvalidUntilBuild { .. }
            | ProblemKind::InvalidDependencyId
            | ProblemKind::InvalidModuleId
            | ProblemKind::NoModuleDependencies
            | ProblemKind::UnresolvedInclude
            | ProblemKind::UnreadableDescriptor
            | ProblemKind::UnreadableClassFiles { .. } => ProblemLevel::Error,
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemKind::PropertyNotSpecified { property } => {
                write!(f, "{} is not specified", property)
            }
            ProblemKind::PropertyWithDefaultValue { property } => {
                write!(f, "{} has the default template value", property)
            }
            ProblemKind::RedundantWordInName => {
                write!(
                    f,
                    "name should not include the word '{}'",
                    defaults::REDUNDANT_NAME_WORD
                )
            }
            ProblemKind::ShortDescription => write!(
                f,
                "description is shorter than {} characters",
                defaults::MIN_DESCRIPTION_LENGTH
            ),
            ProblemKind::DefaultDescription => {
                write!(f, "description is the default template text")
            }
            ProblemKind::NonLatinDescription => write!(
                f,
                "description must contain at least {} Latin characters",
                defaults::MIN_LATIN_CHARACTERS
            ),
            ProblemKind::ShortChangeNotes => write!(
                f,
                "change notes are shorter than {} characters",
                defaults::MIN_CHANGE_NOTES_LENGTH
            ),
            ProblemKind::DefaultChangeNotes => {
                write!(f, "change notes are the default template text")
            }
            ProblemKind::SinceBuildNotSpecified => write!(f, "since-build is not specified"),
            ProblemKind::InvalidSinceBuild { build } => {
                write!(f, "invalid since-build: '{}'", build)
            }
            ProblemKind::InvalidUntilBuild { build } => {
                write!(f, "invalid until-build: '{}'", build)
            }
            ProblemKind::InvalidDependencyId => write!(f, "dependency id is not specified"),
            ProblemKind::InvalidModuleId => write!(f, "module declaration is empty"),
            ProblemKind::NoModuleDependencies => {
                write!(f, "descriptor does not declare any module dependencies")
            }
            ProblemKind::UnresolvedInclude => {
                write!(f, "unable to resolve include directives")
            }
            ProblemKind::UnreadableDescriptor => write!(f, "unable to read the descriptor"),
            ProblemKind::UnreadableClassFiles { file } => {
                write!(f, "unable to read class files: {}", file)
            }
            ProblemKind::MissingOptionalDependencyConfig {
                dependency_id,
                config_file,
            } => write!(
                f,
                "configuration file '{}' of optional dependency '{}' is missing or invalid",
                config_file, dependency_id
            ),
            ProblemKind::CyclicOptionalDependency { config_file } => write!(
                f,
                "optional dependency configuration file '{}' references its own ancestor",
                config_file
            ),
        }
    }
}

/// A single validation finding against one descriptor document.
///
/// Immutable once created; identity is structural (kind, path and
/// parameters), so problem lists can be compared order-independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Problem {
    /// Path of the descriptor the finding refers to (e.g. "plugin.xml")
    pub descriptor_path: String,
    /// Finding classification with its parameters
    #[serde(flatten)]
    pub kind: ProblemKind,
}

impl Problem {
    /// Create a new problem
    pub fn new(descriptor_path: &str, kind: ProblemKind) -> Self {
        Self {
            descriptor_path: descriptor_path.to_string(),
            kind,
        }
    }

    /// Severity of this problem
    pub fn level(&self) -> ProblemLevel {
        self.kind.level()
    }

    /// Check if this is an error-level problem
    pub fn is_error(&self) -> bool {
        self.level() == ProblemLevel::Error
    }

    /// Check if this is a warning-level problem
    pub fn is_warning(&self) -> bool {
        self.level() == ProblemLevel::Warning
    }

    /// Whether the finding originates from descriptor malformation, as
    /// opposed to unrelated artifacts such as unreadable code files.
    /// Callers use this to decide whether a failure is retryable with
    /// relaxed validation.
    pub fn is_descriptor_problem(&self) -> bool {
        !matches!(self.kind, ProblemKind::UnreadableClassFiles { .. })
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.descriptor_path, self.level(), self.kind)
    }
}
