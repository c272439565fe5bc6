//! The descriptor rule set.
//!
//! Each rule is a pure function of its field(s) and the descriptor path,
//! appending zero or more problems to a shared sink. Rules are independent
//! and accumulation is commutative; the only ordering that matters is the
//! documented short-circuit inside the description and change-notes chains.

use regex::Regex;
use std::sync::LazyLock;

use crate::build_number::is_valid_build_number;
use crate::defaults;
use crate::descriptor::PluginDescriptor;
use crate::problem::{Problem, ProblemKind};
use crate::raw::{RawCompatibility, RawDependency, RawDescriptor, RawVendor};

/// Latin letters and whitespace, the characters counted for script coverage
static LATIN_OR_SPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z]|\s").expect("latin coverage pattern is valid")
});

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn blank_or_missing(s: Option<&str>) -> bool {
    s.map_or(true, is_blank)
}

/// Run every pre-construction rule against the raw field set
pub fn validate_raw(raw: &RawDescriptor, descriptor_path: &str, sink: &mut Vec<Problem>) {
    validate_id(raw.id.as_deref(), descriptor_path, sink);
    validate_name(raw.name.as_deref(), descriptor_path, sink);
    validate_version(raw.version.as_deref(), descriptor_path, sink);
    validate_description(raw.description.as_deref(), descriptor_path, sink);
    validate_change_notes(raw.change_notes.as_deref(), descriptor_path, sink);
    validate_vendor(raw.vendor.as_ref(), descriptor_path, sink);
    validate_compatibility(raw.compatibility.as_ref(), descriptor_path, sink);
    validate_dependencies(&raw.dependencies, descriptor_path, sink);
    validate_modules(&raw.modules, descriptor_path, sink);
}

/// Post-construction structural rule: the descriptor must declare at least
/// one module dependency. Runs against the constructed record because
/// module-dependency classification needs resolved declarations.
pub fn validate_descriptor(
    descriptor: &PluginDescriptor,
    descriptor_path: &str,
    sink: &mut Vec<Problem>,
) {
    if descriptor.module_dependencies().next().is_none() {
        sink.push(Problem::new(
            descriptor_path,
            ProblemKind::NoModuleDependencies,
        ));
    }
}

/// A missing id is allowed (it falls back to the name); only the template
/// placeholder is flagged.
pub fn validate_id(id: Option<&str>, descriptor_path: &str, sink: &mut Vec<Problem>) {
    if id == Some(defaults::PLACEHOLDER_ID) {
        sink.push(Problem::new(
            descriptor_path,
            ProblemKind::PropertyWithDefaultValue {
                property: "id".into(),
            },
        ));
    }
}

pub fn validate_name(name: Option<&str>, descriptor_path: &str, sink: &mut Vec<Problem>) {
    let name = match name {
        Some(name) if !is_blank(name) => name,
        _ => {
            sink.push(Problem::new(
                descriptor_path,
                ProblemKind::PropertyNotSpecified {
                    property: "name".into(),
                },
            ));
            return;
        }
    };
    if name == defaults::PLACEHOLDER_NAME {
        sink.push(Problem::new(
            descriptor_path,
            ProblemKind::PropertyWithDefaultValue {
                property: "name".into(),
            },
        ));
    } else if defaults::REDUNDANT_NAME_WORD.contains(name) {
        // TODO: confirm the containment direction. This matches the shipped
        // behavior (the trigger word containing the name), though the intent
        // reads as the opposite check.
        sink.push(Problem::new(
            descriptor_path,
            ProblemKind::RedundantWordInName,
        ));
    }
}

pub fn validate_version(version: Option<&str>, descriptor_path: &str, sink: &mut Vec<Problem>) {
    if blank_or_missing(version) {
        sink.push(Problem::new(
            descriptor_path,
            ProblemKind::PropertyNotSpecified {
                property: "version".into(),
            },
        ));
    }
}

/// Description checks short-circuit: a missing description is only reported
/// as missing, a short one only as short, and so on down the chain.
pub fn validate_description(
    description: Option<&str>,
    descriptor_path: &str,
    sink: &mut Vec<Problem>,
) {
    let description = match description {
        Some(d) if !is_blank(d) => d,
        _ => {
            sink.push(Problem::new(
                descriptor_path,
                ProblemKind::PropertyNotSpecified {
                    property: "description".into(),
                },
            ));
            return;
        }
    };

    if description.chars().count() < defaults::MIN_DESCRIPTION_LENGTH {
        sink.push(Problem::new(descriptor_path, ProblemKind::ShortDescription));
        return;
    }

    if defaults::DESCRIPTION_PLACEHOLDERS
        .iter()
        .any(|p| description.contains(p))
    {
        sink.push(Problem::new(
            descriptor_path,
            ProblemKind::DefaultDescription,
        ));
        return;
    }

    let latin = LATIN_OR_SPACE.find_iter(description).count();
    if latin < defaults::MIN_LATIN_CHARACTERS {
        sink.push(Problem::new(
            descriptor_path,
            ProblemKind::NonLatinDescription,
        ));
    }
}

/// Change notes are optional; when present the same length and placeholder
/// checks as for the description apply.
pub fn validate_change_notes(
    change_notes: Option<&str>,
    descriptor_path: &str,
    sink: &mut Vec<Problem>,
) {
    let change_notes = match change_notes {
        Some(c) if !is_blank(c) => c,
        _ => return,
    };

    if change_notes.chars().count() < defaults::MIN_CHANGE_NOTES_LENGTH {
        sink.push(Problem::new(descriptor_path, ProblemKind::ShortChangeNotes));
        return;
    }

    if defaults::CHANGE_NOTES_PLACEHOLDERS
        .iter()
        .any(|p| change_notes.contains(p))
    {
        sink.push(Problem::new(
            descriptor_path,
            ProblemKind::DefaultChangeNotes,
        ));
    }
}

pub fn validate_vendor(vendor: Option<&RawVendor>, descriptor_path: &str, sink: &mut Vec<Problem>) {
    let vendor = match vendor {
        Some(v) if !blank_or_missing(v.name.as_deref()) => v,
        _ => {
            sink.push(Problem::new(
                descriptor_path,
                ProblemKind::PropertyNotSpecified {
                    property: "vendor".into(),
                },
            ));
            return;
        }
    };

    if vendor.name.as_deref() == Some(defaults::PLACEHOLDER_VENDOR_NAME) {
        sink.push(Problem::new(
            descriptor_path,
            ProblemKind::PropertyWithDefaultValue {
                property: "vendor".into(),
            },
        ));
    }
    if vendor.url.as_deref() == Some(defaults::PLACEHOLDER_VENDOR_URL) {
        sink.push(Problem::new(
            descriptor_path,
            ProblemKind::PropertyWithDefaultValue {
                property: "vendor url".into(),
            },
        ));
    }
    if vendor.email.as_deref() == Some(defaults::PLACEHOLDER_VENDOR_EMAIL) {
        sink.push(Problem::new(
            descriptor_path,
            ProblemKind::PropertyWithDefaultValue {
                property: "vendor email".into(),
            },
        ));
    }
}

pub fn validate_compatibility(
    compatibility: Option<&RawCompatibility>,
    descriptor_path: &str,
    sink: &mut Vec<Problem>,
) {
    let compatibility = match compatibility {
        Some(c) => c,
        None => {
            sink.push(Problem::new(
                descriptor_path,
                ProblemKind::PropertyNotSpecified {
                    property: "compatibility".into(),
                },
            ));
            return;
        }
    };

    match compatibility.since_build.as_deref() {
        None => {
            sink.push(Problem::new(
                descriptor_path,
                ProblemKind::SinceBuildNotSpecified,
            ));
        }
        Some(since) if !is_valid_build_number(since) => {
            sink.push(Problem::new(
                descriptor_path,
                ProblemKind::InvalidSinceBuild {
                    build: since.to_string(),
                },
            ));
        }
        Some(_) => {}
    }

    if let Some(until) = compatibility.until_build.as_deref() {
        if !is_valid_build_number(until) {
            sink.push(Problem::new(
                descriptor_path,
                ProblemKind::InvalidUntilBuild {
                    build: until.to_string(),
                },
            ));
        }
    }
}

pub fn validate_dependencies(
    dependencies: &[RawDependency],
    descriptor_path: &str,
    sink: &mut Vec<Problem>,
) {
    for dependency in dependencies {
        if is_blank(&dependency.id) {
            sink.push(Problem::new(
                descriptor_path,
                ProblemKind::InvalidDependencyId,
            ));
        }
    }
}

pub fn validate_modules(modules: &[String], descriptor_path: &str, sink: &mut Vec<Problem>) {
    for module in modules {
        if is_blank(module) {
            sink.push(Problem::new(descriptor_path, ProblemKind::InvalidModuleId));
        }
    }
}
