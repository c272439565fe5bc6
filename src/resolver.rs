//! Optional-dependency resolution.
//!
//! An optional dependency may point at a configuration file that is itself
//! a full descriptor, recursively. Each referenced file gets its own
//! pipeline invocation; a successful child is attached to the parent under
//! the dependency id, a failed one registers a warning on the parent and
//! is dropped. Sibling resolutions are independent of one another.

use std::path::{Path, PathBuf};

use crate::pipeline::{AssembleOptions, Assembler};
use crate::problem::{Problem, ProblemKind};
use crate::result::AssemblyResult;
use crate::xml::{FileIncludeExpander, XmlFieldExtractor};

/// Resolve the optional dependencies declared by a successful assembly,
/// loading each referenced configuration file through `load`.
///
/// `load` receives the configuration-file reference exactly as declared;
/// interpreting it (relative path, archive entry, ...) is the caller's
/// concern.
pub fn resolve_optional_dependencies<F>(assembler: &mut Assembler, mut load: F)
where
    F: FnMut(&str) -> Assembler,
{
    let configs = match assembler.descriptor() {
        Some(descriptor) => descriptor.optional_dependency_config_files(),
        None => return,
    };
    for (dependency_id, config_file) in configs {
        let child = load(&config_file);
        assembler.add_optional_descriptor(&dependency_id, &config_file, child);
    }
}

/// Assemble a descriptor file from disk, recursively resolving its
/// optional-dependency configuration files relative to the parent file's
/// directory.
pub fn assemble_path(descriptor_file: &Path, options: &AssembleOptions) -> AssemblyResult {
    let expander = FileIncludeExpander::new();
    let extractor = XmlFieldExtractor;
    let mut in_progress = Vec::new();
    assemble_file(descriptor_file, options, &expander, &extractor, &mut in_progress).into_result()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn assemble_file(
    path: &Path,
    options: &AssembleOptions,
    expander: &FileIncludeExpander,
    extractor: &XmlFieldExtractor,
    in_progress: &mut Vec<PathBuf>,
) -> Assembler {
    let descriptor_path = file_name_of(path);
    let document = match std::fs::read_to_string(path) {
        Ok(document) => document,
        Err(err) => {
            log::error!("unable to read descriptor file {}: {}", path.display(), err);
            return Assembler::from_problem(
                &descriptor_path,
                Problem::new(&descriptor_path, ProblemKind::UnreadableDescriptor),
            );
        }
    };

    let mut assembler = Assembler::assemble(&document, path, expander, extractor, options);
    assembler.set_source_file(path.to_path_buf());
    if !assembler.is_success() {
        return assembler;
    }

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let configs = assembler
        .descriptor()
        .map(|d| d.optional_dependency_config_files())
        .unwrap_or_default();

    in_progress.push(normalize(path));
    for (dependency_id, config_file) in configs {
        let child_path = base_dir.join(&config_file);
        if in_progress.contains(&normalize(&child_path)) {
            log::warn!(
                "optional dependency config {} of {} references an ancestor descriptor",
                config_file,
                descriptor_path
            );
            assembler.register_problem(Problem::new(
                &descriptor_path,
                ProblemKind::CyclicOptionalDependency {
                    config_file: config_file.clone(),
                },
            ));
            continue;
        }
        let child = assemble_file(&child_path, options, expander, extractor, in_progress);
        assembler.add_optional_descriptor(&dependency_id, &config_file, child);
    }
    in_progress.pop();

    assembler
}

/// Stable form of a path for ancestor comparison. Canonicalization needs
/// the file to exist; fall back to the joined path when it does not.
fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
