//! The descriptor assembly pipeline.
//!
//! One [`Assembler`] instance covers one pipeline invocation: include
//! expansion, field extraction, the pre-construction rule pass, record
//! construction, and the post-construction structural rule, with an error
//! gate after each validation phase. Collaborator failures never cross the
//! boundary as errors; each is logged and converted into exactly one
//! error-level problem.

use std::path::{Path, PathBuf};

use crate::descriptor::PluginDescriptor;
use crate::problem::{Problem, ProblemKind, ProblemLevel};
use crate::result::{has_errors, only_descriptor_problems, AssemblyResult, CodeResolver};
use crate::rules;
use crate::xml::{FieldExtractor, IncludeExpander};

/// Pipeline switches
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// When false, the rule passes are skipped entirely and any
    /// successfully extracted record is a success. Used when re-reading an
    /// already-trusted descriptor.
    pub validate: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self { validate: true }
    }
}

/// State of one assembly invocation: the problem sink plus the descriptor
/// under construction.
pub struct Assembler {
    descriptor_path: String,
    validate: bool,
    problems: Vec<Problem>,
    descriptor: Option<PluginDescriptor>,
    resolver: Option<Box<dyn CodeResolver>>,
}

/// Descriptor path used in problems: the file name of the document
fn descriptor_path_of(location: &Path) -> String {
    location
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| location.display().to_string())
}

impl Assembler {
    /// Run the assembly pipeline on one document.
    ///
    /// `location` is the path of the document itself and anchors include
    /// resolution; the document content is passed separately so callers can
    /// feed archive entries or in-memory documents.
    pub fn assemble(
        document: &str,
        location: &Path,
        expander: &dyn IncludeExpander,
        extractor: &dyn FieldExtractor,
        options: &AssembleOptions,
    ) -> Assembler {
        let mut assembler = Assembler {
            descriptor_path: descriptor_path_of(location),
            validate: options.validate,
            problems: Vec::new(),
            descriptor: None,
            resolver: None,
        };

        let expanded = match expander.expand(document, location) {
            Ok(expanded) => expanded,
            Err(err) => {
                log::error!(
                    "unable to resolve include directives of {}: {:#}",
                    assembler.descriptor_path,
                    err
                );
                let path = assembler.descriptor_path.clone();
                assembler.register_problem(Problem::new(&path, ProblemKind::UnresolvedInclude));
                return assembler;
            }
        };

        let raw = match extractor.extract(&expanded) {
            Ok(raw) => raw,
            Err(err) => {
                log::error!(
                    "unable to read descriptor {}: {:#}",
                    assembler.descriptor_path,
                    err
                );
                let path = assembler.descriptor_path.clone();
                assembler.register_problem(Problem::new(&path, ProblemKind::UnreadableDescriptor));
                return assembler;
            }
        };

        if assembler.validate {
            rules::validate_raw(&raw, &assembler.descriptor_path, &mut assembler.problems);
            if assembler.has_errors() {
                return assembler;
            }
        }

        let descriptor = PluginDescriptor::from_raw(raw);

        if assembler.validate {
            rules::validate_descriptor(
                &descriptor,
                &assembler.descriptor_path,
                &mut assembler.problems,
            );
            if assembler.has_errors() {
                // the constructed record is discarded, never exposed
                return assembler;
            }
        }

        assembler.descriptor = Some(descriptor);
        assembler
    }

    /// An assembler that failed before the pipeline could start, e.g.
    /// because the descriptor file itself could not be found or read.
    /// Only error-level problems make sense here.
    pub fn from_problem(descriptor_path: &str, problem: Problem) -> Assembler {
        debug_assert_eq!(problem.level(), ProblemLevel::Error);
        Assembler {
            descriptor_path: descriptor_path.to_string(),
            validate: true,
            problems: vec![problem],
            descriptor: None,
            resolver: None,
        }
    }

    pub fn descriptor_path(&self) -> &str {
        &self.descriptor_path
    }

    /// Append a finding to the sink
    pub fn register_problem(&mut self, problem: Problem) {
        self.problems.push(problem);
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn has_errors(&self) -> bool {
        has_errors(&self.problems)
    }

    pub fn is_success(&self) -> bool {
        !self.has_errors()
    }

    /// Whether every error so far stems from descriptor malformation
    pub fn has_only_descriptor_problems(&self) -> bool {
        only_descriptor_problems(&self.problems)
    }

    /// The descriptor under construction, if one was built
    pub fn descriptor(&self) -> Option<&PluginDescriptor> {
        self.descriptor.as_ref()
    }

    /// Record the file the descriptor originated from
    pub fn set_source_file(&mut self, file: PathBuf) {
        if let Some(descriptor) = self.descriptor.as_mut() {
            descriptor.set_source_file(file);
        }
    }

    /// Attach a resolved optional-dependency sub-descriptor, or register a
    /// warning when the child's own assembly failed. A missing or broken
    /// optional dependency is never fatal to the parent.
    pub fn add_optional_descriptor(
        &mut self,
        dependency_id: &str,
        config_file: &str,
        child: Assembler,
    ) {
        let attached = match child.into_result() {
            AssemblyResult::Success { descriptor, .. } => match self.descriptor.as_mut() {
                Some(parent) => {
                    parent.add_optional_descriptor(dependency_id, descriptor);
                    true
                }
                None => false,
            },
            AssemblyResult::Failure { .. } => false,
        };
        if !attached {
            let path = self.descriptor_path.clone();
            self.register_problem(Problem::new(
                &path,
                ProblemKind::MissingOptionalDependencyConfig {
                    dependency_id: dependency_id.to_string(),
                    config_file: config_file.to_string(),
                },
            ));
        }
    }

    /// Second success gate: attach the code resolution handle built by an
    /// external component. A failed handle downgrades the whole outcome to
    /// failure even though descriptor validation passed.
    pub fn attach_code_resolver(&mut self, resolver: anyhow::Result<Box<dyn CodeResolver>>) {
        if self.descriptor.is_none() {
            return;
        }
        match resolver {
            Ok(resolver) => self.resolver = Some(resolver),
            Err(err) => {
                log::error!(
                    "unable to read class files of {}: {:#}",
                    self.descriptor_path,
                    err
                );
                let file = self
                    .descriptor
                    .as_ref()
                    .and_then(|d| d.source_file.as_ref())
                    .map(|f| f.display().to_string())
                    .unwrap_or_else(|| self.descriptor_path.clone());
                let path = self.descriptor_path.clone();
                self.register_problem(Problem::new(
                    &path,
                    ProblemKind::UnreadableClassFiles { file },
                ));
            }
        }
    }

    /// Close the invocation and produce the outcome. A failure carries all
    /// accumulated findings, errors and warnings alike, so callers see the
    /// full diagnostic picture.
    pub fn into_result(mut self) -> AssemblyResult {
        if has_errors(&self.problems) {
            return AssemblyResult::Failure {
                problems: self.problems,
            };
        }
        match self.descriptor.take() {
            Some(descriptor) => AssemblyResult::Success {
                descriptor,
                warnings: self.problems,
                resolver: self.resolver,
            },
            // extraction never produced a record; without errors this state
            // is unreachable through the public constructors
            None => AssemblyResult::Failure {
                problems: self.problems,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{FileIncludeExpander, XmlFieldExtractor};
    use pretty_assertions::assert_eq;

    fn assemble(document: &str) -> Assembler {
        Assembler::assemble(
            document,
            Path::new("plugin.xml"),
            &FileIncludeExpander::new(),
            &XmlFieldExtractor,
            &AssembleOptions::default(),
        )
    }

    const VALID: &str = r#"<plugin>
        <id>com.example.tool</id>
        <name>Example Tool Integration</name>
        <version>1.0.3</version>
        <description>Integrates the Example Tool build system with the host workbench.</description>
        <vendor url="https://example.org" email="dev@example.org">Example Org</vendor>
        <compatibility since-build="131.1" until-build="145.*"/>
        <depends>com.host.modules.platform</depends>
    </plugin>"#;

    #[test]
    fn test_valid_descriptor_succeeds() {
        let assembler = assemble(VALID);
        assert!(assembler.is_success());
        assert!(assembler.problems().is_empty());
        match assembler.into_result() {
            AssemblyResult::Success {
                descriptor,
                warnings,
                resolver,
            } => {
                assert_eq!(descriptor.id, "com.example.tool");
                assert!(warnings.is_empty());
                assert!(resolver.is_none());
            }
            AssemblyResult::Failure { problems } => panic!("unexpected failure: {:?}", problems),
        }
    }

    #[test]
    fn test_unreadable_document_is_single_problem() {
        let assembler = assemble("<plugin><name>broken");
        assert_eq!(
            assembler.problems(),
            &[Problem::new("plugin.xml", ProblemKind::UnreadableDescriptor)]
        );
        assert!(!assembler.is_success());
    }

    #[test]
    fn test_unresolved_include_is_single_problem() {
        let assembler = assemble(r#"<plugin><xi:include href="missing.xml"/></plugin>"#);
        assert_eq!(
            assembler.problems(),
            &[Problem::new("plugin.xml", ProblemKind::UnresolvedInclude)]
        );
    }

    #[test]
    fn test_rule_errors_accumulate_before_failing() {
        let assembler = assemble("<plugin><name/><version/></plugin>");
        assert!(!assembler.is_success());
        // all rule findings are collected, not just the first
        let kinds: Vec<_> = assembler.problems().iter().map(|p| &p.kind).collect();
        assert!(kinds.contains(&&ProblemKind::PropertyNotSpecified {
            property: "name".into()
        }));
        assert!(kinds.contains(&&ProblemKind::PropertyNotSpecified {
            property: "version".into()
        }));
        assert!(kinds.contains(&&ProblemKind::PropertyNotSpecified {
            property: "vendor".into()
        }));
    }

    #[test]
    fn test_no_module_dependencies_two_phase_gate() {
        let document = VALID.replace(
            "<depends>com.host.modules.platform</depends>",
            "<depends>com.example.library</depends>",
        );
        let assembler = assemble(&document);
        assert_eq!(
            assembler.problems(),
            &[Problem::new("plugin.xml", ProblemKind::NoModuleDependencies)]
        );
        match assembler.into_result() {
            AssemblyResult::Failure { problems } => assert_eq!(problems.len(), 1),
            AssemblyResult::Success { .. } => panic!("descriptor must be discarded"),
        }
    }

    #[test]
    fn test_skip_validation_accepts_invalid_descriptor() {
        let assembler = Assembler::assemble(
            "<plugin><name/></plugin>",
            Path::new("plugin.xml"),
            &FileIncludeExpander::new(),
            &XmlFieldExtractor,
            &AssembleOptions { validate: false },
        );
        assert!(assembler.is_success());
        assert!(assembler.problems().is_empty());
        assert!(assembler.into_result().is_success());
    }

    #[test]
    fn test_warnings_survive_success() {
        let document = VALID.replace("<id>com.example.tool</id>", "");
        let document = document.replace(
            "<description>Integrates the Example Tool build system with the host workbench.</description>",
            "<description>too short</description>",
        );
        let assembler = assemble(&document);
        assert!(assembler.is_success());
        match assembler.into_result() {
            AssemblyResult::Success { warnings, .. } => {
                assert_eq!(
                    warnings,
                    vec![Problem::new("plugin.xml", ProblemKind::ShortDescription)]
                );
            }
            AssemblyResult::Failure { .. } => panic!("warnings must not fail assembly"),
        }
    }

    #[test]
    fn test_idempotence() {
        let first = assemble("<plugin><name/><version/></plugin>");
        let second = assemble("<plugin><name/><version/></plugin>");
        let mut a = first.problems().to_vec();
        let mut b = second.problems().to_vec();
        a.sort_by_key(|p| p.to_string());
        b.sort_by_key(|p| p.to_string());
        assert_eq!(a, b);
    }

    #[derive(Debug)]
    struct EmptyResolver;

    impl CodeResolver for EmptyResolver {
        fn contains_class(&self, _binary_name: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_code_resolver_success_gate() {
        let mut assembler = assemble(VALID);
        assembler.attach_code_resolver(Ok(Box::new(EmptyResolver)));
        match assembler.into_result() {
            AssemblyResult::Success { resolver, .. } => assert!(resolver.is_some()),
            AssemblyResult::Failure { .. } => panic!("resolver attachment must keep success"),
        }
    }

    #[test]
    fn test_code_resolver_failure_flips_outcome() {
        let mut assembler = assemble(VALID);
        assembler.attach_code_resolver(Err(anyhow::anyhow!("corrupt archive")));
        assert!(!assembler.is_success());
        // descriptor validation passed, so the failure is not a descriptor problem
        assert!(!assembler.has_only_descriptor_problems());
        match assembler.into_result() {
            AssemblyResult::Failure { problems } => {
                assert_eq!(
                    problems,
                    vec![Problem::new(
                        "plugin.xml",
                        ProblemKind::UnreadableClassFiles {
                            file: "plugin.xml".into()
                        }
                    )]
                );
            }
            AssemblyResult::Success { .. } => panic!("failed resolver must fail the result"),
        }
    }

    #[test]
    fn test_from_problem() {
        let assembler = Assembler::from_problem(
            "plugin.xml",
            Problem::new("plugin.xml", ProblemKind::UnreadableDescriptor),
        );
        assert!(!assembler.is_success());
        assert!(assembler.descriptor().is_none());
    }
}
