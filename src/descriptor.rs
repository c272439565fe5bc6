//! Typed in-memory plugin descriptor

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::defaults;
use crate::raw::RawDescriptor;

/// Vendor metadata of a descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Vendor {
    pub name: String,
    pub url: String,
    pub email: String,
}

/// Host build range the plugin declares itself compatible with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompatibilityRange {
    pub since_build: Option<String>,
    pub until_build: Option<String>,
}

/// One declared dependency of a descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyDecl {
    pub id: String,
    pub optional: bool,
    /// Configuration file of an optional dependency, if declared
    pub config_file: Option<String>,
}

impl DependencyDecl {
    /// Whether this dependency refers to a host module rather than another plugin
    pub fn is_module(&self) -> bool {
        self.id.starts_with(defaults::MODULE_DEPENDENCY_PREFIX)
    }
}

/// A validated plugin manifest: the top-level descriptor or one
/// optional-dependency configuration file.
///
/// Created once per successful pipeline invocation. The only mutations
/// afterwards are attaching the originating file and attaching resolved
/// optional-dependency children.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PluginDescriptor {
    /// Effective plugin id; falls back to the name when the document omits it
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub change_notes: String,
    pub vendor: Vendor,
    pub compatibility: Option<CompatibilityRange>,
    /// All declared dependencies, required and optional
    pub dependencies: Vec<DependencyDecl>,
    /// Module ids this plugin itself declares
    pub modules: Vec<String>,
    /// Resolved sub-descriptors of optional dependencies, keyed by dependency id.
    /// Never contains a child whose own assembly reported an error.
    pub optional_descriptors: BTreeMap<String, PluginDescriptor>,
    /// File this descriptor was read from, if known
    pub source_file: Option<PathBuf>,
}

impl PluginDescriptor {
    /// Build a descriptor from an extracted field set.
    ///
    /// The raw fields are taken as-is; whether they were acceptable is the
    /// rule set's concern, decided before this constructor runs.
    pub fn from_raw(raw: RawDescriptor) -> Self {
        let name = raw.name.unwrap_or_default();
        let id = match raw.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => name.clone(),
        };
        Self {
            id,
            name,
            version: raw.version.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            change_notes: raw.change_notes.unwrap_or_default(),
            vendor: raw
                .vendor
                .map(|v| Vendor {
                    name: v.name.unwrap_or_default(),
                    url: v.url.unwrap_or_default(),
                    email: v.email.unwrap_or_default(),
                })
                .unwrap_or_default(),
            compatibility: raw.compatibility.map(|c| CompatibilityRange {
                since_build: c.since_build,
                until_build: c.until_build,
            }),
            dependencies: raw
                .dependencies
                .into_iter()
                .map(|d| DependencyDecl {
                    id: d.id,
                    optional: d.optional,
                    config_file: d.config_file,
                })
                .collect(),
            modules: raw.modules,
            optional_descriptors: BTreeMap::new(),
            source_file: None,
        }
    }

    /// Dependencies that refer to host modules
    pub fn module_dependencies(&self) -> impl Iterator<Item = &DependencyDecl> {
        self.dependencies.iter().filter(|d| d.is_module())
    }

    /// (dependency id, configuration file) pairs of optional dependencies
    /// that carry a configuration-file reference
    pub fn optional_dependency_config_files(&self) -> Vec<(String, String)> {
        self.dependencies
            .iter()
            .filter(|d| d.optional)
            .filter_map(|d| {
                d.config_file
                    .as_ref()
                    .map(|file| (d.id.clone(), file.clone()))
            })
            .collect()
    }

    /// Record the file this descriptor was read from
    pub fn set_source_file(&mut self, file: PathBuf) {
        self.source_file = Some(file);
    }

    /// Attach the resolved sub-descriptor of an optional dependency
    pub fn add_optional_descriptor(&mut self, dependency_id: &str, child: PluginDescriptor) {
        self.optional_descriptors
            .insert(dependency_id.to_string(), child);
    }
}
