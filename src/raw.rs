//! Raw field set produced by descriptor extraction.
//!
//! Everything here is optional and unvalidated: the extractor records what
//! the document says, the rule set decides what is acceptable, and
//! [`crate::descriptor::PluginDescriptor`] is only built once the rules
//! have passed.

/// Unvalidated field set extracted from one descriptor document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDescriptor {
    pub id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub change_notes: Option<String>,
    pub vendor: Option<RawVendor>,
    pub compatibility: Option<RawCompatibility>,
    pub dependencies: Vec<RawDependency>,
    pub modules: Vec<String>,
}

/// Vendor element as found in the document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawVendor {
    pub name: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
}

/// Compatibility range element as found in the document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCompatibility {
    pub since_build: Option<String>,
    pub until_build: Option<String>,
}

/// One dependency declaration as found in the document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDependency {
    /// Declared dependency id; may be blank, which the rules reject
    pub id: String,
    /// Whether the dependency is declared optional
    pub optional: bool,
    /// Configuration file holding the sub-descriptor for an optional dependency
    pub config_file: Option<String>,
}
