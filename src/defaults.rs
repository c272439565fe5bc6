//! Placeholder values and thresholds recognized by the content rules.
//!
//! These are the values left behind by the descriptor template that ships
//! with the host SDK; finding one of them in a descriptor means the author
//! never filled the field in. Kept as one constant table rather than
//! literals scattered through the rules.

/// Template value of the `id` field
pub const PLACEHOLDER_ID: &str = "com.your.company.unique.plugin.id";

/// Template value of the `name` field
pub const PLACEHOLDER_NAME: &str = "Plugin display name here";

/// Word that is redundant inside a descriptor name
pub const REDUNDANT_NAME_WORD: &str = "plugin";

/// Template phrases found in unedited descriptions
pub const DESCRIPTION_PLACEHOLDERS: &[&str] = &[
    "Enter short description for your plugin here.",
    "most HTML tags may be used",
];

/// Template phrases found in unedited change notes
pub const CHANGE_NOTES_PLACEHOLDERS: &[&str] =
    &["Add change notes here", "most HTML tags may be used"];

/// Template value of the vendor name
pub const PLACEHOLDER_VENDOR_NAME: &str = "YourCompany";

/// Template value of the vendor url
pub const PLACEHOLDER_VENDOR_URL: &str = "http://www.yourcompany.com";

/// Template value of the vendor email
pub const PLACEHOLDER_VENDOR_EMAIL: &str = "support@yourcompany.com";

/// Prefix marking a dependency id as a host module dependency
pub const MODULE_DEPENDENCY_PREFIX: &str = "com.host.modules.";

/// Minimum acceptable description length, in characters
pub const MIN_DESCRIPTION_LENGTH: usize = 40;

/// Minimum acceptable change-notes length, in characters
pub const MIN_CHANGE_NOTES_LENGTH: usize = 40;

/// Minimum count of Latin letters and whitespace in a description
pub const MIN_LATIN_CHARACTERS: usize = 40;
