//! Error types for NIP tooling.

use miette::Diagnostic;

use crate::region::Region;

/// Main error type for NIP operations
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum NipError {
    /// IO error
    #[error(transparent)]
    #[diagnostic(code(nip::io))]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error(transparent)]
    #[diagnostic_source]
    Serde(#[from] SerDeError),

    /// Storage lookup error
    #[error(transparent)]
    #[diagnostic_source]
    Storage(#[from] StorageError),

    /// Region name that is neither AU nor US
    #[error("invalid region {0:?}")]
    #[diagnostic(code(nip::region), help("regions are \"AU\" or \"US\""))]
    InvalidRegion(String),

    /// Bad configuration value
    #[error("configuration error: {0}")]
    #[diagnostic(code(nip::config))]
    Config(String),
}

/// Serialization/deserialization errors
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum SerDeError {
    #[error(transparent)]
    #[diagnostic(code(nip::serde::json))]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code(nip::serde::toml))]
    TomlDe(#[from] toml::de::Error),
}

/// Errors locating stored panels and templates.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum StorageError {
    #[error("HTML file not found in {region} region")]
    #[diagnostic(
        code(nip::storage::not_found),
        help("save the panel first, or check the region")
    )]
    NotFound { region: Region, key: String },

    #[error("an HTML file already exists for {key:?} in: {regions}")]
    #[diagnostic(
        code(nip::storage::exists),
        help("pass --force to overwrite the existing panel")
    )]
    AlreadyExists { key: String, regions: String },

    #[error("template not found for {key:?}")]
    #[diagnostic(code(nip::storage::template_not_found))]
    TemplateNotFound { key: String },

    #[error("identifier {0:?} produces an empty storage key")]
    #[diagnostic(
        code(nip::storage::empty_key),
        help("product identifiers need at least one character")
    )]
    EmptyKey(String),
}

impl From<serde_json::Error> for NipError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(SerDeError::Json(err))
    }
}

impl From<toml::de::Error> for NipError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serde(SerDeError::TomlDe(err))
    }
}

pub type Result<T, E = NipError> = std::result::Result<T, E>;
