// src/error.rs

use thiserror::Error;

/// Core error types for bowerpm
///
/// Every variant is fatal to the operation that produced it. Messages embed
/// the package name, path or URL involved so the command layer can print them
/// as-is.
#[derive(Error, Debug)]
pub enum Error {
    /// Registry lookup or search failed
    #[error("Registry error: {0}")]
    Registry(String),

    /// Tag listing, manifest fetch or release download failed
    #[error("Repository error: {0}")]
    Repository(String),

    /// No tag matched the requested constraint
    #[error("Cannot find package {name} version {constraint}")]
    VersionNotFound { name: String, constraint: String },

    /// A fetched manifest could not be parsed
    #[error("Invalid manifest for package {name}: {reason}")]
    Manifest { name: String, reason: String },

    /// Local manifest files or .bowerrc are missing or malformed
    #[error("Config error: {0}")]
    Config(String),

    /// The package has no local install record
    #[error("Package {0} is not installed")]
    NotInstalled(String),

    /// Archive could not be read or contains unsafe entries
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// A package name that is not a single path component
    #[error("Invalid package name `{0}`")]
    InvalidName(String),

    /// Unknown field requested from package info
    #[error("Unsupported info field: {0}")]
    UnsupportedField(String),

    /// Internal misuse of the API
    #[error("Logic error: {0}")]
    Logic(String),

    /// A package was reached again while it was still being resolved
    #[error("Dependency cycle detected: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    /// An update would break a constraint declared by an installed dependent
    #[error(
        "Cannot update {name} to {version}: {dependent} requires {name} {constraint}"
    )]
    Conflict {
        name: String,
        version: String,
        dependent: String,
        constraint: String,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using bowerpm's Error type
pub type Result<T> = std::result::Result<T, Error>;
