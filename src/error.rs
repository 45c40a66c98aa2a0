//! Error types for loading and importing registry schemas.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the import of one resource document.
///
/// `RefNotFound` is the only failure found while resolving the schema; every
/// other irregularity is reported as a problem instead. The remaining
/// variants are refusals checked before resolution starts. Nothing from a
/// failed import is inserted into the store.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{resource}: $ref \"{reference}\" does not resolve within the document")]
    RefNotFound { reference: String, resource: String },

    /// The document cannot be identified as a resource.
    #[error("document has no string typeName")]
    MissingTypeName,

    /// The document root is not a JSON object.
    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    /// Refused because the store already holds a resource with this type
    /// name. The schema itself may be fine; importing it again would leave
    /// two resources answering the same type-name lookup.
    #[error("resource {type_name} has already been imported")]
    DuplicateResource { type_name: String },
}

impl ImportError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while reading a document, before any import happens.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("document does not match the registry schema shape ({} error(s))", errors.len())]
    MetaSchema { errors: Vec<SchemaError> },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Single meta-schema violation with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the offending node.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
