// src/error.rs
//! Error types for resolution, retrieval, and configuration

use thiserror::Error;

/// Errors surfaced by the resolution and transfer engine
#[derive(Error, Debug)]
pub enum Error {
    /// No configured repository carries the artifact
    #[error("unable to locate artifact '{dependency}' in: {}", repositories.join(", "))]
    ArtifactNotFound {
        dependency: String,
        repositories: Vec<String>,
    },

    /// Transport failure while fetching bytes
    #[error("unable to retrieve artifact '{url}': {reason}")]
    ArtifactRetrieval { url: String, reason: String },

    /// Malformed dependency descriptor, carries every parse diagnostic
    #[error("unable to parse descriptor for '{dependency}': {}", errors.join("; "))]
    DescriptorParse {
        dependency: String,
        errors: Vec<String>,
    },

    /// Malformed repository metadata document
    #[error("unable to parse repository metadata at '{url}': {}", errors.join("; "))]
    MetadataParse { url: String, errors: Vec<String> },

    /// Malformed textual dependency notation
    #[error("invalid dependency notation '{notation}': {reason}")]
    DependencyNotation { notation: String, reason: String },

    /// Unresolvable repository alias or malformed configuration directive
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// I/O error during transfer or local repository access
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
