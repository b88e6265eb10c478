// src/repository/mod.rs

//! Artifact repositories
//!
//! This module provides:
//! - Repository locations, alias resolution, and artifact path layout
//! - Repository metadata document parsing
//! - Transport-neutral artifact retrieval over HTTP(S) and the filesystem

mod locator;
mod metadata;
mod retriever;

// Re-export main types
pub use locator::{
    Repository, APACHE_RELEASES, GOOGLE_MAVEN, MAVEN_CENTRAL, SONATYPE_RELEASES,
    SONATYPE_SNAPSHOTS,
};
pub use metadata::MavenMetadata;
pub use retriever::{
    ArtifactRetriever, CachingArtifactRetriever, HttpArtifactRetriever, RemoteFileStamp,
};
