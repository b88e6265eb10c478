// src/lib.rs

//! Gantry Dependency Engine
//!
//! Maven-compatible dependency resolution: transitive closure over
//! repository descriptors, version conflict handling, scoped visibility,
//! snapshot builds, and idempotent artifact transfer.
//!
//! # Architecture
//!
//! - Coordinates: version-independent identity (group, artifact, classifier, type)
//! - Repositories: ordered probing, alias resolution, remote and local layouts
//! - Resolution: breadth-first closure, first occurrence wins position,
//!   highest version wins content
//! - Transfer: skip-if-unchanged placement verified by size and mtime
//! - Cache: SHA-1 fingerprints gating cached dependency trees

pub mod cache;
pub mod config;
pub mod dependency;
mod error;
pub mod repository;
pub mod resolver;
pub mod version;

pub use cache::FingerprintCache;
pub use config::Config;
pub use dependency::{Dependency, DependencySet, Exclusion, Module, Scope};
pub use error::{Error, Result};
pub use repository::{
    ArtifactRetriever, CachingArtifactRetriever, HttpArtifactRetriever, MavenMetadata,
    RemoteFileStamp, Repository,
};
pub use resolver::{
    transfer_dependencies, DependencyGraph, DependencyResolver, ResolutionContext,
    TransferredArtifact,
};
pub use version::{Version, VersionNumber, VersionResolution};
