// src/resolver/mod.rs

//! Coordinate resolution against configured repositories
//!
//! A [`DependencyResolver`] answers questions about one coordinate: whether
//! any repository carries it, which versions exist, and what it directly
//! depends on. Repositories are consulted strictly in configured order and
//! the first one that has the artifact wins. Version overrides are applied
//! to every coordinate the moment it is read, including parents and
//! transitive declarations.

mod graph;
mod pom;
mod transfer;

// Re-export main types
pub use graph::DependencyGraph;
pub use transfer::{transfer_dependencies, TransferredArtifact};

use crate::dependency::{Dependency, DependencySet, Scope};
use crate::error::{Error, Result};
use crate::repository::{ArtifactRetriever, MavenMetadata, Repository};
use crate::version::{Version, VersionResolution};
use pom::{EffectivePom, PomSource};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Scopes that transit through third-party artifacts
///
/// Provided- and test-scoped declarations of a fetched artifact never
/// propagate, whatever scope set the caller requested.
const TRANSITIVE_SCOPES: &[Scope] = &[Scope::Compile, Scope::Runtime];

/// Shared collaborators for one resolution run
#[derive(Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub retriever: &'a dyn ArtifactRetriever,
    pub resolution: &'a VersionResolution,
    pub repositories: &'a [Repository],
}

/// Resolves one coordinate against the repository list
pub struct DependencyResolver<'a> {
    context: ResolutionContext<'a>,
    dependency: Dependency,
}

impl<'a> DependencyResolver<'a> {
    /// Create a resolver for a coordinate, applying any version override
    pub fn new(context: ResolutionContext<'a>, dependency: &Dependency) -> Self {
        let version = context.resolution.resolve(
            &dependency.group_id,
            &dependency.artifact_id,
            &dependency.version,
        );
        Self {
            context,
            dependency: dependency.with_version(version),
        }
    }

    /// The coordinate being resolved, with its effective version
    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    /// Whether any configured repository carries the artifact
    ///
    /// With a declared version, the version must appear in the repository
    /// metadata's version list; without one, metadata presence suffices.
    /// Probe failures of any kind count as absence.
    pub fn exists(&self) -> bool {
        match self.artifact_metadata() {
            Ok(metadata) => {
                if self.dependency.version.is_unknown() {
                    true
                } else {
                    metadata
                        .versions
                        .iter()
                        .any(|v| v.compare(&self.dependency.version) == Ordering::Equal)
                }
            }
            Err(err @ Error::MetadataParse { .. }) => {
                warn!("Ignoring unusable metadata for {}: {}", self.dependency, err);
                false
            }
            Err(err) => {
                debug!("Existence probe for {} failed: {}", self.dependency, err);
                false
            }
        }
    }

    /// All versions the first responding repository publishes
    pub fn list_versions(&self) -> Result<Vec<Version>> {
        Ok(self.artifact_metadata()?.versions)
    }

    /// The metadata "latest" pointer
    pub fn latest_version(&self) -> Result<Version> {
        Ok(self.artifact_metadata()?.latest)
    }

    /// The metadata "release" pointer
    pub fn release_version(&self) -> Result<Version> {
        Ok(self.artifact_metadata()?.release)
    }

    /// The declared version, or the latest one when none was declared
    pub fn resolve_version(&self) -> Result<Version> {
        if self.dependency.version.is_unknown() {
            self.latest_version()
        } else {
            Ok(self.dependency.version.clone())
        }
    }

    /// Direct dependencies declared for the requested scopes
    ///
    /// Fetches and assembles the coordinate's descriptor, walking its parent
    /// chain, and returns declarations in descriptor order. Each returned
    /// dependency carries its declared exclusions and a parent link back to
    /// this coordinate.
    pub fn get_direct_dependencies(&self, scopes: &[Scope]) -> Result<Vec<Dependency>> {
        Ok(self
            .direct_dependencies_scoped(scopes)?
            .into_iter()
            .map(|(dependency, _)| dependency)
            .collect())
    }

    /// The full transitive closure rooted at this coordinate
    pub fn get_all_dependencies(&self, scopes: &[Scope]) -> Result<DependencySet> {
        let graph =
            DependencyGraph::resolve(self.context, std::slice::from_ref(&self.dependency), scopes)?;
        Ok(graph.into_dependencies())
    }

    /// Direct dependencies paired with their declared scope
    pub(crate) fn direct_dependencies_scoped(
        &self,
        scopes: &[Scope],
    ) -> Result<Vec<(Dependency, Scope)>> {
        let effective = EffectivePom::assemble(&self.dependency, self)?;
        let mut children = Vec::new();
        for declaration in effective.dependencies_for(scopes) {
            let declared = Version::parse(&declaration.version);
            let version = self.context.resolution.resolve(
                &declaration.group_id,
                &declaration.artifact_id,
                &declared,
            );
            let mut child =
                Dependency::new(&declaration.group_id, &declaration.artifact_id, version)
                    .with_parent(&self.dependency);
            if !declaration.classifier.is_empty() {
                child = child.with_classifier(&declaration.classifier);
            }
            if !declaration.artifact_type.is_empty() {
                child = child.with_type(&declaration.artifact_type);
            }
            child
                .exclusions
                .extend(declaration.exclusions.iter().cloned());
            children.push((child, declaration.scope));
        }
        Ok(children)
    }

    /// Artifact-level metadata from the first repository that has it
    fn artifact_metadata(&self) -> Result<MavenMetadata> {
        for repository in self.context.repositories {
            let base = repository.artifact_location(&self.dependency);
            for file_name in repository.metadata_file_names() {
                let url = format!("{}{}", base, file_name);
                if let Some(xml) = self.context.retriever.read_string(repository, &url)? {
                    return MavenMetadata::parse(&xml, &url);
                }
            }
        }
        Err(self.not_found())
    }

    /// Version-level metadata from one repository, absent when it lacks it
    fn version_metadata(
        &self,
        repository: &Repository,
        version: &Version,
    ) -> Result<Option<MavenMetadata>> {
        let versioned = self.dependency.with_version(version.clone());
        for file_name in repository.metadata_file_names() {
            let url = repository.artifact_url(&versioned, file_name);
            if let Some(xml) = self.context.retriever.read_string(repository, &url)? {
                return MavenMetadata::parse(&xml, &url).map(Some);
            }
        }
        Ok(None)
    }

    /// The version string to embed in file names served by a repository
    ///
    /// Remote repositories serve snapshot artifacts under a timestamped
    /// build version taken from version-level metadata; local ones keep the
    /// plain snapshot name. Returns None when the repository does not carry
    /// the snapshot at all.
    pub(crate) fn artifact_file_version(
        &self,
        repository: &Repository,
        version: &Version,
    ) -> Result<Option<Version>> {
        if version.is_snapshot() && !repository.is_local() {
            match self.version_metadata(repository, version)? {
                Some(metadata) => Ok(Some(metadata.snapshot_version(version))),
                None => Ok(None),
            }
        } else {
            Ok(Some(version.clone()))
        }
    }

    /// Fetch this coordinate's descriptor from the first repository that
    /// carries it
    fn fetch_descriptor(&self) -> Result<(String, String)> {
        let version = self.resolve_version()?;
        let versioned = self.dependency.with_version(version.clone());
        for repository in self.context.repositories {
            let Some(file_version) = self.artifact_file_version(repository, &version)? else {
                continue;
            };
            let file_name = format!("{}-{}.pom", self.dependency.artifact_id, file_version);
            let url = repository.artifact_url(&versioned, &file_name);
            if let Some(xml) = self.context.retriever.read_string(repository, &url)? {
                debug!("Fetched descriptor {}", url);
                return Ok((xml, url));
            }
        }
        Err(self.not_found())
    }

    fn not_found(&self) -> Error {
        Error::ArtifactNotFound {
            dependency: self.dependency.to_string(),
            repositories: self
                .context
                .repositories
                .iter()
                .map(|repository| repository.location.clone())
                .collect(),
        }
    }
}

impl PomSource for DependencyResolver<'_> {
    fn fetch_pom(&self, dependency: &Dependency) -> Result<(String, String)> {
        // Parents and imports go through a fresh resolver so overrides apply
        // to them the moment they are read
        DependencyResolver::new(self.context, dependency).fetch_descriptor()
    }
}
