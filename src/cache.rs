// src/cache.rs

//! Resolution fingerprint cache
//!
//! Two independent fingerprint domains, "extensions" and "dependencies",
//! each keyed by a SHA-1 digest over the version overrides, the configured
//! repositories, the declared coordinates and the source/javadoc download
//! flags. When the persisted digest matches the freshly computed one, the
//! expensive work it stands for (resolution, transfer, tree rendering) can
//! be skipped; any mismatch discards the cached results for that domain and
//! leaves the other domain untouched. Cache file corruption is never an
//! error, the file is simply treated as absent.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};

use crate::dependency::Scope;
use crate::error::{Error, Result};
use crate::repository::Repository;
use crate::version::VersionResolution;

/// File name of the persisted cache inside its directory
pub const CACHE_FILE_NAME: &str = "gantry.cache";

const EXTENSIONS_HASH: &str = "extensions.hash";
const EXTENSIONS_SOURCES: &str = "extensions.sources";
const EXTENSIONS_JAVADOC: &str = "extensions.javadoc";
const EXTENSIONS_LOCAL: &str = "extensions.local";
const DEPENDENCIES_HASH: &str = "dependencies.hash";
const DEPENDENCIES_SOURCES: &str = "dependencies.sources";
const DEPENDENCIES_JAVADOC: &str = "dependencies.javadoc";
const DEPENDENCIES_TREE_PREFIX: &str = "dependencies.tree.";

/// Persistent cache of resolution fingerprints and rendered trees
///
/// Fields set on this instance live in a pending layer until [`write`]
/// merges them into the on-disk file, so two tools each touching one domain
/// never clobber each other's entries.
///
/// [`write`]: FingerprintCache::write
#[derive(Debug)]
pub struct FingerprintCache {
    path: PathBuf,
    on_disk: BTreeMap<String, String>,
    pending: BTreeMap<String, String>,
}

impl FingerprintCache {
    /// Load the cache file under `directory`
    ///
    /// A missing, unreadable or unparsable file yields an empty cache.
    pub fn open(directory: &Path) -> Self {
        let path = directory.join(CACHE_FILE_NAME);
        let on_disk = match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<BTreeMap<String, String>>(&content) {
                Ok(fields) => fields,
                Err(err) => {
                    warn!("Ignoring corrupt cache file {}: {err}", path.display());
                    BTreeMap::new()
                }
            },
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!("Ignoring unreadable cache file {}: {err}", path.display());
                }
                BTreeMap::new()
            }
        };
        FingerprintCache {
            path,
            on_disk,
            pending: BTreeMap::new(),
        }
    }

    /// Record the fingerprint of the tooling's own bootstrap dependencies
    pub fn fingerprint_extensions(
        &mut self,
        resolution: &VersionResolution,
        repositories: &[Repository],
        coordinates: &[String],
        sources: bool,
        javadoc: bool,
    ) {
        let digest = fingerprint(resolution, repositories, coordinates, sources, javadoc);
        debug!("Extensions fingerprint {digest} over {} coordinates", coordinates.len());
        self.pending.insert(EXTENSIONS_HASH.to_string(), digest);
        self.pending
            .insert(EXTENSIONS_SOURCES.to_string(), sources.to_string());
        self.pending
            .insert(EXTENSIONS_JAVADOC.to_string(), javadoc.to_string());
    }

    /// Record the fingerprint of the project dependency declarations
    pub fn fingerprint_dependencies(
        &mut self,
        resolution: &VersionResolution,
        repositories: &[Repository],
        coordinates: &[String],
        sources: bool,
        javadoc: bool,
    ) {
        let digest = fingerprint(resolution, repositories, coordinates, sources, javadoc);
        debug!("Dependencies fingerprint {digest} over {} coordinates", coordinates.len());
        self.pending.insert(DEPENDENCIES_HASH.to_string(), digest);
        self.pending
            .insert(DEPENDENCIES_SOURCES.to_string(), sources.to_string());
        self.pending
            .insert(DEPENDENCIES_JAVADOC.to_string(), javadoc.to_string());
    }

    /// Track an artifact sourced from a local repository
    ///
    /// The extensions fingerprint is only trusted while every tracked file
    /// still exists with the recorded modification time, since a rebuilt
    /// local artifact keeps its coordinate but changes its content.
    pub fn track_local_artifact(&mut self, artifact: &Path) -> Result<()> {
        let canonical = artifact.canonicalize()?;
        let metadata = fs::metadata(&canonical)?;
        let stamp = FileTime::from_last_modification_time(&metadata);
        let entry = format!(
            "{}|{}.{}",
            canonical.display(),
            stamp.unix_seconds(),
            stamp.nanoseconds()
        );
        let field = self.pending.entry(EXTENSIONS_LOCAL.to_string()).or_default();
        if !field.is_empty() {
            field.push(';');
        }
        field.push_str(&entry);
        Ok(())
    }

    /// Whether the persisted extensions fingerprint matches the recorded one
    ///
    /// Requires [`fingerprint_extensions`] to have been called first. Local
    /// artifacts recorded on disk are re-checked against the filesystem.
    ///
    /// [`fingerprint_extensions`]: FingerprintCache::fingerprint_extensions
    pub fn is_extensions_hash_valid(&self) -> bool {
        match (self.pending.get(EXTENSIONS_HASH), self.on_disk.get(EXTENSIONS_HASH)) {
            (Some(fresh), Some(stored)) if fresh == stored => self.local_artifacts_unchanged(),
            _ => false,
        }
    }

    /// Whether the extensions fingerprint and download flags both match
    pub fn is_extensions_cache_valid(&self) -> bool {
        self.is_extensions_hash_valid()
            && self.flag_matches(EXTENSIONS_SOURCES)
            && self.flag_matches(EXTENSIONS_JAVADOC)
    }

    /// Whether the persisted dependencies fingerprint matches the recorded one
    pub fn is_dependencies_hash_valid(&self) -> bool {
        match (
            self.pending.get(DEPENDENCIES_HASH),
            self.on_disk.get(DEPENDENCIES_HASH),
        ) {
            (Some(fresh), Some(stored)) => fresh == stored,
            _ => false,
        }
    }

    /// Whether the dependencies fingerprint and download flags both match
    pub fn is_dependencies_cache_valid(&self) -> bool {
        self.is_dependencies_hash_valid()
            && self.flag_matches(DEPENDENCIES_SOURCES)
            && self.flag_matches(DEPENDENCIES_JAVADOC)
    }

    /// Store the rendered dependency tree for one scope
    pub fn cache_dependency_tree(&mut self, scope: Scope, tree: &str) {
        self.pending.insert(tree_key(scope), tree.to_string());
    }

    /// Retrieve a cached dependency tree for one scope
    ///
    /// Trees recorded on this instance are always served; trees from the
    /// cache file are only served while the dependencies fingerprint is
    /// valid, so a changed dependency set never yields a stale tree.
    pub fn cached_dependency_tree(&self, scope: Scope) -> Option<&str> {
        let key = tree_key(scope);
        if let Some(tree) = self.pending.get(&key) {
            return Some(tree.as_str());
        }
        if !self.is_dependencies_hash_valid() {
            return None;
        }
        let tree = self.on_disk.get(&key)?;
        info!("Serving cached {scope} dependency tree");
        Some(tree.as_str())
    }

    /// Persist all recorded fields, merging into the existing file
    ///
    /// Fields this instance never touched survive. When a domain's
    /// fingerprint changed, the stale entries that depended on it (cached
    /// trees, tracked local artifacts) are dropped before the merge.
    pub fn write(&self) -> Result<()> {
        let mut merged = self.on_disk.clone();
        if self.hash_changed(DEPENDENCIES_HASH) {
            merged.retain(|key, _| !key.starts_with(DEPENDENCIES_TREE_PREFIX));
        }
        if self.hash_changed(EXTENSIONS_HASH) {
            merged.remove(EXTENSIONS_LOCAL);
        }
        for (key, value) in &self.pending {
            merged.insert(key.clone(), value.clone());
        }
        let content = toml::to_string(&merged).map_err(|err| Error::Config {
            reason: format!("cannot serialize cache file: {err}"),
        })?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, content)?;
        debug!("Wrote {} cache fields to {}", merged.len(), self.path.display());
        Ok(())
    }

    fn flag_matches(&self, key: &str) -> bool {
        let fresh = self.pending.get(key).map(String::as_str).unwrap_or("false");
        let stored = self.on_disk.get(key).map(String::as_str).unwrap_or("false");
        fresh == stored
    }

    fn hash_changed(&self, key: &str) -> bool {
        match (self.pending.get(key), self.on_disk.get(key)) {
            (Some(fresh), Some(stored)) => fresh != stored,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    fn local_artifacts_unchanged(&self) -> bool {
        let Some(recorded) = self.on_disk.get(EXTENSIONS_LOCAL) else {
            return true;
        };
        for entry in recorded.split(';').filter(|entry| !entry.is_empty()) {
            let Some((path, recorded_stamp)) = entry.rsplit_once('|') else {
                warn!("Ignoring malformed local artifact entry {entry:?} in cache");
                return false;
            };
            let Ok(metadata) = fs::metadata(path) else {
                debug!("Local artifact {path} is gone, extensions fingerprint stale");
                return false;
            };
            let stamp = FileTime::from_last_modification_time(&metadata);
            if format!("{}.{}", stamp.unix_seconds(), stamp.nanoseconds()) != recorded_stamp {
                debug!("Local artifact {path} changed, extensions fingerprint stale");
                return false;
            }
        }
        true
    }
}

fn fingerprint(
    resolution: &VersionResolution,
    repositories: &[Repository],
    coordinates: &[String],
    sources: bool,
    javadoc: bool,
) -> String {
    let mut hasher = Sha1::new();
    for directive in resolution.directives_sorted() {
        hasher.update(directive.as_bytes());
        hasher.update(b"\n");
    }
    for repository in repositories {
        hasher.update(repository.canonical_id().as_bytes());
        hasher.update(b"\n");
    }
    for coordinate in coordinates {
        hasher.update(coordinate.as_bytes());
        hasher.update(b"\n");
    }
    hasher.update([sources as u8, javadoc as u8]);
    hex::encode(hasher.finalize())
}

fn tree_key(scope: Scope) -> String {
    format!("{DEPENDENCIES_TREE_PREFIX}{scope}")
}
