// src/repository/locator.rs

//! Repository locations and artifact paths
//!
//! A repository reference is either an explicit location or a named alias
//! resolved through layered configuration (`repo.<name>[.location]`, with
//! optional `.username`/`.password` keys). Local repositories are bare
//! filesystem paths or `file://` URLs; everything else is remote.

use crate::config::Config;
use crate::dependency::Dependency;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;
use url::Url;

pub const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2/";
pub const SONATYPE_RELEASES: &str =
    "https://s01.oss.sonatype.org/content/repositories/releases/";
pub const SONATYPE_SNAPSHOTS: &str =
    "https://s01.oss.sonatype.org/content/repositories/snapshots/";
pub const APACHE_RELEASES: &str = "https://repository.apache.org/content/repositories/releases/";
pub const GOOGLE_MAVEN: &str = "https://maven.google.com/";

/// One artifact repository: location plus optional credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub location: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Repository {
    pub fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            username: None,
            password: None,
        }
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    /// The conventional local repository under the user's home directory
    pub fn maven_local() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Repository::new(&home.join(".m2").join("repository").to_string_lossy())
    }

    /// Resolve a repository reference
    ///
    /// Configuration entries win over built-in alias names; anything not
    /// found in either is taken as a literal location.
    pub fn resolve(config: &Config, location_or_name: &str) -> Repository {
        let prefix = format!("repo.{}", location_or_name);
        let location = config
            .get(&format!("{}.location", prefix))
            .or_else(|| config.get(&prefix));
        if let Some(location) = location {
            return Repository {
                location: location.to_string(),
                username: config
                    .get(&format!("{}.username", prefix))
                    .map(str::to_string),
                password: config
                    .get(&format!("{}.password", prefix))
                    .map(str::to_string),
            };
        }

        match location_or_name {
            "central" => Repository::new(MAVEN_CENTRAL),
            "local" => Repository::maven_local(),
            "sonatype-releases" => Repository::new(SONATYPE_RELEASES),
            "sonatype-snapshots" => Repository::new(SONATYPE_SNAPSHOTS),
            "apache" => Repository::new(APACHE_RELEASES),
            "google" => Repository::new(GOOGLE_MAVEN),
            location => Repository::new(location),
        }
    }

    /// Whether the location is a bare path or a `file://` URL
    pub fn is_local(&self) -> bool {
        self.location.starts_with("file://") || !self.location.contains("://")
    }

    /// Filesystem path of a local repository
    pub fn local_path(&self) -> Option<PathBuf> {
        if self.location.starts_with("file://") {
            Url::parse(&self.location).ok()?.to_file_path().ok()
        } else if self.is_local() {
            Some(PathBuf::from(&self.location))
        } else {
            None
        }
    }

    /// Directory URL holding a coordinate's artifacts, with trailing slash
    pub fn artifact_location(&self, dependency: &Dependency) -> String {
        let mut result = self.location.clone();
        if !result.ends_with('/') {
            result.push('/');
        }
        result.push_str(&dependency.group_id.replace('.', "/"));
        result.push('/');
        result.push_str(&dependency.artifact_id);
        result.push('/');
        result
    }

    /// URL of one artifact file inside the declared version's directory
    ///
    /// The directory is always named after the declared version; snapshot
    /// substitution only changes the file name.
    pub fn artifact_url(&self, dependency: &Dependency, file_name: &str) -> String {
        format!(
            "{}{}/{}",
            self.artifact_location(dependency),
            dependency.version,
            file_name
        )
    }

    /// Metadata document names to probe, in order
    pub fn metadata_file_names(&self) -> Vec<&'static str> {
        if self.is_local() {
            vec!["maven-metadata-local.xml", "maven-metadata.xml"]
        } else {
            vec!["maven-metadata.xml"]
        }
    }

    /// Canonical form for fingerprints
    ///
    /// Credentials never appear raw; they contribute a location-salted hash
    /// so two repositories at the same location with different credentials
    /// stay distinguishable.
    pub fn canonical_id(&self) -> String {
        if self.username.is_none() && self.password.is_none() {
            return self.location.clone();
        }
        let mut hasher = Sha256::new();
        hasher.update(self.location.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.username.as_deref().unwrap_or("").as_bytes());
        hasher.update([0u8]);
        hasher.update(self.password.as_deref().unwrap_or("").as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("{}:{}", self.location, &digest[..20])
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_id())
    }
}
