// src/repository/retriever.rs

//! Artifact I/O
//!
//! All repository reads and downloads go through the `ArtifactRetriever`
//! trait so resolution logic stays independent of the transport. The default
//! implementation serves `file://` and bare-path locations straight from the
//! filesystem and everything else over blocking HTTP. Transport failures
//! surface as typed errors immediately; retry policy belongs to the caller.

use crate::error::{Error, Result};
use chrono::DateTime;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{CONTENT_LENGTH, LAST_MODIFIED};
use reqwest::StatusCode;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info};
use url::Url;

use super::locator::Repository;

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Size and modification stamp a repository reports for one artifact file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteFileStamp {
    pub size: Option<u64>,
    pub last_modified: Option<SystemTime>,
}

impl RemoteFileStamp {
    /// Whether a local file already carries this exact size and mtime
    ///
    /// Requires both fields to be known and equal; a stamp with unknown
    /// size or modification time never matches, forcing a re-download.
    pub fn matches(&self, path: &Path) -> bool {
        let Ok(metadata) = fs::metadata(path) else {
            return false;
        };
        let (Some(size), Some(last_modified)) = (self.size, self.last_modified) else {
            return false;
        };
        if metadata.len() != size {
            return false;
        }
        filetime::FileTime::from_last_modification_time(&metadata)
            == filetime::FileTime::from_system_time(last_modified)
    }
}

/// Transport-neutral access to repository files
pub trait ArtifactRetriever {
    /// Read a text document, `None` when the repository does not have it
    fn read_string(&self, repository: &Repository, url: &str) -> Result<Option<String>>;

    /// Report the file's size and modification stamp, `None` when absent
    fn probe(&self, repository: &Repository, url: &str) -> Result<Option<RemoteFileStamp>>;

    /// Download the file, placing it atomically at `destination`
    fn download(&self, repository: &Repository, url: &str, destination: &Path) -> Result<()>;

    /// Whether the repository has the file at all
    fn exists(&self, repository: &Repository, url: &str) -> Result<bool> {
        Ok(self.probe(repository, url)?.is_some())
    }
}

/// Blocking retriever over HTTP(S) and the local filesystem
pub struct HttpArtifactRetriever {
    client: Client,
}

impl HttpArtifactRetriever {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Config {
                reason: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    fn authenticated(&self, request: RequestBuilder, repository: &Repository) -> RequestBuilder {
        match repository.username {
            Some(ref username) => request.basic_auth(username, repository.password.as_deref()),
            None => request,
        }
    }
}

/// Filesystem path behind a `file://` or bare-path URL, if any
fn local_file_path(url: &str) -> Option<PathBuf> {
    if url.starts_with("file://") {
        Url::parse(url).ok()?.to_file_path().ok()
    } else if !url.contains("://") {
        Some(PathBuf::from(url))
    } else {
        None
    }
}

fn retrieval_error(url: &str, reason: impl ToString) -> Error {
    Error::ArtifactRetrieval {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

impl ArtifactRetriever for HttpArtifactRetriever {
    fn read_string(&self, repository: &Repository, url: &str) -> Result<Option<String>> {
        if let Some(path) = local_file_path(url) {
            return match fs::read_to_string(&path) {
                Ok(text) => Ok(Some(text)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(retrieval_error(url, e)),
            };
        }

        debug!("Fetching {}", url);
        let response = self
            .authenticated(self.client.get(url), repository)
            .send()
            .map_err(|e| retrieval_error(url, e))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(retrieval_error(url, format!("HTTP {}", response.status())));
        }
        let text = response.text().map_err(|e| retrieval_error(url, e))?;
        Ok(Some(text))
    }

    fn probe(&self, repository: &Repository, url: &str) -> Result<Option<RemoteFileStamp>> {
        if let Some(path) = local_file_path(url) {
            return match fs::metadata(&path) {
                Ok(metadata) => Ok(Some(RemoteFileStamp {
                    size: Some(metadata.len()),
                    last_modified: metadata.modified().ok(),
                })),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(retrieval_error(url, e)),
            };
        }

        debug!("Probing {}", url);
        let response = self
            .authenticated(self.client.head(url), repository)
            .send()
            .map_err(|e| retrieval_error(url, e))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(retrieval_error(url, format!("HTTP {}", response.status())));
        }

        let size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok());
        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| DateTime::parse_from_rfc2822(value).ok())
            .map(SystemTime::from);
        Ok(Some(RemoteFileStamp {
            size,
            last_modified,
        }))
    }

    fn download(&self, repository: &Repository, url: &str, destination: &Path) -> Result<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to a temporary file first, then rename into place
        let temp_path = destination.with_extension("tmp");

        if let Some(path) = local_file_path(url) {
            fs::copy(&path, &temp_path).map_err(|e| retrieval_error(url, e))?;
            fs::rename(&temp_path, destination)?;
            debug!("Copied {} to {}", url, destination.display());
            return Ok(());
        }

        info!("Downloading {} to {}", url, destination.display());
        let mut response = self
            .authenticated(self.client.get(url), repository)
            .send()
            .map_err(|e| retrieval_error(url, e))?;
        if !response.status().is_success() {
            return Err(retrieval_error(url, format!("HTTP {}", response.status())));
        }

        let mut file = File::create(&temp_path)?;
        io::copy(&mut response, &mut file).map_err(|e| retrieval_error(url, e))?;
        fs::rename(&temp_path, destination)?;
        Ok(())
    }
}

/// Wrapper that memoizes reads and probes for one process lifetime
///
/// Resolution walks revisit the same descriptor and metadata URLs many
/// times; the cache keeps those fetches to one round-trip each. Not for
/// shared use across threads.
pub struct CachingArtifactRetriever<R> {
    inner: R,
    strings: RefCell<HashMap<String, Option<String>>>,
    stamps: RefCell<HashMap<String, Option<RemoteFileStamp>>>,
}

impl<R: ArtifactRetriever> CachingArtifactRetriever<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            strings: RefCell::new(HashMap::new()),
            stamps: RefCell::new(HashMap::new()),
        }
    }
}

impl<R: ArtifactRetriever> ArtifactRetriever for CachingArtifactRetriever<R> {
    fn read_string(&self, repository: &Repository, url: &str) -> Result<Option<String>> {
        if let Some(cached) = self.strings.borrow().get(url) {
            return Ok(cached.clone());
        }
        let text = self.inner.read_string(repository, url)?;
        self.strings
            .borrow_mut()
            .insert(url.to_string(), text.clone());
        Ok(text)
    }

    fn probe(&self, repository: &Repository, url: &str) -> Result<Option<RemoteFileStamp>> {
        if let Some(cached) = self.stamps.borrow().get(url) {
            return Ok(*cached);
        }
        let stamp = self.inner.probe(repository, url)?;
        self.stamps.borrow_mut().insert(url.to_string(), stamp);
        Ok(stamp)
    }

    fn download(&self, repository: &Repository, url: &str, destination: &Path) -> Result<()> {
        self.inner.download(repository, url, destination)
    }
}
