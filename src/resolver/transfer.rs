// src/resolver/transfer.rs

//! Artifact transfer into a local directory
//!
//! Transfers every member of a resolved dependency set, plus any requested
//! classifier variants, into one directory. A file whose size and
//! modification time still match what the repository reports is left
//! untouched, so repeated transfers over an unchanged set do not rewrite
//! anything. Downloads land under the declared version's filename even when
//! the remote URL carries a timestamped snapshot build.

use super::{DependencyResolver, ResolutionContext};
use crate::dependency::DependencySet;
use crate::error::Result;
use crate::version::Version;
use filetime::FileTime;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// One artifact that was downloaded or verified in place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferredArtifact {
    /// Location of the repository that served the artifact
    pub repository: String,
    /// Fully resolved artifact URL
    pub url: String,
}

/// Transfer all artifacts of a dependency set into a directory
///
/// For every member the main artifact is required and each extra classifier
/// variant (such as "sources" or "javadoc") is fetched when a repository has
/// it. Returns one entry per transferred or verified file in traversal
/// order, skipping duplicate final filenames.
pub fn transfer_dependencies(
    context: ResolutionContext<'_>,
    dependencies: &DependencySet,
    directory: &Path,
    classifiers: &[&str],
) -> Result<Vec<TransferredArtifact>> {
    fs::create_dir_all(directory)?;

    let mut transferred = Vec::new();
    let mut seen_files: HashSet<String> = HashSet::new();

    for dependency in dependencies {
        let resolver = DependencyResolver::new(context, dependency);
        let version = resolver.resolve_version()?;

        let main = [dependency.classifier.as_str()];
        for (index, classifier) in main.iter().chain(classifiers.iter()).enumerate() {
            let file_name = dependency.file_name_with(&version.to_string(), classifier);
            if !seen_files.insert(file_name.clone()) {
                continue;
            }
            let destination = directory.join(&file_name);
            match transfer_artifact(&resolver, &version, classifier, &destination)? {
                Some(artifact) => transferred.push(artifact),
                None if index == 0 => return Err(resolver.not_found()),
                None => warn!("No {} artifact found for {}", classifier, dependency),
            }
        }
    }

    Ok(transferred)
}

/// Transfer one artifact file from the first repository that carries it
///
/// Returns None when no repository has the file.
fn transfer_artifact(
    resolver: &DependencyResolver<'_>,
    version: &Version,
    classifier: &str,
    destination: &Path,
) -> Result<Option<TransferredArtifact>> {
    let dependency = resolver.dependency();
    let versioned = dependency.with_version(version.clone());

    for repository in resolver.context.repositories {
        let Some(file_version) = resolver.artifact_file_version(repository, version)? else {
            continue;
        };
        let remote_name = dependency.file_name_with(&file_version.to_string(), classifier);
        let url = repository.artifact_url(&versioned, &remote_name);
        let Some(stamp) = resolver.context.retriever.probe(repository, &url)? else {
            continue;
        };

        if stamp.matches(destination) {
            debug!("Keeping {} (up to date)", destination.display());
        } else {
            resolver.context.retriever.download(repository, &url, destination)?;
            if let Some(modified) = stamp.last_modified {
                filetime::set_file_mtime(destination, FileTime::from_system_time(modified))?;
            }
            info!("Transferred {} to {}", url, destination.display());
        }
        return Ok(Some(TransferredArtifact {
            repository: repository.location.clone(),
            url,
        }));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::Dependency;
    use crate::error::Error;
    use crate::repository::{ArtifactRetriever, RemoteFileStamp, Repository};
    use crate::version::VersionResolution;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    struct StubRetriever {
        documents: HashMap<String, String>,
        artifacts: HashMap<String, (String, SystemTime)>,
        downloads: RefCell<Vec<String>>,
    }

    impl StubRetriever {
        fn new() -> Self {
            Self {
                documents: HashMap::new(),
                artifacts: HashMap::new(),
                downloads: RefCell::new(Vec::new()),
            }
        }

        fn with_document(mut self, url: &str, content: &str) -> Self {
            self.documents.insert(url.to_string(), content.to_string());
            self
        }

        fn with_artifact(mut self, url: &str, payload: &str, modified: SystemTime) -> Self {
            self.artifacts
                .insert(url.to_string(), (payload.to_string(), modified));
            self
        }

        fn download_count(&self) -> usize {
            self.downloads.borrow().len()
        }
    }

    impl ArtifactRetriever for StubRetriever {
        fn read_string(&self, _repository: &Repository, url: &str) -> Result<Option<String>> {
            Ok(self.documents.get(url).cloned())
        }

        fn probe(&self, _repository: &Repository, url: &str) -> Result<Option<RemoteFileStamp>> {
            Ok(self.artifacts.get(url).map(|(payload, modified)| {
                RemoteFileStamp {
                    size: Some(payload.len() as u64),
                    last_modified: Some(*modified),
                }
            }))
        }

        fn download(&self, _repository: &Repository, url: &str, destination: &Path) -> Result<()> {
            match self.artifacts.get(url) {
                Some((payload, _)) => {
                    self.downloads.borrow_mut().push(url.to_string());
                    std::fs::write(destination, payload)?;
                    Ok(())
                }
                None => Err(Error::ArtifactRetrieval {
                    url: url.to_string(),
                    reason: "not in fixture".to_string(),
                }),
            }
        }
    }

    const REPO: &str = "https://repo.example.com/maven2/";

    fn stamp_time(offset: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000 + offset)
    }

    fn dep(notation: &str) -> Dependency {
        Dependency::parse(notation).unwrap()
    }

    fn set_of(notations: &[&str]) -> DependencySet {
        notations.iter().map(|n| dep(n)).collect()
    }

    #[test]
    fn test_transfer_downloads_and_stamps_files() {
        let retriever = StubRetriever::new()
            .with_artifact(
                "https://repo.example.com/maven2/org/x/http/1.0/http-1.0.jar",
                "http-payload",
                stamp_time(0),
            )
            .with_artifact(
                "https://repo.example.com/maven2/org/x/util/1.0/util-1.0.jar",
                "util-payload",
                stamp_time(100),
            );
        let resolution = VersionResolution::empty();
        let repositories = vec![Repository::new(REPO)];
        let context = ResolutionContext {
            retriever: &retriever,
            resolution: &resolution,
            repositories: &repositories,
        };
        let dependencies = set_of(&["org.x:http:1.0", "org.x:util:1.0"]);
        let directory = TempDir::new().unwrap();

        let transferred =
            transfer_dependencies(context, &dependencies, directory.path(), &[]).unwrap();

        assert_eq!(
            transferred,
            vec![
                TransferredArtifact {
                    repository: REPO.to_string(),
                    url: "https://repo.example.com/maven2/org/x/http/1.0/http-1.0.jar".to_string(),
                },
                TransferredArtifact {
                    repository: REPO.to_string(),
                    url: "https://repo.example.com/maven2/org/x/util/1.0/util-1.0.jar".to_string(),
                },
            ]
        );

        let http_file = directory.path().join("http-1.0.jar");
        assert_eq!(std::fs::read_to_string(&http_file).unwrap(), "http-payload");
        let metadata = std::fs::metadata(&http_file).unwrap();
        assert_eq!(
            FileTime::from_last_modification_time(&metadata),
            FileTime::from_system_time(stamp_time(0))
        );
    }

    #[test]
    fn test_repeated_transfer_is_a_filesystem_noop() {
        let retriever = StubRetriever::new().with_artifact(
            "https://repo.example.com/maven2/org/x/http/1.0/http-1.0.jar",
            "http-payload",
            stamp_time(0),
        );
        let resolution = VersionResolution::empty();
        let repositories = vec![Repository::new(REPO)];
        let context = ResolutionContext {
            retriever: &retriever,
            resolution: &resolution,
            repositories: &repositories,
        };
        let dependencies = set_of(&["org.x:http:1.0"]);
        let directory = TempDir::new().unwrap();

        transfer_dependencies(context, &dependencies, directory.path(), &[]).unwrap();
        assert_eq!(retriever.download_count(), 1);

        // Verified in place, reported again, but not downloaded again
        let second =
            transfer_dependencies(context, &dependencies, directory.path(), &[]).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(retriever.download_count(), 1);
    }

    #[test]
    fn test_modified_file_is_refetched() {
        let retriever = StubRetriever::new().with_artifact(
            "https://repo.example.com/maven2/org/x/http/1.0/http-1.0.jar",
            "http-payload",
            stamp_time(0),
        );
        let resolution = VersionResolution::empty();
        let repositories = vec![Repository::new(REPO)];
        let context = ResolutionContext {
            retriever: &retriever,
            resolution: &resolution,
            repositories: &repositories,
        };
        let dependencies = set_of(&["org.x:http:1.0"]);
        let directory = TempDir::new().unwrap();

        transfer_dependencies(context, &dependencies, directory.path(), &[]).unwrap();

        // Truncated by an external process
        let file = directory.path().join("http-1.0.jar");
        std::fs::write(&file, "junk").unwrap();

        transfer_dependencies(context, &dependencies, directory.path(), &[]).unwrap();
        assert_eq!(retriever.download_count(), 2);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "http-payload");
    }

    #[test]
    fn test_deleted_file_is_refetched() {
        let retriever = StubRetriever::new().with_artifact(
            "https://repo.example.com/maven2/org/x/http/1.0/http-1.0.jar",
            "http-payload",
            stamp_time(0),
        );
        let resolution = VersionResolution::empty();
        let repositories = vec![Repository::new(REPO)];
        let context = ResolutionContext {
            retriever: &retriever,
            resolution: &resolution,
            repositories: &repositories,
        };
        let dependencies = set_of(&["org.x:http:1.0"]);
        let directory = TempDir::new().unwrap();

        transfer_dependencies(context, &dependencies, directory.path(), &[]).unwrap();
        std::fs::remove_file(directory.path().join("http-1.0.jar")).unwrap();

        transfer_dependencies(context, &dependencies, directory.path(), &[]).unwrap();
        assert_eq!(retriever.download_count(), 2);
        assert!(directory.path().join("http-1.0.jar").exists());
    }

    #[test]
    fn test_classifier_variants_are_fetched_when_present() {
        let retriever = StubRetriever::new()
            .with_artifact(
                "https://repo.example.com/maven2/org/x/http/1.0/http-1.0.jar",
                "http-payload",
                stamp_time(0),
            )
            .with_artifact(
                "https://repo.example.com/maven2/org/x/http/1.0/http-1.0-sources.jar",
                "http-sources",
                stamp_time(1),
            )
            .with_artifact(
                "https://repo.example.com/maven2/org/x/util/1.0/util-1.0.jar",
                "util-payload",
                stamp_time(2),
            );
        let resolution = VersionResolution::empty();
        let repositories = vec![Repository::new(REPO)];
        let context = ResolutionContext {
            retriever: &retriever,
            resolution: &resolution,
            repositories: &repositories,
        };
        let dependencies = set_of(&["org.x:http:1.0", "org.x:util:1.0"]);
        let directory = TempDir::new().unwrap();

        // util has no sources artifact; that is not an error
        let transferred =
            transfer_dependencies(context, &dependencies, directory.path(), &["sources"]).unwrap();

        let urls: Vec<&str> = transferred.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://repo.example.com/maven2/org/x/http/1.0/http-1.0.jar",
                "https://repo.example.com/maven2/org/x/http/1.0/http-1.0-sources.jar",
                "https://repo.example.com/maven2/org/x/util/1.0/util-1.0.jar",
            ]
        );
        assert!(directory.path().join("http-1.0-sources.jar").exists());
    }

    #[test]
    fn test_snapshot_downloads_timestamped_build_under_declared_name() {
        let retriever = StubRetriever::new()
            .with_document(
                "https://repo.example.com/maven2/org/x/lib/1.0-SNAPSHOT/maven-metadata.xml",
                r#"<metadata>
  <versioning>
    <snapshot>
      <timestamp>20230405.121314</timestamp>
      <buildNumber>7</buildNumber>
    </snapshot>
  </versioning>
</metadata>"#,
            )
            .with_artifact(
                "https://repo.example.com/maven2/org/x/lib/1.0-SNAPSHOT/lib-1.0-20230405.121314-7.jar",
                "snapshot-payload",
                stamp_time(0),
            );
        let resolution = VersionResolution::empty();
        let repositories = vec![Repository::new(REPO)];
        let context = ResolutionContext {
            retriever: &retriever,
            resolution: &resolution,
            repositories: &repositories,
        };
        let dependencies = set_of(&["org.x:lib:1.0-SNAPSHOT"]);
        let directory = TempDir::new().unwrap();

        let transferred =
            transfer_dependencies(context, &dependencies, directory.path(), &[]).unwrap();

        assert_eq!(
            transferred[0].url,
            "https://repo.example.com/maven2/org/x/lib/1.0-SNAPSHOT/lib-1.0-20230405.121314-7.jar"
        );
        // The local file keeps the plain snapshot name
        assert_eq!(
            std::fs::read_to_string(directory.path().join("lib-1.0-SNAPSHOT.jar")).unwrap(),
            "snapshot-payload"
        );
    }

    #[test]
    fn test_missing_main_artifact_is_an_error() {
        let retriever = StubRetriever::new();
        let resolution = VersionResolution::empty();
        let repositories = vec![Repository::new(REPO)];
        let context = ResolutionContext {
            retriever: &retriever,
            resolution: &resolution,
            repositories: &repositories,
        };
        let dependencies = set_of(&["org.x:http:1.0"]);
        let directory = TempDir::new().unwrap();

        let err =
            transfer_dependencies(context, &dependencies, directory.path(), &[]).unwrap_err();
        assert!(matches!(err, Error::ArtifactNotFound { .. }));
    }

    #[test]
    fn test_failing_repository_aborts_the_transfer() {
        struct FailingRetriever;

        impl ArtifactRetriever for FailingRetriever {
            fn read_string(&self, _repository: &Repository, _url: &str) -> Result<Option<String>> {
                Ok(None)
            }

            fn probe(&self, _repository: &Repository, url: &str) -> Result<Option<RemoteFileStamp>> {
                Err(Error::ArtifactRetrieval {
                    url: url.to_string(),
                    reason: "HTTP 500 Internal Server Error".to_string(),
                })
            }

            fn download(&self, _repository: &Repository, _url: &str, _dest: &Path) -> Result<()> {
                Ok(())
            }
        }

        let retriever = FailingRetriever;
        let resolution = VersionResolution::empty();
        let repositories = vec![Repository::new(REPO)];
        let context = ResolutionContext {
            retriever: &retriever,
            resolution: &resolution,
            repositories: &repositories,
        };
        let dependencies = set_of(&["org.x:http:1.0"]);
        let directory = TempDir::new().unwrap();

        // A broken repository must not masquerade as an absent artifact
        let err =
            transfer_dependencies(context, &dependencies, directory.path(), &[]).unwrap_err();
        assert!(matches!(err, Error::ArtifactRetrieval { .. }));
    }

    #[test]
    fn test_duplicate_final_filenames_transfer_once() {
        let retriever = StubRetriever::new().with_artifact(
            "https://repo.example.com/maven2/org/a/lib/1.0/lib-1.0.jar",
            "payload",
            stamp_time(0),
        );
        let resolution = VersionResolution::empty();
        let repositories = vec![Repository::new(REPO)];
        let context = ResolutionContext {
            retriever: &retriever,
            resolution: &resolution,
            repositories: &repositories,
        };
        // Different groups, identical final filename
        let dependencies = set_of(&["org.a:lib:1.0", "org.b:lib:1.0"]);
        let directory = TempDir::new().unwrap();

        let transferred =
            transfer_dependencies(context, &dependencies, directory.path(), &[]).unwrap();
        assert_eq!(transferred.len(), 1);
        assert_eq!(retriever.download_count(), 1);
    }
}
