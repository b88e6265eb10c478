// src/repository/metadata.rs

//! Repository metadata documents
//!
//! `maven-metadata.xml` sits next to an artifact's version directories and
//! carries the latest/release pointers plus the list of published versions.
//! For snapshot coordinates a second document inside the version directory
//! names the timestamped build that stands in for the `SNAPSHOT` suffix in
//! remote artifact filenames.

use crate::error::{Error, Result};
use crate::version::Version;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Parsed form of one metadata document
#[derive(Debug, Clone)]
pub struct MavenMetadata {
    pub latest: Version,
    pub release: Version,
    pub version: Version,
    pub versions: Vec<Version>,
    pub snapshot_timestamp: Option<String>,
    pub snapshot_build_number: Option<u32>,
    pub snapshot_local_copy: bool,
}

impl MavenMetadata {
    /// Parse a metadata document
    ///
    /// Parse diagnostics are collected across the whole document and
    /// surface together in the returned error. The latest and release
    /// pointers fall back to the greatest listed version (greatest
    /// non-snapshot version for release) when the document omits them.
    pub fn parse(xml: &str, url: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut path: Vec<String> = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        let mut version = Version::unknown();
        let mut latest = Version::unknown();
        let mut release = Version::unknown();
        let mut versions: Vec<Version> = Vec::new();
        let mut snapshot_timestamp: Option<String> = None;
        let mut snapshot_build_number: Option<u32> = None;
        let mut snapshot_local_copy = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    path.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                }
                Ok(Event::End(_)) => {
                    path.pop();
                }
                Ok(Event::Text(e)) => {
                    let text = match e.unescape() {
                        Ok(text) => text.trim().to_string(),
                        Err(err) => {
                            errors.push(err.to_string());
                            buf.clear();
                            continue;
                        }
                    };
                    let in_versions = path.iter().any(|name| name == "versions");
                    let in_snapshot = path.iter().any(|name| name == "snapshot");
                    match path.last().map(String::as_str) {
                        Some("latest") => latest = Version::parse(&text),
                        Some("release") => release = Version::parse(&text),
                        Some("version") if in_versions => versions.push(Version::parse(&text)),
                        Some("version") => version = Version::parse(&text),
                        Some("timestamp") if in_snapshot => snapshot_timestamp = Some(text),
                        Some("buildNumber") if in_snapshot => match text.parse::<u32>() {
                            Ok(number) => snapshot_build_number = Some(number),
                            Err(_) => errors.push(format!("invalid buildNumber '{}'", text)),
                        },
                        Some("localCopy") if in_snapshot => {
                            snapshot_local_copy = text.eq_ignore_ascii_case("true");
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => {
                    errors.push(err.to_string());
                    break;
                }
            }
            buf.clear();
        }

        if !errors.is_empty() {
            return Err(Error::MetadataParse {
                url: url.to_string(),
                errors,
            });
        }

        if latest.is_unknown() {
            if let Some(max) = versions.iter().max() {
                latest = max.clone();
            }
        }
        if release.is_unknown() {
            if let Some(max) = versions.iter().filter(|v| !v.is_snapshot()).max() {
                release = max.clone();
            }
        }

        Ok(Self {
            latest,
            release,
            version,
            versions,
            snapshot_timestamp,
            snapshot_build_number,
            snapshot_local_copy,
        })
    }

    /// Concrete build version for a snapshot coordinate
    ///
    /// Substitutes `timestamp-buildNumber` for the `SNAPSHOT` suffix of the
    /// version under resolution. Per-version documents may omit their own
    /// `<version>` element, so the caller's version is the base; the
    /// document's element stands in only when the caller has none. Builds
    /// marked as a local copy keep the plain snapshot name.
    pub fn snapshot_version(&self, declared: &Version) -> Version {
        let base = if declared.is_unknown() {
            &self.version
        } else {
            declared
        };
        match (&self.snapshot_timestamp, self.snapshot_build_number) {
            (Some(timestamp), Some(number)) if !self.snapshot_local_copy => {
                substitute_snapshot(base, timestamp, number)
            }
            _ => base.clone(),
        }
    }
}

fn substitute_snapshot(declared: &Version, timestamp: &str, build_number: u32) -> Version {
    let rendered = declared.to_string();
    match rendered.strip_suffix("SNAPSHOT") {
        Some(prefix) => Version::parse(&format!("{}{}-{}", prefix, timestamp, build_number)),
        None => declared.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://repo1.maven.org/maven2/com/example/lib/maven-metadata.xml";

    #[test]
    fn test_parse_artifact_metadata() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>org.eclipse.jetty</groupId>
  <artifactId>jetty-server</artifactId>
  <versioning>
    <latest>12.0.0-alpha3</latest>
    <release>11.0.14</release>
    <versions>
      <version>11.0.13</version>
      <version>11.0.14</version>
      <version>12.0.0-alpha3</version>
    </versions>
    <lastUpdated>20230222171448</lastUpdated>
  </versioning>
</metadata>
"#;
        let metadata = MavenMetadata::parse(xml, URL).unwrap();
        assert_eq!(metadata.latest.to_string(), "12.0.0-alpha3");
        assert_eq!(metadata.release.to_string(), "11.0.14");
        assert_eq!(metadata.versions.len(), 3);
        assert!(metadata.snapshot_timestamp.is_none());
    }

    #[test]
    fn test_missing_pointers_fall_back_to_versions() {
        let xml = r#"<metadata>
  <versioning>
    <versions>
      <version>1.0</version>
      <version>1.2-SNAPSHOT</version>
      <version>1.1</version>
    </versions>
  </versioning>
</metadata>
"#;
        let metadata = MavenMetadata::parse(xml, URL).unwrap();
        // Latest is the overall maximum, release skips snapshots
        assert_eq!(metadata.latest.to_string(), "1.2-SNAPSHOT");
        assert_eq!(metadata.release.to_string(), "1.1");
    }

    #[test]
    fn test_snapshot_substitution() {
        let xml = r#"<metadata modelVersion="1.1.0">
  <groupId>com.example</groupId>
  <artifactId>lib</artifactId>
  <version>1.0-SNAPSHOT</version>
  <versioning>
    <snapshot>
      <timestamp>20230405.121314</timestamp>
      <buildNumber>7</buildNumber>
    </snapshot>
    <lastUpdated>20230405121314</lastUpdated>
  </versioning>
</metadata>
"#;
        let metadata = MavenMetadata::parse(xml, URL).unwrap();
        assert_eq!(metadata.snapshot_timestamp.as_deref(), Some("20230405.121314"));
        assert_eq!(metadata.snapshot_build_number, Some(7));
        let declared = Version::parse("1.0-SNAPSHOT");
        assert_eq!(
            metadata.snapshot_version(&declared).to_string(),
            "1.0-20230405.121314-7"
        );
        // Without a caller version the document's own element is the base
        assert_eq!(
            metadata.snapshot_version(&Version::unknown()).to_string(),
            "1.0-20230405.121314-7"
        );
    }

    #[test]
    fn test_substitution_without_version_element() {
        // Per-version documents often carry only the snapshot block
        let xml = r#"<metadata>
  <versioning>
    <snapshot>
      <timestamp>20230405.121314</timestamp>
      <buildNumber>7</buildNumber>
    </snapshot>
  </versioning>
</metadata>
"#;
        let metadata = MavenMetadata::parse(xml, URL).unwrap();
        let declared = Version::parse("1.0-SNAPSHOT");
        assert_eq!(
            metadata.snapshot_version(&declared).to_string(),
            "1.0-20230405.121314-7"
        );
    }

    #[test]
    fn test_local_copy_keeps_declared_version() {
        let xml = r#"<metadata>
  <version>1.0-SNAPSHOT</version>
  <versioning>
    <snapshot>
      <timestamp>20230405.121314</timestamp>
      <buildNumber>7</buildNumber>
      <localCopy>true</localCopy>
    </snapshot>
  </versioning>
</metadata>
"#;
        let metadata = MavenMetadata::parse(xml, URL).unwrap();
        assert!(metadata.snapshot_local_copy);
        assert_eq!(
            metadata
                .snapshot_version(&Version::parse("1.0-SNAPSHOT"))
                .to_string(),
            "1.0-SNAPSHOT"
        );
    }

    #[test]
    fn test_malformed_document_is_metadata_error() {
        let err =
            MavenMetadata::parse("<metadata><versioning></wrong></metadata>", URL).unwrap_err();
        match err {
            Error::MetadataParse { url, errors } => {
                assert_eq!(url, URL);
                assert!(!errors.is_empty());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_build_number_is_collected() {
        let xml = r#"<metadata>
  <version>1.0-SNAPSHOT</version>
  <versioning>
    <snapshot>
      <timestamp>20230405.121314</timestamp>
      <buildNumber>seven</buildNumber>
    </snapshot>
  </versioning>
</metadata>
"#;
        let err = MavenMetadata::parse(xml, URL).unwrap_err();
        match err {
            Error::MetadataParse { errors, .. } => {
                assert!(errors[0].contains("buildNumber"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
