// tests/common/mod.rs

//! Shared fixtures for resolution and transfer tests.
//!
//! Builds an on-disk artifact repository in the standard
//! groupId/artifactId/version layout. Bare filesystem paths are valid
//! repository locations, so the fixture exercises the same retriever code
//! paths a remote repository would, minus the network.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// An artifact repository rooted in a temporary directory.
///
/// Keep the value alive for the duration of the test; dropping it removes
/// the backing directory.
pub struct LocalRepository {
    dir: TempDir,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Repository location usable in a `Repository`
    pub fn location(&self) -> String {
        self.dir.path().to_string_lossy().into_owned()
    }

    fn artifact_dir(&self, group: &str, artifact: &str) -> PathBuf {
        self.dir
            .path()
            .join(group.replace('.', "/"))
            .join(artifact)
    }

    /// Install a descriptor whose `<project>` body is the given XML fragment
    pub fn install_pom(&self, group: &str, artifact: &str, version: &str, body: &str) {
        let xml = format!(
            "<project>\n\
             \x20 <modelVersion>4.0.0</modelVersion>\n\
             \x20 <groupId>{group}</groupId>\n\
             \x20 <artifactId>{artifact}</artifactId>\n\
             \x20 <version>{version}</version>\n\
             {body}\
             </project>\n"
        );
        let dir = self.artifact_dir(group, artifact).join(version);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{artifact}-{version}.pom")), xml).unwrap();
    }

    /// Install the per-artifact metadata document listing the given versions
    ///
    /// The last entry becomes `latest`; the last non-snapshot entry becomes
    /// `release`.
    pub fn install_metadata(&self, group: &str, artifact: &str, versions: &[&str]) {
        let listed: String = versions
            .iter()
            .map(|version| format!("      <version>{version}</version>\n"))
            .collect();
        let latest = versions.last().unwrap();
        let release = versions
            .iter()
            .rev()
            .find(|version| !version.ends_with("-SNAPSHOT"))
            .unwrap_or(latest);
        let xml = format!(
            "<metadata>\n\
             \x20 <groupId>{group}</groupId>\n\
             \x20 <artifactId>{artifact}</artifactId>\n\
             \x20 <versioning>\n\
             \x20   <latest>{latest}</latest>\n\
             \x20   <release>{release}</release>\n\
             \x20   <versions>\n\
             {listed}\
             \x20   </versions>\n\
             \x20 </versioning>\n\
             </metadata>\n"
        );
        let dir = self.artifact_dir(group, artifact);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("maven-metadata.xml"), xml).unwrap();
    }

    /// Place an artifact payload file inside the version directory
    pub fn install_artifact(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
        file_name: &str,
        payload: &[u8],
    ) -> PathBuf {
        let dir = self.artifact_dir(group, artifact).join(version);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file_name);
        fs::write(&path, payload).unwrap();
        path
    }
}

/// One `<dependency>` declaration block
pub fn dependency_block(group: &str, artifact: &str, version: &str, scope: Option<&str>) -> String {
    let scope_line = match scope {
        Some(scope) => format!("      <scope>{scope}</scope>\n"),
        None => String::new(),
    };
    format!(
        "    <dependency>\n\
         \x20     <groupId>{group}</groupId>\n\
         \x20     <artifactId>{artifact}</artifactId>\n\
         \x20     <version>{version}</version>\n\
         {scope_line}\
         \x20   </dependency>\n"
    )
}

/// Wrap dependency blocks in a `<dependencies>` section
pub fn dependencies_section(blocks: &[String]) -> String {
    format!("  <dependencies>\n{}  </dependencies>\n", blocks.concat())
}
