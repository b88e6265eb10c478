// src/dependency/coordinate.rs

//! Dependency coordinates
//!
//! A `Dependency` names one artifact by groupId, artifactId, version,
//! classifier, and type. Equality and hashing are version-independent:
//! conflict resolution treats every version of `group:artifact` (same
//! classifier and normalized type) as the same entry. The textual notation is
//! `groupId:artifactId[:version[:classifier]][@type]`.

use crate::error::{Error, Result};
use crate::version::Version;
use regex::Regex;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::str::FromStr;
use std::sync::LazyLock;

pub const TYPE_JAR: &str = "jar";
pub const TYPE_MODULAR_JAR: &str = "modular-jar";
pub const TYPE_CLASSPATH_JAR: &str = "classpath-jar";

/// Fold an undeclared type and the jar variant markers into plain "jar"
pub(crate) fn normalize_type(raw: &str) -> &str {
    match raw {
        "" | TYPE_MODULAR_JAR | TYPE_CLASSPATH_JAR => TYPE_JAR,
        other => other,
    }
}

static NOTATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^:@]+):([^:@]+)(?::([^:@]+)(?::([^:@]+))?)?(?:@([^:@]+))?$").unwrap()
});

/// An exclusion rule: groupId or `*`, artifactId or `*`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

impl Exclusion {
    pub fn new(group_id: &str, artifact_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
        }
    }

    pub fn matches(&self, dependency: &Dependency) -> bool {
        (self.group_id == "*" || self.group_id == dependency.group_id)
            && (self.artifact_id == "*" || self.artifact_id == dependency.artifact_id)
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// Version-independent identity of a coordinate
///
/// Keyed by groupId, artifactId, classifier, and the normalized type, where
/// "modular-jar" and "classpath-jar" fold into "jar" because they mark
/// variants of the same physical artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyId {
    group_id: String,
    artifact_id: String,
    classifier: String,
    kind: String,
}

impl fmt::Display for DependencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if !self.classifier.is_empty() {
            write!(f, ":{}", self.classifier)?;
        }
        if self.kind != TYPE_JAR {
            write!(f, "@{}", self.kind)?;
        }
        Ok(())
    }
}

/// One artifact coordinate with its exclusion rules and origin
#[derive(Debug, Clone)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Version,
    pub classifier: String,
    artifact_type: Option<String>,
    pub exclusions: Vec<Exclusion>,
    pub parent: Option<Box<Dependency>>,
}

impl Dependency {
    pub fn new(group_id: &str, artifact_id: &str, version: Version) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version,
            classifier: String::new(),
            artifact_type: None,
            exclusions: Vec::new(),
            parent: None,
        }
    }

    /// Coordinate with no declared version
    pub fn unversioned(group_id: &str, artifact_id: &str) -> Self {
        Self::new(group_id, artifact_id, Version::unknown())
    }

    /// Parse the textual notation `groupId:artifactId[:version[:classifier]][@type]`
    pub fn parse(notation: &str) -> Result<Self> {
        let trimmed = notation.trim();
        let captures = NOTATION_PATTERN.captures(trimmed).ok_or_else(|| {
            Error::DependencyNotation {
                notation: notation.to_string(),
                reason: "expected groupId:artifactId[:version[:classifier]][@type]".to_string(),
            }
        })?;

        let mut dependency = Dependency::new(
            captures.get(1).map_or("", |m| m.as_str()),
            captures.get(2).map_or("", |m| m.as_str()),
            captures
                .get(3)
                .map_or_else(Version::unknown, |m| Version::parse(m.as_str())),
        );
        if let Some(classifier) = captures.get(4) {
            dependency.classifier = classifier.as_str().to_string();
        }
        if let Some(artifact_type) = captures.get(5) {
            dependency.artifact_type = Some(artifact_type.as_str().to_string());
        }
        Ok(dependency)
    }

    pub fn with_classifier(mut self, classifier: &str) -> Self {
        self.classifier = classifier.to_string();
        self
    }

    pub fn with_type(mut self, artifact_type: &str) -> Self {
        self.artifact_type = Some(artifact_type.to_string());
        self
    }

    pub fn with_version(&self, version: Version) -> Self {
        let mut copy = self.clone();
        copy.version = version;
        copy
    }

    pub fn with_parent(mut self, parent: &Dependency) -> Self {
        self.parent = Some(Box::new(parent.clone()));
        self
    }

    /// Attach one exclusion rule
    pub fn exclude(mut self, group_id: &str, artifact_id: &str) -> Self {
        self.exclusions.push(Exclusion::new(group_id, artifact_id));
        self
    }

    /// Declared type, defaulting to "jar" when unset
    pub fn artifact_type(&self) -> &str {
        self.artifact_type.as_deref().unwrap_or(TYPE_JAR)
    }

    pub fn has_declared_type(&self) -> bool {
        self.artifact_type.is_some()
    }

    /// Type with variant markers folded away, also the file extension
    pub fn normalized_type(&self) -> &str {
        normalize_type(self.artifact_type())
    }

    /// Whether the artifact participates in the module path
    ///
    /// Falls back to the parent coordinate when this dependency carries no
    /// declared type of its own.
    pub fn is_modular_jar(&self) -> bool {
        match self.artifact_type.as_deref() {
            Some(t) => t == TYPE_MODULAR_JAR,
            None => self.parent.as_deref().is_some_and(Dependency::is_modular_jar),
        }
    }

    pub fn is_classpath_jar(&self) -> bool {
        match self.artifact_type.as_deref() {
            Some(t) => t == TYPE_CLASSPATH_JAR,
            None => self
                .parent
                .as_deref()
                .is_some_and(Dependency::is_classpath_jar),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        self.version.is_snapshot()
    }

    pub fn id(&self) -> DependencyId {
        DependencyId {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            classifier: self.classifier.clone(),
            kind: self.normalized_type().to_string(),
        }
    }

    /// Whether any of the given rules excludes this coordinate
    pub fn is_excluded_by<'a, I>(&self, rules: I) -> bool
    where
        I: IntoIterator<Item = &'a Exclusion>,
    {
        rules.into_iter().any(|rule| rule.matches(self))
    }

    /// Local artifact filename using the declared version and classifier
    pub fn file_name(&self) -> String {
        self.file_name_with(&self.version.to_string(), &self.classifier)
    }

    /// Artifact filename for an explicit version string and classifier
    ///
    /// The version string diverges from the declared version for remote
    /// snapshot artifacts, where the repository substitutes a timestamped
    /// build number.
    pub fn file_name_with(&self, version: &str, classifier: &str) -> String {
        let mut name = format!("{}-{}", self.artifact_id, version);
        if !classifier.is_empty() {
            name.push('-');
            name.push_str(classifier);
        }
        name.push('.');
        name.push_str(self.normalized_type());
        name
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if !self.version.is_unknown() {
            write!(f, ":{}", self.version)?;
        }
        if !self.classifier.is_empty() {
            write!(f, ":{}", self.classifier)?;
        }
        if let Some(ref artifact_type) = self.artifact_type {
            if artifact_type != TYPE_JAR {
                write!(f, "@{}", artifact_type)?;
            }
        }
        Ok(())
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.group_id == other.group_id
            && self.artifact_id == other.artifact_id
            && self.classifier == other.classifier
            && self.normalized_type() == other.normalized_type()
    }
}

impl Eq for Dependency {}

impl Hash for Dependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Version-independent, and coarser than equality: classifier and
        // type only split buckets through eq.
        self.group_id.hash(state);
        self.artifact_id.hash(state);
    }
}

impl FromStr for Dependency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Dependency::parse(s)
    }
}

/// A dependency whose artifact kind defaults to "modular-jar"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Module(Dependency);

impl Module {
    pub fn new(group_id: &str, artifact_id: &str, version: Version) -> Self {
        Module(Dependency::new(group_id, artifact_id, version).with_type(TYPE_MODULAR_JAR))
    }

    /// Parse module notation; an explicit `@type` suffix wins over the default
    pub fn parse(notation: &str) -> Result<Self> {
        let dependency = Dependency::parse(notation)?;
        if dependency.has_declared_type() {
            Ok(Module(dependency))
        } else {
            Ok(Module(dependency.with_type(TYPE_MODULAR_JAR)))
        }
    }
}

impl Deref for Module {
    type Target = Dependency;

    fn deref(&self) -> &Dependency {
        &self.0
    }
}

impl From<Module> for Dependency {
    fn from(module: Module) -> Dependency {
        module.0
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Module {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Module::parse(s)
    }
}
