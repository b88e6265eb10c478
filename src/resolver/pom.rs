// src/resolver/pom.rs

//! Descriptor parsing
//!
//! An artifact's descriptor declares its direct dependencies, a `parent`
//! descriptor to inherit from, a `dependencyManagement` section supplying
//! versions and exclusions for coordinates that omit them, and `properties`
//! for `${...}` interpolation. Assembly flattens the whole parent chain into
//! one effective view, expanding `scope=import` entries along the way.
//! Malformed elements and unresolvable properties are collected as
//! diagnostics and surface together in a single descriptor-parse error.

use crate::dependency::{normalize_type, Dependency, Exclusion, Scope};
use crate::error::{Error, Result};
use crate::version::Version;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use tracing::debug;

const DIRECT_DEPENDENCY_PATH: &[&str] = &["project", "dependencies", "dependency"];
const MANAGED_DEPENDENCY_PATH: &[&str] =
    &["project", "dependencyManagement", "dependencies", "dependency"];

/// Bound on chained `${a}` -> `${b}` property substitutions
const MAX_INTERPOLATION_STEPS: usize = 16;

/// One dependency declaration as assembled from the descriptor chain
#[derive(Debug, Clone)]
pub(crate) struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: String,
    pub artifact_type: String,
    pub scope: Scope,
    pub exclusions: Vec<Exclusion>,
}

/// Where descriptor documents come from during assembly
///
/// The resolver implements this against the configured repositories; tests
/// implement it over in-memory fixtures.
pub(crate) trait PomSource {
    /// Fetch the descriptor text for a coordinate, plus its source URL
    fn fetch_pom(&self, dependency: &Dependency) -> Result<(String, String)>;
}

/// Fully flattened view of a descriptor and its ancestors
#[derive(Debug)]
pub(crate) struct EffectivePom {
    pub dependencies: Vec<PomDependency>,
}

impl EffectivePom {
    pub(crate) fn assemble(dependency: &Dependency, source: &dyn PomSource) -> Result<Self> {
        let mut assembly = Assembly {
            source,
            diagnostics: Vec::new(),
            import_stack: HashSet::new(),
        };
        let sections = assembly.sections(dependency)?;
        if !assembly.diagnostics.is_empty() {
            return Err(Error::DescriptorParse {
                dependency: dependency.to_string(),
                errors: assembly.diagnostics,
            });
        }
        Ok(EffectivePom {
            dependencies: sections.direct,
        })
    }

    /// Declarations whose scope is one of the requested scopes
    pub(crate) fn dependencies_for(&self, scopes: &[Scope]) -> Vec<&PomDependency> {
        self.dependencies
            .iter()
            .filter(|declaration| scopes.contains(&declaration.scope))
            .collect()
    }
}

/// One declaration exactly as written in a single document
#[derive(Debug, Clone, Default)]
struct RawDependency {
    group_id: String,
    artifact_id: String,
    version: Option<String>,
    classifier: Option<String>,
    artifact_type: Option<String>,
    scope: Option<String>,
    optional: Option<String>,
    exclusions: Vec<(String, String)>,
}

/// One parsed descriptor document, fields still uninterpolated
#[derive(Debug, Default)]
struct RawPom {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
    parent_group_id: Option<String>,
    parent_artifact_id: Option<String>,
    parent_version: Option<String>,
    properties: HashMap<String, String>,
    dependencies: Vec<RawDependency>,
    managed: Vec<RawDependency>,
}

impl RawPom {
    /// Scan one document, collecting malformed-element diagnostics
    ///
    /// Only the sections the engine consumes are scanned; dependency blocks
    /// under profiles or build plugins are left alone.
    fn parse(xml: &str, diagnostics: &mut Vec<String>) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut doc = RawPom::default();
        let mut buf = Vec::new();
        let mut path: Vec<String> = Vec::new();
        let mut current: Option<(RawDependency, bool)> = None;
        let mut exclusion: Option<(String, String)> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    path.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                    if path_eq(&path, DIRECT_DEPENDENCY_PATH) {
                        current = Some((RawDependency::default(), false));
                    } else if path_eq(&path, MANAGED_DEPENDENCY_PATH) {
                        current = Some((RawDependency::default(), true));
                    } else if current.is_some() && path_ends_with(&path, &["exclusions", "exclusion"]) {
                        exclusion = Some((String::new(), String::new()));
                    }
                }
                Ok(Event::End(_)) => {
                    if path_eq(&path, DIRECT_DEPENDENCY_PATH) || path_eq(&path, MANAGED_DEPENDENCY_PATH)
                    {
                        if let Some((raw, managed)) = current.take() {
                            if managed {
                                doc.managed.push(raw);
                            } else {
                                doc.dependencies.push(raw);
                            }
                        }
                    } else if path_ends_with(&path, &["exclusions", "exclusion"]) {
                        if let (Some((raw, _)), Some(pair)) = (current.as_mut(), exclusion.take()) {
                            raw.exclusions.push(pair);
                        }
                    }
                    path.pop();
                }
                Ok(Event::Text(e)) => {
                    let text = match e.unescape() {
                        Ok(text) => text.trim().to_string(),
                        Err(err) => {
                            diagnostics.push(err.to_string());
                            buf.clear();
                            continue;
                        }
                    };
                    doc.assign(&path, text, &mut current, &mut exclusion);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => {
                    diagnostics.push(err.to_string());
                    break;
                }
            }
            buf.clear();
        }

        doc
    }

    fn assign(
        &mut self,
        path: &[String],
        text: String,
        current: &mut Option<(RawDependency, bool)>,
        exclusion: &mut Option<(String, String)>,
    ) {
        if path_eq(path, &["project", "groupId"]) {
            self.group_id = Some(text);
        } else if path_eq(path, &["project", "artifactId"]) {
            self.artifact_id = Some(text);
        } else if path_eq(path, &["project", "version"]) {
            self.version = Some(text);
        } else if path_eq(path, &["project", "parent", "groupId"]) {
            self.parent_group_id = Some(text);
        } else if path_eq(path, &["project", "parent", "artifactId"]) {
            self.parent_artifact_id = Some(text);
        } else if path_eq(path, &["project", "parent", "version"]) {
            self.parent_version = Some(text);
        } else if path.len() == 3 && path[0] == "project" && path[1] == "properties" {
            self.properties.insert(path[2].clone(), text);
        } else if let Some(pair) = exclusion.as_mut() {
            if path_ends_with(path, &["exclusion", "groupId"]) {
                pair.0 = text;
            } else if path_ends_with(path, &["exclusion", "artifactId"]) {
                pair.1 = text;
            }
        } else if let Some((raw, _)) = current.as_mut() {
            if path.len() < 2 || path[path.len() - 2] != "dependency" {
                return;
            }
            match path[path.len() - 1].as_str() {
                "groupId" => raw.group_id = text,
                "artifactId" => raw.artifact_id = text,
                "version" => raw.version = Some(text),
                "classifier" => raw.classifier = Some(text),
                "type" => raw.artifact_type = Some(text),
                "scope" => raw.scope = Some(text),
                "optional" => raw.optional = Some(text),
                _ => {}
            }
        }
    }

    fn parent_dependency(&self, diagnostics: &mut Vec<String>) -> Option<Dependency> {
        let (group_id, artifact_id) = match (&self.parent_group_id, &self.parent_artifact_id) {
            (Some(group_id), Some(artifact_id)) => (group_id, artifact_id),
            (None, None) => return None,
            _ => {
                diagnostics.push("parent declaration is missing groupId or artifactId".to_string());
                return None;
            }
        };
        let Some(version) = &self.parent_version else {
            diagnostics.push(format!(
                "parent declaration '{}:{}' is missing a version",
                group_id, artifact_id
            ));
            return None;
        };
        if group_id.contains("${") || artifact_id.contains("${") || version.contains("${") {
            diagnostics.push(format!(
                "parent declaration '{}:{}:{}' uses unresolvable property references",
                group_id, artifact_id, version
            ));
            return None;
        }
        Some(Dependency::new(group_id, artifact_id, Version::parse(version)))
    }
}

fn path_eq(path: &[String], expected: &[&str]) -> bool {
    path.len() == expected.len() && path.iter().zip(expected).all(|(a, b)| a == b)
}

fn path_ends_with(path: &[String], expected: &[&str]) -> bool {
    path.len() >= expected.len()
        && path[path.len() - expected.len()..]
            .iter()
            .zip(expected)
            .all(|(a, b)| a == b)
}

/// Substitute `${...}` references, following chained definitions
fn interpolate(
    raw: &str,
    properties: &HashMap<String, String>,
) -> std::result::Result<String, String> {
    let mut value = raw.to_string();
    for _ in 0..MAX_INTERPOLATION_STEPS {
        let Some(start) = value.find("${") else {
            return Ok(value);
        };
        let Some(offset) = value[start..].find('}') else {
            return Err(format!("unterminated property reference in '{}'", raw));
        };
        let key = value[start + 2..start + offset].to_string();
        match properties.get(&key) {
            Some(replacement) => value.replace_range(start..start + offset + 1, replacement),
            None => return Err(format!("unresolvable property '${{{}}}' in '{}'", key, raw)),
        }
    }
    Err(format!("circular property reference in '{}'", raw))
}

/// (groupId, artifactId, classifier, normalized type)
type ManagedKey = (String, String, String, String);

#[derive(Debug, Clone, Default)]
struct ManagedInfo {
    version: Option<String>,
    scope: Option<String>,
    exclusions: Vec<Exclusion>,
}

struct Sections {
    managed: HashMap<ManagedKey, ManagedInfo>,
    direct: Vec<PomDependency>,
}

struct Assembly<'a> {
    source: &'a dyn PomSource,
    diagnostics: Vec<String>,
    import_stack: HashSet<String>,
}

impl Assembly<'_> {
    fn sections(&mut self, dependency: &Dependency) -> Result<Sections> {
        let chain = self.load_chain(dependency)?;

        // Properties from the whole chain, nearest document winning
        let mut properties: HashMap<String, String> = HashMap::new();
        for doc in chain.iter().rev() {
            properties.extend(doc.properties.clone());
        }

        let child = chain.first();
        let effective_group = child
            .and_then(|doc| doc.group_id.clone().or_else(|| doc.parent_group_id.clone()))
            .unwrap_or_else(|| dependency.group_id.clone());
        let effective_artifact = child
            .and_then(|doc| doc.artifact_id.clone())
            .unwrap_or_else(|| dependency.artifact_id.clone());
        let effective_version = child
            .and_then(|doc| doc.version.clone().or_else(|| doc.parent_version.clone()))
            .unwrap_or_else(|| dependency.version.to_string());
        let effective_group = self.interpolated(&effective_group, &properties);
        let effective_artifact = self.interpolated(&effective_artifact, &properties);
        let effective_version = self.interpolated(&effective_version, &properties);

        // Project coordinate built-ins, including the legacy spellings
        for key in ["project.groupId", "pom.groupId", "groupId"] {
            properties.insert(key.to_string(), effective_group.clone());
        }
        for key in ["project.artifactId", "pom.artifactId", "artifactId"] {
            properties.insert(key.to_string(), effective_artifact.clone());
        }
        for key in ["project.version", "pom.version", "version"] {
            properties.insert(key.to_string(), effective_version.clone());
        }
        if let Some(doc) = child {
            for (suffix, value) in [
                ("groupId", &doc.parent_group_id),
                ("artifactId", &doc.parent_artifact_id),
                ("version", &doc.parent_version),
            ] {
                if let Some(value) = value {
                    properties.insert(format!("project.parent.{}", suffix), value.clone());
                    properties.insert(format!("parent.{}", suffix), value.clone());
                }
            }
        }

        let managed = self.managed_sections(&chain, &properties)?;
        let direct = self.direct_sections(&chain, &managed, &properties);

        Ok(Sections { managed, direct })
    }

    /// Load the document chain, child first, walking `parent` declarations
    fn load_chain(&mut self, dependency: &Dependency) -> Result<Vec<RawPom>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(dependency.clone());

        while let Some(current) = next {
            if !seen.insert(format!("{}:{}", current.group_id, current.artifact_id)) {
                self.diagnostics
                    .push(format!("circular parent chain at '{}'", current));
                break;
            }
            let (xml, url) = self.source.fetch_pom(&current)?;
            let mut doc_diagnostics = Vec::new();
            let doc = RawPom::parse(&xml, &mut doc_diagnostics);
            self.diagnostics
                .extend(doc_diagnostics.into_iter().map(|d| format!("{}: {}", url, d)));
            next = doc.parent_dependency(&mut self.diagnostics);
            chain.push(doc);
        }

        Ok(chain)
    }

    fn managed_sections(
        &mut self,
        chain: &[RawPom],
        properties: &HashMap<String, String>,
    ) -> Result<HashMap<ManagedKey, ManagedInfo>> {
        let mut managed: HashMap<ManagedKey, ManagedInfo> = HashMap::new();

        for doc in chain.iter().rev() {
            let mut local: HashMap<ManagedKey, ManagedInfo> = HashMap::new();
            for raw in &doc.managed {
                let group_id = self.interpolated(&raw.group_id, properties);
                let artifact_id = self.interpolated(&raw.artifact_id, properties);
                let version = raw
                    .version
                    .as_deref()
                    .map(|v| self.interpolated(v, properties));
                let scope = raw.scope.clone().unwrap_or_default();
                let artifact_type =
                    normalize_type(raw.artifact_type.as_deref().unwrap_or_default()).to_string();

                if scope == "import" && artifact_type == "pom" {
                    let Some(version) = version else {
                        self.diagnostics.push(format!(
                            "import of '{}:{}' has no version",
                            group_id, artifact_id
                        ));
                        continue;
                    };
                    let imported =
                        self.imported_sections(&group_id, &artifact_id, &version)?;
                    for (key, info) in imported {
                        local.entry(key).or_insert(info);
                    }
                    continue;
                }

                let key = (
                    group_id,
                    artifact_id,
                    raw.classifier
                        .as_deref()
                        .map(|c| self.interpolated(c, properties))
                        .unwrap_or_default(),
                    artifact_type,
                );
                local.insert(
                    key,
                    ManagedInfo {
                        version,
                        scope: raw.scope.clone(),
                        exclusions: self.interpolated_exclusions(&raw.exclusions, properties),
                    },
                );
            }
            // Nearer documents override inherited management
            managed.extend(local);
        }

        Ok(managed)
    }

    fn imported_sections(
        &mut self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> Result<HashMap<ManagedKey, ManagedInfo>> {
        let key = format!("{}:{}", group_id, artifact_id);
        if !self.import_stack.insert(key.clone()) {
            self.diagnostics
                .push(format!("circular dependencyManagement import of '{}'", key));
            return Ok(HashMap::new());
        }
        let imported = Dependency::new(group_id, artifact_id, Version::parse(version));
        let sections = self.sections(&imported)?;
        self.import_stack.remove(&key);
        Ok(sections.managed)
    }

    fn direct_sections(
        &mut self,
        chain: &[RawPom],
        managed: &HashMap<ManagedKey, ManagedInfo>,
        properties: &HashMap<String, String>,
    ) -> Vec<PomDependency> {
        let mut order: Vec<ManagedKey> = Vec::new();
        let mut declarations: HashMap<ManagedKey, &RawDependency> = HashMap::new();

        // Child documents win; parent declarations fill in behind them
        for doc in chain {
            for raw in &doc.dependencies {
                let key = (
                    self.interpolated(&raw.group_id, properties),
                    self.interpolated(&raw.artifact_id, properties),
                    raw.classifier
                        .as_deref()
                        .map(|c| self.interpolated(c, properties))
                        .unwrap_or_default(),
                    normalize_type(raw.artifact_type.as_deref().unwrap_or_default()).to_string(),
                );
                if !declarations.contains_key(&key) {
                    order.push(key.clone());
                    declarations.insert(key, raw);
                }
            }
        }

        let mut direct = Vec::new();
        for key in &order {
            let raw = declarations[key];
            let (group_id, artifact_id, classifier, _) = key.clone();
            // The result keeps the declared type, not the folded key type
            let artifact_type = raw.artifact_type.clone().unwrap_or_default();
            if group_id.is_empty() || artifact_id.is_empty() {
                self.diagnostics
                    .push("dependency declaration is missing groupId or artifactId".to_string());
                continue;
            }
            let management = managed.get(key);

            if let Some(optional) = &raw.optional {
                if self.interpolated(optional, properties) == "true" {
                    continue;
                }
            }

            let version = raw
                .version
                .as_deref()
                .map(|v| self.interpolated(v, properties))
                .or_else(|| management.and_then(|m| m.version.clone()));
            let Some(version) = version else {
                self.diagnostics.push(format!(
                    "dependency '{}:{}' has no version and none is managed",
                    group_id, artifact_id
                ));
                continue;
            };

            let scope_name = raw
                .scope
                .clone()
                .or_else(|| management.and_then(|m| m.scope.clone()))
                .unwrap_or_else(|| "compile".to_string());
            let scope_name = self.interpolated(&scope_name, properties);
            let Ok(scope) = Scope::from_str(&scope_name) else {
                debug!(
                    "Skipping dependency {}:{} with unsupported scope '{}'",
                    group_id, artifact_id, scope_name
                );
                continue;
            };

            // Declared exclusions replace managed ones entirely
            let exclusions = if raw.exclusions.is_empty() {
                management.map(|m| m.exclusions.clone()).unwrap_or_default()
            } else {
                self.interpolated_exclusions(&raw.exclusions, properties)
            };

            direct.push(PomDependency {
                group_id,
                artifact_id,
                version,
                classifier,
                artifact_type,
                scope,
                exclusions,
            });
        }

        direct
    }

    fn interpolated_exclusions(
        &mut self,
        raw: &[(String, String)],
        properties: &HashMap<String, String>,
    ) -> Vec<Exclusion> {
        raw.iter()
            .map(|(group_id, artifact_id)| {
                Exclusion::new(
                    &self.interpolated(group_id, properties),
                    &self.interpolated(artifact_id, properties),
                )
            })
            .collect()
    }

    fn interpolated(&mut self, raw: &str, properties: &HashMap<String, String>) -> String {
        match interpolate(raw, properties) {
            Ok(value) => value,
            Err(diagnostic) => {
                self.diagnostics.push(diagnostic);
                raw.to_string()
            }
        }
    }
}
