// src/version/resolution.rs

//! Version override table
//!
//! Overrides come from layered configuration as `groupId:artifactId:version`
//! directives, separated by semicolons or newlines. The table is passed
//! explicitly into resolver and cache calls and substitutes the effective
//! version for every matching coordinate the moment it is read.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::version::Version;
use std::collections::HashMap;

/// Configuration key holding override directives
pub const OVERRIDES_KEY: &str = "dependency.overrides";

#[derive(Debug, Clone, Default)]
pub struct VersionResolution {
    overrides: HashMap<String, Version>,
}

impl VersionResolution {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse override directives
    pub fn from_directives(directives: &str) -> Result<Self> {
        let mut overrides = HashMap::new();
        for entry in directives.split([';', '\n']) {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
                return Err(Error::DependencyNotation {
                    notation: entry.to_string(),
                    reason: "expected groupId:artifactId:version".to_string(),
                });
            }
            overrides.insert(
                format!("{}:{}", parts[0], parts[1]),
                Version::parse(parts[2]),
            );
        }
        Ok(Self { overrides })
    }

    /// Read the override table from layered configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.get(OVERRIDES_KEY) {
            Some(directives) => Self::from_directives(directives),
            None => Ok(Self::default()),
        }
    }

    pub fn overridden(&self, group_id: &str, artifact_id: &str) -> Option<&Version> {
        self.overrides.get(&format!("{}:{}", group_id, artifact_id))
    }

    /// The effective version for a coordinate
    pub fn resolve(&self, group_id: &str, artifact_id: &str, declared: &Version) -> Version {
        self.overridden(group_id, artifact_id)
            .cloned()
            .unwrap_or_else(|| declared.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Sorted `groupId:artifactId:version` directives, used for fingerprints
    pub fn directives_sorted(&self) -> Vec<String> {
        let mut entries: Vec<String> = self
            .overrides
            .iter()
            .map(|(coordinate, version)| format!("{}:{}", coordinate, version))
            .collect();
        entries.sort();
        entries
    }
}
