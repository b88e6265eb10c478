// src/config.rs

//! Layered key/value configuration
//!
//! Repository aliases and version-override directives come from an ordered
//! stack of string maps: later layers shadow earlier ones, so a project file
//! can override user-level settings and programmatic values can override
//! both. TOML files load as one layer each, with nested tables flattened
//! into dotted keys (`[repo.central] location = "..."` becomes
//! `repo.central.location`).

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Config {
    layers: Vec<BTreeMap<String, String>>,
}

impl Config {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Load a TOML file as the next (shadowing) layer
    pub fn push_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        self.push_toml(&content).map_err(|err| match err {
            Error::Config { reason } => Error::Config {
                reason: format!("{}: {}", path.display(), reason),
            },
            other => other,
        })
    }

    /// Parse a TOML document as the next layer
    pub fn push_toml(&mut self, content: &str) -> Result<()> {
        let value: toml::Value = content.parse().map_err(|e: toml::de::Error| Error::Config {
            reason: e.to_string(),
        })?;
        let mut layer = BTreeMap::new();
        flatten_value("", &value, &mut layer);
        self.layers.push(layer);
        Ok(())
    }

    /// Push explicit key/value pairs as the next layer
    pub fn push_values<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.layers.push(values.into_iter().collect());
    }

    /// Look a key up, topmost layer first
    pub fn get(&self, key: &str) -> Option<&str> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.get(key).map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(BTreeMap::is_empty)
    }
}

fn flatten_value(prefix: &str, value: &toml::Value, out: &mut BTreeMap<String, String>) {
    match value {
        toml::Value::Table(table) => {
            for (key, inner) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_value(&path, inner, out);
            }
        }
        toml::Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}
