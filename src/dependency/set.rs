// src/dependency/set.rs

//! Ordered, identity-deduplicated dependency collection
//!
//! Iteration order is the insertion order of the first occurrence of each
//! identity. Re-adding an existing identity keeps its position and replaces
//! the stored entry only when the new version compares strictly greater, so
//! the surviving version is always the maximum observed during traversal.

use crate::dependency::{Dependency, DependencyId};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Default)]
pub struct DependencySet {
    entries: Vec<Dependency>,
    index: HashMap<DependencyId, usize>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency under the conflict rule
    ///
    /// Returns true when the entry was inserted or replaced an older
    /// version, false when an equal or newer version was already stored.
    pub fn add(&mut self, dependency: Dependency) -> bool {
        match self.index.get(&dependency.id()) {
            Some(&position) => {
                if dependency.version > self.entries[position].version {
                    self.entries[position] = dependency;
                    true
                } else {
                    false
                }
            }
            None => {
                self.index.insert(dependency.id(), self.entries.len());
                self.entries.push(dependency);
                true
            }
        }
    }

    pub fn add_all<I>(&mut self, dependencies: I)
    where
        I: IntoIterator<Item = Dependency>,
    {
        for dependency in dependencies {
            self.add(dependency);
        }
    }

    /// The winning entry for a coordinate's identity
    pub fn get(&self, dependency: &Dependency) -> Option<&Dependency> {
        self.index
            .get(&dependency.id())
            .map(|&position| &self.entries[position])
    }

    pub fn contains(&self, dependency: &Dependency) -> bool {
        self.index.contains_key(&dependency.id())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dependency> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Coordinate strings in iteration order
    pub fn coordinates(&self) -> Vec<String> {
        self.entries.iter().map(Dependency::to_string).collect()
    }
}

impl fmt::Display for DependencySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, dependency) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", dependency)?;
        }
        Ok(())
    }
}

impl FromIterator<Dependency> for DependencySet {
    fn from_iter<I: IntoIterator<Item = Dependency>>(iter: I) -> Self {
        let mut set = DependencySet::new();
        set.add_all(iter);
        set
    }
}

impl Extend<Dependency> for DependencySet {
    fn extend<I: IntoIterator<Item = Dependency>>(&mut self, iter: I) {
        self.add_all(iter);
    }
}

impl IntoIterator for DependencySet {
    type Item = Dependency;
    type IntoIter = std::vec::IntoIter<Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a DependencySet {
    type Item = &'a Dependency;
    type IntoIter = std::slice::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
