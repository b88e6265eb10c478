// src/dependency/mod.rs

//! Dependency coordinates, scopes, and ordered collections
//!
//! This module provides:
//! - Coordinate parsing and version-independent identity
//! - The scope enumeration with transitive visibility rules
//! - The insertion-ordered set used for conflict resolution

mod coordinate;
mod scope;
mod set;

// Re-export main types
pub use coordinate::{
    Dependency, DependencyId, Exclusion, Module, TYPE_CLASSPATH_JAR, TYPE_JAR, TYPE_MODULAR_JAR,
};
pub(crate) use coordinate::normalize_type;
pub use scope::Scope;
pub use set::DependencySet;
