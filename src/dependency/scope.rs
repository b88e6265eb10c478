// src/dependency/scope.rs

//! Dependency scopes and transitive visibility rules

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Usage phase of a dependency
///
/// `Standalone` resolves only from local repositories, never remote ones.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Compile,
    Provided,
    Runtime,
    Test,
    Standalone,
}

impl Scope {
    /// Effective scope of a child reached through this effective scope
    ///
    /// Compile lets the child's declared scope through; every other scope
    /// pins the whole subtree to itself, so a compile-scoped child of a
    /// runtime dependency stays runtime-visible.
    pub fn narrow(self, declared: Scope) -> Scope {
        match self {
            Scope::Compile => declared,
            pinned => pinned,
        }
    }

    /// Whether a third-party declaration with this scope transits at all
    ///
    /// Provided- and test-scoped dependencies of third-party artifacts are
    /// never pulled in transitively.
    pub fn is_transitive(self) -> bool {
        matches!(self, Scope::Compile | Scope::Runtime)
    }

    /// Whether artifacts with this effective scope resolve from local
    /// repositories only
    pub fn is_local_only(self) -> bool {
        matches!(self, Scope::Standalone)
    }
}
