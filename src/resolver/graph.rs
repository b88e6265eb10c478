// src/resolver/graph.rs

//! Transitive closure and dependency-tree rendering
//!
//! The closure is a breadth-first worklist over coordinate identities.
//! Children are expanded in descriptor declaration order, each identity is
//! expanded exactly once (the first discovery path wins expansion), and
//! re-discovered identities go through the conflict rule without being
//! re-enqueued, which also keeps cyclic descriptor graphs terminating.

use super::{DependencyResolver, ResolutionContext, TRANSITIVE_SCOPES};
use crate::dependency::{Dependency, DependencyId, DependencySet, Scope};
use crate::error::Result;
use crate::repository::Repository;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

const BRANCH: &str = "├─ ";
const LAST_BRANCH: &str = "└─ ";
const CONTINUATION: &str = "│  ";
const BLANK: &str = "   ";

/// The resolved closure of one or more root coordinates
///
/// Keeps the winning dependency set plus the first-discovery child lists
/// needed to render the tree.
#[derive(Debug)]
pub struct DependencyGraph {
    roots: Vec<Dependency>,
    children: HashMap<DependencyId, Vec<Dependency>>,
    dependencies: DependencySet,
}

impl DependencyGraph {
    /// Resolve the transitive closure of the given roots
    ///
    /// Roots expand against the requested scopes; everything below them
    /// expands against the transitive scopes only. Dependencies reached
    /// under an effective standalone scope resolve from local repositories
    /// exclusively.
    pub fn resolve(
        context: ResolutionContext<'_>,
        roots: &[Dependency],
        scopes: &[Scope],
    ) -> Result<Self> {
        let local_repositories: Vec<Repository> = context
            .repositories
            .iter()
            .filter(|repository| repository.is_local())
            .cloned()
            .collect();
        let local_only = !scopes.is_empty() && scopes.iter().all(|scope| scope.is_local_only());

        let mut dependencies = DependencySet::new();
        let mut children: HashMap<DependencyId, Vec<Dependency>> = HashMap::new();
        let mut queue: VecDeque<(Dependency, Scope)> = VecDeque::new();
        let mut resolved_roots = Vec::new();

        for root in roots {
            let root = DependencyResolver::new(context, root).dependency().clone();
            let root_scope = if local_only {
                Scope::Standalone
            } else {
                Scope::Compile
            };
            let first_occurrence = !dependencies.contains(&root);
            dependencies.add(root.clone());
            if first_occurrence {
                queue.push_back((root.clone(), root_scope));
            }
            resolved_roots.push(root);
        }

        while let Some((node, effective)) = queue.pop_front() {
            let node_scopes = if node.parent.is_none() {
                scopes
            } else {
                TRANSITIVE_SCOPES
            };
            let repositories = if effective.is_local_only() {
                local_repositories.as_slice()
            } else {
                context.repositories
            };
            let node_context = ResolutionContext {
                repositories,
                ..context
            };
            let resolver = DependencyResolver::new(node_context, &node);

            let mut surviving = Vec::new();
            for (child, declared) in resolver.direct_dependencies_scoped(node_scopes)? {
                if excluded_by_ancestors(&child) {
                    debug!("Excluding {} declared by {}", child, node);
                    continue;
                }
                surviving.push(child.clone());
                if dependencies.contains(&child) {
                    dependencies.add(child);
                } else {
                    let child_scope = effective.narrow(declared);
                    dependencies.add(child.clone());
                    queue.push_back((child, child_scope));
                }
            }
            children.insert(node.id(), surviving);
        }

        Ok(Self {
            roots: resolved_roots,
            children,
            dependencies,
        })
    }

    /// Roots in traversal order, with overrides applied
    pub fn roots(&self) -> &[Dependency] {
        &self.roots
    }

    /// The winning entries in first-discovery order
    pub fn dependencies(&self) -> &DependencySet {
        &self.dependencies
    }

    pub fn into_dependencies(self) -> DependencySet {
        self.dependencies
    }

    /// Render the tree as text with box-drawing connectors
    ///
    /// Every node is labelled with its winning coordinate. An identity
    /// reachable along several paths is expanded only at its first rendered
    /// occurrence and printed as a leaf everywhere else.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut expanded = HashSet::new();
        for root in &self.roots {
            out.push_str(&self.label(root));
            out.push('\n');
            if expanded.insert(root.id()) {
                self.render_children(root, "", &mut expanded, &mut out);
            }
        }
        out
    }

    fn render_children(
        &self,
        node: &Dependency,
        prefix: &str,
        expanded: &mut HashSet<DependencyId>,
        out: &mut String,
    ) {
        let Some(children) = self.children.get(&node.id()) else {
            return;
        };
        for (position, child) in children.iter().enumerate() {
            let last = position + 1 == children.len();
            out.push_str(prefix);
            out.push_str(if last { LAST_BRANCH } else { BRANCH });
            out.push_str(&self.label(child));
            out.push('\n');
            if expanded.insert(child.id()) {
                let child_prefix = format!("{}{}", prefix, if last { BLANK } else { CONTINUATION });
                self.render_children(child, &child_prefix, expanded, out);
            }
        }
    }

    fn label(&self, dependency: &Dependency) -> String {
        self.dependencies
            .get(dependency)
            .unwrap_or(dependency)
            .to_string()
    }
}

/// Whether any ancestor on the discovery path excludes this candidate
fn excluded_by_ancestors(child: &Dependency) -> bool {
    let mut ancestor = child.parent.as_deref();
    while let Some(node) = ancestor {
        if child.is_excluded_by(&node.exclusions) {
            return true;
        }
        ancestor = node.parent.as_deref();
    }
    false
}
