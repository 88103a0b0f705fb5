// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Topological grouping of module dependency graphs.
//!
//! The builder accumulates `(node id, dependency ids)` pairs and partitions
//! them into ordered groups where no member of a group depends on another
//! member of the same group. Group `k` only depends on groups `0..k-1`, so
//! every group can be initialized concurrently once its predecessors are
//! done.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::errors::GraphError;

/// Accumulates nodes and computes their initialization groups.
///
/// The builder is one-shot: [`calc_groups`](Self::calc_groups) consumes it,
/// so a second computation always starts from a fresh, empty value. This
/// replaces the accumulate-then-compute-then-implicitly-reset pattern with
/// one the type system enforces.
#[derive(Debug, Default)]
pub struct DependencyGraphBuilder {
    nodes: HashMap<String, Vec<String>>,
}

impl DependencyGraphBuilder {
    /// Create a new empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node with its dependency ids. Last write wins for a given
    /// id within one builder.
    pub fn add_node(&mut self, id: impl Into<String>, dependencies: Vec<String>) {
        self.nodes.insert(id.into(), dependencies);
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no nodes have been registered
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Partition the registered nodes into ordered initialization groups.
    ///
    /// Uses Kahn's algorithm with an explicit in-degree counter and a ready
    /// queue, O(V + E):
    /// * group 0 holds the nodes with no dependencies;
    /// * group `k` holds the nodes whose dependencies all sit in groups
    ///   `0..k-1`;
    /// * every registered node appears in exactly one group.
    ///
    /// Intra-group member order is unspecified; members of one group are
    /// expected to be initialized concurrently.
    ///
    /// # Errors
    ///
    /// * [`GraphError::UnmetDependency`] if a dependency id was never
    ///   registered via [`add_node`](Self::add_node). Checked before
    ///   layering, so it is always reported in preference to a cycle.
    /// * [`GraphError::Cycle`] if no zero-dependency node remains while
    ///   nodes are still unplaced. No partial grouping is returned; the
    ///   error carries the remaining node -> outstanding-dependency map.
    pub fn calc_groups(self) -> Result<Vec<Vec<String>>, GraphError> {
        let nodes = self.nodes;

        // Reject references to ids that were never added. Scan in sorted
        // order so the reported error is deterministic.
        let mut ids: Vec<&String> = nodes.keys().collect();
        ids.sort();
        for id in &ids {
            for dependency in &nodes[*id] {
                if !nodes.contains_key(dependency) {
                    return Err(GraphError::UnmetDependency {
                        node_id: (*id).clone(),
                        missing_dependency: dependency.clone(),
                    });
                }
            }
        }

        // In-degree per node over unique dependencies, plus the reverse
        // mapping (dependency -> dependents) for O(1) decrements.
        let mut in_degree: HashMap<&String, usize> = HashMap::new();
        let mut dependents: HashMap<&String, Vec<&String>> = HashMap::new();
        for (id, dependencies) in &nodes {
            let unique: HashSet<&String> = dependencies.iter().collect();
            in_degree.insert(id, unique.len());
            for dependency in unique {
                dependents.entry(dependency).or_default().push(id);
            }
        }

        let mut ready: VecDeque<&String> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut placed = 0usize;

        while !ready.is_empty() {
            let mut group = Vec::with_capacity(ready.len());
            let mut next: VecDeque<&String> = VecDeque::new();

            for id in ready.drain(..) {
                group.push(id.clone());
                placed += 1;

                if let Some(children) = dependents.get(id) {
                    for child in children {
                        // Every dependent was registered above, so the
                        // lookup cannot miss.
                        if let Some(degree) = in_degree.get_mut(*child) {
                            *degree -= 1;
                            if *degree == 0 {
                                next.push_back(*child);
                            }
                        }
                    }
                }
            }

            groups.push(group);
            ready = next;
        }

        if placed != nodes.len() {
            let placed_ids: HashSet<&String> = groups.iter().flatten().collect();
            let remaining = nodes
                .iter()
                .filter(|(id, _)| !placed_ids.contains(id))
                .map(|(id, dependencies)| {
                    let outstanding = dependencies
                        .iter()
                        .filter(|dependency| !placed_ids.contains(dependency))
                        .cloned()
                        .collect();
                    (id.clone(), outstanding)
                })
                .collect();
            return Err(GraphError::Cycle { remaining });
        }

        Ok(groups)
    }
}
