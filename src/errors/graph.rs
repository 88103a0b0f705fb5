// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur while computing initialization groups
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// A node lists a dependency id that was never added to the graph
    #[error("node '{node_id}' depends on '{missing_dependency}' which was never added to the graph")]
    UnmetDependency {
        /// The node that declared the dependency
        node_id: String,
        /// The dependency id that could not be found
        missing_dependency: String,
    },

    /// No node with zero outstanding dependencies remained while nodes were
    /// still unplaced. The map carries each remaining node with its
    /// outstanding dependency list for diagnosis.
    #[error("dependency cycle detected among remaining nodes: {}", format_remaining(.remaining))]
    Cycle {
        /// Remaining node id -> outstanding dependency ids
        remaining: HashMap<String, Vec<String>>,
    },
}

fn format_remaining(remaining: &HashMap<String, Vec<String>>) -> String {
    let mut entries: Vec<_> = remaining
        .iter()
        .map(|(id, deps)| format!("{} -> [{}]", id, deps.join(", ")))
        .collect();
    entries.sort();
    entries.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_display_is_sorted_and_readable() {
        let mut remaining = HashMap::new();
        remaining.insert("b".to_string(), vec!["a".to_string()]);
        remaining.insert("a".to_string(), vec!["b".to_string()]);

        let error = GraphError::Cycle { remaining };
        assert_eq!(
            error.to_string(),
            "dependency cycle detected among remaining nodes: a -> [b], b -> [a]"
        );
    }

    #[test]
    fn unmet_dependency_display_names_both_ids() {
        let error = GraphError::UnmetDependency {
            node_id: "router".to_string(),
            missing_dependency: "sessions".to_string(),
        };
        assert!(error.to_string().contains("router"));
        assert!(error.to_string().contains("sessions"));
    }
}
