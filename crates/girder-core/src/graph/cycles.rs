//! Cycle prediction for the dependency graph.
//!
//! # Overview
//!
//! Dependency edges must keep the predecessor graph acyclic — a cycle would
//! leave every item in the loop permanently blocked. This module answers
//! "would adding this edge close a cycle?" *before* the edge is applied, and
//! reports the actual cycle path so the rejection is diagnosable.
//!
//! # Design
//!
//! - **DFS-based**: depth-first search from the candidate predecessor,
//!   following existing blocked-by links, looking for a path back to the
//!   candidate successor. If one exists, the new edge closes a cycle.
//! - **Reject, don't warn**: unlike advisory systems, the caller treats a
//!   detected cycle as a hard error and the mutation is aborted.
//! - **O(V+E)**: each node and edge is visited at most once per check.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};

use crate::model::ids::ItemId;

use super::blocking::DependencyGraph;

/// Detect whether adding "`successor` is blocked by `predecessor`" would
/// create a cycle in `graph` (which does not yet contain the edge).
///
/// Returns the cycle path the edge would close, starting and ending at
/// `successor` — e.g. adding `b blocked-by a` onto `a blocked-by b` yields
/// `[b, a, b]`. Returns `None` when the edge is safe.
pub fn detect_cycle_on_add(
    graph: &DependencyGraph,
    successor: &ItemId,
    predecessor: &ItemId,
) -> Option<Vec<ItemId>> {
    // Self-loop: degenerate two-entry path. Callers normally reject this
    // earlier as a self-reference.
    if successor == predecessor {
        return Some(vec![successor.clone(), successor.clone()]);
    }

    // The new edge is successor -> predecessor in the blocked-by direction.
    // A cycle exists iff the predecessor can already reach the successor by
    // following blocked-by links.
    let mut visited: HashSet<ItemId> = HashSet::new();
    let mut parent_map: HashMap<ItemId, ItemId> = HashMap::new();

    if dfs_find_path(graph, predecessor, successor, &mut visited, &mut parent_map) {
        let mut path = vec![successor.clone()];
        reconstruct_path(&parent_map, predecessor, successor, &mut path);
        Some(path)
    } else {
        None
    }
}

/// Boolean form of [`detect_cycle_on_add`] for callers that do not need the
/// path.
pub fn would_create_cycle(
    graph: &DependencyGraph,
    successor: &ItemId,
    predecessor: &ItemId,
) -> bool {
    detect_cycle_on_add(graph, successor, predecessor).is_some()
}

/// DFS from `current` toward `target` along blocked-by links, recording the
/// traversal in `parent_map` so the path can be reconstructed.
fn dfs_find_path(
    graph: &DependencyGraph,
    current: &ItemId,
    target: &ItemId,
    visited: &mut HashSet<ItemId>,
    parent_map: &mut HashMap<ItemId, ItemId>,
) -> bool {
    if current == target {
        return true;
    }
    if !visited.insert(current.clone()) {
        return false;
    }

    for edge in graph.predecessors_of(current) {
        let next = &edge.predecessor_id;
        if !visited.contains(next) {
            parent_map.insert(next.clone(), current.clone());
            if dfs_find_path(graph, next, target, visited, parent_map) {
                return true;
            }
        }
    }

    false
}

/// Append the nodes from `start` to `end` (walking `parent_map` backwards
/// from `end`) onto `path`, then close the loop with `end`'s repeat being
/// supplied by the caller's starting entry.
fn reconstruct_path(
    parent_map: &HashMap<ItemId, ItemId>,
    start: &ItemId,
    end: &ItemId,
    path: &mut Vec<ItemId>,
) {
    let mut chain = Vec::new();
    let mut current = end.clone();

    while &current != start {
        chain.push(current.clone());
        match parent_map.get(&current) {
            Some(parent) => current = parent.clone(),
            None => break,
        }
    }
    chain.push(start.clone());
    chain.reverse();

    path.extend(chain);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::blocking::DependencyGraph;

    /// Build a graph from (successor, predecessors) pairs.
    fn build_graph(links: &[(&str, &[&str])]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (succ, preds) in links {
            for pred in *preds {
                graph
                    .insert(DependencyGraph::plain_edge(
                        ItemId::from(*pred),
                        ItemId::from(*succ),
                    ))
                    .expect("test edges form a DAG");
            }
        }
        graph
    }

    fn detect(graph: &DependencyGraph, succ: &str, pred: &str) -> Option<Vec<ItemId>> {
        detect_cycle_on_add(graph, &ItemId::from(succ), &ItemId::from(pred))
    }

    // -----------------------------------------------------------------------
    // Self-loop
    // -----------------------------------------------------------------------

    #[test]
    fn self_loop_detected() {
        let graph = build_graph(&[]);
        let path = detect(&graph, "a", "a").expect("self-loop is a cycle");
        assert_eq!(path, vec![ItemId::from("a"), ItemId::from("a")]);
    }

    // -----------------------------------------------------------------------
    // Small cycles
    // -----------------------------------------------------------------------

    #[test]
    fn mutual_block_detected() {
        // a blocked by b; adding b blocked by a closes a 2-cycle.
        let graph = build_graph(&[("a", &["b"])]);
        let path = detect(&graph, "b", "a").expect("mutual block is a cycle");
        assert_eq!(path.first().unwrap().as_str(), "b");
        assert_eq!(path.last().unwrap().as_str(), "b");
        assert_eq!(path.len(), 3, "b -> a -> b");
    }

    #[test]
    fn three_node_cycle_detected() {
        // a blocked by b, b blocked by c; adding c blocked by a closes it.
        let graph = build_graph(&[("a", &["b"]), ("b", &["c"])]);
        let path = detect(&graph, "c", "a").expect("three-node cycle");
        assert_eq!(path.first().unwrap().as_str(), "c");
        assert_eq!(path.last().unwrap().as_str(), "c");
        assert_eq!(path.len(), 4, "c -> a -> b -> c");
    }

    // -----------------------------------------------------------------------
    // No cycle
    // -----------------------------------------------------------------------

    #[test]
    fn no_cycle_in_linear_chain() {
        let graph = build_graph(&[("a", &["b"]), ("b", &["c"])]);
        assert!(detect(&graph, "d", "a").is_none());
        assert!(!would_create_cycle(
            &graph,
            &ItemId::from("d"),
            &ItemId::from("a")
        ));
    }

    #[test]
    fn no_cycle_parallel_chains() {
        let graph = build_graph(&[("a", &["b"]), ("c", &["d"])]);
        assert!(detect(&graph, "a", "c").is_none());
    }

    #[test]
    fn no_cycle_diamond() {
        // a blocked by b and c; b and c both blocked by d. Adding e blocked
        // by a is safe.
        let graph = build_graph(&[("a", &["b", "c"]), ("b", &["d"]), ("c", &["d"])]);
        assert!(detect(&graph, "e", "a").is_none());
    }

    #[test]
    fn duplicate_edge_is_not_a_cycle() {
        let graph = build_graph(&[("a", &["b"])]);
        assert!(detect(&graph, "a", "b").is_none());
    }

    #[test]
    fn empty_graph_no_cycle() {
        let graph = build_graph(&[]);
        assert!(detect(&graph, "a", "b").is_none());
    }

    #[test]
    fn cycle_in_disconnected_subgraph_detected() {
        let graph = build_graph(&[("x", &["y"]), ("y", &["z"]), ("a", &["b"])]);
        let path = detect(&graph, "b", "a").expect("2-cycle in a-b subgraph");
        assert_eq!(path.len(), 3);
    }

    // -----------------------------------------------------------------------
    // Long chains
    // -----------------------------------------------------------------------

    #[test]
    fn long_chain_cycle_reports_full_path() {
        // n0 blocked by n1 blocked by ... blocked by n9.
        let names: Vec<String> = (0..10).map(|i| format!("n{i}")).collect();
        let mut graph = DependencyGraph::new();
        for i in 0..9 {
            graph
                .insert(DependencyGraph::plain_edge(
                    ItemId::new(names[i + 1].clone()),
                    ItemId::new(names[i].clone()),
                ))
                .expect("chain edges accepted");
        }

        // n9 blocked by n0 closes a 10-node cycle.
        let path = detect(&graph, "n9", "n0").expect("chain closes into a cycle");
        assert_eq!(path.len(), 11, "10 distinct nodes plus the repeat");
        assert_eq!(path.first().unwrap().as_str(), "n9");
        assert_eq!(path.last().unwrap().as_str(), "n9");
    }

    #[test]
    fn long_chain_without_cycle_is_fast_and_clean() {
        let names: Vec<String> = (0..1000).map(|i| format!("n{i}")).collect();
        let mut graph = DependencyGraph::new();
        for i in 0..999 {
            graph
                .insert(DependencyGraph::plain_edge(
                    ItemId::new(names[i + 1].clone()),
                    ItemId::new(names[i].clone()),
                ))
                .expect("chain edges accepted");
        }

        assert!(detect(&graph, "fresh", "n0").is_none());
    }
}
