//! Visit-once BFS and iterative DFS over the relation index.

use kgraph_index::EntityIndex;
use kgraph_storage::GraphView;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

use crate::neighbours::neighbours;
use crate::options::{NeighbourOptions, TraversalOptions};

/// Visited order, per-node depth, and BFS/DFS parent pointers from one
/// traversal. A nonexistent `start` yields an empty result.
#[derive(Debug, Clone, Default)]
pub struct TraversalResult {
    pub visited: Vec<String>,
    pub depth: FxHashMap<String, usize>,
    pub parent: FxHashMap<String, String>,
}

fn adjacency_opts(opts: &TraversalOptions) -> NeighbourOptions {
    NeighbourOptions { direction: opts.direction, ..Default::default() }
}

/// Breadth-first traversal, respecting `opts.max_depth`.
pub fn bfs(view: &GraphView, index: &EntityIndex, start: &str, opts: &TraversalOptions) -> TraversalResult {
    let mut result = TraversalResult::default();
    if view.get_entity(start).is_none() && index.relations_by_entity.get(start).is_none() {
        return result;
    }
    let adj_opts = adjacency_opts(opts);

    let mut queue = VecDeque::new();
    queue.push_back(start.to_string());
    result.depth.insert(start.to_string(), 0);

    while let Some(node) = queue.pop_front() {
        result.visited.push(node.clone());
        let depth = result.depth[&node];
        if opts.max_depth.is_some_and(|max| depth >= max) {
            continue;
        }
        for (next, _relation) in neighbours(view, index, &node, &adj_opts) {
            if result.depth.contains_key(&next) {
                continue;
            }
            result.depth.insert(next.clone(), depth + 1);
            result.parent.insert(next.clone(), node.clone());
            queue.push_back(next);
        }
    }
    result
}

/// Depth-first traversal using an explicit stack (no recursion, so depth is
/// bounded only by available memory rather than the call stack).
pub fn dfs(view: &GraphView, index: &EntityIndex, start: &str, opts: &TraversalOptions) -> TraversalResult {
    let mut result = TraversalResult::default();
    if view.get_entity(start).is_none() && index.relations_by_entity.get(start).is_none() {
        return result;
    }
    let adj_opts = adjacency_opts(opts);

    let mut visited_set = rustc_hash::FxHashSet::default();
    let mut stack = vec![start.to_string()];
    result.depth.insert(start.to_string(), 0);

    while let Some(node) = stack.pop() {
        if !visited_set.insert(node.clone()) {
            continue;
        }
        result.visited.push(node.clone());
        let depth = result.depth[&node];
        if opts.max_depth.is_some_and(|max| depth >= max) {
            continue;
        }
        for (next, _relation) in neighbours(view, index, &node, &adj_opts) {
            if visited_set.contains(&next) {
                continue;
            }
            result.depth.entry(next.clone()).or_insert(depth + 1);
            result.parent.entry(next.clone()).or_insert_with(|| node.clone());
            stack.push(next);
        }
    }
    result
}
