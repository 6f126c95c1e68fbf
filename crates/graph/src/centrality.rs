//! Degree, betweenness (Brandes), and PageRank centrality measures.

use kgraph_core::{CancellationToken, Error, Result};
use kgraph_index::EntityIndex;
use kgraph_storage::GraphView;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

use crate::neighbours::neighbours;
use crate::options::{Direction, NeighbourOptions};

fn undirected_adjacency(view: &GraphView, index: &EntityIndex) -> FxHashMap<String, Vec<String>> {
    let adj_opts = NeighbourOptions { direction: Direction::Both, ..Default::default() };
    let mut adjacency = FxHashMap::default();
    for name in view.entities.keys() {
        let neighbours: Vec<String> = neighbours(view, index, name, &adj_opts)
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        adjacency.insert(name.clone(), neighbours);
    }
    adjacency
}

/// `(in + out) / (n - 1)` per entity, or per-direction when `direction` is
/// not [`Direction::Both`]. A single-node graph yields 0.0 for everyone
/// rather than dividing by zero.
pub fn degree_centrality(view: &GraphView, index: &EntityIndex, direction: Direction) -> FxHashMap<String, f64> {
    let n = view.entity_count();
    let mut scores = FxHashMap::default();
    if n <= 1 {
        for name in view.entities.keys() {
            scores.insert(name.clone(), 0.0);
        }
        return scores;
    }
    let adj_opts = NeighbourOptions { direction, ..Default::default() };
    for name in view.entities.keys() {
        let degree = neighbours(view, index, name, &adj_opts).len();
        scores.insert(name.clone(), degree as f64 / (n - 1) as f64);
    }
    scores
}

/// Top-`k` entities by score, descending, ties broken by name for
/// determinism.
pub fn top_k(scores: &FxHashMap<String, f64>, k: usize) -> Vec<(String, f64)> {
    let mut entries: Vec<(String, f64)> = scores.iter().map(|(n, s)| (n.clone(), *s)).collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(k);
    entries
}

/// Brandes' exact betweenness centrality. With `approximate`, samples
/// `ceil(sample_rate * n)` (minimum 10, capped at n) source vertices and
/// scales the accumulated scores by `1 / sample_rate` rather than visiting
/// every source. Yields (checks cancellation and reports progress) every
/// `chunk_size` source vertices.
pub struct BetweennessOptions {
    pub approximate: bool,
    pub sample_rate: f64,
    pub chunk_size: usize,
}

impl Default for BetweennessOptions {
    fn default() -> Self {
        BetweennessOptions { approximate: false, sample_rate: 0.2, chunk_size: 50 }
    }
}

pub fn betweenness_centrality(
    view: &GraphView,
    index: &EntityIndex,
    opts: &BetweennessOptions,
    cancel: &CancellationToken,
    mut progress: impl FnMut(usize, usize),
) -> Result<FxHashMap<String, f64>> {
    let adjacency = undirected_adjacency(view, index);
    let n = adjacency.len();
    let mut all_nodes: Vec<String> = adjacency.keys().cloned().collect();
    all_nodes.sort();

    let mut scores: FxHashMap<String, f64> = all_nodes.iter().map(|n| (n.clone(), 0.0)).collect();
    if n < 3 {
        return Ok(scores);
    }

    let sources: Vec<String> = if opts.approximate {
        let sample_size = ((opts.sample_rate * n as f64).ceil() as usize).max(10).min(n);
        all_nodes.iter().take(sample_size).cloned().collect()
    } else {
        all_nodes.clone()
    };

    for (processed, source) in sources.iter().enumerate() {
        if processed % opts.chunk_size.max(1) == 0 {
            if cancel.is_cancelled() {
                return Err(Error::OperationCancelled);
            }
            progress(processed, sources.len());
        }
        brandes_single_source(source, &adjacency, &mut scores);
    }
    progress(sources.len(), sources.len());

    if opts.approximate {
        let scale = 1.0 / opts.sample_rate;
        for v in scores.values_mut() {
            *v *= scale;
        }
    }

    // Brandes accumulates each pair twice on an undirected graph.
    for v in scores.values_mut() {
        *v /= 2.0;
    }

    Ok(scores)
}

fn brandes_single_source(source: &str, adjacency: &FxHashMap<String, Vec<String>>, scores: &mut FxHashMap<String, f64>) {
    let mut stack = Vec::new();
    let mut predecessors: FxHashMap<String, Vec<String>> = FxHashMap::default();
    let mut sigma: FxHashMap<String, f64> = adjacency.keys().map(|k| (k.clone(), 0.0)).collect();
    let mut dist: FxHashMap<String, i64> = adjacency.keys().map(|k| (k.clone(), -1)).collect();
    sigma.insert(source.to_string(), 1.0);
    dist.insert(source.to_string(), 0);

    let mut queue = VecDeque::new();
    queue.push_back(source.to_string());

    while let Some(v) = queue.pop_front() {
        stack.push(v.clone());
        let Some(neighbours) = adjacency.get(&v) else { continue };
        for w in neighbours {
            if dist[w] < 0 {
                dist.insert(w.clone(), dist[&v] + 1);
                queue.push_back(w.clone());
            }
            if dist[w] == dist[&v] + 1 {
                let sv = sigma[&v];
                *sigma.get_mut(w).unwrap() += sv;
                predecessors.entry(w.clone()).or_default().push(v.clone());
            }
        }
    }

    let mut delta: FxHashMap<String, f64> = adjacency.keys().map(|k| (k.clone(), 0.0)).collect();
    while let Some(w) = stack.pop() {
        if let Some(preds) = predecessors.get(&w) {
            for v in preds {
                let coeff = (sigma[v] / sigma[&w]) * (1.0 + delta[&w]);
                *delta.get_mut(v).unwrap() += coeff;
            }
        }
        if w != source {
            *scores.get_mut(&w).unwrap() += delta[&w];
        }
    }
}

/// Power-iteration PageRank with damping `damping`, distributing dangling
/// (out-degree-zero) nodes' mass uniformly across all nodes. Converges when
/// the L1 delta between iterations drops below `tolerance` or after
/// `max_iterations`.
pub struct PageRankOptions {
    pub damping: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for PageRankOptions {
    fn default() -> Self {
        PageRankOptions { damping: 0.85, tolerance: 1e-6, max_iterations: 100 }
    }
}

pub fn pagerank(view: &GraphView, index: &EntityIndex, opts: &PageRankOptions) -> FxHashMap<String, f64> {
    let adj_opts = NeighbourOptions { direction: Direction::Out, ..Default::default() };
    let mut all_nodes: Vec<String> = view.entities.keys().cloned().collect();
    all_nodes.sort();
    let n = all_nodes.len();
    if n == 0 {
        return FxHashMap::default();
    }

    let out_links: FxHashMap<String, Vec<String>> = all_nodes
        .iter()
        .map(|name| {
            let outs: Vec<String> = neighbours(view, index, name, &adj_opts).into_iter().map(|(t, _)| t).collect();
            (name.clone(), outs)
        })
        .collect();

    let mut rank: FxHashMap<String, f64> = all_nodes.iter().map(|n| (n.clone(), 1.0 / n as f64)).collect();

    for _ in 0..opts.max_iterations {
        let dangling_mass: f64 = all_nodes
            .iter()
            .filter(|n| out_links[*n].is_empty())
            .map(|n| rank[n])
            .sum();

        let base = (1.0 - opts.damping) / n as f64 + opts.damping * dangling_mass / n as f64;
        let mut next: FxHashMap<String, f64> = all_nodes.iter().map(|n| (n.clone(), base)).collect();

        for name in &all_nodes {
            let outs = &out_links[name];
            if outs.is_empty() {
                continue;
            }
            let share = opts.damping * rank[name] / outs.len() as f64;
            for target in outs {
                if let Some(v) = next.get_mut(target) {
                    *v += share;
                }
            }
        }

        let delta: f64 = all_nodes.iter().map(|n| (next[n] - rank[n]).abs()).sum();
        rank = next;
        if delta < opts.tolerance {
            break;
        }
    }

    rank
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_core::{Entity, Relation};

    fn star_view() -> (GraphView, EntityIndex) {
        let mut view = GraphView::new();
        for name in ["Hub", "A", "B", "C"] {
            view.entities.insert(name.into(), Entity::new(name, "t", vec![]));
        }
        for leaf in ["A", "B", "C"] {
            let r = Relation::new("Hub", leaf, "knows");
            view.relations.insert(r.key(), r);
        }
        let index = EntityIndex::rebuild(&view);
        (view, index)
    }

    #[test]
    fn hub_has_highest_degree_centrality() {
        let (view, index) = star_view();
        let scores = degree_centrality(&view, &index, Direction::Both);
        let hub = scores["Hub"];
        assert!(hub > scores["A"]);
    }

    #[test]
    fn single_node_degree_is_zero() {
        let mut view = GraphView::new();
        view.entities.insert("Solo".into(), Entity::new("Solo", "t", vec![]));
        let index = EntityIndex::rebuild(&view);
        let scores = degree_centrality(&view, &index, Direction::Both);
        assert_eq!(scores["Solo"], 0.0);
    }

    #[test]
    fn betweenness_hub_dominates_leaves() {
        let (view, index) = star_view();
        let cancel = CancellationToken::new();
        let opts = BetweennessOptions::default();
        let scores = betweenness_centrality(&view, &index, &opts, &cancel, |_, _| {}).unwrap();
        assert!(scores["Hub"] > scores["A"]);
    }

    #[test]
    fn betweenness_respects_cancellation() {
        let (view, index) = star_view();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut opts = BetweennessOptions::default();
        opts.chunk_size = 1;
        let result = betweenness_centrality(&view, &index, &opts, &cancel, |_, _| {});
        assert!(matches!(result, Err(Error::OperationCancelled)));
    }

    #[test]
    fn pagerank_sums_close_to_one() {
        let (view, index) = star_view();
        let scores = pagerank(&view, &index, &PageRankOptions::default());
        let total: f64 = scores.values().sum();
        assert!((total - 1.0).abs() < 1e-3);
    }

    #[test]
    fn pagerank_empty_graph_is_empty() {
        let view = GraphView::new();
        let index = EntityIndex::rebuild(&view);
        assert!(pagerank(&view, &index, &PageRankOptions::default()).is_empty());
    }
}
