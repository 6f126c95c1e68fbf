//! Bounded Levenshtein fuzzy matching (spec §4.G): edit distance against
//! every candidate's name/tag/observation tokens, with early termination
//! once the running distance exceeds the threshold-derived bound. Corpora
//! above [`OFFLOAD_THRESHOLD`] candidates have their per-candidate work
//! split across the shared worker pool (spec §4.Q) instead of running in
//! the caller's thread.

use kgraph_core::{CancellationToken, Entity, Error, Result};
use kgraph_index::tokenize::tokenize;
use kgraph_storage::GraphView;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Above this many candidates, distance computation is split into chunks
/// and offloaded to the worker pool rather than run inline.
pub const OFFLOAD_THRESHOLD: usize = 500;
const CHUNK_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyMatch {
    pub name: String,
    pub score: f64,
}

/// Computes Levenshtein distance, aborting early (returning `None`) once
/// every cell in a row already exceeds `max_distance` — the standard
/// banded-DP bail-out, since no later cell in that row can recover.
pub fn levenshtein_bounded(a: &str, b: &str, max_distance: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max_distance {
        return None;
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for i in 1..=a.len() {
        let mut cur = vec![0usize; b.len() + 1];
        cur[0] = i;
        let mut row_min = cur[0];
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            cur[j] = (prev[j] + 1).min(cur[j - 1] + 1).min(prev[j - 1] + cost);
            row_min = row_min.min(cur[j]);
        }
        if row_min > max_distance {
            return None;
        }
        prev = cur;
    }
    let distance = prev[b.len()];
    (distance <= max_distance).then_some(distance)
}

/// ⌈(1 − threshold) · max(len(a), len(b))⌉, the maximum edit distance that
/// still counts as a match at `threshold`.
fn distance_budget(a_len: usize, b_len: usize, threshold: f64) -> usize {
    let max_len = a_len.max(b_len) as f64;
    ((1.0 - threshold) * max_len).ceil() as usize
}

fn similarity(distance: usize, max_len: usize) -> f64 {
    if max_len == 0 {
        1.0
    } else {
        1.0 - (distance as f64 / max_len as f64)
    }
}

fn candidate_tokens(entity: &Entity) -> Vec<String> {
    let mut tokens = kgraph_index::tokenize::tokenize_entity_text(&entity.name, &entity.entity_type, &entity.observations);
    if let Some(tags) = &entity.tags {
        tokens.extend(tags.iter().cloned());
    }
    tokens
}

/// Best similarity of any `query_token` against any of `tokens`, or `None`
/// if nothing clears `threshold`.
fn best_similarity(query_tokens: &[String], tokens: &[String], threshold: f64) -> Option<f64> {
    let mut best = 0.0f64;
    for q in query_tokens {
        for t in tokens {
            let budget = distance_budget(q.len(), t.len(), threshold);
            if let Some(distance) = levenshtein_bounded(q, t, budget) {
                let score = similarity(distance, q.len().max(t.len()));
                if score > best {
                    best = score;
                }
            }
        }
    }
    (best >= threshold).then_some(best)
}

/// Fuzzy-matches `query` against every entity's tokens, returning the
/// top `limit` by descending similarity.
pub async fn fuzzy_search(
    view: &GraphView,
    query: &str,
    threshold: f64,
    limit: usize,
    cancel: &CancellationToken,
) -> Result<Vec<FuzzyMatch>> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return Ok(Vec::new());
    }
    let candidates: Vec<(String, Vec<String>)> =
        view.entities.values().map(|e| (e.name.clone(), candidate_tokens(e))).collect();

    let mut matches = if candidates.len() > OFFLOAD_THRESHOLD {
        fuzzy_search_offloaded(candidates, query_tokens, threshold, cancel).await?
    } else {
        fuzzy_search_inline(&candidates, &query_tokens, threshold, cancel)?
    };

    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    matches.truncate(limit);
    Ok(matches)
}

fn fuzzy_search_inline(
    candidates: &[(String, Vec<String>)],
    query_tokens: &[String],
    threshold: f64,
    cancel: &CancellationToken,
) -> Result<Vec<FuzzyMatch>> {
    let mut out = Vec::new();
    for (i, (name, tokens)) in candidates.iter().enumerate() {
        if i % 100 == 0 && cancel.is_cancelled() {
            return Err(Error::OperationCancelled);
        }
        if let Some(score) = best_similarity(query_tokens, tokens, threshold) {
            out.push(FuzzyMatch { name: name.clone(), score });
        }
    }
    Ok(out)
}

async fn fuzzy_search_offloaded(
    candidates: Vec<(String, Vec<String>)>,
    query_tokens: Vec<String>,
    threshold: f64,
    cancel: &CancellationToken,
) -> Result<Vec<FuzzyMatch>> {
    let pool = kgraph_scheduler::global_pool(4);
    let mut handles = Vec::new();
    for chunk in candidates.chunks(CHUNK_SIZE) {
        if cancel.is_cancelled() {
            return Err(Error::OperationCancelled);
        }
        let chunk = chunk.to_vec();
        let q = query_tokens.clone();
        let handle = pool.submit(kgraph_scheduler::Priority::Normal, Duration::from_secs(10), move || async move {
            let mut out = Vec::new();
            for (name, tokens) in &chunk {
                if let Some(score) = best_similarity(&q, tokens, threshold) {
                    out.push(FuzzyMatch { name: name.clone(), score });
                }
            }
            out
        });
        handles.push(handle);
    }
    let mut results = Vec::new();
    for handle in handles {
        if let Ok(chunk_matches) = handle.join().await.into_result() {
            results.extend(chunk_matches);
        }
    }
    Ok(results)
}
