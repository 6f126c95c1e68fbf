//! Search dispatcher (spec §4.K): one entry point per query method plus an
//! `auto` entry that picks a method from the query shape, estimates cost
//! per method, executes, and records elapsed time for calibration.

use crate::basic::{self, BasicSearchFilters, BasicSearchResult, Pagination};
use crate::boolean;
use crate::fuzzy::{self, FuzzyMatch};
use crate::hybrid::{self, HybridResult};
use kgraph_core::config::{Bm25Config, HybridWeightsConfig};
use kgraph_core::{CancellationToken, Result};
use kgraph_index::entity_index::EntityIndex;
use kgraph_index::tfidf::TfIdfIndex;
use kgraph_index::tokenize::tokenize;
use kgraph_index::vector::VectorStore;
use kgraph_storage::GraphView;
use rustc_hash::FxHashSet;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Basic,
    Ranked,
    Boolean,
    Fuzzy,
    Vector,
    Hybrid,
}

impl Method {
    /// Relative per-item cost constant used for the size-of-corpus estimate.
    /// Values are calibrated by relative algorithmic weight, not an absolute
    /// unit: fuzzy's bounded edit distance per token pair dominates, basic's
    /// single substring check is cheapest.
    fn cost_constant(self) -> f64 {
        match self {
            Method::Basic => 1.0,
            Method::Boolean => 1.2,
            Method::Ranked => 1.5,
            Method::Vector => 2.0,
            Method::Hybrid => 2.5,
            Method::Fuzzy => 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CostEstimate {
    pub method: Method,
    pub estimated_cost: f64,
}

/// Estimated as corpus size × the method's relative cost constant.
pub fn estimate_costs(corpus_size: usize) -> Vec<CostEstimate> {
    [Method::Basic, Method::Ranked, Method::Boolean, Method::Fuzzy, Method::Vector, Method::Hybrid]
        .into_iter()
        .map(|method| CostEstimate { method, estimated_cost: corpus_size as f64 * method.cost_constant() })
        .collect()
}

/// Picks a method from the query's shape (spec §4.K selection rule),
/// returning the chosen method and a human-readable reason. `is_known_token`
/// reports whether a single-word query already appears somewhere in the
/// indexed corpus (e.g. the observation word index); a short token that
/// isn't is the actual likely-misspelled signal — short length alone
/// can't tell "Acme" (a real, if short, entity name) from "alce" (a typo).
pub fn select_auto(query: &str, embeddings_available: bool, is_known_token: impl Fn(&str) -> bool) -> (Method, String) {
    if boolean::looks_boolean(query) {
        return (Method::Boolean, "query contains boolean operators or field qualifiers".to_string());
    }
    if query.contains('*') || query.contains('?') {
        return (Method::Fuzzy, "query contains wildcard characters".to_string());
    }
    let tokens = tokenize(query);
    if tokens.len() == 1 && tokens[0].len() <= 4 && !is_known_token(&tokens[0]) {
        return (Method::Fuzzy, "single short token not present in the corpus looks likely-misspelled".to_string());
    }
    if tokens.len() >= 3 {
        if embeddings_available {
            return (Method::Vector, "multi-term query with embeddings available, preferring semantic match".to_string());
        }
        return (Method::Ranked, "multi-term natural language query".to_string());
    }
    (Method::Basic, "short query with no operators or wildcards".to_string())
}

#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Basic(BasicSearchResult),
    Ranked(Vec<(String, f64)>),
    Boolean(FxHashSet<String>),
    Fuzzy(Vec<FuzzyMatch>),
    Vector(Vec<(String, f32)>),
    Hybrid(Vec<HybridResult>),
}

#[derive(Debug, Clone)]
pub struct AutoResult {
    pub method: Method,
    pub reason: String,
    pub estimates: Vec<CostEstimate>,
    pub outcome: DispatchOutcome,
    pub elapsed: Duration,
}

/// Everything a dispatch call needs pulled from the engine's indexed view.
pub struct DispatchContext<'a> {
    pub view: &'a GraphView,
    pub entity_index: &'a EntityIndex,
    pub tfidf: &'a TfIdfIndex,
    pub vector_store: Option<&'a VectorStore>,
    pub bm25: Bm25Config,
    pub fuzzy_threshold: f64,
    pub hybrid_weights: HybridWeightsConfig,
    pub max_limit: usize,
}

pub fn dispatch_basic(ctx: &DispatchContext<'_>, query: &str, filters: &BasicSearchFilters, page: &Pagination) -> BasicSearchResult {
    basic::basic_search(ctx.view, ctx.entity_index, query, filters, page, ctx.max_limit)
}

pub fn dispatch_ranked(ctx: &DispatchContext<'_>, query: &str) -> Result<Vec<(String, f64)>> {
    ctx.tfidf.score_bm25(query, &ctx.bm25)
}

pub fn dispatch_boolean(ctx: &DispatchContext<'_>, query: &str) -> Result<FxHashSet<String>> {
    boolean::search(query, ctx.view)
}

pub async fn dispatch_fuzzy(ctx: &DispatchContext<'_>, query: &str, limit: usize, cancel: &CancellationToken) -> Result<Vec<FuzzyMatch>> {
    fuzzy::fuzzy_search(ctx.view, query, ctx.fuzzy_threshold, limit, cancel).await
}

pub fn dispatch_vector(ctx: &DispatchContext<'_>, query_embedding: &[f32], limit: usize, min_score: Option<f32>) -> Result<Vec<(String, f32)>> {
    match ctx.vector_store {
        Some(store) => store.top_k(query_embedding, limit, min_score),
        None => Ok(Vec::new()),
    }
}

pub fn dispatch_hybrid(
    ctx: &DispatchContext<'_>,
    query: &str,
    query_embedding: Option<&[f32]>,
    limit: usize,
) -> Result<Vec<HybridResult>> {
    let lexical: rustc_hash::FxHashMap<String, f64> = dispatch_ranked(ctx, query)?.into_iter().collect();
    let symbolic: rustc_hash::FxHashMap<String, f64> = boolean::search(query, ctx.view)
        .ok()
        .map(|names| names.into_iter().map(|n| (n, 1.0)).collect())
        .unwrap_or_default();
    let semantic: rustc_hash::FxHashMap<String, f64> = match (ctx.vector_store, query_embedding) {
        (Some(store), Some(embedding)) => {
            store.top_k(embedding, limit.max(1) * 4, None)?.into_iter().map(|(n, s)| (n, s as f64)).collect()
        }
        _ => rustc_hash::FxHashMap::default(),
    };
    let mut results = hybrid::hybrid_search(&semantic, &lexical, &symbolic, &ctx.hybrid_weights);
    results.truncate(limit);
    Ok(results)
}

/// Selects a method from the query shape, executes it, and times the whole
/// round trip. `query_embedding` is only consulted if the heuristic (or the
/// fallback below) picks [`Method::Vector`].
pub async fn dispatch_auto(
    ctx: &DispatchContext<'_>,
    query: &str,
    filters: &BasicSearchFilters,
    page: &Pagination,
    query_embedding: Option<&[f32]>,
    cancel: &CancellationToken,
) -> Result<AutoResult> {
    let embeddings_available = ctx.vector_store.is_some_and(|s| !s.is_empty()) && query_embedding.is_some();
    let (mut method, mut reason) = select_auto(query, embeddings_available, |token| ctx.entity_index.word_index.contains_key(token));
    if method == Method::Vector && !embeddings_available {
        method = Method::Ranked;
        reason = "embeddings unavailable, falling back to ranked search".to_string();
    }
    let estimates = estimate_costs(ctx.view.entities.len());

    let start = Instant::now();
    let outcome = match method {
        Method::Basic => DispatchOutcome::Basic(dispatch_basic(ctx, query, filters, page)),
        Method::Ranked => DispatchOutcome::Ranked(dispatch_ranked(ctx, query)?),
        Method::Boolean => DispatchOutcome::Boolean(dispatch_boolean(ctx, query)?),
        Method::Fuzzy => DispatchOutcome::Fuzzy(dispatch_fuzzy(ctx, query, page.limit.max(1), cancel).await?),
        Method::Vector => {
            let embedding = query_embedding.expect("embeddings_available implies query_embedding is Some");
            DispatchOutcome::Vector(dispatch_vector(ctx, embedding, page.limit.max(1), None)?)
        }
        Method::Hybrid => DispatchOutcome::Hybrid(dispatch_hybrid(ctx, query, query_embedding, page.limit.max(1))?),
    };
    let elapsed = start.elapsed();

    Ok(AutoResult { method, reason, estimates, outcome, elapsed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_core::Entity;

    fn sample_ctx() -> (GraphView, EntityIndex, TfIdfIndex) {
        let mut view = GraphView::new();
        view.entities.insert("Alice".into(), Entity::new("Alice", "person", vec!["Engineer".into()]));
        view.entities.insert("Bob".into(), Entity::new("Bob", "person", vec!["Manager".into()]));
        let entity_index = EntityIndex::rebuild(&view);
        let mut tfidf = TfIdfIndex::new();
        for e in view.entities.values() {
            tfidf.add_document(&e.name, &e.entity_type, &e.observations);
        }
        (view, entity_index, tfidf)
    }

    #[test]
    fn boolean_operators_select_boolean_method() {
        let (method, _) = select_auto("type:person AND name:alice", false, |_| false);
        assert_eq!(method, Method::Boolean);
    }

    #[test]
    fn short_single_token_selects_fuzzy() {
        let (method, _) = select_auto("alce", false, |_| false);
        assert_eq!(method, Method::Fuzzy);
    }

    #[test]
    fn multi_term_without_embeddings_selects_ranked() {
        let (method, _) = select_auto("senior backend engineer", false, |_| false);
        assert_eq!(method, Method::Ranked);
    }

    #[test]
    fn multi_term_with_embeddings_prefers_vector() {
        let (method, _) = select_auto("senior backend engineer", true, |_| false);
        assert_eq!(method, Method::Vector);
    }

    #[test]
    fn short_plain_query_known_in_corpus_selects_basic() {
        let (method, _) = select_auto("Acme", false, |token| token == "acme");
        assert_eq!(method, Method::Basic);
    }

    #[tokio::test]
    async fn auto_falls_back_to_ranked_without_embeddings() {
        let (view, entity_index, tfidf) = sample_ctx();
        let ctx = DispatchContext {
            view: &view,
            entity_index: &entity_index,
            tfidf: &tfidf,
            vector_store: None,
            bm25: Bm25Config::default(),
            fuzzy_threshold: 0.7,
            hybrid_weights: HybridWeightsConfig::default(),
            max_limit: 100,
        };
        let cancel = CancellationToken::new();
        let result = dispatch_auto(&ctx, "senior backend engineer", &BasicSearchFilters::default(), &Pagination { offset: 0, limit: 10 }, None, &cancel)
            .await
            .unwrap();
        assert_eq!(result.method, Method::Ranked);
        assert_eq!(result.estimates.len(), 6);
    }
}
