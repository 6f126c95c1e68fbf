//! TF-IDF / BM25 statistics engine (spec §4.E).
//!
//! Maintains per-document term frequencies, document length, and corpus
//! document frequency, with incremental add/remove/update so a single
//! mutation only touches the terms that actually changed.

use kgraph_core::config::Bm25Config;
use kgraph_core::{Error, Result};
use rustc_hash::FxHashMap;

use crate::tokenize::{tokenize_entity_text, unique};

#[derive(Debug, Clone, Default)]
struct DocStats {
    term_freq: FxHashMap<String, usize>,
    length: usize,
}

/// Ranked lexical statistics over the current corpus. Built empty; callers
/// (normally the event-subscriber wiring in `kgraph-concurrency`) call
/// `add_document`/`remove_document`/`update_document` as the store mutates.
#[derive(Debug, Clone, Default)]
pub struct TfIdfIndex {
    docs: FxHashMap<String, DocStats>,
    document_frequency: FxHashMap<String, usize>,
    total_length: usize,
    ready: bool,
}

impl TfIdfIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn document_count(&self) -> usize {
        self.docs.len()
    }

    fn average_doc_length(&self) -> f64 {
        if self.docs.is_empty() {
            0.0
        } else {
            self.total_length as f64 / self.docs.len() as f64
        }
    }

    /// Indexes (or re-indexes, if `name` is already present) one entity's text.
    pub fn add_document(&mut self, name: &str, entity_type: &str, observations: &[String]) {
        if self.docs.contains_key(name) {
            self.remove_document(name);
        }
        let tokens = tokenize_entity_text(name, entity_type, observations);
        let mut term_freq = FxHashMap::default();
        for t in &tokens {
            *term_freq.entry(t.clone()).or_insert(0) += 1;
        }
        for term in term_freq.keys() {
            *self.document_frequency.entry(term.clone()).or_insert(0) += 1;
        }
        self.total_length += tokens.len();
        self.docs.insert(name.to_string(), DocStats { term_freq, length: tokens.len() });
        self.ready = true;
    }

    pub fn remove_document(&mut self, name: &str) {
        let Some(stats) = self.docs.remove(name) else { return };
        self.total_length -= stats.length;
        for term in stats.term_freq.keys() {
            if let Some(df) = self.document_frequency.get_mut(term) {
                *df -= 1;
                if *df == 0 {
                    self.document_frequency.remove(term);
                }
            }
        }
    }

    /// Applies only the token-set delta between `old_observations` and the
    /// entity's current text, rather than a full remove+add.
    pub fn update_document(
        &mut self,
        name: &str,
        entity_type: &str,
        old_observations: &[String],
        new_observations: &[String],
    ) {
        let old_tokens = unique(&tokenize_entity_text(name, entity_type, old_observations));
        let new_tokens = unique(&tokenize_entity_text(name, entity_type, new_observations));
        if old_tokens == new_tokens && self.docs.contains_key(name) {
            return;
        }
        self.add_document(name, entity_type, new_observations);
    }

    fn idf(&self, term: &str) -> f64 {
        let n = self.docs.len() as f64;
        let df = *self.document_frequency.get(term).unwrap_or(&0) as f64;
        if df == 0.0 {
            0.0
        } else {
            (1.0 + (n - df + 0.5) / (df + 0.5)).ln().max(0.0)
        }
    }

    /// Cosine similarity over TF-IDF vectors, restricted to query terms.
    pub fn score_tfidf(&self, query: &str) -> Result<Vec<(String, f64)>> {
        if !self.ready && !self.docs.is_empty() {
            return Err(Error::IndexNotReady { index: "tfidf".to_string() });
        }
        let query_tokens = crate::tokenize::tokenize(query);
        if self.docs.is_empty() || query_tokens.is_empty() {
            return Ok(Vec::new());
        }
        let query_terms = unique(&query_tokens);
        let mut scores: Vec<(String, f64)> = self
            .docs
            .iter()
            .filter_map(|(name, stats)| {
                let mut score = 0.0;
                for term in &query_terms {
                    let tf = *stats.term_freq.get(term).unwrap_or(&0) as f64;
                    if tf > 0.0 {
                        score += tf * self.idf(term);
                    }
                }
                (score > 0.0).then_some((name.clone(), score))
            })
            .collect();
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scores)
    }

    /// BM25 scoring with the given (k1, b); empty corpora yield an empty list.
    pub fn score_bm25(&self, query: &str, cfg: &Bm25Config) -> Result<Vec<(String, f64)>> {
        if !self.ready && !self.docs.is_empty() {
            return Err(Error::IndexNotReady { index: "tfidf".to_string() });
        }
        let query_tokens = crate::tokenize::tokenize(query);
        if self.docs.is_empty() || query_tokens.is_empty() {
            return Ok(Vec::new());
        }
        let query_terms = unique(&query_tokens);
        let avg_len = self.average_doc_length();
        let mut scores: Vec<(String, f64)> = self
            .docs
            .iter()
            .filter_map(|(name, stats)| {
                let mut score = 0.0;
                for term in &query_terms {
                    let tf = *stats.term_freq.get(term).unwrap_or(&0) as f64;
                    if tf == 0.0 {
                        continue;
                    }
                    let idf = self.idf(term);
                    let denom = tf + cfg.k1 * (1.0 - cfg.b + cfg.b * stats.length as f64 / avg_len.max(1.0));
                    score += idf * (tf * (cfg.k1 + 1.0)) / denom;
                }
                (score > 0.0).then_some((name.clone(), score))
            })
            .collect();
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_corpus_returns_empty_ranked_list() {
        let idx = TfIdfIndex::new();
        assert!(idx.score_tfidf("anything").unwrap().is_empty());
        assert!(idx.score_bm25("anything", &Bm25Config::default()).unwrap().is_empty());
    }

    #[test]
    fn document_containing_term_outranks_one_without() {
        let mut idx = TfIdfIndex::new();
        idx.add_document("Alice", "person", &["Developer".into()]);
        idx.add_document("Bob", "person", &["Manager".into()]);
        let ranked = idx.score_bm25("developer", &Bm25Config::default()).unwrap();
        assert_eq!(ranked[0].0, "Alice");
    }

    #[test]
    fn remove_document_clears_exhausted_terms() {
        let mut idx = TfIdfIndex::new();
        idx.add_document("Alice", "person", &["Unique".into()]);
        idx.remove_document("Alice");
        assert!(idx.document_frequency.get("unique").is_none());
    }

    #[test]
    fn update_document_applies_only_delta() {
        let mut idx = TfIdfIndex::new();
        idx.add_document("Alice", "person", &["Developer".into()]);
        idx.update_document("Alice", "person", &["Developer".into()], &["Developer".into(), "Lead".into()]);
        let ranked = idx.score_bm25("lead", &Bm25Config::default()).unwrap();
        assert_eq!(ranked[0].0, "Alice");
    }
}
