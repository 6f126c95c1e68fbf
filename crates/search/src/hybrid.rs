//! Hybrid scorer (spec §4.J): fuses up to three per-entity score layers
//! (semantic, lexical, symbolic) under min-max normalisation and
//! weight redistribution over whichever layers are actually present.

use kgraph_core::config::HybridWeightsConfig;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Semantic,
    Lexical,
    Symbolic,
}

/// One entity's fused result: the combined score, which layers it matched
/// in, and the pre-normalisation raw score per layer (for explainability).
#[derive(Debug, Clone)]
pub struct HybridResult {
    pub name: String,
    pub combined: f64,
    pub matched_layers: Vec<Layer>,
    pub raw_scores: FxHashMap<Layer, f64>,
}

/// Min-max normalises `scores` into `[0,1]`. All-equal-and-nonzero maps
/// every score to `1.0`; all-zero is left at `0.0` (spec §4.J step 1).
fn min_max_normalise(scores: &FxHashMap<String, f64>) -> FxHashMap<String, f64> {
    if scores.is_empty() {
        return FxHashMap::default();
    }
    let min = scores.values().cloned().fold(f64::INFINITY, f64::min);
    let max = scores.values().cloned().fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return scores.iter().map(|(k, &v)| (k.clone(), if v == 0.0 { 0.0 } else { 1.0 })).collect();
    }
    scores.iter().map(|(k, &v)| (k.clone(), (v - min) / (max - min))).collect()
}

/// Fuses semantic/lexical/symbolic score maps into a ranked, explainable
/// result list. Any of the three inputs may be empty, meaning that layer
/// did not run (e.g. no embeddings configured); weights are renormalised
/// over whichever layers are non-empty.
pub fn hybrid_search(
    semantic: &FxHashMap<String, f64>,
    lexical: &FxHashMap<String, f64>,
    symbolic: &FxHashMap<String, f64>,
    weights: &HybridWeightsConfig,
) -> Vec<HybridResult> {
    let norm_semantic = min_max_normalise(semantic);
    let norm_lexical = min_max_normalise(lexical);
    let norm_symbolic = min_max_normalise(symbolic);

    let layers: [(Layer, &FxHashMap<String, f64>, f64); 3] = [
        (Layer::Semantic, &norm_semantic, weights.semantic),
        (Layer::Lexical, &norm_lexical, weights.lexical),
        (Layer::Symbolic, &norm_symbolic, weights.symbolic),
    ];
    let active: Vec<(Layer, &FxHashMap<String, f64>, f64)> =
        layers.into_iter().filter(|(_, scores, _)| !scores.is_empty()).collect();
    let weight_sum: f64 = active.iter().map(|(_, _, w)| w).sum();

    let mut all_names: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
    for (_, scores, _) in &active {
        all_names.extend(scores.keys().cloned());
    }

    let mut results = Vec::new();
    for name in all_names {
        let mut combined = 0.0;
        let mut matched_layers = Vec::new();
        let mut raw_scores = FxHashMap::default();
        for (layer, norm_scores, weight) in &active {
            if let Some(&score) = norm_scores.get(&name) {
                let effective_weight = if weight_sum > 0.0 { weight / weight_sum } else { 0.0 };
                combined += effective_weight * score;
                matched_layers.push(*layer);
                let raw = match layer {
                    Layer::Semantic => semantic.get(&name),
                    Layer::Lexical => lexical.get(&name),
                    Layer::Symbolic => symbolic.get(&name),
                };
                if let Some(&r) = raw {
                    raw_scores.insert(*layer, r);
                }
            }
        }
        if !matched_layers.is_empty() {
            results.push(HybridResult { name, combined, matched_layers, raw_scores });
        }
    }

    results.retain(|r| r.combined >= weights.min_score);
    results.sort_by(|a, b| b.combined.partial_cmp(&a.combined).unwrap_or(std::cmp::Ordering::Equal));
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, f64)]) -> FxHashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn single_active_layer_gets_full_weight() {
        let lexical = map(&[("Alice", 2.0), ("Bob", 1.0)]);
        let results = hybrid_search(&FxHashMap::default(), &lexical, &FxHashMap::default(), &HybridWeightsConfig::default());
        assert_eq!(results[0].name, "Alice");
        assert!((results[0].combined - 1.0).abs() < 1e-9);
    }

    #[test]
    fn entity_in_two_layers_outranks_one_in_a_single_layer() {
        let semantic = map(&[("Alice", 1.0), ("Bob", 0.1)]);
        let lexical = map(&[("Alice", 1.0)]);
        let results = hybrid_search(&semantic, &lexical, &FxHashMap::default(), &HybridWeightsConfig::default());
        assert_eq!(results[0].name, "Alice");
        assert_eq!(results[0].matched_layers.len(), 2);
    }

    #[test]
    fn all_zero_layer_stays_zero_not_one() {
        let lexical = map(&[("Alice", 0.0), ("Bob", 0.0)]);
        let results = hybrid_search(&FxHashMap::default(), &lexical, &FxHashMap::default(), &HybridWeightsConfig::default());
        assert!(results.iter().all(|r| r.combined == 0.0));
    }

    #[test]
    fn min_score_drops_low_combined_results() {
        let lexical = map(&[("Alice", 1.0), ("Bob", 0.0)]);
        let weights = HybridWeightsConfig { min_score: 0.5, ..Default::default() };
        let results = hybrid_search(&FxHashMap::default(), &lexical, &FxHashMap::default(), &weights);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Alice");
    }

    #[test]
    fn empty_inputs_yield_empty_results() {
        let results = hybrid_search(&FxHashMap::default(), &FxHashMap::default(), &FxHashMap::default(), &HybridWeightsConfig::default());
        assert!(results.is_empty());
    }
}
