//! Optional vector store (spec §4.F): entity name → fixed-dimension dense
//! embedding, with cosine-similarity top-k.

use kgraph_core::{Error, Result};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct VectorStore {
    dimensions: usize,
    vectors: FxHashMap<String, Vec<f32>>,
}

impl VectorStore {
    pub fn new(dimensions: usize) -> Self {
        VectorStore { dimensions, vectors: FxHashMap::default() }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn upsert(&mut self, name: &str, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(Error::validation(format!(
                "embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                vector.len()
            )));
        }
        self.vectors.insert(name.to_string(), vector);
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Option<Vec<f32>> {
        self.vectors.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&[f32]> {
        self.vectors.get(name).map(|v| v.as_slice())
    }

    /// Top-k by cosine similarity to `query`, optionally filtered to a
    /// minimum score. Degrades to an empty result (not an error) if the
    /// store has no vectors — the dispatcher is responsible for treating
    /// that as "semantic unavailable" and redistributing weights (§4.J).
    pub fn top_k(&self, query: &[f32], k: usize, min_score: Option<f32>) -> Result<Vec<(String, f32)>> {
        if query.len() != self.dimensions {
            return Err(Error::validation(format!(
                "query embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                query.len()
            )));
        }
        let mut scored: Vec<(String, f32)> = self
            .vectors
            .iter()
            .filter_map(|(name, vec)| {
                let score = cosine_similarity(query, vec);
                match min_score {
                    Some(min) if score < min => None,
                    _ => Some((name.clone(), score)),
                }
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
