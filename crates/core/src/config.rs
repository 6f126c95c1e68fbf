//! Engine configuration surface (spec §6 "Configuration").
//!
//! `EngineConfig` enumerates every option the core recognises. The loader
//! itself (reading a config file from disk, merging CLI flags) is a
//! collaborator concern per spec §1; this module only defines the shape and
//! the documented defaults, plus a minimal JSON loader and an env-var
//! override helper for the scalar fields.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackendKind {
    AppendOnlyLog,
    SqlBacked,
}

impl Default for StorageBackendKind {
    fn default() -> Self {
        StorageBackendKind::AppendOnlyLog
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    Openai,
    Local,
    None,
    Mock,
}

impl Default for EmbeddingProviderKind {
    fn default() -> Self {
        EmbeddingProviderKind::None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub dimensions: usize,
    pub request_timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig {
            provider: EmbeddingProviderKind::None,
            dimensions: 384,
            request_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Config {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Bm25Config { k1: 1.2, b: 0.75 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionConfig {
    pub min_pending: usize,
    pub fraction_of_entities: f64,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        CompactionConfig {
            min_pending: 100,
            fraction_of_entities: 0.1,
        }
    }
}

impl CompactionConfig {
    /// T = max(min_pending, floor(fraction * entity_count)) (spec §3, property 13).
    pub fn threshold(&self, entity_count: usize) -> usize {
        let frac = ((entity_count as f64) * self.fraction_of_entities).floor() as usize;
        self.min_pending.max(frac)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridWeightsConfig {
    pub semantic: f64,
    pub lexical: f64,
    pub symbolic: f64,
    pub normalise: bool,
    pub min_score: f64,
}

impl Default for HybridWeightsConfig {
    fn default() -> Self {
        HybridWeightsConfig {
            semantic: 0.4,
            lexical: 0.4,
            symbolic: 0.2,
            normalise: true,
            min_score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerPoolKind {
    Thread,
    Async,
}

impl Default for WorkerPoolKind {
    fn default() -> Self {
        WorkerPoolKind::Async
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    pub min_workers: usize,
    pub max_workers: usize,
    pub kind: WorkerPoolKind,
    pub idle_timeout_ms: u64,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        WorkerPoolConfig {
            min_workers: 1,
            max_workers: 4,
            kind: WorkerPoolKind::Async,
            idle_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheBudgetConfig {
    pub max_entries: usize,
    pub ttl_ms: u64,
}

impl Default for CacheBudgetConfig {
    fn default() -> Self {
        CacheBudgetConfig {
            max_entries: 256,
            ttl_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub quality: u8,
    pub min_size_to_compress: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        CompressionConfig {
            enabled: false,
            quality: 6,
            min_size_to_compress: 4096,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub storage_backend: StorageBackendKind,
    pub embedding: EmbeddingConfig,
    pub default_search_limit: usize,
    pub max_search_limit: usize,
    pub bm25: Bm25Config,
    pub default_fuzzy_threshold: f64,
    pub compaction: CompactionConfig,
    pub hybrid_weights: HybridWeightsConfig,
    pub worker_pool: WorkerPoolConfig,
    pub cache_budget: CacheBudgetConfig,
    pub compression: CompressionConfig,
    pub backup_dir: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            storage_backend: StorageBackendKind::default(),
            embedding: EmbeddingConfig::default(),
            default_search_limit: 100,
            max_search_limit: crate::limits::DEFAULT_MAX_SEARCH_LIMIT,
            bm25: Bm25Config::default(),
            default_fuzzy_threshold: 0.7,
            compaction: CompactionConfig::default(),
            hybrid_weights: HybridWeightsConfig::default(),
            worker_pool: WorkerPoolConfig::default(),
            cache_budget: CacheBudgetConfig::default(),
            compression: CompressionConfig::default(),
            backup_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(s: &str) -> crate::error::Result<Self> {
        serde_json::from_str(s).map_err(|e| crate::error::Error::InvalidConfig {
            message: e.to_string(),
        })
    }

    /// Overrides a handful of scalar fields from `KGRAPH_*` environment
    /// variables, for the common operator knobs. Anything beyond these
    /// scalars is a loader concern outside this crate's scope.
    pub fn merge_env(mut self) -> Self {
        if let Ok(v) = std::env::var("KGRAPH_DEFAULT_SEARCH_LIMIT") {
            if let Ok(n) = v.parse() {
                self.default_search_limit = n;
            }
        }
        if let Ok(v) = std::env::var("KGRAPH_MAX_SEARCH_LIMIT") {
            if let Ok(n) = v.parse() {
                self.max_search_limit = n;
            }
        }
        if let Ok(v) = std::env::var("KGRAPH_FUZZY_THRESHOLD") {
            if let Ok(n) = v.parse() {
                self.default_fuzzy_threshold = n;
            }
        }
        self
    }
}
