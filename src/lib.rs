//! # kgraph
//!
//! An embeddable knowledge-graph engine: named entities and directed typed
//! relations, durable append-only persistence, secondary indexes, and a
//! search dispatcher spanning substring, TF-IDF/BM25, boolean, fuzzy, and
//! vector-similarity queries fused under a hybrid scorer.
//!
//! # Quick start
//!
//! ```no_run
//! use kgraph::{Entity, EngineConfig, KnowledgeGraph, Relation};
//!
//! fn main() -> kgraph::Result<()> {
//!     let kg = KnowledgeGraph::open("./graph.jsonl", EngineConfig::default())?;
//!
//!     kg.create_entity(Entity::new("Alice", "person", vec!["Engineer".into()]))?;
//!     kg.create_entity(Entity::new("Bob", "person", vec!["Manager".into()]))?;
//!     kg.create_relation(Relation::new("Alice", "Bob", "knows"))?;
//!
//!     let result = kg.search_basic(
//!         "Alice",
//!         &Default::default(),
//!         &kgraph::Pagination { offset: 0, limit: 10 },
//!     );
//!     assert_eq!(result.entities.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! [`KnowledgeGraph`] is the single entry point; it composes the append-only
//! store, secondary indexes, search dispatcher, graph traversal, transaction
//! manager, event bus, and cache fabric. Each of those lives in its own
//! workspace crate (`kgraph-storage`, `kgraph-index`, `kgraph-search`,
//! `kgraph-graph`, `kgraph-concurrency`, `kgraph-scheduler`) which this crate
//! re-exports the public surface of.

pub use kgraph_core::config::{self, EngineConfig};
pub use kgraph_core::{now, CancellationToken, Entity, Error, ErrorCode, Event, Relation, RelationKey, RelationMetadata, Result, Timestamp};

pub use kgraph_concurrency::{BatchBuilder, CacheFabric, CommitReport, EventBus, Transaction, TransactionManager};

pub use kgraph_index::{EntityIndex, IntInvertedIndex, TfIdfIndex, VectorStore};

pub use kgraph_search::basic::{BasicSearchFilters, BasicSearchResult, Pagination};
pub use kgraph_search::boolean::{Expr, Field};
pub use kgraph_search::dispatcher::{AutoResult, CostEstimate, DispatchOutcome, Method};
pub use kgraph_search::fuzzy::FuzzyMatch;
pub use kgraph_search::hybrid::{HybridResult, Layer};

pub use kgraph_graph::{
    BetweennessOptions, Component, Direction, NeighbourOptions, PageRankOptions, Path, TraversalOptions, TraversalResult,
};

pub use kgraph_storage::{ImportReport, MergeStrategy, SavedSearch};

pub use kgraph_engine::{EmbeddingProvider, KnowledgeGraph};
