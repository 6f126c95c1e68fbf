//! `KnowledgeGraph`: the facade wiring storage, indexes, search, traversal,
//! transactions, and the scheduler into one embeddable engine. Every public
//! method here is a thin composition of the collaborator crates; the actual
//! algorithms live where the grounding ledger says they do.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use kgraph_concurrency::{query_key, BatchBuilder, CacheFabric, CommitReport, EventBus, IndexCatalog, Transaction, TransactionManager};
use kgraph_core::config::EngineConfig;
use kgraph_core::{CancellationToken, Entity, Relation, Result};
use kgraph_graph::{
    all_paths, betweenness_centrality, bfs, connected_components, degree_centrality, dfs, neighbours, pagerank,
    shortest_path, top_k, BetweennessOptions, Component, Direction, NeighbourOptions, PageRankOptions, Path as GraphPath,
    TraversalOptions, TraversalResult,
};
use kgraph_index::VectorStore;
use kgraph_search::basic::{BasicSearchFilters, BasicSearchResult, Pagination};
use kgraph_search::boolean::Expr;
use kgraph_search::dispatcher::{self, AutoResult, DispatchContext};
use kgraph_search::fuzzy::FuzzyMatch;
use kgraph_search::hybrid::HybridResult;
use kgraph_storage::{saved_searches, AppendOnlyStore, ImportReport, MergeStrategy, SavedSearch};
use rustc_hash::FxHashSet;

use crate::embedding::{self, EmbeddingProvider};

/// An embeddable knowledge-graph engine over one on-disk log. Cheap to
/// clone-by-`Arc`: every method takes `&self`, matching the single-writer,
/// many-reader discipline of the underlying store.
pub struct KnowledgeGraph {
    store: Arc<AppendOnlyStore>,
    bus: Arc<EventBus>,
    index_catalog: Arc<IndexCatalog>,
    cache: Arc<CacheFabric>,
    vector_store: RwLock<VectorStore>,
    embedding_provider: Box<dyn EmbeddingProvider>,
    config: EngineConfig,
    saved_searches_path: PathBuf,
    saved_searches: RwLock<FxHashMap<String, SavedSearch>>,
}

impl KnowledgeGraph {
    /// Opens (or creates) the log at `path`, replays it, and wires the
    /// index catalog and cache fabric to the event bus so both stay current
    /// as mutations land (spec §2 data flow: store → log → indexes → event
    /// bus → caches).
    pub fn open(path: impl Into<PathBuf>, config: EngineConfig) -> Result<Self> {
        let path = path.into();
        let store = Arc::new(AppendOnlyStore::new(&path, config.compaction));
        let bus = EventBus::new();
        store.set_event_sink(bus.clone());

        let index_catalog = IndexCatalog::new();
        index_catalog.wire(&bus);

        // A transaction commit or import rewrites the view wholesale rather
        // than emitting a per-entity event for every deletion (spec §4.O has
        // no `entity:deleted`), so the catalog's incremental wiring above
        // cannot track those. Resync wholesale on every `graph:saved` —
        // cheap at this scale and exactly correct, same as the explicit
        // rebuild `open` does after `load`.
        let index_catalog_for_save = index_catalog.clone();
        let store_for_save = store.clone();
        bus.subscribe(Some("graph:saved"), move |_event| {
            index_catalog_for_save.rebuild(&store_for_save.view());
        });

        let cache = Arc::new(CacheFabric::new(config.cache_budget));
        let cache_for_bus = cache.clone();
        bus.subscribe(None, move |_event| cache_for_bus.invalidate_all());

        store.load()?;
        index_catalog.rebuild(&store.view());

        let vector_store = RwLock::new(VectorStore::new(config.embedding.dimensions));
        let embedding_provider = embedding::provider_for(config.embedding.provider, config.embedding.dimensions);

        let saved_searches_path = saved_searches::sidecar_path(&path);
        let saved_searches = RwLock::new(saved_searches::load(&saved_searches_path)?);

        Ok(KnowledgeGraph {
            store,
            bus,
            index_catalog,
            cache,
            vector_store,
            embedding_provider,
            config,
            saved_searches_path,
            saved_searches,
        })
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- direct (non-transactional) mutation -----------------------------

    pub fn create_entity(&self, entity: Entity) -> Result<Arc<Entity>> {
        self.store.append_entity(entity)
    }

    pub fn update_entity(&self, name: &str, mutate: impl FnOnce(&mut Entity)) -> Result<Arc<Entity>> {
        self.store.update_entity(name, mutate)
    }

    pub fn create_relation(&self, relation: Relation) -> Result<Arc<Relation>> {
        self.store.append_relation(relation)
    }

    /// Deletion has no single-append form (spec §4.O has no `entity:deleted`
    /// event); it always goes through a one-operation transaction so the
    /// cascade and the diffed events come from the same machinery a batch
    /// delete would use.
    pub fn delete_entity(&self, name: &str) -> Result<CommitReport> {
        let manager = TransactionManager::with_event_bus(&self.store, self.bus.clone());
        let mut txn = manager.begin();
        match txn.delete_entity(name) {
            Ok(_) => Ok(txn.commit()),
            Err(e) => Ok(CommitReport { success: false, operations_executed: 0, error: Some(e.to_string()) }),
        }
    }

    pub fn delete_relation(&self, from: &str, to: &str, relation_type: &str) -> Result<CommitReport> {
        let manager = TransactionManager::with_event_bus(&self.store, self.bus.clone());
        let mut txn = manager.begin();
        match txn.delete_relation(from, to, relation_type) {
            Ok(_) => Ok(txn.commit()),
            Err(e) => Ok(CommitReport { success: false, operations_executed: 0, error: Some(e.to_string()) }),
        }
    }

    pub fn compact(&self) -> Result<()> {
        self.store.compact()
    }

    // ---- transactional mutation (spec §4.L-§4.M) --------------------------

    pub fn begin_transaction(&self) -> Transaction<'_> {
        TransactionManager::with_event_bus(&self.store, self.bus.clone()).begin()
    }

    pub fn batch(&self) -> BatchBuilder {
        BatchBuilder::default()
    }

    /// Executes a builder produced by [`KnowledgeGraph::batch`] as one
    /// transaction against this engine's store and event bus.
    pub fn commit_batch(&self, batch: BatchBuilder) -> CommitReport {
        batch.commit(&TransactionManager::with_event_bus(&self.store, self.bus.clone()))
    }

    // ---- import / export (spec §6 round-trip contract) --------------------

    pub fn export_json(&self) -> Result<String> {
        kgraph_storage::export_json(&self.store.view())
    }

    /// Imports `json` under `strategy`. Reads a mutable copy of the current
    /// view, merges into it, and persists via one full save — the same
    /// all-or-nothing-per-call discipline a transaction uses.
    pub fn import_json(&self, json: &str, strategy: MergeStrategy) -> Result<ImportReport> {
        let mut view = self.store.mutable_view();
        let report = kgraph_storage::import_json(&mut view, json, strategy)?;
        // `save` publishes `graph:saved`, which the index catalog subscribes
        // to for a full rebuild (see `open`).
        self.store.save(view)?;
        Ok(report)
    }

    // ---- saved searches (spec §6 secondary file) ---------------------------

    pub fn save_search(&self, search: SavedSearch) -> Result<()> {
        self.saved_searches.write().insert(search.name.clone(), search);
        saved_searches::save(&self.saved_searches_path, &self.saved_searches.read())
    }

    pub fn list_saved_searches(&self) -> Vec<SavedSearch> {
        self.saved_searches.read().values().cloned().collect()
    }

    pub fn delete_saved_search(&self, name: &str) -> Result<bool> {
        let removed = self.saved_searches.write().remove(name).is_some();
        if removed {
            saved_searches::save(&self.saved_searches_path, &self.saved_searches.read())?;
        }
        Ok(removed)
    }

    // ---- embeddings (spec §4.R collaborator contract) ----------------------

    /// Embeds `text` through the configured provider, falling back to
    /// splitting the batch once on a "batch too large" refusal.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let batch = vec![text.to_string()];
        let mut vectors = embedding::embed_with_fallback(self.embedding_provider.as_ref(), &batch).await?;
        Ok(vectors.pop().unwrap_or_default())
    }

    /// Embeds and indexes one entity's observations into the vector store,
    /// keyed by name.
    pub async fn embed_entity(&self, name: &str) -> Result<()> {
        let view = self.store.view();
        let entity = view.get_entity(name).ok_or_else(|| kgraph_core::Error::EntityNotFound { name: name.to_string() })?;
        let text = format!("{} {} {}", entity.name, entity.entity_type, entity.observations.join(" "));
        let vector = self.embed_query(&text).await?;
        self.vector_store.write().upsert(name, vector)?;
        Ok(())
    }

    fn dispatch_ctx<'a>(&'a self, view: &'a kgraph_storage::GraphView, indexes: &'a kgraph_concurrency::Indexes, vector_store: &'a VectorStore) -> DispatchContext<'a> {
        DispatchContext {
            view,
            entity_index: &indexes.entity,
            tfidf: &indexes.tfidf,
            vector_store: Some(vector_store),
            bm25: self.config.bm25,
            fuzzy_threshold: self.config.default_fuzzy_threshold,
            hybrid_weights: self.config.hybrid_weights,
            max_limit: self.config.max_search_limit,
        }
    }

    // ---- search (spec §4.G-§4.K) --------------------------------------------

    /// Consults the basic-search cache fabric keyed by (query, filters,
    /// pagination) before streaming the view; any graph mutation clears this
    /// entry via the cache's global-invalidation subscriber (spec §4.P).
    pub fn search_basic(&self, query: &str, filters: &BasicSearchFilters, page: &Pagination) -> BasicSearchResult {
        let key = query_key(&[
            query,
            filters.entity_type.as_deref().unwrap_or(""),
            &filters.tags_any.as_deref().unwrap_or(&[]).join(","),
            &filters.min_importance.map(|v| v.to_string()).unwrap_or_default(),
            &filters.max_importance.map(|v| v.to_string()).unwrap_or_default(),
            &filters.created_after.map(|t| t.to_rfc3339()).unwrap_or_default(),
            &filters.created_before.map(|t| t.to_rfc3339()).unwrap_or_default(),
            &page.offset.to_string(),
            &page.limit.to_string(),
        ]);
        if let Some(cached) = self.cache.get("basic", key).and_then(|v| serde_json::from_value(v).ok()) {
            return cached;
        }
        let view = self.store.view();
        let indexes = self.index_catalog.snapshot();
        let result = kgraph_search::basic_search(&view, &indexes.entity, query, filters, page, self.config.max_search_limit);
        if let Ok(value) = serde_json::to_value(&result) {
            self.cache.put("basic", key, value);
        }
        result
    }

    pub fn search_ranked(&self, query: &str) -> Result<Vec<(String, f64)>> {
        let indexes = self.index_catalog.snapshot();
        indexes.tfidf.score_bm25(query, &self.config.bm25)
    }

    pub fn search_boolean(&self, query: &str) -> Result<FxHashSet<String>> {
        let key = query_key(&["boolean", query]);
        if let Some(names) = self.cache.get("boolean", key).and_then(|v| serde_json::from_value::<Vec<String>>(v).ok()) {
            return Ok(names.into_iter().collect());
        }
        let view = self.store.view();
        let result = kgraph_search::boolean::search(query, &view)?;
        if let Ok(value) = serde_json::to_value(&result.iter().cloned().collect::<Vec<_>>()) {
            self.cache.put("boolean", key, value);
        }
        Ok(result)
    }

    pub fn parse_boolean(&self, query: &str) -> Result<Expr> {
        kgraph_search::boolean::parse(query)
    }

    pub async fn search_fuzzy(&self, query: &str, limit: usize, cancel: &CancellationToken) -> Result<Vec<FuzzyMatch>> {
        let key = query_key(&["fuzzy", query, &limit.to_string()]);
        if let Some(matches) = self.cache.get("fuzzy", key).and_then(|v| serde_json::from_value(v).ok()) {
            return Ok(matches);
        }
        let view = self.store.view();
        let matches = kgraph_search::fuzzy::fuzzy_search(&view, query, self.config.default_fuzzy_threshold, limit, cancel).await?;
        if let Ok(value) = serde_json::to_value(&matches) {
            self.cache.put("fuzzy", key, value);
        }
        Ok(matches)
    }

    pub fn search_vector(&self, query_embedding: &[f32], limit: usize, min_score: Option<f32>) -> Result<Vec<(String, f32)>> {
        self.vector_store.read().top_k(query_embedding, limit, min_score)
    }

    pub fn search_hybrid(&self, query: &str, query_embedding: Option<&[f32]>, limit: usize) -> Result<Vec<HybridResult>> {
        let view = self.store.view();
        let indexes = self.index_catalog.snapshot();
        let vector_store = self.vector_store.read();
        let ctx = self.dispatch_ctx(&view, &indexes, &vector_store);
        dispatcher::dispatch_hybrid(&ctx, query, query_embedding, limit)
    }

    /// Runs the dispatcher's auto-selection and executes the chosen method,
    /// computing a query embedding first only if semantic search might be
    /// picked (multi-term query and a non-empty vector store).
    pub async fn search_auto(
        &self,
        query: &str,
        filters: &BasicSearchFilters,
        page: &Pagination,
        cancel: &CancellationToken,
    ) -> Result<AutoResult> {
        let view = self.store.view();
        let indexes = self.index_catalog.snapshot();
        let vector_store = self.vector_store.read();

        let embedding = if !vector_store.is_empty() {
            self.embed_query(query).await.ok()
        } else {
            None
        };

        let ctx = self.dispatch_ctx(&view, &indexes, &vector_store);
        dispatcher::dispatch_auto(&ctx, query, filters, page, embedding.as_deref(), cancel).await
    }

    // ---- traversal (spec §4.N) ----------------------------------------------

    pub fn neighbours(&self, name: &str, opts: &NeighbourOptions) -> Vec<(String, Relation)> {
        let view = self.store.view();
        let indexes = self.index_catalog.snapshot();
        neighbours(&view, &indexes.entity, name, opts)
    }

    pub fn bfs(&self, start: &str, opts: &TraversalOptions) -> TraversalResult {
        let view = self.store.view();
        let indexes = self.index_catalog.snapshot();
        bfs(&view, &indexes.entity, start, opts)
    }

    pub fn dfs(&self, start: &str, opts: &TraversalOptions) -> TraversalResult {
        let view = self.store.view();
        let indexes = self.index_catalog.snapshot();
        dfs(&view, &indexes.entity, start, opts)
    }

    pub fn shortest_path(&self, a: &str, b: &str, opts: &TraversalOptions) -> Option<GraphPath> {
        let view = self.store.view();
        let indexes = self.index_catalog.snapshot();
        shortest_path(&view, &indexes.entity, a, b, opts)
    }

    pub fn all_paths(&self, a: &str, b: &str, max_depth: usize, opts: &TraversalOptions, cancel: &CancellationToken) -> Result<Vec<GraphPath>> {
        let view = self.store.view();
        let indexes = self.index_catalog.snapshot();
        all_paths(&view, &indexes.entity, a, b, max_depth, opts, cancel)
    }

    pub fn connected_components(&self) -> Vec<Component> {
        let view = self.store.view();
        let indexes = self.index_catalog.snapshot();
        connected_components(&view, &indexes.entity)
    }

    pub fn degree_centrality(&self, direction: Direction, top: usize) -> Vec<(String, f64)> {
        let view = self.store.view();
        let indexes = self.index_catalog.snapshot();
        let scores = degree_centrality(&view, &indexes.entity, direction);
        top_k(&scores, top)
    }

    pub fn betweenness_centrality(
        &self,
        opts: &BetweennessOptions,
        cancel: &CancellationToken,
        progress: impl FnMut(usize, usize),
    ) -> Result<FxHashMap<String, f64>> {
        let view = self.store.view();
        let indexes = self.index_catalog.snapshot();
        betweenness_centrality(&view, &indexes.entity, opts, cancel, progress)
    }

    pub fn pagerank(&self, opts: &PageRankOptions) -> FxHashMap<String, f64> {
        let view = self.store.view();
        let indexes = self.index_catalog.snapshot();
        pagerank(&view, &indexes.entity, opts)
    }
}
