//! Keeps the secondary indexes (spec §4.D) and lexical statistics (spec
//! §4.E) in lockstep with the store by subscribing to its mutation events —
//! the same fan-out the cache invalidator uses.
//!
//! Entity deletion has no dedicated event (spec §4.O only defines
//! `entity:created`/`entity:updated`, never `entity:deleted` — deletion
//! happens via a transaction's full rewrite), so the catalog keeps a shadow
//! copy of each indexed entity to diff against on update and to know what
//! to drop after a rewrite. [`IndexCatalog::rebuild`] resyncs the shadow
//! wholesale after `graph:loaded`/`graph:saved`, where that's cheap and
//! exactly correct.

use kgraph_core::{Entity, Event};
use kgraph_index::{EntityIndex, TfIdfIndex};
use kgraph_storage::GraphView;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::event_bus::EventBus;

/// The live index pair, versioned behind one swappable `Arc` — the same
/// read-side pattern `AppendOnlyStore` uses for its cached view: readers
/// clone the `Arc` (O(1)), writers replace it wholesale.
#[derive(Clone, Default)]
pub struct Indexes {
    pub entity: EntityIndex,
    pub tfidf: TfIdfIndex,
}

pub struct IndexCatalog {
    indexes: RwLock<Arc<Indexes>>,
    shadow: RwLock<FxHashMap<String, Entity>>,
}

impl IndexCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(IndexCatalog { indexes: RwLock::new(Arc::new(Indexes::default())), shadow: RwLock::new(FxHashMap::default()) })
    }

    pub fn snapshot(&self) -> Arc<Indexes> {
        self.indexes.read().clone()
    }

    /// Recomputes both indexes wholesale from `view`. The right tool right
    /// after `load`/import/full-transaction-rewrite, where replaying
    /// per-entity events would mean O(n) events instead of one O(n) rebuild.
    pub fn rebuild(&self, view: &GraphView) {
        let entity = EntityIndex::rebuild(view);
        let mut tfidf = TfIdfIndex::new();
        for e in view.entities.values() {
            tfidf.add_document(&e.name, &e.entity_type, &e.observations);
        }
        *self.indexes.write() = Arc::new(Indexes { entity, tfidf });
        *self.shadow.write() = view.entities.clone();
    }

    /// Subscribes this catalog to `bus` for incremental per-event updates.
    /// Callers must still call [`IndexCatalog::rebuild`] once after a
    /// `graph:loaded`/`graph:saved` event — the event itself only carries
    /// counts, not the view to rebuild from.
    pub fn wire(self: &Arc<Self>, bus: &EventBus) {
        let catalog = self.clone();
        bus.subscribe(None, move |event| catalog.apply_event(event));
    }

    fn apply_event(&self, event: &Event) {
        match event {
            Event::EntityCreated(entity) => self.index_new_entity(entity),
            Event::EntityUpdated(entity) => self.reindex_updated_entity(entity),
            Event::RelationCreated(relation) => {
                let mut next = (*self.indexes.read()).clone();
                next.entity.index_relation(relation);
                *self.indexes.write() = Arc::new(next);
            }
            Event::RelationDeleted(relation) => {
                let mut next = (*self.indexes.read()).clone();
                next.entity.deindex_relation(relation);
                *self.indexes.write() = Arc::new(next);
            }
            Event::GraphLoaded { .. } | Event::GraphSaved { .. } => {
                // Caller resyncs explicitly via `rebuild`; see doc comment.
            }
        }
    }

    fn index_new_entity(&self, entity: &Entity) {
        let mut next = (*self.indexes.read()).clone();
        next.entity.index_entity(entity);
        next.tfidf.add_document(&entity.name, &entity.entity_type, &entity.observations);
        *self.indexes.write() = Arc::new(next);
        self.shadow.write().insert(entity.name.clone(), entity.clone());
    }

    fn reindex_updated_entity(&self, entity: &Entity) {
        let mut shadow = self.shadow.write();
        let mut next = (*self.indexes.read()).clone();
        match shadow.get(&entity.name) {
            Some(old) => {
                next.entity.deindex_entity(old);
                next.entity.index_entity(entity);
                next.tfidf.update_document(&entity.name, &entity.entity_type, &old.observations, &entity.observations);
            }
            None => {
                next.entity.index_entity(entity);
                next.tfidf.add_document(&entity.name, &entity.entity_type, &entity.observations);
            }
        }
        shadow.insert(entity.name.clone(), entity.clone());
        *self.indexes.write() = Arc::new(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_core::Entity;

    #[test]
    fn created_entity_is_searchable_by_type() {
        let catalog = IndexCatalog::new();
        catalog.apply_event(&Event::EntityCreated(Arc::new(Entity::new("Alice", "person", vec!["Engineer".into()]))));
        let idx = catalog.snapshot();
        assert!(idx.entity.names_for_type("person").contains("Alice"));
        assert!(idx.tfidf.is_ready());
    }

    #[test]
    fn updated_entity_replaces_stale_word_postings() {
        let catalog = IndexCatalog::new();
        catalog.apply_event(&Event::EntityCreated(Arc::new(Entity::new("Alice", "person", vec!["Developer".into()]))));
        let mut updated = Entity::new("Alice", "person", vec!["Manager".into()]);
        updated.touch();
        catalog.apply_event(&Event::EntityUpdated(Arc::new(updated)));
        let idx = catalog.snapshot();
        assert!(idx.entity.names_matching_any(&["developer".to_string()]).is_empty());
        assert!(idx.entity.names_matching_any(&["manager".to_string()]).contains("Alice"));
    }

    #[test]
    fn rebuild_resets_shadow_and_indexes() {
        let catalog = IndexCatalog::new();
        let mut view = GraphView::new();
        view.entities.insert("Alice".into(), Entity::new("Alice", "person", vec![]));
        catalog.rebuild(&view);
        assert_eq!(catalog.snapshot().entity.names_for_type("person").len(), 1);
    }
}
