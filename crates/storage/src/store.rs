//! The append-only store (spec §4.C): owns the on-disk log and the cached
//! in-memory view, mediates compaction, and serialises all mutations behind
//! a single mutex.

use crate::codec::Record;
use crate::view::GraphView;
use crate::writer;
use kgraph_core::config::CompactionConfig;
use kgraph_core::{Entity, Error, Event, EventSink, Relation, Result};
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Default)]
struct MutationState {
    pending_appends: usize,
}

/// Durable, mutex-guarded, append-only store.
///
/// Reads never take the mutation lock: they read the currently published
/// [`GraphView`] snapshot (an `Arc` clone, O(1)). Writes take the mutation
/// lock, append to the log, then publish a new snapshot.
pub struct AppendOnlyStore {
    path: PathBuf,
    mutation_lock: Mutex<MutationState>,
    view: RwLock<Arc<GraphView>>,
    event_sink: RwLock<Option<Arc<dyn EventSink>>>,
    compaction_cfg: CompactionConfig,
}

impl AppendOnlyStore {
    pub fn new(path: impl Into<PathBuf>, compaction_cfg: CompactionConfig) -> Self {
        AppendOnlyStore {
            path: path.into(),
            mutation_lock: Mutex::new(MutationState::default()),
            view: RwLock::new(Arc::new(GraphView::new())),
            event_sink: RwLock::new(None),
            compaction_cfg,
        }
    }

    pub fn set_event_sink(&self, sink: Arc<dyn EventSink>) {
        *self.event_sink.write() = Some(sink);
    }

    fn publish(&self, event: Event) {
        if let Some(sink) = self.event_sink.read().as_ref() {
            sink.publish(event);
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Replays the file once, deduplicating by key (latest wins). A missing
    /// file yields an empty view. A malformed line is fatal unless it is the
    /// trailing line, in which case it is treated as a torn write and
    /// discarded (spec §4.B/§6).
    pub fn load(&self) -> Result<()> {
        let _guard = self.mutation_lock.lock();
        let content = writer::read_to_string_tolerant(&self.path)?;
        let lines: Vec<&str> = content.lines().collect();

        let mut next = GraphView::new();
        for (i, line) in lines.iter().enumerate() {
            match Record::parse_line(line) {
                Ok(None) => continue,
                Ok(Some(Record::Entity(e))) => {
                    next.entities.insert(e.name.clone(), e);
                }
                Ok(Some(Record::Relation(r))) => {
                    next.relations.insert(r.key(), r);
                }
                Err(err) => {
                    if i + 1 == lines.len() {
                        tracing::warn!(line = i, error = %err, "discarding unparseable trailing log line");
                        break;
                    }
                    return Err(Error::StorageCorrupted {
                        message: format!("malformed record at line {}: {err}", i + 1),
                    });
                }
            }
        }

        let entity_count = next.entity_count();
        let relation_count = next.relation_count();
        *self.view.write() = Arc::new(next);
        self.mutation_lock.lock().pending_appends = 0;

        self.publish(Event::GraphLoaded { entity_count, relation_count });
        Ok(())
    }

    /// O(1) shared reference to the cached view. Callers must treat the
    /// result as immutable.
    pub fn view(&self) -> Arc<GraphView> {
        self.view.read().clone()
    }

    /// A deep copy of the cached view, for staging in-place mutation ahead
    /// of a full [`AppendOnlyStore::save`].
    pub fn mutable_view(&self) -> GraphView {
        (*self.view.read()).clone()
    }

    /// Appends a new entity record and publishes it into the cached view.
    pub fn append_entity(&self, entity: Entity) -> Result<Arc<Entity>> {
        entity.validate()?;
        let guard = self.mutation_lock.lock();
        if let Some(parent) = &entity.parent_id {
            if self.view.read().would_cycle(&entity.name, parent) {
                return Err(Error::CycleDetected { entity: entity.name.clone(), parent: parent.clone() });
            }
        }
        let record = Record::Entity(entity.clone());
        let line = record.to_line().map_err(|e| Error::storage_write(e.to_string()))?;
        writer::append_line(&self.path, &line)?;

        let entity = Arc::new(entity);
        {
            let mut next = (*self.view.read()).clone();
            next.entities.insert(entity.name.clone(), (*entity).clone());
            *self.view.write() = Arc::new(next);
        }
        self.publish(Event::EntityCreated(entity.clone()));
        self.note_append_and_maybe_compact(guard)?;
        Ok(entity)
    }

    /// Appends a relation record and publishes it into the cached view.
    pub fn append_relation(&self, relation: Relation) -> Result<Arc<Relation>> {
        relation.validate()?;
        let guard = self.mutation_lock.lock();
        let record = Record::Relation(relation.clone());
        let line = record.to_line().map_err(|e| Error::storage_write(e.to_string()))?;
        writer::append_line(&self.path, &line)?;

        let relation = Arc::new(relation);
        {
            let mut next = (*self.view.read()).clone();
            next.relations.insert(relation.key(), (*relation).clone());
            *self.view.write() = Arc::new(next);
        }
        self.publish(Event::RelationCreated(relation.clone()));
        self.note_append_and_maybe_compact(guard)?;
        Ok(relation)
    }

    /// Composes and appends a superseding record for an existing entity.
    /// Errors with `EntityNotFound` if the name is unknown (use
    /// `append_entity` for creation).
    pub fn update_entity(&self, name: &str, mutate: impl FnOnce(&mut Entity)) -> Result<Arc<Entity>> {
        let guard = self.mutation_lock.lock();
        let mut updated = {
            let view = self.view.read();
            view.entities
                .get(name)
                .cloned()
                .ok_or_else(|| Error::EntityNotFound { name: name.to_string() })?
        };
        mutate(&mut updated);
        updated.touch();
        updated.validate()?;
        if let Some(parent) = &updated.parent_id {
            if self.view.read().would_cycle(&updated.name, parent) {
                return Err(Error::CycleDetected { entity: updated.name.clone(), parent: parent.clone() });
            }
        }

        let line = Record::Entity(updated.clone())
            .to_line()
            .map_err(|e| Error::storage_write(e.to_string()))?;
        writer::append_line(&self.path, &line)?;

        let updated = Arc::new(updated);
        {
            let mut next = (*self.view.read()).clone();
            next.entities.insert(updated.name.clone(), (*updated).clone());
            *self.view.write() = Arc::new(next);
        }
        self.publish(Event::EntityUpdated(updated.clone()));
        self.note_append_and_maybe_compact(guard)?;
        Ok(updated)
    }

    fn note_append_and_maybe_compact(&self, mut guard: parking_lot::MutexGuard<'_, MutationState>) -> Result<()> {
        guard.pending_appends += 1;
        let entity_count = self.view.read().entity_count();
        let threshold = self.compaction_cfg.threshold(entity_count);
        if guard.pending_appends >= threshold {
            drop(guard);
            self.compact()?;
        }
        Ok(())
    }

    /// Rewrites the log to contain exactly the latest record per key
    /// (spec §3 "Compaction"). Idempotent: compacting twice in a row with no
    /// intervening mutation produces byte-identical output the second time
    /// only up to record ordering (map iteration order is not guaranteed
    /// stable across processes but is deterministic within one).
    pub fn compact(&self) -> Result<()> {
        let _guard = self.mutation_lock.lock();
        let view = self.view.read().clone();
        let bytes = serialize_view(&view)?;
        writer::full_write(&self.path, &bytes)?;
        drop(_guard);
        self.mutation_lock.lock().pending_appends = 0;
        self.publish(Event::GraphSaved {
            entity_count: view.entity_count(),
            relation_count: view.relation_count(),
        });
        Ok(())
    }

    /// Full save: overwrites the log with `graph`, replaces the cache, and
    /// resets the pending-append counter.
    pub fn save(&self, graph: GraphView) -> Result<()> {
        let _guard = self.mutation_lock.lock();
        let bytes = serialize_view(&graph)?;
        writer::full_write(&self.path, &bytes)?;
        let entity_count = graph.entity_count();
        let relation_count = graph.relation_count();
        *self.view.write() = Arc::new(graph);
        drop(_guard);
        self.mutation_lock.lock().pending_appends = 0;
        self.publish(Event::GraphSaved { entity_count, relation_count });
        Ok(())
    }

    pub fn pending_appends(&self) -> usize {
        self.mutation_lock.lock().pending_appends
    }
}

fn serialize_view(view: &GraphView) -> Result<Vec<u8>> {
    let mut lines = Vec::with_capacity(view.entity_count() + view.relation_count());
    for entity in view.entities.values() {
        lines.push(Record::Entity(entity.clone()).to_line().map_err(|e| Error::storage_write(e.to_string()))?);
    }
    for relation in view.relations.values() {
        lines.push(Record::Relation(relation.clone()).to_line().map_err(|e| Error::storage_write(e.to_string()))?);
    }
    Ok(lines.join("\n").into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_core::config::CompactionConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn store(dir: &std::path::Path) -> AppendOnlyStore {
        AppendOnlyStore::new(dir.join("store.jsonl"), CompactionConfig::default())
    }

    #[test]
    fn load_on_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let s = store(dir.path());
        s.load().unwrap();
        assert_eq!(s.view().entity_count(), 0);
    }

    #[test]
    fn append_then_reload_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.jsonl");
        {
            let s = AppendOnlyStore::new(&path, CompactionConfig::default());
            s.load().unwrap();
            s.append_entity(Entity::new("Alice", "person", vec!["Engineer".into()])).unwrap();
            s.append_relation(Relation::new("Alice", "Bob", "knows")).unwrap();
        }
        let s2 = AppendOnlyStore::new(&path, CompactionConfig::default());
        s2.load().unwrap();
        assert_eq!(s2.view().entity_count(), 1);
        assert_eq!(s2.view().relation_count(), 1);
    }

    #[test]
    fn update_entity_requires_existing() {
        let dir = tempdir().unwrap();
        let s = store(dir.path());
        s.load().unwrap();
        let result = s.update_entity("Ghost", |_| {});
        assert!(matches!(result, Err(Error::EntityNotFound { .. })));
    }

    #[test]
    fn update_entity_supersedes_prior_value() {
        let dir = tempdir().unwrap();
        let s = store(dir.path());
        s.load().unwrap();
        s.append_entity(Entity::new("Alice", "person", vec!["Engineer".into()])).unwrap();
        s.update_entity("Alice", |e| e.observations.push("Manager".into())).unwrap();
        let view = s.view();
        let alice = view.get_entity("Alice").unwrap();
        assert_eq!(alice.observations, vec!["Engineer", "Manager"]);
    }

    #[test]
    fn compaction_triggers_after_threshold_appends() {
        let dir = tempdir().unwrap();
        let cfg = CompactionConfig { min_pending: 5, fraction_of_entities: 0.0 };
        let s = AppendOnlyStore::new(dir.path().join("store.jsonl"), cfg);
        s.load().unwrap();
        for i in 0..5 {
            s.append_entity(Entity::new(format!("E{i}"), "t", vec![])).unwrap();
        }
        // compaction should have reset the pending counter
        assert_eq!(s.pending_appends(), 0);
        assert_eq!(s.view().entity_count(), 5);
    }

    #[test]
    fn compaction_is_idempotent() {
        let dir = tempdir().unwrap();
        let s = store(dir.path());
        s.load().unwrap();
        s.append_entity(Entity::new("Alice", "person", vec![])).unwrap();
        s.compact().unwrap();
        let view1 = s.view();
        s.compact().unwrap();
        let view2 = s.view();
        assert_eq!(view1.entity_count(), view2.entity_count());
    }

    #[test]
    fn append_then_compact_preserves_view() {
        let dir = tempdir().unwrap();
        let s = store(dir.path());
        s.load().unwrap();
        s.append_entity(Entity::new("Alice", "person", vec![])).unwrap();
        let before = s.view().entity_count();
        s.compact().unwrap();
        assert_eq!(s.view().entity_count(), before);
    }

    #[test]
    fn update_entity_rejects_a_multi_hop_parent_cycle() {
        let dir = tempdir().unwrap();
        let s = store(dir.path());
        s.load().unwrap();
        s.append_entity(Entity::new("A", "t", vec![])).unwrap();
        s.append_entity(Entity::new("B", "t", vec![]).with_parent("A")).unwrap();
        let err = s.update_entity("A", |e| e.parent_id = Some("B".to_string())).unwrap_err();
        assert!(matches!(err, Error::CycleDetected { .. }));
    }

    #[test]
    fn tolerates_torn_trailing_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.jsonl");
        let good = Record::Entity(Entity::new("Alice", "person", vec![])).to_line().unwrap();
        std::fs::write(&path, format!("{good}\n{{\"type\":\"entity\",\"name\":")).unwrap();
        let s = AppendOnlyStore::new(&path, CompactionConfig::default());
        s.load().unwrap();
        assert_eq!(s.view().entity_count(), 1);
    }

    #[test]
    fn events_are_emitted_on_mutation() {
        let dir = tempdir().unwrap();
        let s = store(dir.path());
        s.load().unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        s.set_event_sink(Arc::new(move |_e: Event| {
            count2.fetch_add(1, Ordering::SeqCst);
        }));
        s.append_entity(Entity::new("Alice", "person", vec![])).unwrap();
        assert!(count.load(Ordering::SeqCst) >= 1);
    }
}
