//! Transaction manager: idle → open → (committed | rolled-back).
//!
//! `begin` snapshots the current view; create/update/delete calls stage
//! changes against a mutable working copy without touching disk. `commit`
//! validates the whole batch is internally consistent, persists it with one
//! full save, and republishes granular events for the diff
//! against the snapshot — the store's own `append_*` events don't fire here
//! since a transaction bypasses them in favour of one atomic rewrite.
//! `rollback` (or simply dropping an open transaction) discards the staged
//! copy; nothing reaches disk.

use kgraph_core::{Entity, Error, Event, Relation, Result};
use kgraph_storage::{AppendOnlyStore, GraphView};
use std::sync::Arc;

use crate::event_bus::EventBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Committed,
    RolledBack,
}

/// The outcome of a transaction commit: `{success, operationsExecuted, error}`.
#[derive(Debug, Clone)]
pub struct CommitReport {
    pub success: bool,
    pub operations_executed: usize,
    pub error: Option<String>,
}

/// A staged set of mutations against one snapshot of the graph. Not `Send`
/// across an await point by design — transactions are short-lived and
/// synchronous, matching the store's own single-mutex discipline.
pub struct Transaction<'a> {
    store: &'a AppendOnlyStore,
    bus: Option<Arc<EventBus>>,
    snapshot: GraphView,
    staged: GraphView,
    operations: usize,
    state: State,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(store: &'a AppendOnlyStore, bus: Option<Arc<EventBus>>) -> Self {
        let snapshot = store.mutable_view();
        let staged = snapshot.clone();
        Transaction { store, bus, snapshot, staged, operations: 0, state: State::Open }
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            State::Open => Ok(()),
            _ => Err(Error::InvalidQuery { message: "transaction is no longer open".to_string() }),
        }
    }

    pub fn create_entity(&mut self, entity: Entity) -> Result<&mut Self> {
        self.ensure_open()?;
        entity.validate()?;
        if self.staged.entities.contains_key(&entity.name) {
            return Err(Error::DuplicateEntity { name: entity.name });
        }
        if let Some(parent) = &entity.parent_id {
            if self.staged.would_cycle(&entity.name, parent) {
                return Err(Error::CycleDetected { entity: entity.name.clone(), parent: parent.clone() });
            }
        }
        self.staged.entities.insert(entity.name.clone(), entity);
        self.operations += 1;
        Ok(self)
    }

    pub fn update_entity(&mut self, name: &str, mutate: impl FnOnce(&mut Entity)) -> Result<&mut Self> {
        self.ensure_open()?;
        let entity = self
            .staged
            .entities
            .get_mut(name)
            .ok_or_else(|| Error::EntityNotFound { name: name.to_string() })?;
        mutate(entity);
        entity.touch();
        entity.validate()?;
        if let Some(parent) = entity.parent_id.clone() {
            if self.staged.would_cycle(name, &parent) {
                return Err(Error::CycleDetected { entity: name.to_string(), parent });
            }
        }
        self.operations += 1;
        Ok(self)
    }

    /// Removes the entity and cascades to every relation touching it:
    /// deleting an entity deletes every relation that references it.
    pub fn delete_entity(&mut self, name: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        let (removed, _) = self.staged.remove_entity_cascade(name);
        if removed.is_none() {
            return Err(Error::EntityNotFound { name: name.to_string() });
        }
        self.operations += 1;
        Ok(self)
    }

    pub fn create_relation(&mut self, relation: Relation) -> Result<&mut Self> {
        self.ensure_open()?;
        relation.validate()?;
        if !self.staged.entities.contains_key(&relation.from) {
            return Err(Error::EntityNotFound { name: relation.from.clone() });
        }
        if !self.staged.entities.contains_key(&relation.to) {
            return Err(Error::EntityNotFound { name: relation.to.clone() });
        }
        let key = relation.key();
        if self.staged.relations.contains_key(&key) {
            return Err(Error::DuplicateRelation {
                from: relation.from,
                to: relation.to,
                relation_type: relation.relation_type,
            });
        }
        self.staged.relations.insert(key, relation);
        self.operations += 1;
        Ok(self)
    }

    pub fn delete_relation(&mut self, from: &str, to: &str, relation_type: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        let key = (from.to_string(), to.to_string(), relation_type.to_lowercase());
        if self.staged.relations.remove(&key).is_none() {
            return Err(Error::RelationNotFound {
                from: from.to_string(),
                to: to.to_string(),
                relation_type: relation_type.to_string(),
            });
        }
        self.operations += 1;
        Ok(self)
    }

    /// Persists the staged view with one full save and publishes the diff
    /// against the snapshot as granular events. Re-entrant commit (calling
    /// this twice) is an error, matching "re-entry while open is an error"
    /// for the transaction as a whole.
    pub fn commit(mut self) -> CommitReport {
        if let Err(e) = self.ensure_open() {
            return CommitReport { success: false, operations_executed: 0, error: Some(e.to_string()) };
        }
        match self.store.save(self.staged.clone()) {
            Ok(()) => {
                self.publish_diff();
                let executed = self.operations;
                self.state = State::Committed;
                CommitReport { success: true, operations_executed: executed, error: None }
            }
            Err(e) => {
                self.state = State::RolledBack;
                CommitReport { success: false, operations_executed: 0, error: Some(e.to_string()) }
            }
        }
    }

    /// Discards every staged change; the snapshot taken at `begin` is never
    /// written back out (there is nothing to restore — disk was never
    /// touched).
    pub fn rollback(mut self) {
        self.state = State::RolledBack;
    }

    fn publish_diff(&self) {
        let Some(bus) = self.bus.as_ref() else { return };
        for (name, entity) in &self.staged.entities {
            match self.snapshot.entities.get(name) {
                None => bus.publish(Event::EntityCreated(Arc::new(entity.clone()))),
                Some(before) if before != entity => bus.publish(Event::EntityUpdated(Arc::new(entity.clone()))),
                Some(_) => {}
            }
        }
        for (key, relation) in &self.staged.relations {
            if !self.snapshot.relations.contains_key(key) {
                bus.publish(Event::RelationCreated(Arc::new(relation.clone())));
            }
        }
        for (key, relation) in &self.snapshot.relations {
            if !self.staged.relations.contains_key(key) {
                bus.publish(Event::RelationDeleted(Arc::new(relation.clone())));
            }
        }
    }
}

impl<'a> Drop for Transaction<'a> {
    fn drop(&mut self) {
        if self.state == State::Open {
            tracing::debug!("transaction dropped without commit/rollback; staged changes discarded");
        }
    }
}

/// Opens transactions against one store. Holding the manager costs nothing;
/// it exists mainly so callers don't have to thread the event bus through
/// every `begin` call.
pub struct TransactionManager<'a> {
    store: &'a AppendOnlyStore,
    bus: Option<Arc<EventBus>>,
}

impl<'a> TransactionManager<'a> {
    pub fn new(store: &'a AppendOnlyStore) -> Self {
        TransactionManager { store, bus: None }
    }

    pub fn with_event_bus(store: &'a AppendOnlyStore, bus: Arc<EventBus>) -> Self {
        TransactionManager { store, bus: Some(bus) }
    }

    pub fn begin(&self) -> Transaction<'a> {
        Transaction::begin(self.store, self.bus.clone())
    }
}
