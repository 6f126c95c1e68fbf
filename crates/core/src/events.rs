//! Mutation event types shared between the store and the event bus
//! (spec §4.O). Defined here, rather than in the store or the bus crate, so
//! neither crate needs to depend on the other — the store only needs an
//! [`EventSink`] to publish through.

use crate::types::{Entity, Relation};
use std::sync::Arc;

/// A graph-mutation event, emitted in mutation-completion order.
#[derive(Debug, Clone)]
pub enum Event {
    EntityCreated(Arc<Entity>),
    EntityUpdated(Arc<Entity>),
    RelationCreated(Arc<Relation>),
    RelationDeleted(Arc<Relation>),
    GraphLoaded { entity_count: usize, relation_count: usize },
    GraphSaved { entity_count: usize, relation_count: usize },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::EntityCreated(_) => "entity:created",
            Event::EntityUpdated(_) => "entity:updated",
            Event::RelationCreated(_) => "relation:created",
            Event::RelationDeleted(_) => "relation:deleted",
            Event::GraphLoaded { .. } => "graph:loaded",
            Event::GraphSaved { .. } => "graph:saved",
        }
    }
}

/// Sink the store publishes events through. The event bus (spec §4.O,
/// implemented in `kgraph-concurrency`) is the canonical implementation;
/// tests may supply a simple closure-backed sink.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: Event);
}

impl<F: Fn(Event) + Send + Sync> EventSink for F {
    fn publish(&self, event: Event) {
        self(event)
    }
}
