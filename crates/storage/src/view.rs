//! The in-memory, deduplicated view of the graph (spec §4.C).

use kgraph_core::types::RelationKey;
use kgraph_core::{Entity, Relation};
use rustc_hash::FxHashMap;

/// A point-in-time snapshot of every entity and relation, keyed the same way
/// the on-disk log deduplicates them (latest wins).
#[derive(Debug, Clone, Default)]
pub struct GraphView {
    pub entities: FxHashMap<String, Entity>,
    pub relations: FxHashMap<RelationKey, Relation>,
}

impl GraphView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn get_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// All relations referencing `name` as either endpoint.
    pub fn relations_touching<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Relation> {
        self.relations
            .values()
            .filter(move |r| r.from == name || r.to == name)
    }

    /// Walks the parent chain starting at `start_parent`, returning `true` if
    /// it ever reaches `name` (spec §3 "Parent-graph acyclicity: no entity is
    /// its own ancestor", §9 "ancestry lookup is a bounded walk that returns
    /// CycleDetected if it revisits a node"). A dangling or already-cyclic
    /// chain elsewhere in the graph does not loop forever here: the walk's
    /// own visited set bounds it to at most one pass over existing entities.
    pub fn would_cycle(&self, name: &str, start_parent: &str) -> bool {
        let mut current = start_parent;
        let mut visited = rustc_hash::FxHashSet::default();
        loop {
            if current == name {
                return true;
            }
            if !visited.insert(current.to_string()) {
                return false;
            }
            match self.entities.get(current).and_then(|e| e.parent_id.as_deref()) {
                Some(next) => current = next,
                None => return false,
            }
        }
    }

    /// Removes `name` and every relation that references it, as required by
    /// entity deletion (spec §3 "Deletion of an entity deletes every
    /// relation that references it").
    pub fn remove_entity_cascade(&mut self, name: &str) -> (Option<Entity>, Vec<Relation>) {
        let removed_entity = self.entities.remove(name);
        let mut removed_relations = Vec::new();
        self.relations.retain(|_, r| {
            if r.from == name || r.to == name {
                removed_relations.push(r.clone());
                false
            } else {
                true
            }
        });
        (removed_entity, removed_relations)
    }
}
