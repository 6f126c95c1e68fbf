//! Name/type/lowercase-cache/relation/word indexes (spec §4.D).
//!
//! All of these are maintained incrementally by the store under its single
//! mutation mutex, and can be rebuilt wholesale from a [`GraphView`] via
//! [`EntityIndex::rebuild`] — rebuilding must be a fixed point (spec §8,
//! property 3).

use kgraph_core::types::RelationKey;
use kgraph_core::{Entity, Relation};
use kgraph_storage::GraphView;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::tokenize::tokenize_entity_text;

/// Pre-lowercased text for substring search, kept alongside the entity so
/// basic/boolean search never re-lowercases on the hot path.
#[derive(Debug, Clone, Default)]
pub struct LowercaseCache {
    pub name: String,
    pub entity_type: String,
    pub observations: Vec<String>,
}

impl LowercaseCache {
    fn build(entity: &Entity) -> Self {
        LowercaseCache {
            name: entity.name.to_lowercase(),
            entity_type: entity.entity_type.to_lowercase(),
            observations: entity.observations.iter().map(|o| o.to_lowercase()).collect(),
        }
    }

    /// True if `needle` (already lowercased) appears anywhere in this
    /// entity's name, type, or observations.
    pub fn contains(&self, needle: &str) -> bool {
        self.name.contains(needle)
            || self.entity_type.contains(needle)
            || self.observations.iter().any(|o| o.contains(needle))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelationEdges {
    pub outgoing: Vec<RelationKey>,
    pub incoming: Vec<RelationKey>,
}

/// In-memory secondary indexes over a [`GraphView`]. Holds no data the view
/// doesn't already have; it exists purely to make lookups that would
/// otherwise be O(n) scans into O(1)/O(postings-size) operations.
#[derive(Debug, Clone, Default)]
pub struct EntityIndex {
    pub type_index: FxHashMap<String, FxHashSet<String>>,
    pub lowercase: FxHashMap<String, LowercaseCache>,
    pub relations_by_entity: FxHashMap<String, RelationEdges>,
    pub word_index: FxHashMap<String, FxHashSet<String>>,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes every index from scratch. O(entities + relations +
    /// total observation text).
    pub fn rebuild(view: &GraphView) -> Self {
        let mut idx = EntityIndex::new();
        for entity in view.entities.values() {
            idx.index_entity(entity);
        }
        for relation in view.relations.values() {
            idx.index_relation(relation);
        }
        idx
    }

    pub fn index_entity(&mut self, entity: &Entity) {
        self.type_index
            .entry(entity.type_key())
            .or_default()
            .insert(entity.name.clone());
        self.lowercase.insert(entity.name.clone(), LowercaseCache::build(entity));

        for token in tokenize_entity_text(&entity.name, &entity.entity_type, &entity.observations) {
            self.word_index.entry(token).or_default().insert(entity.name.clone());
        }
    }

    /// Removes all index entries for `entity` ahead of a reindex, without
    /// touching relation edges (callers that also remove relations should
    /// call [`EntityIndex::deindex_relation`] for each one).
    pub fn deindex_entity(&mut self, entity: &Entity) {
        if let Some(names) = self.type_index.get_mut(&entity.type_key()) {
            names.remove(&entity.name);
            if names.is_empty() {
                self.type_index.remove(&entity.type_key());
            }
        }
        self.lowercase.remove(&entity.name);
        for token in tokenize_entity_text(&entity.name, &entity.entity_type, &entity.observations) {
            if let Some(names) = self.word_index.get_mut(&token) {
                names.remove(&entity.name);
                if names.is_empty() {
                    self.word_index.remove(&token);
                }
            }
        }
    }

    pub fn index_relation(&mut self, relation: &Relation) {
        let key = relation.key();
        self.relations_by_entity
            .entry(relation.from.clone())
            .or_default()
            .outgoing
            .push(key.clone());
        self.relations_by_entity
            .entry(relation.to.clone())
            .or_default()
            .incoming
            .push(key);
    }

    pub fn deindex_relation(&mut self, relation: &Relation) {
        let key = relation.key();
        if let Some(edges) = self.relations_by_entity.get_mut(&relation.from) {
            edges.outgoing.retain(|k| k != &key);
        }
        if let Some(edges) = self.relations_by_entity.get_mut(&relation.to) {
            edges.incoming.retain(|k| k != &key);
        }
    }

    pub fn names_for_type(&self, entity_type: &str) -> FxHashSet<String> {
        self.type_index.get(&entity_type.to_lowercase()).cloned().unwrap_or_default()
    }

    pub fn types(&self) -> Vec<String> {
        self.type_index.keys().cloned().collect()
    }

    /// All outgoing + incoming relation keys touching `name`.
    pub fn relations_for(&self, name: &str) -> Vec<RelationKey> {
        match self.relations_by_entity.get(name) {
            Some(edges) => edges.outgoing.iter().chain(edges.incoming.iter()).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Names whose indexed text contains every token in `tokens` (AND).
    pub fn names_matching_all(&self, tokens: &[String]) -> FxHashSet<String> {
        let mut iter = tokens.iter();
        let Some(first) = iter.next() else { return FxHashSet::default() };
        let mut acc = self.word_index.get(first).cloned().unwrap_or_default();
        for token in iter {
            let postings = self.word_index.get(token).cloned().unwrap_or_default();
            acc.retain(|name| postings.contains(name));
        }
        acc
    }

    /// Names whose indexed text contains any token in `tokens` (OR).
    pub fn names_matching_any(&self, tokens: &[String]) -> FxHashSet<String> {
        let mut acc = FxHashSet::default();
        for token in tokens {
            if let Some(postings) = self.word_index.get(token) {
                acc.extend(postings.iter().cloned());
            }
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_core::Entity;

    fn view_with(entities: Vec<Entity>) -> GraphView {
        let mut v = GraphView::new();
        for e in entities {
            v.entities.insert(e.name.clone(), e);
        }
        v
    }

    #[test]
    fn rebuild_is_fixed_point() {
        let view = view_with(vec![
            Entity::new("Alice", "person", vec!["Engineer".into()]),
            Entity::new("Bob", "person", vec!["Manager".into()]),
        ]);
        let a = EntityIndex::rebuild(&view);
        let b = EntityIndex::rebuild(&view);
        assert_eq!(a.type_index, b.type_index);
        assert_eq!(a.word_index, b.word_index);
    }

    #[test]
    fn type_index_groups_by_lowercased_type() {
        let view = view_with(vec![Entity::new("Alice", "Person", vec![])]);
        let idx = EntityIndex::rebuild(&view);
        assert!(idx.names_for_type("person").contains("Alice"));
    }

    #[test]
    fn word_index_matches_all_and_any() {
        let view = view_with(vec![
            Entity::new("Alice", "person", vec!["Developer".into()]),
            Entity::new("Bob", "person", vec!["Manager".into(), "Developer".into()]),
        ]);
        let idx = EntityIndex::rebuild(&view);
        let any = idx.names_matching_any(&["developer".to_string(), "manager".to_string()]);
        assert_eq!(any.len(), 2);
        let all = idx.names_matching_all(&["developer".to_string(), "manager".to_string()]);
        assert_eq!(all, FxHashSet::from_iter(["Bob".to_string()]));
    }

    #[test]
    fn deindex_entity_removes_word_postings() {
        let mut idx = EntityIndex::new();
        let e = Entity::new("Alice", "person", vec!["Developer".into()]);
        idx.index_entity(&e);
        idx.deindex_entity(&e);
        assert!(idx.word_index.get("developer").is_none());
    }
}
