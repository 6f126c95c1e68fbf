//! Basic search (spec §4.I): a streaming filter over the cached view —
//! substring match, then tag/importance/type/date filters, then pagination —
//! returning the matched entities plus their induced subgraph of relations.

use kgraph_core::types::Timestamp;
use kgraph_index::entity_index::EntityIndex;
use kgraph_storage::GraphView;
use serde::{Deserialize, Serialize};

/// Optional filters applied after the substring match, all ANDed together.
#[derive(Debug, Clone, Default)]
pub struct BasicSearchFilters {
    pub entity_type: Option<String>,
    pub tags_any: Option<Vec<String>>,
    pub min_importance: Option<u8>,
    pub max_importance: Option<u8>,
    pub created_after: Option<Timestamp>,
    pub created_before: Option<Timestamp>,
}

impl BasicSearchFilters {
    fn matches(&self, entity: &kgraph_core::Entity) -> bool {
        if let Some(t) = &self.entity_type {
            if !entity.entity_type.eq_ignore_ascii_case(t) {
                return false;
            }
        }
        if let Some(tags) = &self.tags_any {
            let has_any = entity.tags.as_ref().is_some_and(|entity_tags| tags.iter().any(|t| entity_tags.contains(&t.to_lowercase())));
            if !has_any {
                return false;
            }
        }
        let importance = entity.importance_or_default();
        if let Some(min) = self.min_importance {
            if importance < min {
                return false;
            }
        }
        if let Some(max) = self.max_importance {
            if importance > max {
                return false;
            }
        }
        // Date range matches if either createdAt or lastModified falls
        // within [created_after, created_before].
        let in_range = |ts: Timestamp| {
            self.created_after.map_or(true, |after| ts >= after) && self.created_before.map_or(true, |before| ts <= before)
        };
        if self.created_after.is_some() || self.created_before.is_some() {
            if !(in_range(entity.created_at) || in_range(entity.last_modified)) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicSearchResult {
    pub entities: Vec<kgraph_core::Entity>,
    pub relations: Vec<kgraph_core::Relation>,
    pub total_matched: usize,
}

/// Runs the substring + filter + pagination pipeline, then computes the
/// induced subgraph (every relation whose both endpoints are in the
/// returned page).
pub fn basic_search(
    view: &GraphView,
    index: &EntityIndex,
    query: &str,
    filters: &BasicSearchFilters,
    page: &Pagination,
    max_limit: usize,
) -> BasicSearchResult {
    let needle = query.to_lowercase();
    let mut matched: Vec<&kgraph_core::Entity> = view
        .entities
        .values()
        .filter(|e| {
            let substring_ok = needle.is_empty()
                || index.lowercase.get(&e.name).map(|c| c.contains(&needle)).unwrap_or_else(|| {
                    e.name.to_lowercase().contains(&needle)
                        || e.entity_type.to_lowercase().contains(&needle)
                        || e.observations.iter().any(|o| o.to_lowercase().contains(&needle))
                });
            substring_ok && filters.matches(e)
        })
        .collect();
    matched.sort_by(|a, b| a.name.cmp(&b.name));

    let total_matched = matched.len();
    let limit = page.limit.min(max_limit.max(1));
    let page_entities: Vec<kgraph_core::Entity> =
        matched.into_iter().skip(page.offset).take(limit).cloned().collect();

    let names: rustc_hash::FxHashSet<&str> = page_entities.iter().map(|e| e.name.as_str()).collect();
    let relations: Vec<kgraph_core::Relation> = view
        .relations
        .values()
        .filter(|r| names.contains(r.from.as_str()) && names.contains(r.to.as_str()))
        .cloned()
        .collect();

    BasicSearchResult { entities: page_entities, relations, total_matched }
}
