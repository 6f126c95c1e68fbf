//! JSON import/export: the one exchange format in scope (spec §6 "beyond
//! the round-trip contract"). Shares the tolerant-reader rules with the log
//! codec — missing optional fields and unparseable entries are survivable,
//! not fatal, except under `MergeStrategy::Fail`.

use crate::view::GraphView;
use kgraph_core::{Entity, Error, Relation, Result};
use serde::{Deserialize, Serialize};

/// Caps from spec §6 "Import/export formats", applied uniformly since JSON
/// is the one encoder/decoder this crate implements.
const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;
const MAX_IMPORT_ITEMS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Abort on first conflicting key; the store is left untouched.
    Fail,
    /// Keep the existing record, ignore the incoming one.
    Skip,
    /// Merge the incoming record into the existing one (observations are
    /// appended and deduplicated; relation properties/metadata are
    /// shallow-merged, incoming wins per key).
    Merge,
    /// Incoming record fully supersedes the existing one.
    Replace,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphExport {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub entities_created: usize,
    pub entities_updated: usize,
    pub entities_skipped: usize,
    pub relations_created: usize,
    pub relations_updated: usize,
    pub relations_skipped: usize,
    pub errors: Vec<String>,
}

/// Serialises `view` to the structural JSON export format.
pub fn export_json(view: &GraphView) -> Result<String> {
    let export = GraphExport {
        entities: view.entities.values().cloned().collect(),
        relations: view.relations.values().cloned().collect(),
    };
    serde_json::to_string_pretty(&export).map_err(|e| Error::ExportError { message: e.to_string() })
}

/// Parses and merges `json` into `view` in place, per `strategy`. Returns a
/// per-item report; under `MergeStrategy::Fail` the first conflict aborts
/// and leaves `view` byte-for-byte as it was passed in (the caller's clone
/// discipline, e.g. staging a `Transaction`-owned copy, is what makes this
/// safe — this function itself mutates eagerly until it returns `Err`).
pub fn import_json(view: &mut GraphView, json: &str, strategy: MergeStrategy) -> Result<ImportReport> {
    if json.len() > MAX_IMPORT_BYTES {
        return Err(Error::ImportError { message: format!("import payload exceeds {MAX_IMPORT_BYTES} bytes") });
    }
    let export: GraphExport = serde_json::from_str(json).map_err(|e| Error::ImportError { message: e.to_string() })?;
    if export.entities.len() + export.relations.len() > MAX_IMPORT_ITEMS {
        return Err(Error::ImportError { message: format!("import payload exceeds {MAX_IMPORT_ITEMS} items") });
    }

    let mut report = ImportReport::default();

    for incoming in export.entities {
        if let Err(e) = incoming.validate() {
            if strategy == MergeStrategy::Fail {
                return Err(e);
            }
            report.errors.push(e.to_string());
            continue;
        }
        match view.entities.get(&incoming.name) {
            None => {
                view.entities.insert(incoming.name.clone(), incoming);
                report.entities_created += 1;
            }
            Some(existing) => match strategy {
                MergeStrategy::Fail => {
                    return Err(Error::DuplicateEntity { name: incoming.name });
                }
                MergeStrategy::Skip => {
                    report.entities_skipped += 1;
                }
                MergeStrategy::Replace => {
                    view.entities.insert(incoming.name.clone(), incoming);
                    report.entities_updated += 1;
                }
                MergeStrategy::Merge => {
                    let mut merged = existing.clone();
                    for obs in incoming.observations {
                        if !merged.observations.contains(&obs) {
                            merged.observations.push(obs);
                        }
                    }
                    if incoming.tags.is_some() {
                        merged.tags = incoming.tags;
                    }
                    if incoming.importance.is_some() {
                        merged.importance = incoming.importance;
                    }
                    if incoming.parent_id.is_some() {
                        merged.parent_id = incoming.parent_id;
                    }
                    merged.touch();
                    view.entities.insert(merged.name.clone(), merged);
                    report.entities_updated += 1;
                }
            },
        }
    }

    for incoming in export.relations {
        if let Err(e) = incoming.validate() {
            if strategy == MergeStrategy::Fail {
                return Err(e);
            }
            report.errors.push(e.to_string());
            continue;
        }
        let key = incoming.key();
        match view.relations.get(&key) {
            None => {
                view.relations.insert(key, incoming);
                report.relations_created += 1;
            }
            Some(existing) => match strategy {
                MergeStrategy::Fail => {
                    return Err(Error::DuplicateRelation { from: incoming.from, to: incoming.to, relation_type: incoming.relation_type });
                }
                MergeStrategy::Skip => {
                    report.relations_skipped += 1;
                }
                MergeStrategy::Replace => {
                    view.relations.insert(key, incoming);
                    report.relations_updated += 1;
                }
                MergeStrategy::Merge => {
                    let mut merged = existing.clone();
                    if incoming.weight.is_some() {
                        merged.weight = incoming.weight;
                    }
                    if incoming.confidence.is_some() {
                        merged.confidence = incoming.confidence;
                    }
                    let mut props = merged.properties.take().unwrap_or_default();
                    if let Some(incoming_props) = incoming.properties {
                        props.extend(incoming_props);
                    }
                    merged.properties = (!props.is_empty()).then_some(props);
                    merged.touch();
                    view.relations.insert(key, merged);
                    report.relations_updated += 1;
                }
            },
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_core::Entity;

    fn sample_view() -> GraphView {
        let mut v = GraphView::new();
        v.entities.insert("Alice".into(), Entity::new("Alice", "person", vec!["Engineer".into()]));
        v
    }

    #[test]
    fn export_then_import_round_trips() {
        let view = sample_view();
        let json = export_json(&view).unwrap();
        let mut fresh = GraphView::new();
        let report = import_json(&mut fresh, &json, MergeStrategy::Fail).unwrap();
        assert_eq!(report.entities_created, 1);
        assert_eq!(fresh.entities.len(), 1);
    }

    #[test]
    fn fail_strategy_aborts_on_first_conflict() {
        let mut view = sample_view();
        let json = export_json(&view).unwrap();
        let result = import_json(&mut view, &json, MergeStrategy::Fail);
        assert!(result.is_err());
    }

    #[test]
    fn skip_strategy_leaves_existing_untouched() {
        let mut view = sample_view();
        let original = view.entities.get("Alice").unwrap().clone();
        let json = export_json(&view).unwrap();
        let report = import_json(&mut view, &json, MergeStrategy::Skip).unwrap();
        assert_eq!(report.entities_skipped, 1);
        assert_eq!(view.entities.get("Alice").unwrap().last_modified, original.last_modified);
    }

    #[test]
    fn merge_strategy_appends_new_observations() {
        let mut view = sample_view();
        let mut incoming = GraphExport::default();
        let mut updated = Entity::new("Alice", "person", vec!["Mentor".into()]);
        updated.name = "Alice".to_string();
        incoming.entities.push(updated);
        let json = serde_json::to_string(&incoming).unwrap();
        let report = import_json(&mut view, &json, MergeStrategy::Merge).unwrap();
        assert_eq!(report.entities_updated, 1);
        let alice = view.entities.get("Alice").unwrap();
        assert!(alice.observations.contains(&"Engineer".to_string()));
        assert!(alice.observations.contains(&"Mentor".to_string()));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let mut view = GraphView::new();
        let huge = "x".repeat(MAX_IMPORT_BYTES + 1);
        let result = import_json(&mut view, &huge, MergeStrategy::Fail);
        assert!(matches!(result, Err(Error::ImportError { .. })));
    }
}
