//! Direct-neighbour lookup (spec §4.N "Neighbours").

use kgraph_core::Relation;
use kgraph_index::EntityIndex;
use kgraph_storage::GraphView;

use crate::options::{Direction, NeighbourOptions};

/// Returns `(neighbour name, relation)` pairs reachable from `name` in one
/// hop, honouring direction and allow-lists. Self-loops are skipped. A
/// nonexistent `name` yields an empty result rather than an error.
pub fn neighbours(view: &GraphView, index: &EntityIndex, name: &str, opts: &NeighbourOptions) -> Vec<(String, Relation)> {
    let Some(edges) = index.relations_by_entity.get(name) else { return Vec::new() };
    let mut out = Vec::new();

    if matches!(opts.direction, Direction::Out | Direction::Both) {
        for key in &edges.outgoing {
            if let Some(r) = view.relations.get(key) {
                push_if_allowed(view, opts, name, &r.to, r, &mut out);
            }
        }
    }
    if matches!(opts.direction, Direction::In | Direction::Both) {
        for key in &edges.incoming {
            if let Some(r) = view.relations.get(key) {
                push_if_allowed(view, opts, name, &r.from, r, &mut out);
            }
        }
    }
    out
}

fn push_if_allowed(
    view: &GraphView,
    opts: &NeighbourOptions,
    from_name: &str,
    other_name: &str,
    relation: &Relation,
    out: &mut Vec<(String, Relation)>,
) {
    if other_name == from_name {
        return;
    }
    if !opts.allows_relation_type(&relation.relation_type) {
        return;
    }
    let other_type = view.get_entity(other_name).map(|e| e.entity_type.as_str());
    if opts.entity_types.is_some() && !opts.allows_entity_type(other_type) {
        return;
    }
    out.push((other_name.to_string(), relation.clone()));
}
