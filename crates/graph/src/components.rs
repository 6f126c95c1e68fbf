//! Connected components over the undirected projection of the graph.

use kgraph_index::EntityIndex;
use kgraph_storage::GraphView;
use rustc_hash::FxHashSet;

use crate::neighbours::neighbours;
use crate::options::{Direction, NeighbourOptions};

#[derive(Debug, Clone)]
pub struct Component {
    pub members: Vec<String>,
}

impl Component {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Flood-fills the undirected projection (both relation directions count as
/// adjacency). Components are returned sorted by size descending.
pub fn connected_components(view: &GraphView, index: &EntityIndex) -> Vec<Component> {
    let adj_opts = NeighbourOptions { direction: Direction::Both, ..Default::default() };
    let mut visited = FxHashSet::default();
    let mut components = Vec::new();

    for name in view.entities.keys() {
        if visited.contains(name) {
            continue;
        }
        let mut members = Vec::new();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(name.clone());
        visited.insert(name.clone());

        while let Some(node) = queue.pop_front() {
            members.push(node.clone());
            for (next, _relation) in neighbours(view, index, &node, &adj_opts) {
                if visited.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }
        components.push(Component { members });
    }

    components.sort_by(|a, b| b.size().cmp(&a.size()));
    components
}

/// Size of the largest component, or 0 for an empty graph.
pub fn largest_component_size(view: &GraphView, index: &EntityIndex) -> usize {
    connected_components(view, index).first().map(Component::size).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_core::{Entity, Relation};

    #[test]
    fn disjoint_pairs_are_separate_components() {
        let mut view = GraphView::new();
        for name in ["A", "B", "C", "D"] {
            view.entities.insert(name.into(), Entity::new(name, "t", vec![]));
        }
        let r = Relation::new("A", "B", "knows");
        view.relations.insert(r.key(), r);
        let index = EntityIndex::rebuild(&view);

        let components = connected_components(&view, &index);
        assert_eq!(components.len(), 3); // {A,B}, {C}, {D}
        assert_eq!(components[0].size(), 2);
    }

    #[test]
    fn directed_edges_still_connect_undirected() {
        let mut view = GraphView::new();
        view.entities.insert("A".into(), Entity::new("A", "t", vec![]));
        view.entities.insert("B".into(), Entity::new("B", "t", vec![]));
        let r = Relation::new("A", "B", "knows");
        view.relations.insert(r.key(), r);
        let index = EntityIndex::rebuild(&view);

        assert_eq!(largest_component_size(&view, &index), 2);
    }

    #[test]
    fn empty_graph_has_no_components() {
        let view = GraphView::new();
        let index = EntityIndex::rebuild(&view);
        assert!(connected_components(&view, &index).is_empty());
    }
}
