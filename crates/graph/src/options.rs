//! Shared option types for traversal operations (spec §4.N).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    Both,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Both
    }
}

/// Allow-lists applied before a relation/entity counts as a neighbour edge.
/// `None` means "no restriction"; comparisons are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct NeighbourOptions {
    pub direction: Direction,
    pub relation_types: Option<Vec<String>>,
    pub entity_types: Option<Vec<String>>,
}

impl NeighbourOptions {
    pub fn allows_relation_type(&self, relation_type: &str) -> bool {
        match &self.relation_types {
            None => true,
            Some(allowed) => allowed.iter().any(|t| t.eq_ignore_ascii_case(relation_type)),
        }
    }

    pub fn allows_entity_type(&self, entity_type: Option<&str>) -> bool {
        match &self.entity_types {
            None => true,
            Some(allowed) => match entity_type {
                Some(t) => allowed.iter().any(|a| a.eq_ignore_ascii_case(t)),
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TraversalOptions {
    pub direction: Direction,
    pub max_depth: Option<usize>,
}
