//! The entity/relation data model (spec §3).

use crate::error::{Error, Result};
use crate::limits::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wall-clock timestamp, serialized as RFC3339/ISO-8601.
pub type Timestamp = DateTime<Utc>;

/// Returns the current instant, used to synthesise missing timestamps on load.
pub fn now() -> Timestamp {
    Utc::now()
}

/// A named, typed node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "entityType")]
    pub entity_type: String,
    #[serde(default)]
    pub observations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "createdAt", default = "now")]
    pub created_at: Timestamp,
    #[serde(rename = "lastModified", default = "now")]
    pub last_modified: Timestamp,
}

impl Entity {
    /// Constructs a new entity, stamping both timestamps with the current
    /// instant and normalising tags to lowercase per spec §3.
    pub fn new(
        name: impl Into<String>,
        entity_type: impl Into<String>,
        observations: Vec<String>,
    ) -> Self {
        let ts = now();
        Entity {
            name: name.into(),
            entity_type: entity_type.into(),
            observations,
            tags: None,
            importance: None,
            parent_id: None,
            created_at: ts,
            last_modified: ts,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(normalize_tags(tags));
        self
    }

    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = Some(importance);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Importance rank, defaulting per spec §3 when unset.
    pub fn importance_or_default(&self) -> u8 {
        self.importance.unwrap_or(DEFAULT_IMPORTANCE)
    }

    /// Lowercased entity-type, used for case-insensitive comparisons.
    pub fn type_key(&self) -> String {
        self.entity_type.to_lowercase()
    }

    /// Marks the entity as modified now.
    pub fn touch(&mut self) {
        self.last_modified = now();
    }

    /// Validates field lengths/ranges per spec §3. Does not check
    /// uniqueness or acyclicity — those are store-level invariants.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation("entity name must not be empty"));
        }
        if self.name.len() > MAX_NAME_LEN {
            return Err(Error::validation(format!(
                "entity name exceeds {MAX_NAME_LEN} chars"
            )));
        }
        if self.name.contains('\n') {
            return Err(Error::validation("entity name must not contain newlines"));
        }
        if self.entity_type.len() > MAX_ENTITY_TYPE_LEN {
            return Err(Error::validation(format!(
                "entityType exceeds {MAX_ENTITY_TYPE_LEN} chars"
            )));
        }
        if self.observations.len() > MAX_OBSERVATIONS {
            return Err(Error::validation(format!(
                "too many observations (max {MAX_OBSERVATIONS})"
            )));
        }
        for obs in &self.observations {
            if obs.len() > MAX_OBSERVATION_LEN {
                return Err(Error::validation(format!(
                    "observation exceeds {MAX_OBSERVATION_LEN} chars"
                )));
            }
        }
        if let Some(tags) = &self.tags {
            if tags.len() > MAX_TAGS {
                return Err(Error::validation(format!("too many tags (max {MAX_TAGS})")));
            }
            for tag in tags {
                if tag.len() > MAX_TAG_LEN {
                    return Err(Error::validation(format!("tag exceeds {MAX_TAG_LEN} chars")));
                }
            }
        }
        if let Some(importance) = self.importance {
            if !IMPORTANCE_RANGE.contains(&importance) {
                return Err(Error::validation("importance must be within 0..=10"));
            }
        }
        if let Some(parent) = &self.parent_id {
            if parent == &self.name {
                return Err(Error::CycleDetected {
                    entity: self.name.clone(),
                    parent: parent.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Lowercases and truncates tags to the configured limits (does not error;
/// callers validate counts/lengths separately via [`Entity::validate`]).
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = Vec::new();
    for tag in tags {
        let lower = tag.to_lowercase();
        if seen.insert(lower.clone()) {
            out.push(lower);
        }
    }
    out
}

/// Optional numeric/structured metadata attached to a relation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, serde_json::Value>>,
}

/// A directed, typed edge between two entity names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub from: String,
    pub to: String,
    #[serde(rename = "relationType")]
    pub relation_type: String,
    #[serde(rename = "createdAt", default = "now")]
    pub created_at: Timestamp,
    #[serde(rename = "lastModified", default = "now")]
    pub last_modified: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

/// Identity key for a relation: (from, to, lowercased relationType).
pub type RelationKey = (String, String, String);

impl Relation {
    pub fn new(from: impl Into<String>, to: impl Into<String>, relation_type: impl Into<String>) -> Self {
        let ts = now();
        Relation {
            from: from.into(),
            to: to.into(),
            relation_type: relation_type.into(),
            created_at: ts,
            last_modified: ts,
            weight: None,
            confidence: None,
            properties: None,
            metadata: None,
        }
    }

    /// Identity triple used for uniqueness and supersession (spec §3).
    pub fn key(&self) -> RelationKey {
        (self.from.clone(), self.to.clone(), self.relation_type.to_lowercase())
    }

    pub fn touch(&mut self) {
        self.last_modified = now();
    }

    pub fn validate(&self) -> Result<()> {
        if self.from.is_empty() || self.to.is_empty() {
            return Err(Error::validation("relation endpoints must not be empty"));
        }
        if self.relation_type.is_empty() {
            return Err(Error::validation("relationType must not be empty"));
        }
        if let Some(c) = self.confidence {
            if !(0.0..=1.0).contains(&c) {
                return Err(Error::validation("confidence must be within [0,1]"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_defaults_importance() {
        let e = Entity::new("Alice", "person", vec!["Engineer".into()]);
        assert_eq!(e.importance_or_default(), DEFAULT_IMPORTANCE);
    }

    #[test]
    fn entity_rejects_self_parent() {
        let e = Entity::new("Alice", "person", vec![]).with_parent("Alice");
        assert!(matches!(e.validate(), Err(Error::CycleDetected { .. })));
    }

    #[test]
    fn tags_are_lowercased_and_deduped() {
        let e = Entity::new("Alice", "person", vec![]).with_tags(vec!["Team".into(), "team".into()]);
        assert_eq!(e.tags.unwrap(), vec!["team".to_string()]);
    }

    #[test]
    fn relation_key_is_case_insensitive_on_type() {
        let a = Relation::new("Alice", "Bob", "Knows");
        let b = Relation::new("Alice", "Bob", "knows");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn relation_rejects_confidence_out_of_range() {
        let mut r = Relation::new("A", "B", "knows");
        r.confidence = Some(1.5);
        assert!(r.validate().is_err());
    }

    #[test]
    fn entity_name_length_is_bounded() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        let e = Entity::new(long, "person", vec![]);
        assert!(e.validate().is_err());
    }
}
