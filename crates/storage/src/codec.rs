//! Record codec (spec §4.A).
//!
//! One self-describing JSON object per line, discriminated by a `type`
//! field. Readers tolerate missing optional fields and missing timestamps
//! (synthesised via `Entity`/`Relation`'s `#[serde(default = "now")]`
//! timestamp fields); unknown fields are silently ignored by serde's
//! default (non-`deny_unknown_fields`) struct deserialization. Because
//! `serde_json` escapes control characters (including literal newlines)
//! inside string values, a record's JSON encoding never spans more than
//! one line.

use kgraph_core::{Entity, Relation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    Entity(Entity),
    Relation(Relation),
}

impl Record {
    /// Parses one line. Returns `Ok(None)` for a blank line (tolerated, not
    /// an error) and `Err` for malformed JSON — callers replaying a log
    /// should treat a trailing unparseable line as a torn write and discard
    /// it rather than fail the whole replay.
    pub fn parse_line(line: &str) -> Result<Option<Record>, serde_json::Error> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(trimmed).map(Some)
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<Entity> for Record {
    fn from(e: Entity) -> Self {
        Record::Entity(e)
    }
}

impl From<Relation> for Record {
    fn from(r: Relation) -> Self {
        Record::Relation(r)
    }
}
