//! Shared types, error taxonomy, and configuration for the kgraph engine.
//!
//! This crate has no knowledge of storage, indexing, or search — it only
//! defines the vocabulary (`Entity`, `Relation`, `Error`, `EngineConfig`)
//! that every other crate in the workspace builds on.

pub mod cancellation;
pub mod config;
pub mod error;
pub mod events;
pub mod limits;
pub mod path_safety;
pub mod types;

pub use cancellation::CancellationToken;
pub use error::{Error, ErrorCode, Result};
pub use events::{Event, EventSink};
pub use types::{now, Entity, Relation, RelationKey, RelationMetadata, Timestamp};
