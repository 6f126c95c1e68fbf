//! The embeddable facade: [`KnowledgeGraph`] wires the store, indexes,
//! search dispatcher, graph traversal, transaction manager, event bus, and
//! cache fabric into one handle. Everything here is composition; the
//! algorithms live in the collaborator crates named in the grounding
//! ledger.

pub mod embedding;
pub mod graph;

pub use embedding::{embed_with_fallback, provider_for, EmbeddingProvider, MockProvider};
pub use graph::KnowledgeGraph;
