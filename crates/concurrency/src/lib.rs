//! Mutation-coordination layer above the store: a transaction manager and
//! fluent batch builder, the event bus standard subscribers hang off of, the
//! per-search-kind cache fabric, and the index-catalog wiring that keeps
//! secondary indexes and TF-IDF statistics current as the store mutates.

pub mod batch_builder;
pub mod cache;
pub mod event_bus;
pub mod index_sync;
pub mod transaction;

pub use batch_builder::BatchBuilder;
pub use cache::{query_key, CacheFabric};
pub use event_bus::EventBus;
pub use index_sync::{IndexCatalog, Indexes};
pub use transaction::{CommitReport, Transaction, TransactionManager};
