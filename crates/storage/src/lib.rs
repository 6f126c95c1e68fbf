//! Append-only durable store: the record codec, the durable writer, the
//! cached in-memory view, and the mutex-guarded store that ties them
//! together (spec §4.A–§4.C).

pub mod codec;
pub mod exchange;
pub mod saved_searches;
pub mod store;
pub mod view;
pub mod writer;

pub use codec::Record;
pub use exchange::{export_json, import_json, GraphExport, ImportReport, MergeStrategy};
pub use saved_searches::SavedSearch;
pub use store::AppendOnlyStore;
pub use view::GraphView;
