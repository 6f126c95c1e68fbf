//! Query layer above the indexed view: basic substring search, the boolean
//! AST parser/evaluator, bounded-Levenshtein fuzzy matching, the hybrid
//! multi-layer scorer, and the dispatcher that picks among them (spec §4.G
//! through §4.K). Ranked (TF-IDF/BM25) and vector search live in
//! `kgraph-index` and are re-exported here for convenience since the
//! dispatcher and hybrid scorer sit directly on top of them.

pub mod basic;
pub mod boolean;
pub mod dispatcher;
pub mod fuzzy;
pub mod hybrid;

pub use basic::{basic_search, BasicSearchFilters, BasicSearchResult, Pagination};
pub use boolean::{evaluate, looks_boolean, parse, parse_with_limits, Expr, Field};
pub use dispatcher::{dispatch_auto, estimate_costs, select_auto, AutoResult, CostEstimate, DispatchContext, DispatchOutcome, Method};
pub use fuzzy::{fuzzy_search, levenshtein_bounded, FuzzyMatch, OFFLOAD_THRESHOLD};
pub use hybrid::{hybrid_search, HybridResult, Layer};
