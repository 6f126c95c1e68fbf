//! Size and range limits from the data model (spec §3).

/// Maximum length of an entity name.
pub const MAX_NAME_LEN: usize = 500;
/// Maximum length of an entity-type string.
pub const MAX_ENTITY_TYPE_LEN: usize = 100;
/// Maximum length of a single observation.
pub const MAX_OBSERVATION_LEN: usize = 5000;
/// Maximum number of observations per entity.
pub const MAX_OBSERVATIONS: usize = 1000;
/// Maximum number of tags per entity.
pub const MAX_TAGS: usize = 50;
/// Maximum length of a single tag.
pub const MAX_TAG_LEN: usize = 100;
/// Default importance rank when unspecified.
pub const DEFAULT_IMPORTANCE: u8 = 5;
/// Inclusive range of valid importance ranks.
pub const IMPORTANCE_RANGE: std::ops::RangeInclusive<u8> = 0..=10;

/// Default maximum page size for basic search pagination.
pub const DEFAULT_MAX_SEARCH_LIMIT: usize = 1000;

/// Import/export size caps (spec §6).
pub const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_IMPORT_ITEMS: usize = 100_000;
