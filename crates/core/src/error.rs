//! Error taxonomy for the kgraph engine.
//!
//! Covers lookup misses, unique-key violations, validation failures, cycle
//! detection, storage faults, query errors, cancellation, and filesystem-level
//! errors.
//! Every variant carries enough context to build a human-readable message and
//! to look up recovery hints via [`Error::recovery_hints`].

use thiserror::Error;

/// Result type alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error code, independent of the `Display` message, for programmatic
/// matching (logging, telemetry, client-side branching).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    EntityNotFound,
    RelationNotFound,
    DuplicateEntity,
    DuplicateRelation,
    ValidationFailure,
    CycleDetected,
    StorageRead,
    StorageWrite,
    StorageCorrupted,
    InvalidQuery,
    SearchFailed,
    IndexNotReady,
    EmbeddingFailed,
    OperationCancelled,
    ImportError,
    ExportError,
    FileOperation,
    PathTraversal,
    InvalidConfig,
    MissingDependency,
    UnsupportedFeature,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::EntityNotFound => "EntityNotFound",
            ErrorCode::RelationNotFound => "RelationNotFound",
            ErrorCode::DuplicateEntity => "DuplicateEntity",
            ErrorCode::DuplicateRelation => "DuplicateRelation",
            ErrorCode::ValidationFailure => "ValidationFailure",
            ErrorCode::CycleDetected => "CycleDetected",
            ErrorCode::StorageRead => "StorageRead",
            ErrorCode::StorageWrite => "StorageWrite",
            ErrorCode::StorageCorrupted => "StorageCorrupted",
            ErrorCode::InvalidQuery => "InvalidQuery",
            ErrorCode::SearchFailed => "SearchFailed",
            ErrorCode::IndexNotReady => "IndexNotReady",
            ErrorCode::EmbeddingFailed => "EmbeddingFailed",
            ErrorCode::OperationCancelled => "OperationCancelled",
            ErrorCode::ImportError => "ImportError",
            ErrorCode::ExportError => "ExportError",
            ErrorCode::FileOperation => "FileOperation",
            ErrorCode::PathTraversal => "PathTraversal",
            ErrorCode::InvalidConfig => "InvalidConfig",
            ErrorCode::MissingDependency => "MissingDependency",
            ErrorCode::UnsupportedFeature => "UnsupportedFeature",
        }
    }
}

/// Unified error type for the kgraph engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("entity not found: {name}")]
    EntityNotFound { name: String },

    #[error("relation not found: {from} -[{relation_type}]-> {to}")]
    RelationNotFound {
        from: String,
        to: String,
        relation_type: String,
    },

    #[error("duplicate entity: {name}")]
    DuplicateEntity { name: String },

    #[error("duplicate relation: {from} -[{relation_type}]-> {to}")]
    DuplicateRelation {
        from: String,
        to: String,
        relation_type: String,
    },

    #[error("validation failure: {message}")]
    ValidationFailure { message: String },

    #[error("cycle detected: setting parent of {entity} to {parent} would close a cycle")]
    CycleDetected { entity: String, parent: String },

    #[error("storage read error: {message}")]
    StorageRead { message: String },

    #[error("storage write error: {message}")]
    StorageWrite { message: String },

    #[error("storage corrupted: {message}")]
    StorageCorrupted { message: String },

    #[error("invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("search failed: {message}")]
    SearchFailed { message: String },

    #[error("index not ready: {index}")]
    IndexNotReady { index: String },

    #[error("embedding failed: {message}")]
    EmbeddingFailed { message: String },

    #[error("operation cancelled")]
    OperationCancelled,

    #[error("import error: {message}")]
    ImportError { message: String },

    #[error("export error: {message}")]
    ExportError { message: String },

    #[error("file operation failed: {message}")]
    FileOperation {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("path traversal rejected: {path}")]
    PathTraversal { path: String },

    #[error("invalid config: {message}")]
    InvalidConfig { message: String },

    #[error("missing dependency: {what}")]
    MissingDependency { what: String },

    #[error("unsupported feature: {what}")]
    UnsupportedFeature { what: String },
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::EntityNotFound { .. } => ErrorCode::EntityNotFound,
            Error::RelationNotFound { .. } => ErrorCode::RelationNotFound,
            Error::DuplicateEntity { .. } => ErrorCode::DuplicateEntity,
            Error::DuplicateRelation { .. } => ErrorCode::DuplicateRelation,
            Error::ValidationFailure { .. } => ErrorCode::ValidationFailure,
            Error::CycleDetected { .. } => ErrorCode::CycleDetected,
            Error::StorageRead { .. } => ErrorCode::StorageRead,
            Error::StorageWrite { .. } => ErrorCode::StorageWrite,
            Error::StorageCorrupted { .. } => ErrorCode::StorageCorrupted,
            Error::InvalidQuery { .. } => ErrorCode::InvalidQuery,
            Error::SearchFailed { .. } => ErrorCode::SearchFailed,
            Error::IndexNotReady { .. } => ErrorCode::IndexNotReady,
            Error::EmbeddingFailed { .. } => ErrorCode::EmbeddingFailed,
            Error::OperationCancelled => ErrorCode::OperationCancelled,
            Error::ImportError { .. } => ErrorCode::ImportError,
            Error::ExportError { .. } => ErrorCode::ExportError,
            Error::FileOperation { .. } => ErrorCode::FileOperation,
            Error::PathTraversal { .. } => ErrorCode::PathTraversal,
            Error::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Error::MissingDependency { .. } => ErrorCode::MissingDependency,
            Error::UnsupportedFeature { .. } => ErrorCode::UnsupportedFeature,
        }
    }

    /// Recovery hints keyed by error code, for surfacing to callers/UIs.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self.code() {
            ErrorCode::EntityNotFound => vec!["check the entity name for typos", "list entities by type to confirm it exists"],
            ErrorCode::RelationNotFound => vec!["confirm both endpoints exist", "relation identity is (from, to, relationType)"],
            ErrorCode::DuplicateEntity => vec!["use update instead of create for an existing name"],
            ErrorCode::DuplicateRelation => vec!["the triple (from, to, relationType) already exists; update metadata instead"],
            ErrorCode::ValidationFailure => vec!["check required fields and length/range limits"],
            ErrorCode::CycleDetected => vec!["verify ancestors before setting parent"],
            ErrorCode::StorageRead => vec!["check the file exists and is readable"],
            ErrorCode::StorageWrite => vec!["check permissions and disk space"],
            ErrorCode::StorageCorrupted => vec!["restore from the most recent backup", "inspect the log for a torn trailing line"],
            ErrorCode::InvalidQuery => vec!["check boolean expression syntax", "reduce nesting depth"],
            ErrorCode::SearchFailed => vec!["retry with a narrower query"],
            ErrorCode::IndexNotReady => vec!["build or rebuild the index before querying it"],
            ErrorCode::EmbeddingFailed => vec!["check the embedding provider configuration", "retry with a smaller batch"],
            ErrorCode::OperationCancelled => vec!["the operation was cancelled by caller signal; retry if still needed"],
            ErrorCode::ImportError => vec!["check the import format and size caps"],
            ErrorCode::ExportError => vec!["check available disk space"],
            ErrorCode::FileOperation => vec!["check file permissions and path validity"],
            ErrorCode::PathTraversal => vec!["use a path within the configured base directory"],
            ErrorCode::InvalidConfig => vec!["check configuration keys against the documented schema"],
            ErrorCode::MissingDependency => vec!["enable the required feature or provide the collaborator"],
            ErrorCode::UnsupportedFeature => vec!["this feature is not implemented by the configured backend"],
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::ValidationFailure { message: message.into() }
    }

    pub fn storage_write(message: impl Into<String>) -> Self {
        Error::StorageWrite { message: message.into() }
    }

    pub fn storage_read(message: impl Into<String>) -> Self {
        Error::StorageRead { message: message.into() }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::StorageRead { .. } | Error::StorageWrite { .. } | Error::EmbeddingFailed { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::EntityNotFound { .. } | Error::RelationNotFound { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::FileOperation {
            message: e.to_string(),
            source: Some(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::StorageCorrupted {
            message: format!("JSON error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_matches_variant() {
        let e = Error::EntityNotFound { name: "Alice".into() };
        assert_eq!(e.code(), ErrorCode::EntityNotFound);
        assert!(e.is_not_found());
        assert!(!e.is_retryable());
    }

    #[test]
    fn cycle_detected_hint_mentions_ancestors() {
        let e = Error::CycleDetected { entity: "A".into(), parent: "B".into() };
        assert!(e.recovery_hints().iter().any(|h| h.contains("ancestors")));
    }

    #[test]
    fn storage_errors_are_retryable() {
        assert!(Error::storage_write("disk full").is_retryable());
        assert!(Error::storage_read("gone").is_retryable());
    }

    #[test]
    fn io_error_converts_to_file_operation() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        let e: Error = io_err.into();
        assert_eq!(e.code(), ErrorCode::FileOperation);
    }
}
