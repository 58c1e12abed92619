use thiserror::Error;

/// Error taxonomy shared by the graph, change detection and contract layers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Empty name or path, malformed identifier, or a broken graph invariant.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An identifier expected to be a graph member is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An operation ran before its required state was established.
    #[error("Precondition failed: {0}")]
    Precondition(String),
}

/// Convenience result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
