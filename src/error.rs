//! Error types for the context budget engine

use thiserror::Error;

/// Context budget errors
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Invalid file tree: {0}")]
    InvalidTree(String),
}

/// Result type alias for context budget operations
pub type Result<T> = std::result::Result<T, ContextError>;
