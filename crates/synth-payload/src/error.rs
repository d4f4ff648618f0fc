//! Generation error types.

use thiserror::Error;

pub type GenerateResult<T> = Result<T, GenerateError>;

/// Errors raised while building a synthetic record.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("metadata template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("metadata rendering failed: {0}")]
    Render(String),
}
