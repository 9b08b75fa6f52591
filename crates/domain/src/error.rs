use thiserror::Error;

use crate::ports::store::StoreError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found")]
    NotFound,
    #[error("conflict")]
    Conflict,
    #[error("integrity violation: {0}")]
    Integrity(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
