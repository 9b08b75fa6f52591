use thiserror::Error;

/// Errors surfaced by the transactional document store collaborator.
/// `Conflict` means a version precondition no longer held; callers decide
/// whether to re-read and retry or to abort.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transaction conflict")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store operation failed: {0}")]
    Operation(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Point-read result. `version` 0 means the document does not exist; any
/// write conditioned on that version asserts continued absence.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot<T> {
    pub doc: Option<T>,
    pub version: u64,
}

impl<T> Snapshot<T> {
    pub fn absent() -> Self {
        Self {
            doc: None,
            version: 0,
        }
    }

    pub fn existing(doc: T, version: u64) -> Self {
        Self {
            doc: Some(doc),
            version,
        }
    }

    pub fn exists(&self) -> bool {
        self.doc.is_some()
    }
}
