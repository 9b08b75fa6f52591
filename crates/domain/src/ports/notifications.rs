use thiserror::Error;

use crate::notifications::NotificationEvent;
use crate::ports::BoxFuture;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification dispatch failed: {0}")]
    Dispatch(String),
}

/// Outbound push collaborator. Delivery is best effort: the engine never
/// waits on retries and never fails a trigger because of a sink error.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: &NotificationEvent) -> BoxFuture<'_, Result<(), NotifyError>>;
}
