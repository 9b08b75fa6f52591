use std::sync::Arc;

use matchroom_domain::triggers::EngineTriggers;
use matchroom_infra::memory::MemoryStore;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::observability;

/// Bridges the store's change feed to the trigger handlers. Every event
/// runs on its own task, so handlers for different documents, and duplicate
/// deliveries for the same document, execute concurrently the way the
/// hosting event system would run them.
pub fn spawn(store: Arc<MemoryStore>, triggers: EngineTriggers) -> JoinHandle<()> {
    let mut events = store.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    observability::register_store_event(event.kind());
                    let triggers = triggers.clone();
                    tokio::spawn(async move {
                        let kind = event.kind();
                        if let Err(err) = triggers.handle(event).await {
                            observability::register_trigger_failure(kind);
                            error!(event = kind, error = %err, "trigger handler failed");
                        }
                    });
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "event feed lagged, change events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
