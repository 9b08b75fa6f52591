use std::time::Duration;

use tracing::info;

use matchroom_domain::notifications::NotificationEvent;
use matchroom_domain::ports::BoxFuture;
use matchroom_domain::ports::notifications::{NotificationSink, NotifyError};

/// Forwards semantic events to the push-gateway collaborator as one JSON
/// POST per event. The gateway owns token lookup, per-recipient fan-out
/// and delivery bookkeeping.
pub struct HttpNotificationSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNotificationSink {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl NotificationSink for HttpNotificationSink {
    fn publish(&self, event: &NotificationEvent) -> BoxFuture<'_, Result<(), NotifyError>> {
        let event = event.clone();
        Box::pin(async move {
            let response = self
                .client
                .post(&self.endpoint)
                .json(&event)
                .send()
                .await
                .map_err(|err| NotifyError::Dispatch(err.to_string()))?;
            if !response.status().is_success() {
                return Err(NotifyError::Dispatch(format!(
                    "push gateway returned {}",
                    response.status()
                )));
            }
            Ok(())
        })
    }
}

/// Sink for development and tests: events land in the log only.
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn publish(&self, event: &NotificationEvent) -> BoxFuture<'_, Result<(), NotifyError>> {
        let payload = serde_json::to_string(event)
            .map_err(|err| NotifyError::Dispatch(err.to_string()));
        Box::pin(async move {
            let payload = payload?;
            info!(payload = %payload, "notification event");
            Ok(())
        })
    }
}
