use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chatroom::{MessageSummary, MessageType};
use crate::ports::notifications::NotificationSink;

pub const MESSAGE_PREVIEW_MAX_CHARS: usize = 120;
pub const IMAGE_PREVIEW: &str = "(photo)";

const NOTIFICATIONS_PUBLISHED_TOTAL: &str = "matchroom_notifications_published_total";
const NOTIFICATIONS_FAILED_TOTAL: &str = "matchroom_notifications_failed_total";

/// Semantic events handed to the push collaborator. The engine decides
/// *when* a notification-worthy transition happened; token lookup, fan-out
/// and delivery bookkeeping live on the other side of the sink.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum NotificationEvent {
    MatchFormed {
        chatroom_id: String,
        participant_ids: Vec<String>,
    },
    WaitingRoomCreated {
        chatroom_id: String,
        participant_ids: Vec<String>,
    },
    Invitation {
        to_user_id: String,
        from_user_id: String,
        group_id: String,
    },
    Message {
        chatroom_id: String,
        sender_id: String,
        recipient_ids: Vec<String>,
        preview: String,
    },
}

impl NotificationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MatchFormed { .. } => "match_formed",
            Self::WaitingRoomCreated { .. } => "waiting_room_created",
            Self::Invitation { .. } => "invitation",
            Self::Message { .. } => "message",
        }
    }
}

pub fn message_preview(message: &MessageSummary) -> String {
    match message.message_type {
        MessageType::Image => IMAGE_PREVIEW.to_string(),
        MessageType::Text => message
            .content
            .chars()
            .take(MESSAGE_PREVIEW_MAX_CHARS)
            .collect(),
    }
}

#[derive(Clone)]
pub struct NotificationService {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationService {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Fire and forget. A sink failure is logged and counted, never
    /// propagated: notifications must not block matching or merging.
    pub async fn publish(&self, event: NotificationEvent) {
        let kind = event.kind();
        match self.sink.publish(&event).await {
            Ok(()) => {
                counter!(NOTIFICATIONS_PUBLISHED_TOTAL, "event" => kind).increment(1);
            }
            Err(err) => {
                warn!(event = kind, error = %err, "notification dispatch failed");
                counter!(NOTIFICATIONS_FAILED_TOTAL, "event" => kind).increment(1);
            }
        }
    }
}
