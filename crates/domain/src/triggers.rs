use tracing::info;

use crate::DomainResult;
use crate::chatroom::{Chatroom, ChatroomService};
use crate::events::{DocumentChange, StoreEvent};
use crate::group::{Group, GroupStatus};
use crate::matching::MatchService;
use crate::notifications::{NotificationEvent, NotificationService, message_preview};

/// Glue between the store's change feed and the engine services. Holds no
/// matching logic of its own: it detects the semantic transition in each
/// change and hands off.
#[derive(Clone)]
pub struct EngineTriggers {
    matching: MatchService,
    chatrooms: ChatroomService,
    notifications: NotificationService,
}

impl EngineTriggers {
    pub fn new(
        matching: MatchService,
        chatrooms: ChatroomService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            matching,
            chatrooms,
            notifications,
        }
    }

    /// Entry point for the event dispatcher. An `Err` here is an integrity
    /// fatal the host may redeliver; contention aborts never reach it.
    pub async fn handle(&self, event: StoreEvent) -> DomainResult<()> {
        match event {
            StoreEvent::GroupCreated(change) => self.on_group_created(change).await,
            StoreEvent::GroupUpdated(change) => self.on_group_updated(change).await,
            StoreEvent::GroupDeleted(_) => Ok(()),
            StoreEvent::ChatroomCreated(change) => self.on_chatroom_created(change).await,
            StoreEvent::ChatroomUpdated(change) => self.on_chatroom_updated(change).await,
            StoreEvent::InvitationCreated(change) => self.on_invitation_created(change).await,
        }
    }

    async fn on_group_created(&self, change: DocumentChange<Group>) -> DomainResult<()> {
        let Some(group) = change.after else {
            return Ok(());
        };
        if self.chatrooms.ensure_waiting_room(&group).await? {
            info!(group_id = %group.id, "waiting chatroom created");
        }
        Ok(())
    }

    async fn on_group_updated(&self, change: DocumentChange<Group>) -> DomainResult<()> {
        let Some(after) = change.after.as_ref() else {
            return Ok(());
        };

        if entered(GroupStatus::Seeking, change.before.as_ref(), after) {
            let _ = self.matching.run(after).await?;
            return Ok(());
        }

        if entered(GroupStatus::Matched, change.before.as_ref(), after) {
            let Some(partner_id) = after.matched_group_id.as_deref() else {
                return Ok(());
            };
            let _ = self.chatrooms.form_chatroom(&after.id, partner_id).await?;
        }
        Ok(())
    }

    async fn on_chatroom_created(&self, change: DocumentChange<Chatroom>) -> DomainResult<()> {
        let Some(room) = change.after else {
            return Ok(());
        };
        if room.participants.is_empty() {
            return Ok(());
        }
        let event = if room.is_pair_room() {
            NotificationEvent::MatchFormed {
                chatroom_id: room.id,
                participant_ids: room.participants,
            }
        } else {
            NotificationEvent::WaitingRoomCreated {
                chatroom_id: room.id,
                participant_ids: room.participants,
            }
        };
        self.notifications.publish(event).await;
        Ok(())
    }

    async fn on_chatroom_updated(&self, change: DocumentChange<Chatroom>) -> DomainResult<()> {
        if let Some(event) = message_event(change.before.as_ref(), change.after.as_ref()) {
            self.notifications.publish(event).await;
        }
        Ok(())
    }

    async fn on_invitation_created(
        &self,
        change: DocumentChange<crate::invitation::Invitation>,
    ) -> DomainResult<()> {
        let Some(invitation) = change.after else {
            return Ok(());
        };
        self.notifications
            .publish(NotificationEvent::Invitation {
                to_user_id: invitation.to_user_id,
                from_user_id: invitation.from_user_id,
                group_id: invitation.group_id,
            })
            .await;
        Ok(())
    }
}

/// Edge detection: did this change move the group *into* `status`?
/// Handlers fire on every update, so acting on levels instead of edges
/// would re-run matching on unrelated writes.
fn entered(status: GroupStatus, before: Option<&Group>, after: &Group) -> bool {
    after.status == status && before.map(|group| group.status) != Some(status)
}

/// A message notification is due when the update advanced `lastMessageId`
/// and there is someone besides the sender to tell.
fn message_event(
    before: Option<&Chatroom>,
    after: Option<&Chatroom>,
) -> Option<NotificationEvent> {
    let after = after?;
    let last_message_id = after.last_message_id.as_deref()?;
    if before.and_then(|room| room.last_message_id.as_deref()) == Some(last_message_id) {
        return None;
    }
    let message = after.last_message.as_ref()?;

    let recipient_ids: Vec<String> = after
        .participants
        .iter()
        .filter(|participant| **participant != message.sender_id)
        .cloned()
        .collect();
    if recipient_ids.is_empty() {
        return None;
    }

    Some(NotificationEvent::Message {
        chatroom_id: after.id.clone(),
        sender_id: message.sender_id.clone(),
        recipient_ids,
        preview: message_preview(message),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chatroom::{MessageSummary, MessageType};
    use crate::group::FilterAttributes;

    fn group(id: &str, status: GroupStatus) -> Group {
        let mut group = Group::new(
            id,
            vec!["u-1".to_string()],
            FilterAttributes::default(),
        )
        .expect("group");
        group.status = status;
        group
    }

    fn room(id: &str, participants: &[&str]) -> Chatroom {
        Chatroom {
            id: id.to_string(),
            participants: participants.iter().map(|member| member.to_string()).collect(),
            message_count: 0,
            last_message_id: None,
            last_message: None,
            created_at_ms: 0,
            updated_at_ms: 0,
        }
    }

    fn text_message(sender: &str, content: &str) -> MessageSummary {
        MessageSummary {
            sender_id: sender.to_string(),
            sender_nickname: format!("{sender}-name"),
            message_type: MessageType::Text,
            content: content.to_string(),
        }
    }

    #[test]
    fn entering_seeking_is_edge_triggered() {
        let before = group("group-a", GroupStatus::Forming);
        let after = group("group-a", GroupStatus::Seeking);
        assert!(entered(GroupStatus::Seeking, Some(&before), &after));
        // Same status on both sides is a level, not an edge.
        assert!(!entered(GroupStatus::Seeking, Some(&after), &after));
        // A fresh snapshot with no before still counts as entering.
        assert!(entered(GroupStatus::Seeking, None, &after));
    }

    #[test]
    fn message_event_requires_a_new_last_message_id() {
        let mut before = room("group-a", &["u1", "u2"]);
        before.last_message_id = Some("m-1".to_string());
        before.last_message = Some(text_message("u1", "hi"));
        let mut after = before.clone();

        assert!(message_event(Some(&before), Some(&after)).is_none());

        after.last_message_id = Some("m-2".to_string());
        after.last_message = Some(text_message("u1", "anyone here?"));
        let event = message_event(Some(&before), Some(&after)).expect("event");
        match event {
            NotificationEvent::Message {
                sender_id,
                recipient_ids,
                preview,
                ..
            } => {
                assert_eq!(sender_id, "u1");
                assert_eq!(recipient_ids, vec!["u2"]);
                assert_eq!(preview, "anyone here?");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn sender_alone_in_the_room_produces_no_event() {
        let before = room("group-a", &["u1"]);
        let mut after = before.clone();
        after.last_message_id = Some("m-1".to_string());
        after.last_message = Some(text_message("u1", "echo"));
        assert!(message_event(Some(&before), Some(&after)).is_none());
    }

    #[test]
    fn image_messages_use_the_placeholder_preview() {
        let before = room("group-a", &["u1", "u2"]);
        let mut after = before.clone();
        after.last_message_id = Some("m-1".to_string());
        after.last_message = Some(MessageSummary {
            sender_id: "u1".to_string(),
            sender_nickname: "alice".to_string(),
            message_type: MessageType::Image,
            content: "https://cdn.example/pic.jpg".to_string(),
        });
        let event = message_event(Some(&before), Some(&after)).expect("event");
        match event {
            NotificationEvent::Message { preview, .. } => {
                assert_eq!(preview, crate::notifications::IMAGE_PREVIEW);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
