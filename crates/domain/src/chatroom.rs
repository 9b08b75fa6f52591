use std::collections::HashSet;
use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::DomainResult;
use crate::error::DomainError;
use crate::group::Group;
use crate::ports::chatrooms::{ChatroomMergeTx, ChatroomStore};
use crate::ports::groups::GroupStore;
use crate::ports::store::StoreError;
use crate::util::{now_ms, uuid_v7_without_dashes};

pub const PAIR_ID_SEPARATOR: char = '_';
pub const DEFAULT_TX_ATTEMPTS: u32 = 5;

const CHATROOMS_CREATED_TOTAL: &str = "matchroom_chatrooms_created_total";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Image,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    pub sender_id: String,
    pub sender_nickname: String,
    pub message_type: MessageType,
    pub content: String,
}

/// Durable conversation container. A waiting room carries its group's own
/// id; a matched room carries the two source group ids joined in ascending
/// order, which makes the id stable and collision free per pair.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chatroom {
    pub id: String,
    pub participants: Vec<String>,
    pub message_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<MessageSummary>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Chatroom {
    pub fn waiting_room(group: &Group) -> Self {
        let now = now_ms();
        Self {
            id: group.id.clone(),
            participants: group.member_ids.clone(),
            message_count: 0,
            last_message_id: None,
            last_message: None,
            created_at_ms: now,
            updated_at_ms: now,
        }
    }

    /// Matched rooms carry the pair separator; waiting rooms never do.
    pub fn is_pair_room(&self) -> bool {
        self.id.contains(PAIR_ID_SEPARATOR)
    }
}

pub fn pair_chatroom_id(one: &str, other: &str) -> String {
    if one <= other {
        format!("{one}{PAIR_ID_SEPARATOR}{other}")
    } else {
        format!("{other}{PAIR_ID_SEPARATOR}{one}")
    }
}

/// De-duplicated union preserving first-seen order.
pub fn merge_participants(first: &[String], second: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    first
        .iter()
        .chain(second.iter())
        .filter(|member| seen.insert((*member).clone()))
        .cloned()
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub enum MergeOutcome {
    /// This invocation created the chatroom and retired both groups.
    Created(Chatroom),
    /// A previous delivery already merged the pair; nothing to do.
    AlreadyExists,
    /// The partner's handler owns the merge (its id is smaller).
    Deferred,
}

#[derive(Clone)]
pub struct ChatroomService {
    chatrooms: Arc<dyn ChatroomStore>,
    groups: Arc<dyn GroupStore>,
    tx_attempts: u32,
}

impl ChatroomService {
    pub fn new(chatrooms: Arc<dyn ChatroomStore>, groups: Arc<dyn GroupStore>) -> Self {
        Self {
            chatrooms,
            groups,
            tx_attempts: DEFAULT_TX_ATTEMPTS,
        }
    }

    pub fn with_tx_attempts(mut self, attempts: u32) -> Self {
        self.tx_attempts = attempts.max(1);
        self
    }

    /// Creates the group's own chat surface when it is first formed, so a
    /// chat view exists before any matching happens. Idempotent via the
    /// existence check; no cross-entity invariant, so not transactional.
    pub async fn ensure_waiting_room(&self, group: &Group) -> DomainResult<bool> {
        if self.chatrooms.get(&group.id).await?.exists() {
            return Ok(false);
        }
        let room = Chatroom::waiting_room(group);
        let created = self.chatrooms.create_if_absent(&room).await?;
        if created {
            counter!(CHATROOMS_CREATED_TOTAL, "kind" => "waiting").increment(1);
        }
        Ok(created)
    }

    /// Merges a matched pair into one chatroom, exactly once per pair.
    /// Invoked from both sides' matched transitions; only the side whose id
    /// is lexicographically smaller proceeds, and redeliveries short-circuit
    /// on the existence check. The chatroom write, every participant's
    /// `currentGroupId` repoint and both group deletions land in one atomic
    /// commit.
    pub async fn form_chatroom(
        &self,
        group_id: &str,
        matched_group_id: &str,
    ) -> DomainResult<MergeOutcome> {
        if group_id >= matched_group_id {
            debug!(
                group_id = %group_id,
                partner_id = %matched_group_id,
                "deferring merge to the partner's handler"
            );
            return Ok(MergeOutcome::Deferred);
        }

        let chatroom_id = pair_chatroom_id(group_id, matched_group_id);
        for _ in 0..self.tx_attempts {
            if self.chatrooms.get(&chatroom_id).await?.exists() {
                return Ok(MergeOutcome::AlreadyExists);
            }

            let own = self.groups.get(group_id).await?;
            let other = self.groups.get(matched_group_id).await?;
            let (Some(own_doc), Some(other_doc)) = (own.doc, other.doc) else {
                return Err(DomainError::Integrity(format!(
                    "matched pair {chatroom_id} references a missing group"
                )));
            };

            let now = now_ms();
            let chatroom = Chatroom {
                id: chatroom_id.clone(),
                participants: merge_participants(&own_doc.member_ids, &other_doc.member_ids),
                message_count: 0,
                last_message_id: None,
                last_message: None,
                created_at_ms: now,
                updated_at_ms: now,
            };
            let tx = ChatroomMergeTx {
                chatroom: chatroom.clone(),
                source_groups: [
                    (group_id.to_string(), own.version),
                    (matched_group_id.to_string(), other.version),
                ],
            };
            match self.chatrooms.merge_groups(&tx).await {
                Ok(()) => {
                    info!(
                        chatroom_id = %chatroom.id,
                        participants = chatroom.participants.len(),
                        "matched pair merged into chatroom"
                    );
                    counter!(CHATROOMS_CREATED_TOTAL, "kind" => "matched").increment(1);
                    return Ok(MergeOutcome::Created(chatroom));
                }
                Err(StoreError::Conflict) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(DomainError::Store(StoreError::Conflict))
    }

    /// Message append for the chat surface; the updated room feeds the
    /// message notification trigger.
    pub async fn append_message(
        &self,
        chatroom_id: &str,
        message: MessageSummary,
    ) -> DomainResult<Chatroom> {
        if message.sender_id.trim().is_empty() {
            return Err(DomainError::Validation("senderId is required".into()));
        }
        if message.message_type == MessageType::Text && message.content.trim().is_empty() {
            return Err(DomainError::Validation("message content is required".into()));
        }

        let room = self
            .chatrooms
            .get(chatroom_id)
            .await?
            .doc
            .ok_or(DomainError::NotFound)?;
        if !room.participants.contains(&message.sender_id) {
            return Err(DomainError::Validation(
                "sender is not a participant of this chatroom".into(),
            ));
        }

        let message_id = uuid_v7_without_dashes();
        self.chatrooms
            .append_message(chatroom_id, &message_id, &message)
            .await?
            .ok_or(DomainError::NotFound)
    }
}
