use crate::chatroom::{Chatroom, MessageSummary};
use crate::ports::BoxFuture;
use crate::ports::store::{Snapshot, StoreResult};

/// Merge of a matched group pair into one chatroom. Applied atomically:
/// the chatroom write (conditioned on absence), the `currentGroupId`
/// repoint of every participant, and the deletion of both source groups
/// (conditioned on their versions) land together or not at all.
#[derive(Clone, Debug)]
pub struct ChatroomMergeTx {
    pub chatroom: Chatroom,
    pub source_groups: [(String, u64); 2],
}

pub trait ChatroomStore: Send + Sync {
    fn get(&self, chatroom_id: &str) -> BoxFuture<'_, StoreResult<Snapshot<Chatroom>>>;

    /// Waiting-room creation: insert only when no chatroom with this id
    /// exists yet. Returns whether a document was written.
    fn create_if_absent(&self, chatroom: &Chatroom) -> BoxFuture<'_, StoreResult<bool>>;

    /// Appends a message summary, advancing `lastMessageId` and the message
    /// count. Returns `None` when the chatroom does not exist.
    fn append_message(
        &self,
        chatroom_id: &str,
        message_id: &str,
        message: &MessageSummary,
    ) -> BoxFuture<'_, StoreResult<Option<Chatroom>>>;

    fn merge_groups(&self, tx: &ChatroomMergeTx) -> BoxFuture<'_, StoreResult<()>>;
}
