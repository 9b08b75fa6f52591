use std::collections::HashMap;

use tokio::sync::{Mutex, broadcast};

use matchroom_domain::chatroom::{Chatroom, MessageSummary};
use matchroom_domain::events::{DocumentChange, StoreEvent};
use matchroom_domain::exemption::Exemption;
use matchroom_domain::group::{Group, GroupStatus};
use matchroom_domain::invitation::Invitation;
use matchroom_domain::ports::BoxFuture;
use matchroom_domain::ports::chatrooms::{ChatroomMergeTx, ChatroomStore};
use matchroom_domain::ports::exemptions::ExemptionStore;
use matchroom_domain::ports::groups::{GroupStore, MatchCommitTx};
use matchroom_domain::ports::invitations::InvitationStore;
use matchroom_domain::ports::store::{Snapshot, StoreError, StoreResult};
use matchroom_domain::ports::users::UserStore;
use matchroom_domain::user::UserRecord;
use matchroom_domain::util::now_ms;

pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

#[derive(Clone)]
struct Versioned<T> {
    doc: T,
    version: u64,
}

#[derive(Default)]
struct Collections {
    groups: HashMap<String, Versioned<Group>>,
    chatrooms: HashMap<String, Versioned<Chatroom>>,
    users: HashMap<String, Versioned<UserRecord>>,
    exemptions: Vec<Exemption>,
    invitations: HashMap<String, Invitation>,
}

/// Development and test stand-in for the platform's document store. One
/// lock across all collections gives the serializable multi-document
/// commits the engine's transactions assume; every mutation bumps the
/// document version and fans out a change event to subscribers. Events are
/// emitted while the lock is held so the feed order matches commit order.
pub struct MemoryStore {
    collections: Mutex<Collections>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            collections: Mutex::new(Collections::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // send fails only when nobody is subscribed.
        let _ = self.events.send(event);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl GroupStore for MemoryStore {
    fn get(&self, group_id: &str) -> BoxFuture<'_, StoreResult<Snapshot<Group>>> {
        let group_id = group_id.to_string();
        Box::pin(async move {
            let collections = self.collections.lock().await;
            Ok(match collections.groups.get(&group_id) {
                Some(entry) => Snapshot::existing(entry.doc.clone(), entry.version),
                None => Snapshot::absent(),
            })
        })
    }

    fn create(&self, group: &Group) -> BoxFuture<'_, StoreResult<Group>> {
        let group = group.clone();
        Box::pin(async move {
            let mut collections = self.collections.lock().await;
            if collections.groups.contains_key(&group.id) {
                return Err(StoreError::Conflict);
            }
            collections.groups.insert(
                group.id.clone(),
                Versioned {
                    doc: group.clone(),
                    version: 1,
                },
            );
            self.emit(StoreEvent::GroupCreated(DocumentChange::created(
                group.id.clone(),
                group.clone(),
            )));
            Ok(group)
        })
    }

    fn update(&self, group: &Group, expected_version: u64) -> BoxFuture<'_, StoreResult<Group>> {
        let group = group.clone();
        Box::pin(async move {
            let mut collections = self.collections.lock().await;
            let Some(entry) = collections.groups.get_mut(&group.id) else {
                return Err(StoreError::Conflict);
            };
            if entry.version != expected_version {
                return Err(StoreError::Conflict);
            }
            let before = entry.doc.clone();
            entry.doc = group.clone();
            entry.version += 1;
            self.emit(StoreEvent::GroupUpdated(DocumentChange::updated(
                group.id.clone(),
                before,
                group.clone(),
            )));
            Ok(group)
        })
    }

    fn list_seeking(&self, exclude_group_id: &str) -> BoxFuture<'_, StoreResult<Vec<Group>>> {
        let exclude_group_id = exclude_group_id.to_string();
        Box::pin(async move {
            let collections = self.collections.lock().await;
            let mut seeking: Vec<Group> = collections
                .groups
                .values()
                .filter(|entry| {
                    entry.doc.status == GroupStatus::Seeking && entry.doc.id != exclude_group_id
                })
                .map(|entry| entry.doc.clone())
                .collect();
            seeking.sort_by(|left, right| left.id.cmp(&right.id));
            Ok(seeking)
        })
    }

    fn commit_match(&self, tx: &MatchCommitTx) -> BoxFuture<'_, StoreResult<()>> {
        let tx = tx.clone();
        Box::pin(async move {
            let mut collections = self.collections.lock().await;

            let seeker_before = match collections.groups.get(&tx.seeker.id) {
                Some(entry) if entry.version == tx.seeker_version => entry.doc.clone(),
                _ => return Err(StoreError::Conflict),
            };
            let candidate_before = match collections.groups.get(&tx.candidate.id) {
                Some(entry) if entry.version == tx.candidate_version => entry.doc.clone(),
                _ => return Err(StoreError::Conflict),
            };

            collections.groups.insert(
                tx.seeker.id.clone(),
                Versioned {
                    doc: tx.seeker.clone(),
                    version: tx.seeker_version + 1,
                },
            );
            collections.groups.insert(
                tx.candidate.id.clone(),
                Versioned {
                    doc: tx.candidate.clone(),
                    version: tx.candidate_version + 1,
                },
            );

            self.emit(StoreEvent::GroupUpdated(DocumentChange::updated(
                tx.seeker.id.clone(),
                seeker_before,
                tx.seeker.clone(),
            )));
            self.emit(StoreEvent::GroupUpdated(DocumentChange::updated(
                tx.candidate.id.clone(),
                candidate_before,
                tx.candidate.clone(),
            )));
            Ok(())
        })
    }
}

impl ChatroomStore for MemoryStore {
    fn get(&self, chatroom_id: &str) -> BoxFuture<'_, StoreResult<Snapshot<Chatroom>>> {
        let chatroom_id = chatroom_id.to_string();
        Box::pin(async move {
            let collections = self.collections.lock().await;
            Ok(match collections.chatrooms.get(&chatroom_id) {
                Some(entry) => Snapshot::existing(entry.doc.clone(), entry.version),
                None => Snapshot::absent(),
            })
        })
    }

    fn create_if_absent(&self, chatroom: &Chatroom) -> BoxFuture<'_, StoreResult<bool>> {
        let chatroom = chatroom.clone();
        Box::pin(async move {
            let mut collections = self.collections.lock().await;
            if collections.chatrooms.contains_key(&chatroom.id) {
                return Ok(false);
            }
            collections.chatrooms.insert(
                chatroom.id.clone(),
                Versioned {
                    doc: chatroom.clone(),
                    version: 1,
                },
            );
            self.emit(StoreEvent::ChatroomCreated(DocumentChange::created(
                chatroom.id.clone(),
                chatroom,
            )));
            Ok(true)
        })
    }

    fn append_message(
        &self,
        chatroom_id: &str,
        message_id: &str,
        message: &MessageSummary,
    ) -> BoxFuture<'_, StoreResult<Option<Chatroom>>> {
        let chatroom_id = chatroom_id.to_string();
        let message_id = message_id.to_string();
        let message = message.clone();
        Box::pin(async move {
            let mut collections = self.collections.lock().await;
            let Some(entry) = collections.chatrooms.get_mut(&chatroom_id) else {
                return Ok(None);
            };
            let before = entry.doc.clone();
            entry.doc.last_message_id = Some(message_id);
            entry.doc.last_message = Some(message);
            entry.doc.message_count += 1;
            entry.doc.updated_at_ms = now_ms();
            entry.version += 1;
            let after = entry.doc.clone();
            self.emit(StoreEvent::ChatroomUpdated(DocumentChange::updated(
                chatroom_id,
                before,
                after.clone(),
            )));
            Ok(Some(after))
        })
    }

    fn merge_groups(&self, tx: &ChatroomMergeTx) -> BoxFuture<'_, StoreResult<()>> {
        let tx = tx.clone();
        Box::pin(async move {
            let mut collections = self.collections.lock().await;

            if collections.chatrooms.contains_key(&tx.chatroom.id) {
                return Err(StoreError::Conflict);
            }
            for (group_id, expected_version) in &tx.source_groups {
                match collections.groups.get(group_id) {
                    Some(entry) if entry.version == *expected_version => {}
                    _ => return Err(StoreError::Conflict),
                }
            }
            for participant in &tx.chatroom.participants {
                if !collections.users.contains_key(participant) {
                    return Err(StoreError::Operation(format!(
                        "user {participant} referenced by merge does not exist"
                    )));
                }
            }

            collections.chatrooms.insert(
                tx.chatroom.id.clone(),
                Versioned {
                    doc: tx.chatroom.clone(),
                    version: 1,
                },
            );
            for participant in &tx.chatroom.participants {
                if let Some(user) = collections.users.get_mut(participant) {
                    user.doc.current_group_id = Some(tx.chatroom.id.clone());
                    user.version += 1;
                }
            }
            let mut deleted = Vec::new();
            for (group_id, _) in &tx.source_groups {
                if let Some(entry) = collections.groups.remove(group_id) {
                    deleted.push((group_id.clone(), entry.doc));
                }
            }

            self.emit(StoreEvent::ChatroomCreated(DocumentChange::created(
                tx.chatroom.id.clone(),
                tx.chatroom.clone(),
            )));
            for (group_id, before) in deleted {
                self.emit(StoreEvent::GroupDeleted(DocumentChange::deleted(
                    group_id, before,
                )));
            }
            Ok(())
        })
    }
}

impl UserStore for MemoryStore {
    fn get(&self, user_id: &str) -> BoxFuture<'_, StoreResult<Snapshot<UserRecord>>> {
        let user_id = user_id.to_string();
        Box::pin(async move {
            let collections = self.collections.lock().await;
            Ok(match collections.users.get(&user_id) {
                Some(entry) => Snapshot::existing(entry.doc.clone(), entry.version),
                None => Snapshot::absent(),
            })
        })
    }

    fn create(&self, user: &UserRecord) -> BoxFuture<'_, StoreResult<UserRecord>> {
        let user = user.clone();
        Box::pin(async move {
            let mut collections = self.collections.lock().await;
            if collections.users.contains_key(&user.id) {
                return Err(StoreError::Conflict);
            }
            collections.users.insert(
                user.id.clone(),
                Versioned {
                    doc: user.clone(),
                    version: 1,
                },
            );
            Ok(user)
        })
    }
}

impl ExemptionStore for MemoryStore {
    fn create(&self, exemption: &Exemption) -> BoxFuture<'_, StoreResult<Exemption>> {
        let exemption = exemption.clone();
        Box::pin(async move {
            let mut collections = self.collections.lock().await;
            collections.exemptions.push(exemption.clone());
            Ok(exemption)
        })
    }

    fn list_by_exempters(&self, user_ids: &[String]) -> BoxFuture<'_, StoreResult<Vec<Exemption>>> {
        let user_ids = user_ids.to_vec();
        Box::pin(async move {
            let collections = self.collections.lock().await;
            Ok(collections
                .exemptions
                .iter()
                .filter(|exemption| user_ids.contains(&exemption.exempter_id))
                .cloned()
                .collect())
        })
    }

    fn list_by_exempted(&self, user_ids: &[String]) -> BoxFuture<'_, StoreResult<Vec<Exemption>>> {
        let user_ids = user_ids.to_vec();
        Box::pin(async move {
            let collections = self.collections.lock().await;
            Ok(collections
                .exemptions
                .iter()
                .filter(|exemption| user_ids.contains(&exemption.exempted_id))
                .cloned()
                .collect())
        })
    }
}

impl InvitationStore for MemoryStore {
    fn create(&self, invitation: &Invitation) -> BoxFuture<'_, StoreResult<Invitation>> {
        let invitation = invitation.clone();
        Box::pin(async move {
            let mut collections = self.collections.lock().await;
            if collections.invitations.contains_key(&invitation.id) {
                return Err(StoreError::Conflict);
            }
            collections
                .invitations
                .insert(invitation.id.clone(), invitation.clone());
            self.emit(StoreEvent::InvitationCreated(DocumentChange::created(
                invitation.id.clone(),
                invitation.clone(),
            )));
            Ok(invitation)
        })
    }
}
