use crate::invitation::Invitation;
use crate::ports::BoxFuture;
use crate::ports::store::StoreResult;

pub trait InvitationStore: Send + Sync {
    fn create(&self, invitation: &Invitation) -> BoxFuture<'_, StoreResult<Invitation>>;
}
