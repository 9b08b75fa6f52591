use crate::ports::BoxFuture;
use crate::ports::store::{Snapshot, StoreResult};
use crate::user::UserRecord;

pub trait UserStore: Send + Sync {
    fn get(&self, user_id: &str) -> BoxFuture<'_, StoreResult<Snapshot<UserRecord>>>;

    fn create(&self, user: &UserRecord) -> BoxFuture<'_, StoreResult<UserRecord>>;
}
