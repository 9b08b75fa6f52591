use crate::group::Group;
use crate::ports::BoxFuture;
use crate::ports::store::{Snapshot, StoreResult};

/// Reciprocal match commit for one group pair. The store applies both
/// writes atomically iff both version preconditions still hold, and
/// returns `StoreError::Conflict` otherwise.
#[derive(Clone, Debug)]
pub struct MatchCommitTx {
    pub seeker: Group,
    pub seeker_version: u64,
    pub candidate: Group,
    pub candidate_version: u64,
}

pub trait GroupStore: Send + Sync {
    fn get(&self, group_id: &str) -> BoxFuture<'_, StoreResult<Snapshot<Group>>>;

    fn create(&self, group: &Group) -> BoxFuture<'_, StoreResult<Group>>;

    fn update(&self, group: &Group, expected_version: u64) -> BoxFuture<'_, StoreResult<Group>>;

    /// All groups currently in the seeking pool, excluding
    /// `exclude_group_id`, in ascending id order so scans are deterministic.
    fn list_seeking(&self, exclude_group_id: &str) -> BoxFuture<'_, StoreResult<Vec<Group>>>;

    fn commit_match(&self, tx: &MatchCommitTx) -> BoxFuture<'_, StoreResult<()>>;
}
