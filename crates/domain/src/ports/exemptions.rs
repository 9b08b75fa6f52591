use crate::exemption::Exemption;
use crate::ports::BoxFuture;
use crate::ports::store::StoreResult;

pub trait ExemptionStore: Send + Sync {
    fn create(&self, exemption: &Exemption) -> BoxFuture<'_, StoreResult<Exemption>>;

    /// Exemptions whose `exempterId` is one of `user_ids`.
    fn list_by_exempters(&self, user_ids: &[String]) -> BoxFuture<'_, StoreResult<Vec<Exemption>>>;

    /// Exemptions whose `exemptedId` is one of `user_ids`.
    fn list_by_exempted(&self, user_ids: &[String]) -> BoxFuture<'_, StoreResult<Vec<Exemption>>>;
}
