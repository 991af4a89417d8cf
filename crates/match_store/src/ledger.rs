use crate::error::StoreError;
use async_trait::async_trait;
use match_core::RewardGrant;

/// Outcome of a conditional grant insert.
#[derive(Clone, Debug, PartialEq)]
pub enum GrantInsert {
    /// The grant was written; the caller's record is now the durable fact.
    Inserted,
    /// A grant for this `(player_id, reward_id)` already existed; the
    /// original record is returned untouched.
    Exists(RewardGrant),
}

/// Durable, TTL-less store of reward grants.
///
/// `insert_grant_if_absent` is the only write path and must be atomic:
/// among concurrent attempts for the same `(player_id, reward_id)`, exactly
/// one transitions the key from absent to present. Implementations map this
/// to the store's native conditional write (e.g. a condition expression on
/// attribute absence), never read-then-write.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_grant_if_absent(&self, grant: RewardGrant) -> Result<GrantInsert, StoreError>;

    async fn get_grant(
        &self,
        player_id: &str,
        reward_id: &str,
    ) -> Result<Option<RewardGrant>, StoreError>;

    /// All grants for a player, sorted by `reward_id` for deterministic reads.
    async fn list_grants(&self, player_id: &str) -> Result<Vec<RewardGrant>, StoreError>;
}
