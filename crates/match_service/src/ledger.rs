use crate::catalog::CatalogHandle;
use crate::errors::RewardError;
use match_core::RewardGrant;
use match_store::{GrantInsert, LedgerStore};
use std::sync::Arc;

/// Outcome of a grant attempt. Both variants are success: `AlreadyGranted`
/// is the idempotent replay case and carries the original record.
#[derive(Clone, Debug, PartialEq)]
pub enum GrantOutcome {
    Granted(RewardGrant),
    AlreadyGranted(RewardGrant),
}

impl GrantOutcome {
    pub fn grant(&self) -> &RewardGrant {
        match self {
            GrantOutcome::Granted(g) | GrantOutcome::AlreadyGranted(g) => g,
        }
    }
}

/// Durable reward ledger with at-most-once grant semantics.
///
/// Duplicate policy: a repeat grant for the same `(player, reward)` is an
/// idempotent success reported as `AlreadyGranted`, never an error. The
/// write path is the store's insert-if-absent primitive, so a retry after a
/// network failure cannot record a second grant or a second timestamp.
pub struct RewardLedger {
    catalog: CatalogHandle,
    store: Arc<dyn LedgerStore>,
}

impl RewardLedger {
    pub fn new(catalog: CatalogHandle, store: Arc<dyn LedgerStore>) -> Self {
        Self { catalog, store }
    }

    /// Check a reward id against the loaded catalog.
    pub async fn validate(&self, reward_id: &str) -> Result<(), RewardError> {
        let catalog = self
            .catalog
            .current()
            .await
            .ok_or(RewardError::CatalogUnavailable)?;
        if catalog.is_valid(reward_id) {
            Ok(())
        } else {
            Err(RewardError::InvalidRewardId(reward_id.to_string()))
        }
    }

    /// Grant a reward, validating it against the catalog first.
    pub async fn grant(
        &self,
        player_id: &str,
        reward_id: &str,
        source_session_id: &str,
    ) -> Result<GrantOutcome, RewardError> {
        self.validate(reward_id).await?;

        let grant = RewardGrant::new(
            player_id.to_string(),
            reward_id.to_string(),
            source_session_id.to_string(),
        );
        match self.store.insert_grant_if_absent(grant.clone()).await? {
            GrantInsert::Inserted => {
                tracing::info!(player_id, reward_id, source_session_id, "reward granted");
                Ok(GrantOutcome::Granted(grant))
            }
            GrantInsert::Exists(existing) => {
                tracing::debug!(player_id, reward_id, "reward already granted");
                Ok(GrantOutcome::AlreadyGranted(existing))
            }
        }
    }

    /// All grants for a player, sorted by reward id.
    pub async fn list_grants(&self, player_id: &str) -> Result<Vec<RewardGrant>, RewardError> {
        Ok(self.store.list_grants(player_id).await?)
    }

    pub async fn has_reward(&self, player_id: &str, reward_id: &str) -> Result<bool, RewardError> {
        Ok(self.store.get_grant(player_id, reward_id).await?.is_some())
    }
}
