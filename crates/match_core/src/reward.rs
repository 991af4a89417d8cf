use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A durable, permanent fact that a player earned a catalog reward.
///
/// Carries no expiration field: absence of TTL is what makes it permanent.
/// At most one grant ever exists per `(player_id, reward_id)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardGrant {
    pub player_id: String,
    pub reward_id: String,
    pub granted: bool,
    pub granted_at: DateTime<Utc>,
    pub source_session_id: String,
}

impl RewardGrant {
    pub fn new(player_id: String, reward_id: String, source_session_id: String) -> Self {
        Self {
            player_id,
            reward_id,
            granted: true,
            granted_at: Utc::now(),
            source_session_id,
        }
    }
}
