pub mod catalog;
pub mod reward;
pub mod session;
pub mod ticket;
pub mod time;

pub use catalog::{CatalogParseError, RewardCatalog, RewardCatalogEntry};
pub use reward::RewardGrant;
pub use session::{InteractionEvent, SessionRecord, SessionState, SessionSummary};
pub use ticket::{
    AttributeValue, ConnectionInfo, MatchTicket, MatchedPlayerSession, TicketPlayer, TicketStatus,
};
pub use time::{ttl_epoch, SESSION_TTL_SECS};
