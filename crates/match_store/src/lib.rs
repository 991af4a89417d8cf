pub mod error;
pub mod ledger;
pub mod memory;
pub mod session;

pub use error::StoreError;
pub use ledger::{GrantInsert, LedgerStore};
pub use memory::{InMemoryLedger, InMemorySessionStore};
pub use session::{
    EventAppend, InsertOutcome, PendingRewardAdd, SessionStore, StateTransition, TransitionEffects,
};
