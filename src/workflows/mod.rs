//! Persisted workflow state machines.
//!
//! Each component owns one record family, loaded at start and saved on
//! every mutation. Read-modify-write on a family happens under that
//! family's own `tokio::sync::Mutex`, making each transition one atomic
//! unit with respect to other operations on the same key; different
//! families never block each other.

pub mod counters;
pub mod strikes;
pub mod suggestions;
pub mod tickets;

use crate::config::Config;
use crate::store::{Store, StoreError};
use std::sync::Arc;

/// The four stateful components, loaded from one store.
pub struct Workflows {
    pub counters: counters::CounterService,
    pub strikes: strikes::StrikeLedger,
    pub suggestions: suggestions::SuggestionBoard,
    pub tickets: tickets::TicketDesk,
}

impl Workflows {
    /// Load every record family from the store.
    pub async fn load(store: Arc<Store>, config: &Config) -> Result<Self, StoreError> {
        Ok(Self {
            counters: counters::CounterService::load(Arc::clone(&store), &config.thresholds)
                .await?,
            strikes: strikes::StrikeLedger::load(Arc::clone(&store)).await?,
            suggestions: suggestions::SuggestionBoard::load(Arc::clone(&store)).await?,
            tickets: tickets::TicketDesk::load(store, config.tickets.name_prefix.clone()).await?,
        })
    }
}
