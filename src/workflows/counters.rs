//! Message counter service.
//!
//! Per-channel message counters plus two process-wide counters (help
//! prompt, suggestion reminder). Each counter fires a one-shot signal when
//! its threshold is reached and resets to zero in the same persisted
//! write. At rest every counter value is strictly below its threshold.

use crate::config::Thresholds;
use crate::platform::ChannelId;
use crate::store::{Store, StoreError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

const CHANNEL_COUNTERS: &str = "message_counters";
const GLOBAL_COUNTERS: &str = "global_counters";

/// Name of the global help-prompt counter.
pub const HELP_COUNTER: &str = "help";
/// Name of the global suggestion-reminder counter.
pub const SUGGESTION_REMINDER_COUNTER: &str = "suggestion_reminder";

/// One-shot signal that a counter crossed its threshold and was reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired;

/// Per-channel and global counters with threshold-crossing side effects.
pub struct CounterService {
    store: Arc<Store>,
    thresholds: Thresholds,
    /// Channel id (text key) -> count. Guarded writes keep the
    /// increment/fire/reset sequence atomic within the family.
    channels: Mutex<BTreeMap<String, u32>>,
    /// Named global counters, persisted like any other record set.
    globals: Mutex<BTreeMap<String, u32>>,
}

impl CounterService {
    /// Load both counter families from the store.
    pub async fn load(store: Arc<Store>, thresholds: &Thresholds) -> Result<Self, StoreError> {
        let channels: BTreeMap<String, u32> = store.load(CHANNEL_COUNTERS).await?;
        let globals: BTreeMap<String, u32> = store.load(GLOBAL_COUNTERS).await?;
        info!(
            channels = channels.len(),
            "Loaded message counters"
        );
        Ok(Self {
            store,
            thresholds: thresholds.clone(),
            channels: Mutex::new(channels),
            globals: Mutex::new(globals),
        })
    }

    /// Record one qualifying message in a monitored channel.
    ///
    /// Returns `Some(Fired)` when the configured threshold is reached; the
    /// reset to zero is persisted in the same write as the increment, so
    /// concurrent callers can never observe (or double-fire on) the
    /// threshold value.
    pub async fn record_channel_message(
        &self,
        channel: ChannelId,
    ) -> Result<Option<Fired>, StoreError> {
        let mut channels = self.channels.lock().await;
        let count = channels.entry(channel.to_string()).or_insert(0);
        *count += 1;
        let fired = *count >= self.thresholds.channel_messages;
        if fired {
            *count = 0;
        }
        self.store.save(CHANNEL_COUNTERS, &*channels).await?;
        Ok(fired.then_some(Fired))
    }

    /// Record one non-command human message for the help-prompt counter.
    pub async fn record_help_eligible(&self) -> Result<Option<Fired>, StoreError> {
        self.bump_global(HELP_COUNTER, self.thresholds.help_messages)
            .await
    }

    /// Record one suggestion creation for the reminder counter.
    pub async fn record_suggestion_created(&self) -> Result<Option<Fired>, StoreError> {
        self.bump_global(
            SUGGESTION_REMINDER_COUNTER,
            self.thresholds.suggestion_reminders,
        )
        .await
    }

    async fn bump_global(&self, name: &str, threshold: u32) -> Result<Option<Fired>, StoreError> {
        let mut globals = self.globals.lock().await;
        let count = globals.entry(name.to_string()).or_insert(0);
        *count += 1;
        let fired = *count >= threshold;
        if fired {
            *count = 0;
        }
        self.store.save(GLOBAL_COUNTERS, &*globals).await?;
        Ok(fired.then_some(Fired))
    }

    /// Operator reset of one channel counter, or all of them.
    ///
    /// Resetting a channel with no counter is a logged no-op.
    pub async fn reset(&self, channel: Option<ChannelId>) -> Result<(), StoreError> {
        let mut channels = self.channels.lock().await;
        match channel {
            Some(id) => {
                let key = id.to_string();
                match channels.get_mut(&key) {
                    Some(count) => {
                        let old = *count;
                        *count = 0;
                        info!(channel = %id, was = old, "Counter reset");
                    }
                    None => {
                        info!(channel = %id, "No counter to reset");
                        return Ok(());
                    }
                }
            }
            None => {
                let cleared = channels.len();
                channels.clear();
                info!(cleared, "All channel counters reset");
            }
        }
        self.store.save(CHANNEL_COUNTERS, &*channels).await
    }

    /// Current value of a channel counter (zero when absent).
    pub async fn channel_count(&self, channel: ChannelId) -> u32 {
        self.channels
            .lock()
            .await
            .get(&channel.to_string())
            .copied()
            .unwrap_or(0)
    }
}
