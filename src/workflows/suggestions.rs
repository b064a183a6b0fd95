//! Suggestion board.
//!
//! One state machine per suggestion record, keyed by the message that
//! carries its visible representation: `pending -> accepted | denied`,
//! both terminal. Vote tallies are captured once, at transition time.

use crate::error::{WorkflowError, WorkflowResult};
use crate::platform::{Actor, ChannelId, MessageId, UserId};
use crate::store::{Store, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

const SUGGESTIONS: &str = "suggestions";

/// Upvote reaction tracked on suggestion messages.
pub const UPVOTE: &str = "👍";
/// Downvote reaction tracked on suggestion messages.
pub const DOWNVOTE: &str = "👎";

/// Lifecycle state of a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    Pending,
    Accepted,
    Denied,
}

/// Review outcome requested by a moderator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Accept,
    Deny,
}

/// Final vote tally captured at transition time, system reactions excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Votes {
    pub up: u32,
    pub down: u32,
}

/// A persisted suggestion record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRecord {
    pub author_id: UserId,
    pub author_name: String,
    pub text: String,
    pub status: SuggestionStatus,
    pub created_at: DateTime<Utc>,
    pub channel_id: ChannelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_votes: Option<Votes>,
}

/// Suggestion records keyed by message id (text).
pub struct SuggestionBoard {
    store: Arc<Store>,
    records: Mutex<BTreeMap<String, SuggestionRecord>>,
}

impl SuggestionBoard {
    pub async fn load(store: Arc<Store>) -> Result<Self, StoreError> {
        let records: BTreeMap<String, SuggestionRecord> = store.load(SUGGESTIONS).await?;
        Ok(Self {
            store,
            records: Mutex::new(records),
        })
    }

    /// Persist a new pending record under the id of its freshly posted
    /// representation.
    pub async fn register(
        &self,
        message: MessageId,
        author: &Actor,
        text: String,
        channel: ChannelId,
    ) -> Result<SuggestionRecord, StoreError> {
        let record = SuggestionRecord {
            author_id: author.id,
            author_name: author.display_name.clone(),
            text,
            status: SuggestionStatus::Pending,
            created_at: Utc::now(),
            channel_id: channel,
            reviewed_by: None,
            reviewed_at: None,
            final_votes: None,
        };

        let mut records = self.records.lock().await;
        records.insert(message.to_string(), record.clone());
        self.store.save(SUGGESTIONS, &*records).await?;

        info!(message = %message, author = %author.id, "Suggestion registered");
        Ok(record)
    }

    /// Current record for a message, if any.
    pub async fn get(&self, message: MessageId) -> Option<SuggestionRecord> {
        self.records.lock().await.get(&message.to_string()).cloned()
    }

    /// Transition a pending record to its terminal state.
    ///
    /// Status, reviewer, timestamp, and the captured tally are written in
    /// one persisted update. A record already in a terminal state yields
    /// `AlreadyResolved` and is left byte-for-byte unchanged.
    pub async fn resolve(
        &self,
        message: MessageId,
        resolution: Resolution,
        reviewer: UserId,
        votes: Votes,
    ) -> WorkflowResult<SuggestionRecord> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(&message.to_string())
            .ok_or(WorkflowError::NotFound("suggestion"))?;

        if record.status != SuggestionStatus::Pending {
            return Err(WorkflowError::AlreadyResolved);
        }

        record.status = match resolution {
            Resolution::Accept => SuggestionStatus::Accepted,
            Resolution::Deny => SuggestionStatus::Denied,
        };
        record.reviewed_by = Some(reviewer);
        record.reviewed_at = Some(Utc::now());
        record.final_votes = Some(votes);
        let resolved = record.clone();
        self.store.save(SUGGESTIONS, &*records).await?;

        info!(
            message = %message,
            reviewer = %reviewer,
            status = ?resolved.status,
            up = votes.up,
            down = votes.down,
            "Suggestion resolved"
        );
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> Actor {
        Actor {
            id: UserId(42),
            display_name: "ada".into(),
            roles: vec!["Member".into()],
            is_bot: false,
        }
    }

    async fn board() -> (tempfile::TempDir, SuggestionBoard) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path()).await.unwrap());
        let board = SuggestionBoard::load(store).await.unwrap();
        (dir, board)
    }

    #[tokio::test]
    async fn register_creates_pending_record() {
        let (_dir, board) = board().await;
        let record = board
            .register(MessageId(1), &author(), "dark theme".into(), ChannelId(9))
            .await
            .unwrap();
        assert_eq!(record.status, SuggestionStatus::Pending);
        assert!(record.final_votes.is_none());
        assert!(board.get(MessageId(1)).await.is_some());
    }

    #[tokio::test]
    async fn resolve_writes_tally_and_reviewer() {
        let (_dir, board) = board().await;
        board
            .register(MessageId(1), &author(), "dark theme".into(), ChannelId(9))
            .await
            .unwrap();

        let resolved = board
            .resolve(
                MessageId(1),
                Resolution::Accept,
                UserId(7),
                Votes { up: 4, down: 1 },
            )
            .await
            .unwrap();
        assert_eq!(resolved.status, SuggestionStatus::Accepted);
        assert_eq!(resolved.reviewed_by, Some(UserId(7)));
        assert_eq!(resolved.final_votes, Some(Votes { up: 4, down: 1 }));
    }

    #[tokio::test]
    async fn second_resolve_is_already_resolved_and_changes_nothing() {
        let (_dir, board) = board().await;
        board
            .register(MessageId(1), &author(), "dark theme".into(), ChannelId(9))
            .await
            .unwrap();
        board
            .resolve(
                MessageId(1),
                Resolution::Deny,
                UserId(7),
                Votes { up: 0, down: 3 },
            )
            .await
            .unwrap();

        let before = board.get(MessageId(1)).await.unwrap();
        let err = board
            .resolve(
                MessageId(1),
                Resolution::Accept,
                UserId(8),
                Votes { up: 99, down: 0 },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyResolved));

        let after = board.get(MessageId(1)).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn resolve_unknown_id_is_not_found() {
        let (_dir, board) = board().await;
        let err = board
            .resolve(MessageId(404), Resolution::Accept, UserId(7), Votes::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound("suggestion")));
    }

    #[tokio::test]
    async fn records_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path()).await.unwrap());
        let board = SuggestionBoard::load(Arc::clone(&store)).await.unwrap();
        board
            .register(MessageId(5), &author(), "longer events".into(), ChannelId(9))
            .await
            .unwrap();

        let reloaded = SuggestionBoard::load(store).await.unwrap();
        let record = reloaded.get(MessageId(5)).await.unwrap();
        assert_eq!(record.text, "longer events");
        assert_eq!(record.status, SuggestionStatus::Pending);
    }
}
