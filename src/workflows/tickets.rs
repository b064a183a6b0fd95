//! Ticket desk.
//!
//! One state machine per support ticket: `open -> closed`, terminal. Each
//! ticket is backed by an isolated provisioned channel and keyed by that
//! channel's id. The monotonic sequence counter is persisted in the same
//! snapshot as the records, so restarts never reuse a number. Closed
//! records are retained for audit after their channel is torn down.

use crate::error::{WorkflowError, WorkflowResult};
use crate::platform::{Actor, ChannelId, HistoryLine, UserId};
use crate::store::{Store, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

const TICKETS: &str = "tickets";

/// Lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    Closed,
}

/// A persisted ticket record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub number: u64,
    pub creator_id: UserId,
    pub creator_name: String,
    pub reason: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

/// The whole persisted family: sequence counter plus records keyed by
/// channel id (text).
#[derive(Debug, Default, Serialize, Deserialize)]
struct TicketSet {
    counter: u64,
    tickets: BTreeMap<String, TicketRecord>,
}

/// A ticket whose sequence number is drawn but whose channel is not yet
/// provisioned. Commit with the new channel id once provisioning succeeds;
/// a number consumed by a failed provision is simply skipped.
#[derive(Debug, Clone)]
pub struct PendingTicket {
    pub number: u64,
    pub channel_name: String,
    record: TicketRecord,
}

/// Ticket records and the monotonic sequence counter.
pub struct TicketDesk {
    store: Arc<Store>,
    name_prefix: String,
    state: Mutex<TicketSet>,
}

impl TicketDesk {
    pub async fn load(store: Arc<Store>, name_prefix: String) -> Result<Self, StoreError> {
        let state: TicketSet = store.load(TICKETS).await?;
        info!(
            counter = state.counter,
            open = state
                .tickets
                .values()
                .filter(|t| t.status == TicketStatus::Open)
                .count(),
            "Loaded ticket ledger"
        );
        Ok(Self {
            store,
            name_prefix,
            state: Mutex::new(state),
        })
    }

    /// Draw the next sequence number and persist it before any channel
    /// exists, so a crash between draw and commit can never reuse it.
    pub async fn begin(&self, creator: &Actor, reason: String) -> Result<PendingTicket, StoreError> {
        let mut state = self.state.lock().await;
        state.counter += 1;
        let number = state.counter;
        self.store.save(TICKETS, &*state).await?;

        Ok(PendingTicket {
            number,
            channel_name: format!("{}-{number:04}", self.name_prefix),
            record: TicketRecord {
                number,
                creator_id: creator.id,
                creator_name: creator.display_name.clone(),
                reason,
                status: TicketStatus::Open,
                created_at: Utc::now(),
                closed_by: None,
                closed_at: None,
            },
        })
    }

    /// Persist the open record under its provisioned channel id.
    pub async fn commit(
        &self,
        channel: ChannelId,
        pending: PendingTicket,
    ) -> Result<TicketRecord, StoreError> {
        let mut state = self.state.lock().await;
        let record = pending.record;
        state.tickets.insert(channel.to_string(), record.clone());
        self.store.save(TICKETS, &*state).await?;
        info!(channel = %channel, number = record.number, "Ticket opened");
        Ok(record)
    }

    /// The open ticket backing a channel, if any. Recognition is by
    /// record lookup, never by channel-name sniffing.
    pub async fn open_ticket(&self, channel: ChannelId) -> Option<TicketRecord> {
        self.state
            .lock()
            .await
            .tickets
            .get(&channel.to_string())
            .filter(|t| t.status == TicketStatus::Open)
            .cloned()
    }

    /// Any ticket record for a channel, open or closed.
    pub async fn get(&self, channel: ChannelId) -> Option<TicketRecord> {
        self.state
            .lock()
            .await
            .tickets
            .get(&channel.to_string())
            .cloned()
    }

    /// Validate that a channel hosts an open ticket before the engine
    /// grants a participant access to it.
    pub async fn participant_grant(&self, channel: ChannelId) -> WorkflowResult<TicketRecord> {
        self.open_ticket(channel)
            .await
            .ok_or(WorkflowError::NotTicketChannel)
    }

    /// Transition a ticket to closed with closer identity and timestamp.
    ///
    /// The record is retained for audit; only its backing channel goes
    /// away, and that teardown is the engine's concern.
    pub async fn close(&self, channel: ChannelId, closer: &Actor) -> WorkflowResult<TicketRecord> {
        let mut state = self.state.lock().await;
        let record = state
            .tickets
            .get_mut(&channel.to_string())
            .ok_or(WorkflowError::NotFound("ticket"))?;

        if record.status == TicketStatus::Closed {
            return Err(WorkflowError::AlreadyResolved);
        }

        record.status = TicketStatus::Closed;
        record.closed_by = Some(closer.id);
        record.closed_at = Some(Utc::now());
        let closed = record.clone();
        self.store.save(TICKETS, &*state).await?;

        info!(channel = %channel, number = closed.number, closer = %closer.id, "Ticket closed");
        Ok(closed)
    }
}

/// Render a ticket's full message history to a plain-text export.
///
/// Includes human messages and system embeds, matching the archived
/// format users already know.
pub fn render_transcript(record: &TicketRecord, history: &[HistoryLine]) -> String {
    let mut out = String::new();
    out.push_str(&format!("TICKET #{:04} TRANSCRIPT\n", record.number));
    out.push_str(&format!("Creator: {}\n", record.creator_name));
    out.push_str(&format!("Reason: {}\n", record.reason));
    out.push_str(&format!("Opened: {}\n", record.created_at.to_rfc3339()));
    if let Some(closed_at) = record.closed_at {
        out.push_str(&format!("Closed: {}\n", closed_at.to_rfc3339()));
    }
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");

    for line in history {
        if line.author_is_bot && !line.has_embed {
            continue;
        }
        let content = if line.content.is_empty() {
            "[embed/attachment]"
        } else {
            line.content.as_str()
        };
        out.push_str(&format!(
            "[{}] {}: {content}\n",
            line.timestamp.format("%d/%m/%Y %H:%M:%S"),
            line.author
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creator() -> Actor {
        Actor {
            id: UserId(42),
            display_name: "ada".into(),
            roles: vec!["Member".into()],
            is_bot: false,
        }
    }

    fn staff() -> Actor {
        Actor {
            id: UserId(7),
            display_name: "mod".into(),
            roles: vec!["Manager".into()],
            is_bot: false,
        }
    }

    async fn desk() -> (tempfile::TempDir, TicketDesk) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path()).await.unwrap());
        let desk = TicketDesk::load(store, "ticket".into()).await.unwrap();
        (dir, desk)
    }

    #[tokio::test]
    async fn sequence_numbers_strictly_increase() {
        let (_dir, desk) = desk().await;
        let a = desk.begin(&creator(), "billing".into()).await.unwrap();
        let b = desk.begin(&creator(), "report".into()).await.unwrap();
        assert_eq!(a.number, 1);
        assert_eq!(b.number, 2);
        assert_eq!(a.channel_name, "ticket-0001");
    }

    #[tokio::test]
    async fn numbers_never_reused_across_restart() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path()).await.unwrap());
        let desk = TicketDesk::load(Arc::clone(&store), "ticket".into())
            .await
            .unwrap();
        let first = desk.begin(&creator(), "one".into()).await.unwrap();
        // Not committed: the drawn number must still be burned.
        drop(first);

        let reloaded = TicketDesk::load(store, "ticket".into()).await.unwrap();
        let next = reloaded.begin(&creator(), "two".into()).await.unwrap();
        assert_eq!(next.number, 2);
    }

    #[tokio::test]
    async fn close_transitions_once() {
        let (_dir, desk) = desk().await;
        let pending = desk.begin(&creator(), "billing".into()).await.unwrap();
        let channel = ChannelId(500);
        desk.commit(channel, pending).await.unwrap();

        let closed = desk.close(channel, &staff()).await.unwrap();
        assert_eq!(closed.status, TicketStatus::Closed);
        assert_eq!(closed.closed_by, Some(UserId(7)));

        let err = desk.close(channel, &staff()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyResolved));

        // Retained for audit after closure.
        assert!(desk.get(channel).await.is_some());
        assert!(desk.open_ticket(channel).await.is_none());
    }

    #[tokio::test]
    async fn close_without_record_is_not_found() {
        let (_dir, desk) = desk().await;
        let err = desk.close(ChannelId(404), &staff()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound("ticket")));
    }

    #[tokio::test]
    async fn participant_grant_requires_open_ticket() {
        let (_dir, desk) = desk().await;
        let err = desk.participant_grant(ChannelId(404)).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotTicketChannel));

        let pending = desk.begin(&creator(), "help".into()).await.unwrap();
        desk.commit(ChannelId(500), pending).await.unwrap();
        assert!(desk.participant_grant(ChannelId(500)).await.is_ok());

        desk.close(ChannelId(500), &staff()).await.unwrap();
        let err = desk.participant_grant(ChannelId(500)).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotTicketChannel));
    }

    #[tokio::test]
    async fn transcript_skips_plain_bot_chatter() {
        let (_dir, desk) = desk().await;
        let pending = desk.begin(&creator(), "billing".into()).await.unwrap();
        let record = desk.commit(ChannelId(500), pending).await.unwrap();

        let history = vec![
            HistoryLine {
                timestamp: Utc::now(),
                author: "ada".into(),
                author_is_bot: false,
                content: "my payment failed".into(),
                has_embed: false,
            },
            HistoryLine {
                timestamp: Utc::now(),
                author: "wardend".into(),
                author_is_bot: true,
                content: "internal ping".into(),
                has_embed: false,
            },
            HistoryLine {
                timestamp: Utc::now(),
                author: "wardend".into(),
                author_is_bot: true,
                content: String::new(),
                has_embed: true,
            },
        ];
        let transcript = render_transcript(&record, &history);
        assert!(transcript.contains("TICKET #0001 TRANSCRIPT"));
        assert!(transcript.contains("my payment failed"));
        assert!(!transcript.contains("internal ping"));
        assert!(transcript.contains("[embed/attachment]"));
    }
}
