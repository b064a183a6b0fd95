//! Platform adapter seam.
//!
//! The core never talks to a chat platform directly; it consumes the
//! narrow [`Platform`] trait and the inbound [`Event`] feed. Adapters
//! implement the trait outside the core and carry no workflow logic.

pub mod stdio;

use crate::workflows::strikes::Severity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl $name {
            /// Parse back from a text store key.
            pub fn parse(key: &str) -> Option<Self> {
                key.parse().ok().map(Self)
            }
        }
    };
}

id_type!(
    /// Platform user identifier.
    UserId
);
id_type!(
    /// Platform channel identifier.
    ChannelId
);
id_type!(
    /// Platform message identifier.
    MessageId
);

/// The acting user attached to an inbound event, with the live role names
/// effective at the moment of the request. Effective permission is derived
/// from these, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub display_name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub is_bot: bool,
}

/// Inbound platform events, each tagged with actor, channel, and payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    MessagePosted {
        channel: ChannelId,
        message: MessageId,
        author: Actor,
        content: String,
    },
    ReactionAdded {
        channel: ChannelId,
        message: MessageId,
        actor: Actor,
        emoji: String,
    },
    MemberJoined {
        member: Actor,
    },
    MemberLeft {
        member: Actor,
    },
    CommandInvoked {
        channel: ChannelId,
        actor: Actor,
        #[serde(flatten)]
        command: CommandInvocation,
    },
}

/// Slash-style command invocations routed through the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandInvocation {
    StrikeAdd {
        target: Actor,
        severity: Severity,
        reason: String,
    },
    StrikeCheck {
        target: Actor,
    },
    StrikeRemove {
        target: Actor,
    },
    Accept {
        target: Actor,
        role: String,
    },
    Deny {
        target: Actor,
    },
    SuggestCreate {
        text: String,
    },
    SuggestAccept {
        message_id: MessageId,
    },
    SuggestDeny {
        message_id: MessageId,
    },
    TicketOpen {
        reason: Option<String>,
    },
    TicketClose,
    TicketAddUser {
        target: Actor,
    },
    CounterReset {
        channel: Option<ChannelId>,
    },
}

/// Message payloads: plain text, a rich embed, or a text-file attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Content {
    Text(String),
    Embed(Embed),
    File { name: String, body: String },
}

/// A rich embed. Field pairs are (name, value).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub fields: Vec<(String, String)>,
    #[serde(default)]
    pub color: u32,
}

impl Embed {
    pub fn new(title: impl Into<String>, description: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            fields: Vec::new(),
            color,
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }
}

/// A fetched message with its current reaction tallies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedMessage {
    pub id: MessageId,
    pub channel: ChannelId,
    /// (emoji, total count) pairs, system reactions included.
    #[serde(default)]
    pub reactions: Vec<(String, u32)>,
}

impl FetchedMessage {
    /// Total count for one reaction emoji.
    pub fn reaction_count(&self, emoji: &str) -> u32 {
        self.reactions
            .iter()
            .find(|(e, _)| e == emoji)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// One line of channel history, as rendered into transcripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryLine {
    pub timestamp: DateTime<Utc>,
    pub author: String,
    #[serde(default)]
    pub author_is_bot: bool,
    pub content: String,
    #[serde(default)]
    pub has_embed: bool,
}

/// Who a channel permission override applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantSubject {
    Everyone,
    User(UserId),
    Role(String),
}

/// A read/write permission override on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub subject: GrantSubject,
    pub read: bool,
    pub write: bool,
}

impl PermissionGrant {
    pub fn deny(subject: GrantSubject) -> Self {
        Self {
            subject,
            read: false,
            write: false,
        }
    }

    pub fn read_write(subject: GrantSubject) -> Self {
        Self {
            subject,
            read: true,
            write: true,
        }
    }
}

/// Platform call failures, converted from the platform's own exception
/// or status vocabulary by the adapter.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    /// The platform refused the action (hierarchy, closed DMs, missing
    /// bot permission). Carries remediation text for the operator.
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found")]
    NotFound,
    #[error("transient platform failure: {0}")]
    Transient(String),
}

/// Outbound operations the core is allowed to perform.
///
/// All calls are expected to complete or fail within the platform's own
/// timeout; none may block indefinitely.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn send_message(
        &self,
        channel: ChannelId,
        content: Content,
    ) -> Result<MessageId, PlatformError>;

    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: Content,
    ) -> Result<(), PlatformError>;

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError>;

    async fn fetch_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<FetchedMessage, PlatformError>;

    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), PlatformError>;

    async fn create_channel(
        &self,
        name: &str,
        grants: &[PermissionGrant],
        position: u32,
    ) -> Result<ChannelId, PlatformError>;

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), PlatformError>;

    async fn set_channel_permissions(
        &self,
        channel: ChannelId,
        grant: &PermissionGrant,
    ) -> Result<(), PlatformError>;

    async fn assign_role(&self, user: UserId, role: &str) -> Result<(), PlatformError>;

    async fn ban_user(&self, user: UserId, reason: &str) -> Result<(), PlatformError>;

    async fn send_direct_message(
        &self,
        user: UserId,
        content: Content,
    ) -> Result<(), PlatformError>;

    /// Private, non-persistent reply to the triggering actor.
    async fn send_ephemeral(
        &self,
        channel: ChannelId,
        user: UserId,
        content: Content,
    ) -> Result<(), PlatformError>;

    /// Full message history of a channel, oldest first.
    async fn channel_history(&self, channel: ChannelId)
    -> Result<Vec<HistoryLine>, PlatformError>;
}
