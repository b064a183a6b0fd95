//! Integration test common infrastructure.
//!
//! Provides a recording platform adapter and engine builders so tests can
//! drive whole event flows and assert on the exact outbound calls.

// Each test binary uses a different slice of this module.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;
use wardend::config::{
    ChannelsConfig, Config, MessagesConfig, RolesConfig, Thresholds, TicketsConfig,
};
use wardend::platform::{
    Actor, ChannelId, Content, FetchedMessage, HistoryLine, MessageId, PermissionGrant, Platform,
    PlatformError, UserId,
};
use wardend::Engine;

pub const SUGGESTIONS: ChannelId = ChannelId(111);
pub const WELCOME: ChannelId = ChannelId(222);
pub const RESULTS: ChannelId = ChannelId(333);
pub const ARCHIVE: ChannelId = ChannelId(444);

/// One recorded outbound platform call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SendMessage(ChannelId, Content),
    SendEphemeral(ChannelId, UserId, Content),
    EditMessage(ChannelId, MessageId, Content),
    DeleteMessage(ChannelId, MessageId),
    AddReaction(ChannelId, MessageId, String),
    CreateChannel(String, usize),
    DeleteChannel(ChannelId),
    SetChannelPermissions(ChannelId, PermissionGrant),
    AssignRole(UserId, String),
    BanUser(UserId, String),
    SendDirectMessage(UserId, Content),
    ChannelHistory(ChannelId),
}

/// Platform stub that records every call and supports targeted failures.
#[derive(Default)]
pub struct RecordingPlatform {
    pub calls: Mutex<Vec<Call>>,
    next_id: AtomicU64,
    pub messages: dashmap::DashMap<MessageId, FetchedMessage>,
    /// Channels where `send_message` fails (e.g. results surface down).
    pub unreachable: Mutex<HashSet<ChannelId>>,
    pub forbid_role_assign: AtomicBool,
    pub forbid_dm: AtomicBool,
    pub history: Mutex<Vec<HistoryLine>>,
}

impl RecordingPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(5000),
            ..Self::default()
        })
    }

    pub async fn recorded(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.calls.lock().await.clear();
    }

    pub async fn make_unreachable(&self, channel: ChannelId) {
        self.unreachable.lock().await.insert(channel);
    }

    /// Simulate member reactions landing on a posted message.
    pub fn react(&self, message: MessageId, emoji: &str, times: u32) {
        if let Some(mut entry) = self.messages.get_mut(&message) {
            if let Some(slot) = entry.reactions.iter_mut().find(|(e, _)| e == emoji) {
                slot.1 += times;
            } else {
                entry.reactions.push((emoji.to_string(), times));
            }
        }
    }

    async fn record(&self, call: Call) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl Platform for RecordingPlatform {
    async fn send_message(
        &self,
        channel: ChannelId,
        content: Content,
    ) -> Result<MessageId, PlatformError> {
        if self.unreachable.lock().await.contains(&channel) {
            return Err(PlatformError::Transient("channel unreachable".into()));
        }
        self.record(Call::SendMessage(channel, content)).await;
        let id = MessageId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.messages.insert(
            id,
            FetchedMessage {
                id,
                channel,
                reactions: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: Content,
    ) -> Result<(), PlatformError> {
        self.record(Call::EditMessage(channel, message, content)).await;
        Ok(())
    }

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError> {
        self.record(Call::DeleteMessage(channel, message)).await;
        self.messages.remove(&message);
        Ok(())
    }

    async fn fetch_message(
        &self,
        _channel: ChannelId,
        message: MessageId,
    ) -> Result<FetchedMessage, PlatformError> {
        self.messages
            .get(&message)
            .map(|e| e.clone())
            .ok_or(PlatformError::NotFound)
    }

    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), PlatformError> {
        self.react(message, emoji, 1);
        self.record(Call::AddReaction(channel, message, emoji.to_string()))
            .await;
        Ok(())
    }

    async fn create_channel(
        &self,
        name: &str,
        grants: &[PermissionGrant],
        _position: u32,
    ) -> Result<ChannelId, PlatformError> {
        self.record(Call::CreateChannel(name.to_string(), grants.len()))
            .await;
        Ok(ChannelId(self.next_id.fetch_add(1, Ordering::Relaxed)))
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), PlatformError> {
        self.record(Call::DeleteChannel(channel)).await;
        Ok(())
    }

    async fn set_channel_permissions(
        &self,
        channel: ChannelId,
        grant: &PermissionGrant,
    ) -> Result<(), PlatformError> {
        self.record(Call::SetChannelPermissions(channel, grant.clone()))
            .await;
        Ok(())
    }

    async fn assign_role(&self, user: UserId, role: &str) -> Result<(), PlatformError> {
        if self.forbid_role_assign.load(Ordering::Relaxed) {
            return Err(PlatformError::Forbidden("role hierarchy".into()));
        }
        self.record(Call::AssignRole(user, role.to_string())).await;
        Ok(())
    }

    async fn ban_user(&self, user: UserId, reason: &str) -> Result<(), PlatformError> {
        self.record(Call::BanUser(user, reason.to_string())).await;
        Ok(())
    }

    async fn send_direct_message(
        &self,
        user: UserId,
        content: Content,
    ) -> Result<(), PlatformError> {
        if self.forbid_dm.load(Ordering::Relaxed) {
            return Err(PlatformError::Forbidden("DMs closed".into()));
        }
        self.record(Call::SendDirectMessage(user, content)).await;
        Ok(())
    }

    async fn send_ephemeral(
        &self,
        channel: ChannelId,
        user: UserId,
        content: Content,
    ) -> Result<(), PlatformError> {
        self.record(Call::SendEphemeral(channel, user, content)).await;
        Ok(())
    }

    async fn channel_history(
        &self,
        channel: ChannelId,
    ) -> Result<Vec<HistoryLine>, PlatformError> {
        self.record(Call::ChannelHistory(channel)).await;
        Ok(self.history.lock().await.clone())
    }
}

/// Config wired to the well-known test channels.
pub fn test_config(data_dir: &Path) -> Config {
    Config {
        data_dir: data_dir.to_path_buf(),
        channels: ChannelsConfig {
            suggestions: SUGGESTIONS,
            welcome: WELCOME,
            results: RESULTS,
            archive: ARCHIVE,
        },
        roles: RolesConfig {
            privileged: vec!["Manager".into(), "Deputy Manager".into()],
            decoration: "👑 ".into(),
        },
        thresholds: Thresholds {
            channel_messages: 5,
            help_messages: 10,
            suggestion_reminders: 5,
        },
        messages: MessagesConfig::default(),
        tickets: TicketsConfig {
            name_prefix: "ticket".into(),
            // Immediate teardown so tests can observe the deferred delete.
            teardown_grace_secs: 0,
            warning_ttl_secs: 0,
        },
    }
}

pub async fn test_engine(data_dir: &Path, platform: Arc<RecordingPlatform>) -> Engine {
    Engine::new(test_config(data_dir), platform)
        .await
        .expect("engine should build")
}

pub fn member(id: u64, name: &str) -> Actor {
    Actor {
        id: UserId(id),
        display_name: name.into(),
        roles: vec!["Member".into()],
        is_bot: false,
    }
}

pub fn staff(id: u64, name: &str) -> Actor {
    Actor {
        id: UserId(id),
        display_name: name.into(),
        roles: vec!["👑 Manager".into()],
        is_bot: false,
    }
}
