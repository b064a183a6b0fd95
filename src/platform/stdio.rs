//! Line-delimited JSON adapter.
//!
//! Lets the daemon run end-to-end without a chat SDK: inbound events are
//! read from stdin (one JSON object per line, see [`super::Event`]) and
//! every outbound platform call is emitted as a JSON line on stdout.
//! Created channels and posted messages get locally allocated identifiers
//! so workflows that key off them still function.

use super::{
    ChannelId, Content, FetchedMessage, HistoryLine, MessageId, PermissionGrant, Platform,
    PlatformError, UserId,
};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::json;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Adapter speaking line-delimited JSON on stdout.
pub struct StdioPlatform {
    next_id: AtomicU64,
    /// Reaction mirror for locally posted messages, so `fetch_message`
    /// reflects reactions this process added itself.
    messages: DashMap<MessageId, FetchedMessage>,
}

impl StdioPlatform {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1_000_000),
            messages: DashMap::new(),
        }
    }

    fn allocate(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn emit(&self, call: serde_json::Value) -> Result<(), PlatformError> {
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer(&mut stdout, &call)
            .map_err(|e| PlatformError::Transient(e.to_string()))?;
        writeln!(stdout).map_err(|e| PlatformError::Transient(e.to_string()))?;
        Ok(())
    }
}

impl Default for StdioPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for StdioPlatform {
    async fn send_message(
        &self,
        channel: ChannelId,
        content: Content,
    ) -> Result<MessageId, PlatformError> {
        let id = MessageId(self.allocate());
        self.emit(json!({
            "call": "send_message",
            "channel": channel,
            "message": id,
            "content": content,
        }))?;
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
        self.emit(json!({
            "call": "edit_message",
            "channel": channel,
            "message": message,
            "content": content,
        }))
    }

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError> {
        self.messages.remove(&message);
        self.emit(json!({
            "call": "delete_message",
            "channel": channel,
            "message": message,
        }))
    }

    async fn fetch_message(
        &self,
        _channel: ChannelId,
        message: MessageId,
    ) -> Result<FetchedMessage, PlatformError> {
        self.messages
            .get(&message)
            .map(|entry| entry.clone())
            .ok_or(PlatformError::NotFound)
    }

    async fn add_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<(), PlatformError> {
        if let Some(mut entry) = self.messages.get_mut(&message) {
            if let Some(slot) = entry.reactions.iter_mut().find(|(e, _)| e == emoji) {
                slot.1 += 1;
            } else {
                entry.reactions.push((emoji.to_string(), 1));
            }
        }
        self.emit(json!({
            "call": "add_reaction",
            "channel": channel,
            "message": message,
            "emoji": emoji,
        }))
    }

    async fn create_channel(
        &self,
        name: &str,
        grants: &[PermissionGrant],
        position: u32,
    ) -> Result<ChannelId, PlatformError> {
        let id = ChannelId(self.allocate());
        self.emit(json!({
            "call": "create_channel",
            "channel": id,
            "name": name,
            "grants": grants,
            "position": position,
        }))?;
        Ok(id)
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), PlatformError> {
        self.emit(json!({
            "call": "delete_channel",
            "channel": channel,
        }))
    }

    async fn set_channel_permissions(
        &self,
        channel: ChannelId,
        grant: &PermissionGrant,
    ) -> Result<(), PlatformError> {
        self.emit(json!({
            "call": "set_channel_permissions",
            "channel": channel,
            "grant": grant,
        }))
    }

    async fn assign_role(&self, user: UserId, role: &str) -> Result<(), PlatformError> {
        self.emit(json!({
            "call": "assign_role",
            "user": user,
            "role": role,
        }))
    }

    async fn ban_user(&self, user: UserId, reason: &str) -> Result<(), PlatformError> {
        self.emit(json!({
            "call": "ban_user",
            "user": user,
            "reason": reason,
        }))
    }

    async fn send_direct_message(
        &self,
        user: UserId,
        content: Content,
    ) -> Result<(), PlatformError> {
        self.emit(json!({
            "call": "send_direct_message",
            "user": user,
            "content": content,
        }))
    }

    async fn send_ephemeral(
        &self,
        channel: ChannelId,
        user: UserId,
        content: Content,
    ) -> Result<(), PlatformError> {
        self.emit(json!({
            "call": "send_ephemeral",
            "channel": channel,
            "user": user,
            "content": content,
        }))
    }

    async fn channel_history(
        &self,
        channel: ChannelId,
    ) -> Result<Vec<HistoryLine>, PlatformError> {
        // The stdio feed does not replay history; emit the call so a
        // wrapping harness can observe it, and return an empty transcript.
        self.emit(json!({
            "call": "channel_history",
            "channel": channel,
        }))?;
        Ok(Vec::new())
    }
}
