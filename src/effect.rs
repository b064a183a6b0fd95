//! Side-effect commands.
//!
//! Workflow handlers produce effects; the engine applies them through the
//! [`Platform`] trait. This decouples workflow logic from platform I/O and
//! keeps every outbound failure on one logging path. Scheduled effects are
//! best-effort delays: spawned, attempted once, logged on failure, never
//! retried, and lost on restart by design.

use crate::platform::{
    ChannelId, Content, MessageId, PermissionGrant, Platform, PlatformError, UserId,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Unified effect type returned by command handlers.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Post a message to a channel.
    SendMessage { channel: ChannelId, content: Content },

    /// Private, non-persistent reply to the triggering actor.
    SendEphemeral {
        channel: ChannelId,
        user: UserId,
        content: Content,
    },

    /// Replace a message's content in place.
    EditMessage {
        channel: ChannelId,
        message: MessageId,
        content: Content,
    },

    /// Remove a message immediately.
    DeleteMessage {
        channel: ChannelId,
        message: MessageId,
    },

    /// Remove a message after a delay (transient warnings).
    ScheduleMessageDelete {
        channel: ChannelId,
        message: MessageId,
        after: Duration,
    },

    /// Tear down a channel after a grace delay (closed tickets).
    DeleteChannelAfter { channel: ChannelId, after: Duration },

    /// Grant or revoke a user's access to a channel.
    SetChannelPermissions {
        channel: ChannelId,
        grant: PermissionGrant,
    },

    /// Assign a role to a user.
    AssignRole { user: UserId, role: String },

    /// Ban a user from the server.
    BanUser { user: UserId, reason: String },

    /// Direct-message a user.
    SendDirectMessage { user: UserId, content: Content },
}

impl Effect {
    fn kind(&self) -> &'static str {
        match self {
            Self::SendMessage { .. } => "send_message",
            Self::SendEphemeral { .. } => "send_ephemeral",
            Self::EditMessage { .. } => "edit_message",
            Self::DeleteMessage { .. } => "delete_message",
            Self::ScheduleMessageDelete { .. } => "schedule_message_delete",
            Self::DeleteChannelAfter { .. } => "delete_channel_after",
            Self::SetChannelPermissions { .. } => "set_channel_permissions",
            Self::AssignRole { .. } => "assign_role",
            Self::BanUser { .. } => "ban_user",
            Self::SendDirectMessage { .. } => "send_direct_message",
        }
    }
}

/// Apply a list of effects sequentially.
///
/// Failures are logged with context and do not abort the remaining
/// effects; the persisted state already reflects the transition.
pub async fn apply_effects(platform: &Arc<dyn Platform>, effects: Vec<Effect>) {
    for effect in effects {
        let kind = effect.kind();
        if let Err(e) = apply_effect(platform, effect).await {
            warn!(effect = kind, error = %e, "Effect failed");
        }
    }
}

async fn apply_effect(platform: &Arc<dyn Platform>, effect: Effect) -> Result<(), PlatformError> {
    match effect {
        Effect::SendMessage { channel, content } => {
            platform.send_message(channel, content).await?;
        }

        Effect::SendEphemeral {
            channel,
            user,
            content,
        } => {
            platform.send_ephemeral(channel, user, content).await?;
        }

        Effect::EditMessage {
            channel,
            message,
            content,
        } => {
            platform.edit_message(channel, message, content).await?;
        }

        Effect::DeleteMessage { channel, message } => {
            platform.delete_message(channel, message).await?;
        }

        Effect::ScheduleMessageDelete {
            channel,
            message,
            after,
        } => {
            let platform = Arc::clone(platform);
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                if let Err(e) = platform.delete_message(channel, message).await {
                    warn!(channel = %channel, message = %message, error = %e,
                        "Deferred message delete failed");
                }
            });
        }

        Effect::DeleteChannelAfter { channel, after } => {
            let platform = Arc::clone(platform);
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                match platform.delete_channel(channel).await {
                    Ok(()) => info!(channel = %channel, "Channel torn down"),
                    Err(e) => {
                        warn!(channel = %channel, error = %e, "Channel teardown failed")
                    }
                }
            });
        }

        Effect::SetChannelPermissions { channel, grant } => {
            platform.set_channel_permissions(channel, &grant).await?;
        }

        Effect::AssignRole { user, role } => {
            platform.assign_role(user, &role).await?;
        }

        Effect::BanUser { user, reason } => {
            platform.ban_user(user, &reason).await?;
        }

        Effect::SendDirectMessage { user, content } => {
            platform.send_direct_message(user, content).await?;
        }
    }
    Ok(())
}
