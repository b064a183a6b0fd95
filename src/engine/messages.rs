//! Message-posted handling: content policy enforcement and counters.

use super::Engine;
use crate::effect::Effect;
use crate::gate::Verdict;
use crate::platform::{Actor, ChannelId, Content, MessageId};
use std::time::Duration;
use tracing::{info, warn};

impl Engine {
    pub(crate) async fn on_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        author: &Actor,
        content: &str,
    ) {
        if author.is_bot {
            return;
        }

        if channel == self.config.channels.suggestions {
            self.on_suggestions_channel_message(channel, message, author, content)
                .await;
            return;
        }

        // Posting restrictions inside ticket channels.
        if let Some(ticket) = self.workflows.tickets.open_ticket(channel).await {
            if let Verdict::Deny(denial) = self.gate.ticket_message_verdict(author, ticket.creator_id)
            {
                info!(
                    actor = %author.id,
                    channel = %channel,
                    ticket = ticket.number,
                    "Removed non-staff message from ticket channel"
                );
                self.remove_and_warn(channel, message, author, denial.warning(author))
                    .await;
                return;
            }
        }

        // Every non-command human message feeds the global help counter.
        if !content.starts_with(crate::gate::COMMAND_PREFIX) {
            match self.workflows.counters.record_help_eligible().await {
                Ok(Some(_)) => {
                    self.apply(vec![Effect::SendMessage {
                        channel,
                        content: Content::Text(self.config.messages.help.clone()),
                    }])
                    .await;
                    info!(channel = %channel, "Help prompt fired");
                }
                Ok(None) => {}
                Err(e) => warn!(channel = %channel, error = %e, "Help counter update abandoned"),
            }
        }
    }

    /// The restricted suggestions channel: commands-only for regular
    /// members, plus the periodic engagement reminder.
    async fn on_suggestions_channel_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        author: &Actor,
        content: &str,
    ) {
        if let Verdict::Deny(denial) = self.gate.suggestion_message_verdict(author, content) {
            info!(
                actor = %author.id,
                channel = %channel,
                "Removed plain message from suggestions channel"
            );
            self.remove_and_warn(channel, message, author, denial.warning(author))
                .await;
            return;
        }

        match self.workflows.counters.record_channel_message(channel).await {
            Ok(Some(_)) => {
                self.apply(vec![Effect::SendMessage {
                    channel,
                    content: Content::Text(self.config.messages.reminder.clone()),
                }])
                .await;
                info!(channel = %channel, "Engagement reminder fired");
            }
            Ok(None) => {}
            Err(e) => {
                warn!(channel = %channel, error = %e, "Channel counter update abandoned")
            }
        }
    }

    /// Delete the offending message and post a transient warning that
    /// removes itself after the configured TTL.
    async fn remove_and_warn(
        &self,
        channel: ChannelId,
        message: MessageId,
        author: &Actor,
        warning: crate::platform::Embed,
    ) {
        self.apply(vec![Effect::DeleteMessage { channel, message }])
            .await;

        // The warning id is only known after posting, so the deferred
        // delete is scheduled here rather than returned as an effect.
        match self
            .platform
            .send_message(channel, Content::Embed(warning))
            .await
        {
            Ok(warning_id) => {
                self.apply(vec![Effect::ScheduleMessageDelete {
                    channel,
                    message: warning_id,
                    after: Duration::from_secs(self.config.tickets.warning_ttl_secs),
                }])
                .await;
            }
            Err(e) => {
                warn!(actor = %author.id, channel = %channel, error = %e, "Failed to post warning")
            }
        }
    }
}
