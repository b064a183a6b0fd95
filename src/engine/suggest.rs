//! Suggestion commands: creation, voting activity, and review.

use super::{COLOR_DANGER, COLOR_INFO, COLOR_SUCCESS, Engine};
use crate::effect::Effect;
use crate::error::{WorkflowError, WorkflowResult};
use crate::platform::{Actor, ChannelId, Content, Embed, MessageId};
use crate::workflows::suggestions::{
    DOWNVOTE, Resolution, SuggestionRecord, SuggestionStatus, UPVOTE, Votes,
};
use tracing::{debug, info, warn};

impl Engine {
    /// Post the suggestion embed, seed the vote reactions, persist the
    /// record under the new message id, and surface the reminder counter's
    /// fire signal.
    pub(crate) async fn cmd_suggest_create(
        &self,
        channel: ChannelId,
        actor: &Actor,
        text: String,
    ) -> WorkflowResult<Vec<Effect>> {
        let target = self.config.channels.suggestions;
        let embed = Embed::new("💡 New suggestion", text.clone(), COLOR_INFO)
            .field("Submitted by", actor.display_name.clone())
            .field("Status", "Pending • react 👍 / 👎 to vote");

        // The record is keyed by the posted representation, so the post
        // happens first; a failure here leaves no record behind.
        let message = self
            .platform
            .send_message(target, Content::Embed(embed))
            .await?;
        for emoji in [UPVOTE, DOWNVOTE] {
            if let Err(e) = self.platform.add_reaction(target, message, emoji).await {
                warn!(message = %message, emoji, error = %e, "Seed reaction failed");
            }
        }

        self.workflows
            .suggestions
            .register(message, actor, text, target)
            .await?;

        let mut effects = vec![Effect::SendEphemeral {
            channel,
            user: actor.id,
            content: Content::Text("✅ Your suggestion has been submitted!".to_string()),
        }];

        match self.workflows.counters.record_suggestion_created().await {
            Ok(Some(_)) => {
                info!("Suggestion reminder fired");
                effects.push(Effect::SendMessage {
                    channel: target,
                    content: Content::Text(self.config.messages.reminder.clone()),
                });
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Suggestion reminder counter update abandoned"),
        }

        Ok(effects)
    }

    /// Resolve a pending suggestion and relocate its representation to
    /// the results surface.
    pub(crate) async fn cmd_suggest_resolve(
        &self,
        channel: ChannelId,
        actor: &Actor,
        message_id: MessageId,
        resolution: Resolution,
    ) -> WorkflowResult<Vec<Effect>> {
        self.require_privilege(actor)?;

        let record = self
            .workflows
            .suggestions
            .get(message_id)
            .await
            .ok_or(WorkflowError::NotFound("suggestion"))?;
        if record.status != SuggestionStatus::Pending {
            return Err(WorkflowError::AlreadyResolved);
        }

        // Capture the tally before the original message goes anywhere.
        let fetched = self
            .platform
            .fetch_message(record.channel_id, message_id)
            .await
            .map_err(|_| WorkflowError::NotFound("suggestion message"))?;
        // Each tracked count excludes the system's own seed reaction.
        let votes = Votes {
            up: fetched.reaction_count(UPVOTE).saturating_sub(1),
            down: fetched.reaction_count(DOWNVOTE).saturating_sub(1),
        };

        let resolved = self
            .workflows
            .suggestions
            .resolve(message_id, resolution, actor.id, votes)
            .await?;

        self.relocate_to_results(message_id, &resolved, actor).await;

        let confirmation = match resolution {
            Resolution::Accept => "✅ Suggestion accepted and moved to results.",
            Resolution::Deny => "❌ Suggestion denied and moved to results.",
        };
        Ok(vec![Effect::SendEphemeral {
            channel,
            user: actor.id,
            content: Content::Text(confirmation.to_string()),
        }])
    }

    /// Best-effort relocation of the resolved representation. When the
    /// results surface is unavailable the record has still transitioned;
    /// the embed is updated in place and the divergence logged.
    async fn relocate_to_results(
        &self,
        message_id: MessageId,
        record: &SuggestionRecord,
        reviewer: &Actor,
    ) {
        let embed = resolved_embed(record, reviewer);
        match self
            .platform
            .send_message(self.config.channels.results, Content::Embed(embed.clone()))
            .await
        {
            Ok(_) => {
                if let Err(e) = self
                    .platform
                    .delete_message(record.channel_id, message_id)
                    .await
                {
                    warn!(message = %message_id, error = %e, "Original suggestion not deleted");
                }
                info!(message = %message_id, "Suggestion moved to results");
            }
            Err(e) => {
                warn!(
                    message = %message_id,
                    error = %e,
                    "Results surface unavailable, updating suggestion in place"
                );
                if let Err(e) = self
                    .platform
                    .edit_message(record.channel_id, message_id, Content::Embed(embed))
                    .await
                {
                    warn!(message = %message_id, error = %e, "In-place update also failed");
                }
            }
        }
    }

    /// Reactions only matter as vote activity on pending suggestions;
    /// tallies are captured at resolve time, not incrementally.
    pub(crate) async fn on_reaction(&self, message: MessageId, actor: &Actor, emoji: &str) {
        if actor.is_bot || (emoji != UPVOTE && emoji != DOWNVOTE) {
            return;
        }
        if let Some(record) = self.workflows.suggestions.get(message).await
            && record.status == SuggestionStatus::Pending
        {
            debug!(message = %message, actor = %actor.id, emoji, "Vote recorded on suggestion");
        }
    }
}

fn resolved_embed(record: &SuggestionRecord, reviewer: &Actor) -> Embed {
    let (title, color) = match record.status {
        SuggestionStatus::Accepted => ("💡 Suggestion • ✅ ACCEPTED", COLOR_SUCCESS),
        SuggestionStatus::Denied => ("💡 Suggestion • ❌ DENIED", COLOR_DANGER),
        SuggestionStatus::Pending => ("💡 Suggestion • Pending", COLOR_INFO),
    };
    let votes = record.final_votes.unwrap_or_default();
    Embed::new(title, record.text.clone(), color)
        .field("Submitted by", record.author_name.clone())
        .field("Reviewed by", reviewer.display_name.clone())
        .field("Votes", format!("👍 {} | 👎 {}", votes.up, votes.down))
}
