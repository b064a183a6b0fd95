//! Moderation commands: the strike ladder and application review.

use super::{COLOR_DANGER, COLOR_INFO, COLOR_SUCCESS, Engine};
use crate::effect::Effect;
use crate::error::{WorkflowError, WorkflowResult};
use crate::platform::{Actor, ChannelId, Content, Embed, PlatformError};
use crate::workflows::strikes::Severity;
use tracing::{info, warn};

impl Engine {
    pub(crate) async fn cmd_strike_add(
        &self,
        channel: ChannelId,
        actor: &Actor,
        target: &Actor,
        severity: Severity,
        reason: String,
    ) -> WorkflowResult<Vec<Effect>> {
        self.require_privilege(actor)?;

        let (entry, _counts, escalation) = self
            .workflows
            .strikes
            .add(target.id, severity, reason, actor.display_name.clone())
            .await?;

        let mut embed = Embed::new(
            "✅ Strike added",
            format!(
                "Strike **{severity}** added to {}",
                target.display_name
            ),
            COLOR_SUCCESS,
        )
        .field("Reason", entry.reason.clone())
        .field("Date", entry.date.clone())
        .field("By", actor.display_name.clone());
        if let Some(notice) = escalation.notice() {
            embed = embed.field("⚠️ Status", notice);
        }

        Ok(vec![Effect::SendMessage {
            channel,
            content: Content::Embed(embed),
        }])
    }

    pub(crate) async fn cmd_strike_check(
        &self,
        channel: ChannelId,
        actor: &Actor,
        target: &Actor,
    ) -> WorkflowResult<Vec<Effect>> {
        self.require_privilege(actor)?;

        let summary = self.workflows.strikes.summary(target.id).await;
        if summary.recent.is_empty() && summary.counts == Default::default() {
            let embed = Embed::new(
                "📋 Strike history",
                format!("{} has no strikes on record.", target.display_name),
                COLOR_INFO,
            );
            return Ok(vec![Effect::SendMessage {
                channel,
                content: Content::Embed(embed),
            }]);
        }

        let mut embed = Embed::new(
            "📋 Strike history",
            format!("Strikes for {}", target.display_name),
            COLOR_INFO,
        )
        .field(
            "📊 Totals",
            format!(
                "🟢 Minor: {}\n🟡 Moderate: {}\n🔴 Severe: {}",
                summary.counts.minor, summary.counts.moderate, summary.counts.severe
            ),
        )
        .field(
            "Status",
            summary
                .escalation
                .notice()
                .unwrap_or("✅ Within limits")
                .to_string(),
        );

        if !summary.recent.is_empty() {
            let lines: Vec<String> = summary
                .recent
                .iter()
                .map(|e| {
                    format!(
                        "{} **{}** - {}\n*{} by {}*",
                        e.severity.marker(),
                        e.severity,
                        e.reason,
                        e.date,
                        e.issuer
                    )
                })
                .collect();
            embed = embed.field("📝 Recent strikes", lines.join("\n\n"));
        }

        Ok(vec![Effect::SendMessage {
            channel,
            content: Content::Embed(embed),
        }])
    }

    pub(crate) async fn cmd_strike_remove(
        &self,
        channel: ChannelId,
        actor: &Actor,
        target: &Actor,
    ) -> WorkflowResult<Vec<Effect>> {
        self.require_privilege(actor)?;

        let removed = self.workflows.strikes.remove_last(target.id).await?;
        let embed = Embed::new(
            "🗑️ Strike removed",
            format!("Removed the most recent strike from {}", target.display_name),
            COLOR_DANGER,
        )
        .field(
            "Removed",
            format!("**{}**: {}", removed.severity, removed.reason),
        )
        .field("Original date", removed.date)
        .field("Removed by", actor.display_name.clone());

        Ok(vec![Effect::SendMessage {
            channel,
            content: Content::Embed(embed),
        }])
    }

    /// Accept an application: assign the role, announce the welcome.
    pub(crate) async fn cmd_accept(
        &self,
        channel: ChannelId,
        actor: &Actor,
        target: &Actor,
        role: &str,
    ) -> WorkflowResult<Vec<Effect>> {
        self.require_privilege(actor)?;

        match self.platform.assign_role(target.id, role).await {
            Ok(()) => {}
            Err(PlatformError::Forbidden(_)) => {
                warn!(
                    actor = %actor.id,
                    target = %target.id,
                    role,
                    "Role assignment rejected by platform"
                );
                return Err(WorkflowError::ExternalForbidden(format!(
                    "I can't assign the role **{role}**. Move my role above \
                     **{role}** in the server's role settings and try again."
                )));
            }
            Err(e) => return Err(e.into()),
        }

        info!(target = %target.id, role, by = %actor.id, "Application accepted");
        let embed = Embed::new(
            "✅ Application accepted",
            format!(
                "✨ {}, your application has been accepted. Welcome aboard as **{role}**! 🎉",
                target.display_name
            ),
            COLOR_SUCCESS,
        )
        .field("User", target.display_name.clone())
        .field("Role", role.to_string())
        .field("Accepted by", actor.display_name.clone());

        Ok(vec![Effect::SendMessage {
            channel,
            content: Content::Embed(embed),
        }])
    }

    /// Deny an application: notify by DM where possible, then ban.
    pub(crate) async fn cmd_deny(
        &self,
        channel: ChannelId,
        actor: &Actor,
        target: &Actor,
    ) -> WorkflowResult<Vec<Effect>> {
        self.require_privilege(actor)?;

        let notice = format!(
            "❌ {}, your application has been denied after review. \
             You're welcome to apply again in the future.",
            target.display_name
        );

        // DM before the ban closes the door; closed DMs are reported, not fatal.
        let dm_sent = match self
            .platform
            .send_direct_message(target.id, Content::Text(notice.clone()))
            .await
        {
            Ok(()) => true,
            Err(PlatformError::Forbidden(_)) => {
                info!(target = %target.id, "Denial DM not delivered (DMs closed)");
                false
            }
            Err(e) => {
                warn!(target = %target.id, error = %e, "Denial DM failed");
                false
            }
        };

        match self
            .platform
            .ban_user(target.id, &format!("Application denied by {}", actor.display_name))
            .await
        {
            Ok(()) => {}
            Err(PlatformError::Forbidden(_)) => {
                warn!(actor = %actor.id, target = %target.id, "Ban rejected by platform");
                return Err(WorkflowError::ExternalForbidden(
                    "I can't ban members. Check that my role has the \
                     'Ban Members' permission."
                        .to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        info!(target = %target.id, by = %actor.id, "Application denied, user banned");
        let embed = Embed::new("❌ Application denied", notice, COLOR_DANGER)
            .field("User", target.display_name.clone())
            .field("Denied by", actor.display_name.clone())
            .field(
                "Notification",
                if dm_sent {
                    "✅ User notified by DM"
                } else {
                    "⚠️ DM not delivered (closed)"
                },
            )
            .field("Outcome", "🔨 User banned from the server");

        Ok(vec![Effect::SendMessage {
            channel,
            content: Content::Embed(embed),
        }])
    }

    /// Operator reset of one or all channel counters.
    pub(crate) async fn cmd_counter_reset(
        &self,
        channel: ChannelId,
        actor: &Actor,
        target: Option<ChannelId>,
    ) -> WorkflowResult<Vec<Effect>> {
        self.require_privilege(actor)?;
        self.workflows.counters.reset(target).await?;

        let what = match target {
            Some(id) => format!("Counter for channel {id} reset."),
            None => "All channel counters reset.".to_string(),
        };
        Ok(vec![Effect::SendEphemeral {
            channel,
            user: actor.id,
            content: Content::Text(format!("✅ {what}")),
        }])
    }
}
