//! Ticket commands: provisioning, participants, closing with transcript.

use super::{COLOR_INFO, COLOR_NEUTRAL, COLOR_SUCCESS, Engine};
use crate::effect::Effect;
use crate::error::WorkflowResult;
use crate::platform::{
    Actor, ChannelId, Content, Embed, GrantSubject, PermissionGrant,
};
use crate::workflows::tickets::render_transcript;
use std::time::Duration;
use tracing::{info, warn};

impl Engine {
    /// Open a ticket: draw a sequence number, provision the isolated
    /// channel, persist the record, and greet the creator inside it.
    pub(crate) async fn cmd_ticket_open(
        &self,
        channel: ChannelId,
        actor: &Actor,
        reason: Option<String>,
    ) -> WorkflowResult<Vec<Effect>> {
        let reason = reason.unwrap_or_else(|| "No reason given".to_string());
        let pending = self.workflows.tickets.begin(actor, reason.clone()).await?;

        // Default-deny visibility; creator and privileged roles get
        // read/write. Both spellings of each privileged role are granted.
        let mut grants = vec![
            PermissionGrant::deny(GrantSubject::Everyone),
            PermissionGrant::read_write(GrantSubject::User(actor.id)),
        ];
        for role in self.gate.privileged_role_names() {
            grants.push(PermissionGrant::read_write(GrantSubject::Role(role.clone())));
        }

        // A provisioning failure burns the drawn number; the sequence
        // stays monotonic either way.
        let ticket_channel = self
            .platform
            .create_channel(&pending.channel_name, &grants, 0)
            .await?;
        let record = self.workflows.tickets.commit(ticket_channel, pending).await?;

        let greeting = Embed::new(
            format!("🎟️ Ticket #{:04}", record.number),
            format!(
                "**Opened by:** {}\n**Reason:** {reason}",
                actor.display_name
            ),
            COLOR_SUCCESS,
        )
        .field(
            "📋 How this works",
            "• Only staff can reply here\n\
             • Staff can add people with `/ticket adduser`\n\
             • Staff close the ticket with `/ticket close`\n\
             • A transcript is archived automatically on close",
        );

        Ok(vec![
            Effect::SendMessage {
                channel: ticket_channel,
                content: Content::Embed(greeting),
            },
            Effect::SendEphemeral {
                channel,
                user: actor.id,
                content: Content::Text(format!(
                    "✅ Ticket #{:04} opened: see your new channel.",
                    record.number
                )),
            },
        ])
    }

    /// Grant another user access to the current open ticket.
    pub(crate) async fn cmd_ticket_add_user(
        &self,
        channel: ChannelId,
        actor: &Actor,
        target: &Actor,
    ) -> WorkflowResult<Vec<Effect>> {
        self.require_privilege(actor)?;
        let record = self.workflows.tickets.participant_grant(channel).await?;

        info!(channel = %channel, ticket = record.number, user = %target.id, "Participant added");
        Ok(vec![
            Effect::SetChannelPermissions {
                channel,
                grant: PermissionGrant::read_write(GrantSubject::User(target.id)),
            },
            Effect::SendMessage {
                channel,
                content: Content::Embed(Embed::new(
                    "👤 User added",
                    format!(
                        "{} was added to the ticket by {}",
                        target.display_name, actor.display_name
                    ),
                    COLOR_INFO,
                )),
            },
        ])
    }

    /// Close the current ticket: mark the record closed, archive the
    /// transcript, then tear the channel down after a grace delay so the
    /// confirmation stays visible.
    pub(crate) async fn cmd_ticket_close(
        &self,
        channel: ChannelId,
        actor: &Actor,
    ) -> WorkflowResult<Vec<Effect>> {
        self.require_privilege(actor)?;

        let record = self.workflows.tickets.close(channel, actor).await?;
        self.archive_transcript(channel, &record).await;

        Ok(vec![
            Effect::SendEphemeral {
                channel,
                user: actor.id,
                content: Content::Text(format!(
                    "✅ Ticket #{:04} closed. Archiving transcript...",
                    record.number
                )),
            },
            Effect::DeleteChannelAfter {
                channel,
                after: Duration::from_secs(self.config.tickets.teardown_grace_secs),
            },
        ])
    }

    /// Render the channel's full history and post summary plus export to
    /// the archive surface. Best effort: the close already happened, so
    /// archival failures are logged and never retried.
    async fn archive_transcript(
        &self,
        channel: ChannelId,
        record: &crate::workflows::tickets::TicketRecord,
    ) {
        let history = match self.platform.channel_history(channel).await {
            Ok(history) => history,
            Err(e) => {
                warn!(channel = %channel, ticket = record.number, error = %e,
                    "History fetch failed, transcript skipped");
                return;
            }
        };

        let summary = Embed::new(
            format!("📄 Transcript: ticket #{:04}", record.number),
            String::new(),
            COLOR_NEUTRAL,
        )
        .field("Creator", record.creator_name.clone())
        .field("Reason", record.reason.clone())
        .field(
            "Opened",
            record.created_at.format("%d/%m/%Y %H:%M").to_string(),
        )
        .field(
            "Closed",
            record
                .closed_at
                .map(|t| t.format("%d/%m/%Y %H:%M").to_string())
                .unwrap_or_default(),
        )
        .field("Messages", history.len().to_string());

        let archive = self.config.channels.archive;
        if let Err(e) = self
            .platform
            .send_message(archive, Content::Embed(summary))
            .await
        {
            warn!(ticket = record.number, error = %e, "Transcript summary not archived");
        }

        let export = Content::File {
            name: format!("ticket-{:04}-transcript.txt", record.number),
            body: render_transcript(record, &history),
        };
        match self.platform.send_message(archive, export).await {
            Ok(_) => info!(ticket = record.number, "Transcript archived"),
            Err(e) => warn!(ticket = record.number, error = %e, "Transcript export not archived"),
        }
    }
}
