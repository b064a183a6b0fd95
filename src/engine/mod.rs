//! Event-driven workflow engine.
//!
//! Inbound platform events pass the access gate first; permitted events
//! are routed to exactly one stateful component, which applies its
//! transition and hands back side-effect commands for the adapter layer.
//! Handler failures never propagate past the dispatcher: they are logged
//! with enough context to reconstruct the decision and answered with an
//! ephemeral reply where one exists.

mod membership;
mod messages;
mod moderation;
mod suggest;
mod ticket;

use crate::config::Config;
use crate::effect::{Effect, apply_effects};
use crate::error::{WorkflowError, WorkflowResult};
use crate::gate::AccessGate;
use crate::platform::{Actor, ChannelId, CommandInvocation, Content, Event, Platform};
use crate::store::Store;
use crate::workflows::Workflows;
use std::sync::Arc;
use tracing::{debug, error};

/// Embed accent colors.
pub(crate) const COLOR_INFO: u32 = 0x3498db;
pub(crate) const COLOR_SUCCESS: u32 = 0x2ecc71;
pub(crate) const COLOR_DANGER: u32 = 0xe74c3c;
pub(crate) const COLOR_NEUTRAL: u32 = 0x2f3136;

/// The workflow engine.
pub struct Engine {
    pub(crate) config: Config,
    pub(crate) gate: AccessGate,
    pub(crate) platform: Arc<dyn Platform>,
    pub workflows: Workflows,
}

impl Engine {
    /// Open the store, load every record family, and assemble the engine.
    pub async fn new(
        config: Config,
        platform: Arc<dyn Platform>,
    ) -> Result<Self, crate::store::StoreError> {
        let store = Arc::new(Store::open(&config.data_dir).await?);
        let workflows = Workflows::load(store, &config).await?;
        let gate = AccessGate::new(&config.roles);
        Ok(Self {
            config,
            gate,
            platform,
            workflows,
        })
    }

    /// Handle one inbound event to completion.
    ///
    /// Safe to call concurrently; per-family serialization inside the
    /// workflows keeps each record transition atomic.
    pub async fn handle_event(&self, event: Event) {
        match event {
            Event::MessagePosted {
                channel,
                message,
                author,
                content,
            } => self.on_message(channel, message, &author, &content).await,
            Event::ReactionAdded {
                message,
                actor,
                emoji,
                ..
            } => self.on_reaction(message, &actor, &emoji).await,
            Event::MemberJoined { member } => self.on_member_joined(&member).await,
            Event::MemberLeft { member } => self.on_member_left(&member).await,
            Event::CommandInvoked {
                channel,
                actor,
                command,
            } => self.on_command(channel, &actor, command).await,
        }
    }

    /// Route a command invocation to exactly one handler and apply the
    /// effects it returns.
    async fn on_command(&self, channel: ChannelId, actor: &Actor, command: CommandInvocation) {
        debug!(actor = %actor.id, channel = %channel, command = ?command, "Command invoked");
        let result = match command {
            CommandInvocation::StrikeAdd {
                target,
                severity,
                reason,
            } => {
                self.cmd_strike_add(channel, actor, &target, severity, reason)
                    .await
            }
            CommandInvocation::StrikeCheck { target } => {
                self.cmd_strike_check(channel, actor, &target).await
            }
            CommandInvocation::StrikeRemove { target } => {
                self.cmd_strike_remove(channel, actor, &target).await
            }
            CommandInvocation::Accept { target, role } => {
                self.cmd_accept(channel, actor, &target, &role).await
            }
            CommandInvocation::Deny { target } => self.cmd_deny(channel, actor, &target).await,
            CommandInvocation::SuggestCreate { text } => {
                self.cmd_suggest_create(channel, actor, text).await
            }
            CommandInvocation::SuggestAccept { message_id } => {
                self.cmd_suggest_resolve(
                    channel,
                    actor,
                    message_id,
                    crate::workflows::suggestions::Resolution::Accept,
                )
                .await
            }
            CommandInvocation::SuggestDeny { message_id } => {
                self.cmd_suggest_resolve(
                    channel,
                    actor,
                    message_id,
                    crate::workflows::suggestions::Resolution::Deny,
                )
                .await
            }
            CommandInvocation::TicketOpen { reason } => {
                self.cmd_ticket_open(channel, actor, reason).await
            }
            CommandInvocation::TicketClose => self.cmd_ticket_close(channel, actor).await,
            CommandInvocation::TicketAddUser { target } => {
                self.cmd_ticket_add_user(channel, actor, &target).await
            }
            CommandInvocation::CounterReset { channel: target } => {
                self.cmd_counter_reset(channel, actor, target).await
            }
        };

        match result {
            Ok(effects) => self.apply(effects).await,
            Err(err) => self.report_failure(channel, actor, err).await,
        }
    }

    pub(crate) async fn apply(&self, effects: Vec<Effect>) {
        apply_effects(&self.platform, effects).await;
    }

    /// Gate check used by every privileged command.
    pub(crate) fn require_privilege(&self, actor: &Actor) -> WorkflowResult<()> {
        if self.gate.has_required_role(actor) {
            Ok(())
        } else {
            Err(WorkflowError::Permission)
        }
    }

    /// Log a handler failure with reconstruction context and answer the
    /// actor with a private, non-persistent reply.
    pub(crate) async fn report_failure(
        &self,
        channel: ChannelId,
        actor: &Actor,
        err: WorkflowError,
    ) {
        error!(
            actor = %actor.id,
            channel = %channel,
            code = err.error_code(),
            error = %err,
            "Command failed"
        );
        let reply = err.user_reply().unwrap_or_else(|| {
            Content::Text("❌ Something went wrong. Please try again.".to_string())
        });
        self.apply(vec![Effect::SendEphemeral {
            channel,
            user: actor.id,
            content: reply,
        }])
        .await;
    }
}
