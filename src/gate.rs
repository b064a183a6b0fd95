//! Access gate.
//!
//! Decides whether an actor may perform privileged actions and whether a
//! message is permitted to remain in a restricted channel. Rejections are
//! structured verdicts, never errors; the engine decides the remedial
//! action (delete + transient warning).

use crate::config::RolesConfig;
use crate::platform::{Actor, Embed, UserId};
use std::collections::HashSet;

/// Orange warning embeds.
const WARNING_COLOR: u32 = 0xff9900;

/// Command-invocation prefix allowed from everyone in restricted channels.
pub const COMMAND_PREFIX: char = '/';

/// Fixed privileged-role set derived from configuration.
///
/// Each configured role is recognized under both its plain spelling and
/// its decorated spelling as the same privilege. Matching is
/// case-sensitive and exact against the actor's live role names.
#[derive(Debug, Clone)]
pub struct AccessGate {
    privileged: HashSet<String>,
    role_names: Vec<String>,
}

/// Outcome of a content-policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(Denial),
}

/// Why a message is not permitted to remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// Non-privileged authors may only use commands in this channel.
    CommandsOnly,
    /// Only staff or the ticket creator may post in a ticket channel.
    TicketStaffOnly,
}

impl Denial {
    /// The transient warning posted in place of the removed message.
    pub fn warning(&self, actor: &Actor) -> Embed {
        match self {
            Self::CommandsOnly => Embed::new(
                "⚠️ Message not allowed",
                format!(
                    "{}, only commands are allowed in this channel.\n\n\
                     Use `/suggest create` to submit a suggestion.",
                    actor.display_name
                ),
                WARNING_COLOR,
            ),
            Self::TicketStaffOnly => Embed::new(
                "⚠️ Staff only",
                format!(
                    "{}, only staff members can reply in tickets.",
                    actor.display_name
                ),
                WARNING_COLOR,
            ),
        }
    }
}

impl AccessGate {
    pub fn new(roles: &RolesConfig) -> Self {
        let mut privileged = HashSet::new();
        let mut role_names = Vec::new();
        for role in &roles.privileged {
            privileged.insert(role.clone());
            privileged.insert(format!("{}{role}", roles.decoration));
            role_names.push(role.clone());
            role_names.push(format!("{}{role}", roles.decoration));
        }
        Self {
            privileged,
            role_names,
        }
    }

    /// True iff the actor's live role-name set intersects the privileged set.
    pub fn has_required_role(&self, actor: &Actor) -> bool {
        actor.roles.iter().any(|r| self.privileged.contains(r))
    }

    /// Every recognized spelling of the privileged roles, for building
    /// channel permission grants.
    pub fn privileged_role_names(&self) -> &[String] {
        &self.role_names
    }

    /// Content policy for the restricted suggestions channel: only
    /// command invocations are allowed from non-privileged authors.
    pub fn suggestion_message_verdict(&self, author: &Actor, content: &str) -> Verdict {
        if content.starts_with(COMMAND_PREFIX) || self.has_required_role(author) {
            Verdict::Allow
        } else {
            Verdict::Deny(Denial::CommandsOnly)
        }
    }

    /// Content policy inside a ticket channel: only privileged users or
    /// the ticket's recorded creator may post.
    pub fn ticket_message_verdict(&self, author: &Actor, creator: UserId) -> Verdict {
        if author.id == creator || self.has_required_role(author) {
            Verdict::Allow
        } else {
            Verdict::Deny(Denial::TicketStaffOnly)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AccessGate {
        AccessGate::new(&RolesConfig {
            privileged: vec!["Manager".into(), "Deputy Manager".into()],
            decoration: "👑 ".into(),
        })
    }

    fn actor(roles: &[&str]) -> Actor {
        Actor {
            id: UserId(1),
            display_name: "tester".into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            is_bot: false,
        }
    }

    #[test]
    fn decorated_and_plain_spellings_are_the_same_privilege() {
        let gate = gate();
        assert!(gate.has_required_role(&actor(&["Manager"])));
        assert!(gate.has_required_role(&actor(&["👑 Manager"])));
        assert!(gate.has_required_role(&actor(&["Member", "👑 Deputy Manager"])));
        assert!(!gate.has_required_role(&actor(&["Member"])));
        // Case-sensitive exact match.
        assert!(!gate.has_required_role(&actor(&["manager"])));
    }

    #[test]
    fn suggestion_channel_allows_commands_from_anyone() {
        let gate = gate();
        let member = actor(&["Member"]);
        assert_eq!(
            gate.suggestion_message_verdict(&member, "/suggest create more emotes"),
            Verdict::Allow
        );
        assert_eq!(
            gate.suggestion_message_verdict(&member, "plain chatter"),
            Verdict::Deny(Denial::CommandsOnly)
        );
        // Privileged authors may chat freely.
        assert_eq!(
            gate.suggestion_message_verdict(&actor(&["Manager"]), "plain chatter"),
            Verdict::Allow
        );
    }

    #[test]
    fn ticket_channel_admits_creator_and_staff_only() {
        let gate = gate();
        let creator = UserId(1);
        assert_eq!(
            gate.ticket_message_verdict(&actor(&["Member"]), creator),
            Verdict::Allow
        );
        let outsider = Actor {
            id: UserId(2),
            ..actor(&["Member"])
        };
        assert_eq!(
            gate.ticket_message_verdict(&outsider, creator),
            Verdict::Deny(Denial::TicketStaffOnly)
        );
        let staff = Actor {
            id: UserId(3),
            ..actor(&["👑 Manager"])
        };
        assert_eq!(gate.ticket_message_verdict(&staff, creator), Verdict::Allow);
    }
}
