//! Member join/leave greetings.

use super::Engine;
use crate::effect::Effect;
use crate::platform::{Actor, Content};

impl Engine {
    pub(crate) async fn on_member_joined(&self, member: &Actor) {
        let text = self
            .config
            .messages
            .welcome
            .replace("{user}", &member.display_name);
        self.apply(vec![Effect::SendMessage {
            channel: self.config.channels.welcome,
            content: Content::Text(text),
        }])
        .await;
    }

    pub(crate) async fn on_member_left(&self, member: &Actor) {
        let text = self
            .config
            .messages
            .goodbye
            .replace("{user}", &member.display_name);
        self.apply(vec![Effect::SendMessage {
            channel: self.config.channels.welcome,
            content: Content::Text(text),
        }])
        .await;
    }
}
