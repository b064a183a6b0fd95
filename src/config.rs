//! Configuration loading and management.

use crate::platform::ChannelId;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Validation(String),
}

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory for persisted record sets.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Well-known channels the workflows operate on.
    pub channels: ChannelsConfig,
    /// Privileged role configuration.
    pub roles: RolesConfig,
    /// Counter thresholds.
    #[serde(default)]
    pub thresholds: Thresholds,
    /// User-facing message templates.
    #[serde(default)]
    pub messages: MessagesConfig,
    /// Ticket system tuning.
    #[serde(default)]
    pub tickets: TicketsConfig,
}

/// Channels the engine monitors or posts to.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelsConfig {
    /// Restricted suggestions channel (commands-only for regular members).
    pub suggestions: ChannelId,
    /// Channel for member join/leave announcements.
    pub welcome: ChannelId,
    /// Results surface where resolved suggestions are relocated.
    pub results: ChannelId,
    /// Archive surface for ticket transcripts.
    pub archive: ChannelId,
}

/// Privileged role configuration.
///
/// Each configured role name is recognized both plain and with the
/// decoration prefix applied, as the same privilege.
#[derive(Debug, Clone, Deserialize)]
pub struct RolesConfig {
    /// Undecorated role names granting moderation capability.
    pub privileged: Vec<String>,
    /// Decoration prefix also accepted on each privileged role name.
    #[serde(default = "default_decoration")]
    pub decoration: String,
}

/// Counter thresholds. All must be positive.
#[derive(Debug, Clone, Deserialize)]
pub struct Thresholds {
    /// Messages in the suggestions channel before the reminder fires.
    #[serde(default = "default_channel_messages")]
    pub channel_messages: u32,
    /// Non-command human messages anywhere before the help prompt fires.
    #[serde(default = "default_help_messages")]
    pub help_messages: u32,
    /// Suggestion creations before the suggestion reminder fires.
    #[serde(default = "default_suggestion_reminders")]
    pub suggestion_reminders: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            channel_messages: default_channel_messages(),
            help_messages: default_help_messages(),
            suggestion_reminders: default_suggestion_reminders(),
        }
    }
}

/// User-facing message templates. `{user}` is substituted where noted.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesConfig {
    /// Periodic engagement reminder posted in the suggestions channel.
    #[serde(default = "default_reminder")]
    pub reminder: String,
    /// Help prompt posted after a stretch of ordinary chat.
    #[serde(default = "default_help")]
    pub help: String,
    /// Greeting for joining members (`{user}` -> mention).
    #[serde(default = "default_welcome")]
    pub welcome: String,
    /// Farewell for departing members (`{user}` -> display name).
    #[serde(default = "default_goodbye")]
    pub goodbye: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            reminder: default_reminder(),
            help: default_help(),
            welcome: default_welcome(),
            goodbye: default_goodbye(),
        }
    }
}

/// Ticket system tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketsConfig {
    /// Channel name prefix; the full name is `{prefix}-{number:04}`.
    #[serde(default = "default_ticket_prefix")]
    pub name_prefix: String,
    /// Grace delay before a closed ticket's channel is deleted.
    #[serde(default = "default_teardown_grace")]
    pub teardown_grace_secs: u64,
    /// Lifetime of transient gate-denial warnings before auto-delete.
    #[serde(default = "default_warning_ttl")]
    pub warning_ttl_secs: u64,
}

impl Default for TicketsConfig {
    fn default() -> Self {
        Self {
            name_prefix: default_ticket_prefix(),
            teardown_grace_secs: default_teardown_grace(),
            warning_ttl_secs: default_warning_ttl(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_decoration() -> String {
    "👑 ".to_string()
}

fn default_channel_messages() -> u32 {
    5
}

fn default_help_messages() -> u32 {
    10
}

fn default_suggestion_reminders() -> u32 {
    5
}

fn default_reminder() -> String {
    "💬 Have a suggestion? Use `/suggest create` to submit your idea.".to_string()
}

fn default_help() -> String {
    "🆘 Need a hand right now? Ask here and someone will help you out. 👇".to_string()
}

fn default_welcome() -> String {
    "👋 Welcome, {user}! Thanks for joining our server.".to_string()
}

fn default_goodbye() -> String {
    "👋 {user} has left the server. See you around!".to_string()
}

fn default_ticket_prefix() -> String {
    "ticket".to_string()
}

fn default_teardown_grace() -> u64 {
    3
}

fn default_warning_ttl() -> u64 {
    10
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate invariants the workflows rely on.
    ///
    /// Thresholds are positive integers; zero is a configuration error,
    /// never a runtime state.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thresholds.channel_messages == 0 {
            return Err(ConfigError::Validation(
                "thresholds.channel_messages must be greater than 0".into(),
            ));
        }
        if self.thresholds.help_messages == 0 {
            return Err(ConfigError::Validation(
                "thresholds.help_messages must be greater than 0".into(),
            ));
        }
        if self.thresholds.suggestion_reminders == 0 {
            return Err(ConfigError::Validation(
                "thresholds.suggestion_reminders must be greater than 0".into(),
            ));
        }
        if self.roles.privileged.is_empty() {
            return Err(ConfigError::Validation(
                "roles.privileged must name at least one role".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    const MINIMAL: &str = r#"
        [channels]
        suggestions = 111
        welcome = 222
        results = 333
        archive = 444

        [roles]
        privileged = ["Manager", "Deputy Manager"]
    "#;

    #[test]
    fn minimal_config_defaults() {
        let config = parse(MINIMAL).unwrap();
        assert_eq!(config.thresholds.channel_messages, 5);
        assert_eq!(config.thresholds.help_messages, 10);
        assert_eq!(config.tickets.name_prefix, "ticket");
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn zero_threshold_rejected() {
        let toml_str = format!("{MINIMAL}\n[thresholds]\nchannel_messages = 0\n");
        let err = parse(&toml_str).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn empty_role_list_rejected() {
        let toml_str = MINIMAL.replace(r#"["Manager", "Deputy Manager"]"#, "[]");
        let err = parse(&toml_str).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
