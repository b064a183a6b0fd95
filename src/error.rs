//! Unified error handling for wardend.
//!
//! Workflow components return structured outcomes rather than raising
//! through to the event dispatcher; this module defines that taxonomy,
//! log labeling, and the user-visible ephemeral replies.

use crate::platform::{Content, PlatformError};
use crate::store::StoreError;
use thiserror::Error;

/// Errors produced by the workflow components and command handlers.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Actor lacks a privileged role. User-visible, non-retryable.
    #[error("permission denied")]
    Permission,

    /// Referenced record, message, or channel is absent.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// State-machine transition attempted from a terminal state.
    #[error("already resolved")]
    AlreadyResolved,

    /// Command used outside a recognized open ticket channel.
    #[error("not a ticket channel")]
    NotTicketChannel,

    /// The platform rejected an action (role hierarchy, missing bot
    /// permission). Reported with remediation text, never retried.
    #[error("platform rejected the action: {0}")]
    ExternalForbidden(String),

    /// Store failure; the persisted state remains whatever it was before.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    /// Unexpected platform failure; the operation is abandoned.
    #[error("transient failure: {0}")]
    Transient(String),
}

impl WorkflowError {
    /// Static error code for log labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Permission => "permission_denied",
            Self::NotFound(_) => "not_found",
            Self::AlreadyResolved => "already_resolved",
            Self::NotTicketChannel => "not_ticket_channel",
            Self::ExternalForbidden(_) => "external_forbidden",
            Self::Store(_) => "store_failure",
            Self::Transient(_) => "transient_failure",
        }
    }

    /// Ephemeral reply shown to the triggering actor.
    ///
    /// Returns `None` for systemic failures that only get logged; the user
    /// then receives the generic failure line from the dispatcher.
    pub fn user_reply(&self) -> Option<Content> {
        let text = match self {
            Self::Permission => {
                "❌ You don't have permission to use this command.".to_string()
            }
            Self::NotFound(what) => format!("❌ No {what} was found for that request."),
            Self::AlreadyResolved => {
                "ℹ️ This has already been resolved; nothing was changed.".to_string()
            }
            Self::NotTicketChannel => {
                "❌ This command can only be used inside a ticket channel.".to_string()
            }
            Self::ExternalForbidden(remedy) => format!("❌ {remedy}"),
            Self::Store(_) | Self::Transient(_) => return None,
        };
        Some(Content::Text(text))
    }
}

impl From<PlatformError> for WorkflowError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Forbidden(remedy) => Self::ExternalForbidden(remedy),
            PlatformError::NotFound => Self::NotFound("resource"),
            PlatformError::Transient(msg) => Self::Transient(msg),
        }
    }
}

/// Result type for command handlers.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(WorkflowError::Permission.error_code(), "permission_denied");
        assert_eq!(
            WorkflowError::NotFound("suggestion").error_code(),
            "not_found"
        );
        assert_eq!(
            WorkflowError::Transient("oops".into()).error_code(),
            "transient_failure"
        );
    }

    #[test]
    fn systemic_failures_have_no_user_reply() {
        assert!(WorkflowError::Transient("io".into()).user_reply().is_none());
        assert!(WorkflowError::Permission.user_reply().is_some());
        assert!(WorkflowError::AlreadyResolved.user_reply().is_some());
    }

    #[test]
    fn platform_forbidden_maps_to_external_forbidden() {
        let err: WorkflowError = PlatformError::Forbidden("move my role up".into()).into();
        assert!(matches!(err, WorkflowError::ExternalForbidden(_)));
    }
}
