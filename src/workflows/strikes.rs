//! Strike ledger.
//!
//! Append-only-per-user disciplinary history with severity tiers and a
//! limit-evaluation policy classifying the current tally into
//! none/warning/termination-risk. The only removal is "pop most recent".

use crate::error::{WorkflowError, WorkflowResult};
use crate::platform::UserId;
use crate::store::{Store, StoreError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

const STRIKES: &str = "strikes";

/// Strike severity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        };
        f.write_str(s)
    }
}

impl Severity {
    /// Marker used in user-facing summaries.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Minor => "🟢",
            Self::Moderate => "🟡",
            Self::Severe => "🔴",
        }
    }
}

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeEntry {
    pub severity: Severity,
    pub reason: String,
    /// Issue date, `%Y-%m-%d`.
    pub date: String,
    /// Display name of the issuing moderator.
    pub issuer: String,
}

/// Occurrence counts per severity tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub minor: u32,
    pub moderate: u32,
    pub severe: u32,
}

impl SeverityCounts {
    pub fn tally(entries: &[StrikeEntry]) -> Self {
        let mut counts = Self::default();
        for entry in entries {
            match entry.severity {
                Severity::Minor => counts.minor += 1,
                Severity::Moderate => counts.moderate += 1,
                Severity::Severe => counts.severe += 1,
            }
        }
        counts
    }
}

/// Escalation classification of a strike tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    None,
    Warning,
    TerminationRisk,
    DirectTerminationRisk,
}

impl Escalation {
    /// User-facing escalation notice, `None` when within limits.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Warning => Some("⚠️ **WARNING** (strike limit approaching)"),
            Self::TerminationRisk => Some("🚨 **TERMINATION RISK** (strike limit exceeded)"),
            Self::DirectTerminationRisk => {
                Some("🚨 **DIRECT TERMINATION RISK** (severe strike on record)")
            }
        }
    }
}

/// Classify a tally. Pure function; only the single highest-priority tier
/// applies, most severe first.
pub fn classify(counts: SeverityCounts) -> Escalation {
    if counts.severe >= 1 {
        Escalation::DirectTerminationRisk
    } else if counts.minor >= 5 || counts.moderate >= 3 {
        Escalation::TerminationRisk
    } else if counts.minor >= 3 || counts.moderate >= 2 {
        Escalation::Warning
    } else {
        Escalation::None
    }
}

/// Summary of a user's ledger.
#[derive(Debug, Clone)]
pub struct StrikeSummary {
    pub counts: SeverityCounts,
    pub escalation: Escalation,
    /// Last five entries, most recent first.
    pub recent: Vec<StrikeEntry>,
}

/// The persisted ledger, keyed by user id (text).
pub struct StrikeLedger {
    store: Arc<Store>,
    entries: Mutex<BTreeMap<String, Vec<StrikeEntry>>>,
}

impl StrikeLedger {
    pub async fn load(store: Arc<Store>) -> Result<Self, StoreError> {
        let entries: BTreeMap<String, Vec<StrikeEntry>> = store.load(STRIKES).await?;
        Ok(Self {
            store,
            entries: Mutex::new(entries),
        })
    }

    /// Append a strike dated today and evaluate the escalation policy
    /// over the updated tally.
    pub async fn add(
        &self,
        target: UserId,
        severity: Severity,
        reason: String,
        issuer: String,
    ) -> Result<(StrikeEntry, SeverityCounts, Escalation), StoreError> {
        let entry = StrikeEntry {
            severity,
            reason,
            date: Utc::now().format("%Y-%m-%d").to_string(),
            issuer,
        };

        let mut entries = self.entries.lock().await;
        let user_entries = entries.entry(target.to_string()).or_default();
        user_entries.push(entry.clone());
        let counts = SeverityCounts::tally(user_entries);
        self.store.save(STRIKES, &*entries).await?;

        info!(user = %target, severity = %severity, "Strike added");
        Ok((entry, counts, classify(counts)))
    }

    /// Pop the most recently appended entry.
    ///
    /// An emptied entry sequence is a valid terminal state; the user's key
    /// stays in the ledger with no outstanding strikes.
    pub async fn remove_last(&self, target: UserId) -> WorkflowResult<StrikeEntry> {
        let mut entries = self.entries.lock().await;
        let removed = entries
            .get_mut(&target.to_string())
            .and_then(|list| list.pop())
            .ok_or(WorkflowError::NotFound("strike"))?;
        self.store.save(STRIKES, &*entries).await?;
        info!(user = %target, "Last strike removed");
        Ok(removed)
    }

    /// Counts, escalation, and the last five entries most-recent-first.
    pub async fn summary(&self, target: UserId) -> StrikeSummary {
        let entries = self.entries.lock().await;
        let user_entries = entries
            .get(&target.to_string())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let counts = SeverityCounts::tally(user_entries);
        let recent = user_entries.iter().rev().take(5).cloned().collect();
        StrikeSummary {
            counts,
            escalation: classify(counts),
            recent,
        }
    }
}
