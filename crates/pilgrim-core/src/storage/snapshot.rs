//! The single durable record persisted between runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::journal::{JournalEntry, PendingReflection};
use crate::progression::ProgressState;
use crate::timer::{Mode, Phase};

/// Where the timer stood when the snapshot was taken. Never records
/// `isRunning`: a restored timer is always stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub remaining_seconds: u64,
    pub mode: Mode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub session_count: u64,
    #[serde(default)]
    pub completed_focus_count: u64,
    #[serde(default)]
    pub active_environment_id: String,
    #[serde(default)]
    pub active_avatar_id: String,
    #[serde(default)]
    pub unlocked_environment_ids: BTreeSet<String>,
    #[serde(default)]
    pub unlocked_avatar_ids: BTreeSet<String>,
    #[serde(default)]
    pub journal_entries: Vec<JournalEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_reflection: Option<PendingReflection>,
}

impl Snapshot {
    pub fn progress(&self) -> ProgressState {
        ProgressState {
            unlocked_environment_ids: self.unlocked_environment_ids.clone(),
            unlocked_avatar_ids: self.unlocked_avatar_ids.clone(),
            active_environment_id: self.active_environment_id.clone(),
            active_avatar_id: self.active_avatar_id.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
