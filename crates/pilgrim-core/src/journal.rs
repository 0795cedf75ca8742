//! Append-only reflection log.
//!
//! A reflection can only be written for a Work phase that has just been
//! completed and not yet journaled. Completing a Work phase opens a prompt;
//! saving or dismissing closes it. Entries are never edited or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// How the finished focus phase felt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Focused,
    Distracted,
    Breakthrough,
    Peaceful,
    Energized,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Focused,
        Mood::Distracted,
        Mood::Breakthrough,
        Mood::Peaceful,
        Mood::Energized,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Focused => "focused",
            Mood::Distracted => "distracted",
            Mood::Breakthrough => "breakthrough",
            Mood::Peaceful => "peaceful",
            Mood::Energized => "energized",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| format!("unknown mood '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "moodTag")]
    pub mood: Mood,
    #[serde(default)]
    pub free_text: String,
    pub focus_count_at_creation: u64,
    pub environment_id: String,
    pub avatar_id: String,
}

/// What the user supplies; the rest comes from the core.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reflection {
    pub mood: Mood,
    pub free_text: String,
}

impl Reflection {
    pub fn new(mood: Mood, free_text: impl Into<String>) -> Self {
        Self {
            mood,
            free_text: free_text.into(),
        }
    }
}

/// An open prompt for the Work phase that brought the focus count to `focus_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReflection {
    pub focus_count: u64,
    pub opened_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
    pending: Option<PendingReflection>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore(entries: Vec<JournalEntry>, pending: Option<PendingReflection>) -> Self {
        Self { entries, pending }
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Entries for display.
    pub fn newest_first(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().rev()
    }

    pub fn pending(&self) -> Option<&PendingReflection> {
        self.pending.as_ref()
    }

    /// Open a prompt after a Work completion.
    ///
    /// Returns `false` and keeps the current prompt if one is already open.
    pub fn open_prompt(&mut self, focus_count: u64, at: DateTime<Utc>) -> bool {
        if let Some(existing) = &self.pending {
            tracing::debug!(
                pending = existing.focus_count,
                focus_count,
                "reflection prompt already open"
            );
            return false;
        }
        self.pending = Some(PendingReflection {
            focus_count,
            opened_at: at,
        });
        true
    }

    /// Append an entry for the open prompt and close it.
    pub fn record(
        &mut self,
        reflection: Reflection,
        environment_id: &str,
        avatar_id: &str,
        at: DateTime<Utc>,
    ) -> Result<&JournalEntry> {
        let pending = self.pending.take().ok_or(CoreError::NoPendingReflection)?;
        self.entries.push(JournalEntry {
            timestamp: at,
            mood: reflection.mood,
            free_text: reflection.free_text,
            focus_count_at_creation: pending.focus_count,
            environment_id: environment_id.to_string(),
            avatar_id: avatar_id.to_string(),
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Close the open prompt without writing anything.
    pub fn dismiss(&mut self) -> Result<PendingReflection> {
        self.pending.take().ok_or(CoreError::NoPendingReflection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn record_without_prompt_is_rejected() {
        let mut j = Journal::new();
        let err = j
            .record(Reflection::default(), "desert", "novice", Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::NoPendingReflection));
        assert!(j.entries().is_empty());
    }

    #[test]
    fn one_entry_per_prompt() {
        let mut j = Journal::new();
        let now = Utc::now();
        assert!(j.open_prompt(3, now));
        let entry = j
            .record(Reflection::new(Mood::Breakthrough, "cracked it"), "mountain", "seeker", now)
            .unwrap();
        assert_eq!(entry.focus_count_at_creation, 3);
        assert_eq!(entry.environment_id, "mountain");
        assert_eq!(entry.avatar_id, "seeker");

        let again = j.record(Reflection::default(), "mountain", "seeker", now);
        assert!(matches!(again, Err(CoreError::NoPendingReflection)));
        assert_eq!(j.entries().len(), 1);
    }

    #[test]
    fn open_prompt_does_not_replace_existing() {
        let mut j = Journal::new();
        let now = Utc::now();
        assert!(j.open_prompt(1, now));
        assert!(!j.open_prompt(2, now + Duration::seconds(5)));
        assert_eq!(j.pending().unwrap().focus_count, 1);
    }

    #[test]
    fn dismiss_closes_prompt() {
        let mut j = Journal::new();
        j.open_prompt(1, Utc::now());
        assert_eq!(j.dismiss().unwrap().focus_count, 1);
        assert!(matches!(j.dismiss(), Err(CoreError::NoPendingReflection)));
        assert!(j.open_prompt(2, Utc::now()));
    }

    #[test]
    fn newest_first_reverses_insertion_order() {
        let mut j = Journal::new();
        let now = Utc::now();
        for n in 1..=3 {
            j.open_prompt(n, now);
            j.record(Reflection::default(), "desert", "novice", now + Duration::minutes(n as i64))
                .unwrap();
        }
        let counts: Vec<u64> = j.newest_first().map(|e| e.focus_count_at_creation).collect();
        assert_eq!(counts, vec![3, 2, 1]);
        let stored: Vec<u64> = j.entries().iter().map(|e| e.focus_count_at_creation).collect();
        assert_eq!(stored, vec![1, 2, 3]);
    }

    #[test]
    fn entry_serializes_with_mood_tag() {
        let entry = JournalEntry {
            timestamp: "2026-01-02T03:04:05Z".parse().unwrap(),
            mood: Mood::Peaceful,
            free_text: "calm".into(),
            focus_count_at_creation: 4,
            environment_id: "desert".into(),
            avatar_id: "novice".into(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["moodTag"], "peaceful");
        assert_eq!(json["focusCountAtCreation"], 4);
        assert_eq!(json["timestamp"], "2026-01-02T03:04:05Z");
    }

    #[test]
    fn mood_parses_case_insensitively() {
        assert_eq!("Energized".parse::<Mood>().unwrap(), Mood::Energized);
        assert!("sleepy".parse::<Mood>().is_err());
    }
}
