use clap::Subcommand;
use pilgrim_core::{Mood, Reflection};
use serde_json::json;

use super::{print_json, Session};

#[derive(Subcommand)]
pub enum JournalAction {
    /// List reflections, newest first
    List {
        /// Show at most this many entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Answer the open reflection prompt
    Record {
        /// focused, distracted, breakthrough, peaceful or energized
        #[arg(long, default_value = "focused")]
        mood: Mood,
        /// Free-form note (may be empty)
        #[arg(long, default_value = "")]
        text: String,
    },
    /// Skip the open reflection prompt
    Dismiss,
}

pub fn run(action: JournalAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open()?;
    let journey = &mut session.journey;

    match action {
        JournalAction::List { limit } => {
            let entries: Vec<_> = journey
                .journal()
                .newest_first()
                .take(limit.unwrap_or(usize::MAX))
                .collect();
            print_json(&json!({
                "pending": journey.journal().pending(),
                "entries": entries,
            }))?;
        }
        JournalAction::Record { mood, text } => {
            let (entry, event) = journey.record_reflection(Reflection::new(mood, text))?;
            print_json(&json!({ "entry": entry, "event": event }))?;
        }
        JournalAction::Dismiss => {
            let event = journey.dismiss_reflection()?;
            print_json(&event)?;
        }
    }

    session.close()
}
