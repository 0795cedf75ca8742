use chrono::{Local, Timelike};
use clap::Subcommand;
use pilgrim_core::views::{suggested_environment, traveler_pose, traveler_position};
use pilgrim_core::Category;
use serde_json::json;

use super::{print_json, Session};

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Unlocked items, active selections and what comes next
    Status,
    /// Every catalog item with its threshold and unlock state
    Catalog,
    /// Switch to an unlocked environment
    Environment { id: String },
    /// Switch to an unlocked traveler
    Avatar { id: String },
}

pub fn run(action: ProgressAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open()?;
    let journey = &mut session.journey;

    match action {
        ProgressAction::Status => {
            let focus = journey.session().completed_focus_count;
            let progress = journey.progress();
            let next: Vec<_> = Category::ALL
                .into_iter()
                .filter_map(|c| journey.catalog().next_threshold(c, focus))
                .map(|item| {
                    json!({
                        "id": item.id,
                        "category": item.category,
                        "threshold": item.threshold,
                        "remaining": item.threshold - focus,
                    })
                })
                .collect();
            print_json(&json!({
                "completedFocusCount": focus,
                "progress": progress,
                "travelerPosition": traveler_position(focus),
                "travelerPose": traveler_pose(journey.session()),
                "suggestedEnvironment": suggested_environment(Local::now().hour(), progress),
                "nextUnlocks": next,
            }))?;
        }
        ProgressAction::Catalog => {
            let progress = journey.progress();
            let items: Vec<_> = journey
                .catalog()
                .items()
                .iter()
                .map(|item| {
                    json!({
                        "id": item.id,
                        "category": item.category,
                        "threshold": item.threshold,
                        "name": item.label(),
                        "description": item.description,
                        "unlocked": progress.is_unlocked(item.category, &item.id),
                        "active": progress.active(item.category) == item.id,
                    })
                })
                .collect();
            print_json(&items)?;
        }
        ProgressAction::Environment { id } => {
            print_json(&journey.select_environment(&id)?)?;
        }
        ProgressAction::Avatar { id } => {
            print_json(&journey.select_avatar(&id)?)?;
        }
    }

    session.close()
}
