//! Completion-count driven unlocks for environments and avatars.

mod catalog;
mod engine;

pub use catalog::{Category, UnlockCatalog, UnlockItem};
pub use engine::{ProgressState, Progression};
