//! Unlock evaluation and cosmetic selection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::catalog::{Category, UnlockCatalog, UnlockItem};
use crate::error::{CoreError, Result};

/// Durable progression state.
///
/// Unlocked sets only ever grow, and each active id is a member of its set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub unlocked_environment_ids: BTreeSet<String>,
    pub unlocked_avatar_ids: BTreeSet<String>,
    pub active_environment_id: String,
    pub active_avatar_id: String,
}

impl ProgressState {
    /// Only the threshold-0 items unlocked; first defaults active.
    pub fn initial(catalog: &UnlockCatalog) -> Self {
        let defaults = |category| -> BTreeSet<String> {
            catalog
                .in_category(category)
                .filter(|i| i.is_default())
                .map(|i| i.id.clone())
                .collect()
        };
        Self {
            unlocked_environment_ids: defaults(Category::Environment),
            unlocked_avatar_ids: defaults(Category::Avatar),
            active_environment_id: catalog.default_for(Category::Environment).id.clone(),
            active_avatar_id: catalog.default_for(Category::Avatar).id.clone(),
        }
    }

    pub fn unlocked(&self, category: Category) -> &BTreeSet<String> {
        match category {
            Category::Environment => &self.unlocked_environment_ids,
            Category::Avatar => &self.unlocked_avatar_ids,
        }
    }

    pub fn active(&self, category: Category) -> &str {
        match category {
            Category::Environment => &self.active_environment_id,
            Category::Avatar => &self.active_avatar_id,
        }
    }

    pub fn is_unlocked(&self, category: Category, id: &str) -> bool {
        self.unlocked(category).contains(id)
    }

    fn unlocked_mut(&mut self, category: Category) -> &mut BTreeSet<String> {
        match category {
            Category::Environment => &mut self.unlocked_environment_ids,
            Category::Avatar => &mut self.unlocked_avatar_ids,
        }
    }

    fn active_mut(&mut self, category: Category) -> &mut String {
        match category {
            Category::Environment => &mut self.active_environment_id,
            Category::Avatar => &mut self.active_avatar_id,
        }
    }
}

/// Owns the catalog and the progress it gates.
#[derive(Debug, Clone)]
pub struct Progression {
    catalog: UnlockCatalog,
    state: ProgressState,
}

impl Progression {
    pub fn new(catalog: UnlockCatalog) -> Self {
        let state = ProgressState::initial(&catalog);
        Self { catalog, state }
    }

    /// Adopt persisted progress, re-establishing the invariants.
    ///
    /// Defaults are always unlocked. Ids the catalog no longer knows are kept
    /// so the sets never shrink; an active id outside its set falls back to
    /// the category default.
    pub fn restore(catalog: UnlockCatalog, mut state: ProgressState) -> Self {
        for category in Category::ALL {
            let defaults: Vec<String> = catalog
                .in_category(category)
                .filter(|i| i.is_default())
                .map(|i| i.id.clone())
                .collect();
            state.unlocked_mut(category).extend(defaults);

            if !state.is_unlocked(category, state.active(category)) {
                tracing::debug!(
                    %category,
                    id = state.active(category),
                    "active id is not unlocked, falling back to default"
                );
                *state.active_mut(category) = catalog.default_for(category).id.clone();
            }
        }
        Self { catalog, state }
    }

    pub fn catalog(&self) -> &UnlockCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Unlock every catalog item whose threshold `completed_focus_count` meets.
    ///
    /// Returns newly unlocked items in catalog order; empty when nothing new
    /// qualifies. A new avatar is equipped immediately, a new environment is
    /// not.
    pub fn check_unlocks(&mut self, completed_focus_count: u64) -> Vec<UnlockItem> {
        let mut unlocked = Vec::new();
        for item in self.catalog.items() {
            if item.threshold > completed_focus_count {
                continue;
            }
            if !self.state.unlocked_mut(item.category).insert(item.id.clone()) {
                continue;
            }
            if item.category == Category::Avatar {
                self.state.active_avatar_id = item.id.clone();
            }
            tracing::info!(
                category = %item.category,
                id = %item.id,
                threshold = item.threshold,
                "unlocked"
            );
            unlocked.push(item.clone());
        }
        unlocked
    }

    pub fn select_environment(&mut self, id: &str) -> Result<bool> {
        self.select(Category::Environment, id)
    }

    pub fn select_avatar(&mut self, id: &str) -> Result<bool> {
        self.select(Category::Avatar, id)
    }

    /// Returns whether the active id changed.
    pub fn select(&mut self, category: Category, id: &str) -> Result<bool> {
        if !self.state.is_unlocked(category, id) {
            return Err(CoreError::NotUnlocked {
                category,
                id: id.to_string(),
            });
        }
        let active = self.state.active_mut(category);
        if active.as_str() == id {
            return Ok(false);
        }
        *active = id.to_string();
        Ok(true)
    }
}

impl Default for Progression {
    fn default() -> Self {
        Self::new(UnlockCatalog::journey())
    }
}
