//! Static table of cosmetic unlocks.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Environment,
    Avatar,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Environment, Category::Avatar];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Environment => f.write_str("environment"),
            Category::Avatar => f.write_str("avatar"),
        }
    }
}

/// One unlockable environment or avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockItem {
    pub id: String,
    pub category: Category,
    /// Completed focus count required.
    pub threshold: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl UnlockItem {
    pub fn new(id: &str, category: Category, threshold: u64, name: &str, description: &str) -> Self {
        Self {
            id: id.into(),
            category,
            threshold,
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.threshold == 0
    }

    /// Display name, falling back to the id.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Ordered, validated unlock table.
///
/// Invariants: ids are unique, thresholds never decrease within a category,
/// and every category has at least one threshold-0 entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UnlockCatalog {
    items: Vec<UnlockItem>,
}

impl UnlockCatalog {
    pub fn new(items: Vec<UnlockItem>) -> Result<Self, ValidationError> {
        let mut seen = HashSet::new();
        let mut last_threshold: HashMap<Category, u64> = HashMap::new();

        for item in &items {
            if item.id.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "id".into(),
                    message: "unlock id must not be empty".into(),
                });
            }
            if !seen.insert(item.id.as_str()) {
                return Err(ValidationError::DuplicateId(item.id.clone()));
            }
            if let Some(&previous) = last_threshold.get(&item.category) {
                if item.threshold < previous {
                    return Err(ValidationError::ThresholdOrder {
                        category: item.category,
                        id: item.id.clone(),
                        threshold: item.threshold,
                        previous,
                    });
                }
            }
            last_threshold.insert(item.category, item.threshold);
        }

        for category in Category::ALL {
            if !items.iter().any(|i| i.category == category && i.is_default()) {
                return Err(ValidationError::MissingDefault(category));
            }
        }

        Ok(Self { items })
    }

    /// Desert-to-aurora journey with four traveler variants.
    pub fn journey() -> Self {
        use Category::*;
        Self {
            items: vec![
                UnlockItem::new("desert", Environment, 0, "Ancient Desert", "Begin your journey in the endless dunes"),
                UnlockItem::new("mountain", Environment, 10, "Mystic Peaks", "Ascend to ancient mountain temples"),
                UnlockItem::new("ocean", Environment, 25, "Ethereal Waters", "Traverse mystical ocean depths"),
                UnlockItem::new("aurora", Environment, 50, "Northern Lights", "Dance beneath the cosmic aurora"),
                UnlockItem::new("novice", Avatar, 0, "Novice Traveler", ""),
                UnlockItem::new("seeker", Avatar, 15, "Truth Seeker", ""),
                UnlockItem::new("sage", Avatar, 30, "Ancient Sage", ""),
                UnlockItem::new("enlightened", Avatar, 75, "Enlightened One", ""),
            ],
        }
    }

    pub fn items(&self) -> &[UnlockItem] {
        &self.items
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &UnlockItem> {
        self.items.iter().filter(move |i| i.category == category)
    }

    pub fn get(&self, id: &str) -> Option<&UnlockItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// First threshold-0 entry of the category.
    pub fn default_for(&self, category: Category) -> &UnlockItem {
        // `new` and `journey` both guarantee a default per category.
        self.in_category(category)
            .find(|i| i.is_default())
            .unwrap_or(&self.items[0])
    }

    /// Lowest threshold in the category still above `focus_count`.
    pub fn next_threshold(&self, category: Category, focus_count: u64) -> Option<&UnlockItem> {
        self.in_category(category).find(|i| i.threshold > focus_count)
    }
}

impl Default for UnlockCatalog {
    fn default() -> Self {
        Self::journey()
    }
}

impl<'de> Deserialize<'de> for UnlockCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let items = Vec::<UnlockItem>::deserialize(deserializer)?;
        UnlockCatalog::new(items).map_err(serde::de::Error::custom)
    }
}
