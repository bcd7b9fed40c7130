//! Achievement snapshots and diffing
//!
//! A snapshot is the complete category/subcategory/item map of achieved
//! flags at one point in time, built whole by an evaluation pass. The differ
//! extracts exactly the items that flipped from not-achieved to achieved.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One badge's evaluated state: the achieved flag plus the rule's display
/// fields, carried along so consumers can render the badge without going
/// back to the rule files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BadgeState {
    pub achieved: bool,
    #[serde(flatten)]
    pub meta: BTreeMap<String, Value>,
}

/// category -> subcategory -> item -> evaluated badge state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AchievementSnapshot {
    categories: BTreeMap<String, BTreeMap<String, BTreeMap<String, BadgeState>>>,
}

impl AchievementSnapshot {
    pub fn insert(&mut self, category: &str, subcategory: &str, item: &str, state: BadgeState) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .entry(subcategory.to_string())
            .or_default()
            .insert(item.to_string(), state);
    }

    pub fn get(&self, category: &str, subcategory: &str, item: &str) -> Option<&BadgeState> {
        self.categories.get(category)?.get(subcategory)?.get(item)
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Iterate every item as `(category, subcategory, item, state)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str, &BadgeState)> + '_ {
        self.categories.iter().flat_map(|(category, subcategories)| {
            subcategories.iter().flat_map(move |(subcategory, items)| {
                items.iter().map(move |(item, state)| {
                    (
                        category.as_str(),
                        subcategory.as_str(),
                        item.as_str(),
                        state,
                    )
                })
            })
        })
    }

    /// `category:subcategory:item` tokens for every item, in order.
    pub fn item_tokens(&self) -> Vec<String> {
        self.iter()
            .map(|(category, subcategory, item, _)| format!("{category}:{subcategory}:{item}"))
            .collect()
    }

    /// The subset of items that flipped from not-achieved in `old` to
    /// achieved in `self`.
    ///
    /// Items absent from `old` (newly added rules) are excluded rather than
    /// treated as transitions. True-to-false flips and unchanged items never
    /// appear.
    pub fn newly_achieved(&self, old: &AchievementSnapshot) -> AchievementSnapshot {
        if self == old {
            return AchievementSnapshot::default();
        }

        let mut changes = AchievementSnapshot::default();
        for (category, subcategory, item, state) in self.iter() {
            if !state.achieved {
                continue;
            }
            if let Some(previous) = old.get(category, subcategory, item) {
                if !previous.achieved {
                    changes.insert(category, subcategory, item, state.clone());
                }
            }
        }
        changes
    }
}
