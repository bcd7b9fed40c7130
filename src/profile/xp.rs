//! XP calculation
//!
//! Each app's XP rules hold two recognized groups: `level` (a one-off award
//! per level the app has reached) and `multipliers` (a per-unit award for a
//! tracked counter). Everything else in the document is ignored.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ProfileError;
use super::state::{stat_value, AppStateStore};

/// XP rules for one app.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppXpRules {
    /// level number -> award, granted while the app's recorded `level`
    /// variable is at or above that number.
    #[serde(default)]
    pub level: BTreeMap<u32, i64>,
    /// variable name -> XP per unit of the variable's current value.
    #[serde(default)]
    pub multipliers: BTreeMap<String, f64>,
}

/// The full XP rule document: app identifier -> rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct XpRuleSet {
    pub apps: BTreeMap<String, AppXpRules>,
}

impl XpRuleSet {
    /// Load the XP rule document. A missing or unparseable file yields an
    /// empty rule set, which makes [`calculate_xp`] report its sentinel.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str(&content) {
            Ok(rules) => Ok(rules),
            Err(err) => {
                tracing::warn!("ignoring unparseable XP rules {}: {err}", path.display());
                Ok(Self::default())
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

/// Total XP across all apps, or `-1` when no XP rules are loaded.
///
/// Apps without recorded state contribute nothing. Multiplier contributions
/// are summed in floating point and the total is truncated at the end.
pub fn calculate_xp(rules: &XpRuleSet, store: &dyn AppStateStore) -> Result<i64, ProfileError> {
    if rules.is_empty() {
        return Ok(-1);
    }

    let mut points = 0.0_f64;
    for (app, groups) in &rules.apps {
        let state = store.load_app_state(app)?;
        if state.is_empty() {
            continue;
        }

        if let Some(reached) = stat_value(&state, "level") {
            let reached = reached as i64;
            for (&level, &award) in &groups.level {
                if i64::from(level) <= reached {
                    points += award as f64;
                }
            }
        }

        for (variable, &per_unit) in &groups.multipliers {
            if let Some(value) = stat_value(&state, variable) {
                points += per_unit * value;
            }
        }
    }

    Ok(points as i64)
}
