//! Badge rule documents and the rule repository loader
//!
//! Rules live on disk as JSON documents grouped into a fixed set of category
//! subfolders under the rules root. Each file holds the items of one
//! subcategory (subcategory name = filename stem). Operations are resolved
//! into a closed enum at load time; evaluation never dispatches on strings.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::error::ProfileError;
use super::state::numeric;

/// The category subfolders a rules root must contain.
pub const RULE_CATEGORIES: &[&str] = &["avatars", "badges", "environments"];

/// One target of a `stat_gta` rule: the app's variable must meet the
/// per-target threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct StatThreshold {
    pub app: String,
    pub variable: String,
    pub threshold: f64,
}

/// One target of a `stat_sum_gt` rule.
#[derive(Debug, Clone, PartialEq)]
pub struct StatRef {
    pub app: String,
    pub variable: String,
}

/// Achievement condition, resolved from the wire `operation` string.
#[derive(Debug, Clone, PartialEq)]
pub enum BadgeOp {
    /// `stat_gta`: every target meets or exceeds its own threshold.
    StatsAtLeast(Vec<StatThreshold>),
    /// `stat_sum_gt`: the targets' values sum to at least `value`,
    /// missing targets contributing 0.
    StatSumAtLeast { targets: Vec<StatRef>, value: f64 },
}

/// A loaded badge rule.
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeRule {
    pub op: BadgeOp,
    /// Deferred rules run in the second evaluation pass, after the offline
    /// badge count has been injected.
    pub push_back: bool,
    /// Display fields (title, description, icon, ...) carried through to
    /// achievement snapshots untouched.
    pub meta: BTreeMap<String, Value>,
}

/// Wire form of a rule, before the operation is resolved.
#[derive(Debug, Deserialize)]
struct RawBadgeRule {
    operation: String,
    #[serde(default)]
    targets: Vec<Value>,
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    push_back: bool,
    #[serde(flatten)]
    meta: BTreeMap<String, Value>,
}

impl RawBadgeRule {
    fn resolve(self) -> Result<BadgeRule, String> {
        let op = match self.operation.as_str() {
            "stat_gta" => {
                let mut targets = Vec::with_capacity(self.targets.len());
                for raw in &self.targets {
                    targets.push(parse_threshold_target(raw)?);
                }
                BadgeOp::StatsAtLeast(targets)
            }
            "stat_sum_gt" => {
                let mut targets = Vec::with_capacity(self.targets.len());
                for raw in &self.targets {
                    targets.push(parse_sum_target(raw)?);
                }
                let value = self
                    .value
                    .ok_or_else(|| "stat_sum_gt rule has no value".to_string())?;
                BadgeOp::StatSumAtLeast { targets, value }
            }
            other => return Err(format!("unknown operation {other}")),
        };

        Ok(BadgeRule {
            op,
            push_back: self.push_back,
            meta: self.meta,
        })
    }
}

/// Targets are wire-encoded as `[app, variable, threshold]`.
fn parse_threshold_target(raw: &Value) -> Result<StatThreshold, String> {
    let parts = raw
        .as_array()
        .filter(|parts| parts.len() >= 3)
        .ok_or_else(|| format!("malformed stat_gta target: {raw}"))?;
    let app = parts[0]
        .as_str()
        .ok_or_else(|| format!("malformed stat_gta target: {raw}"))?;
    let variable = parts[1]
        .as_str()
        .ok_or_else(|| format!("malformed stat_gta target: {raw}"))?;
    let threshold =
        numeric(&parts[2]).ok_or_else(|| format!("malformed stat_gta target: {raw}"))?;
    Ok(StatThreshold {
        app: app.to_string(),
        variable: variable.to_string(),
        threshold,
    })
}

/// Targets are wire-encoded as `[app, variable]`.
fn parse_sum_target(raw: &Value) -> Result<StatRef, String> {
    let parts = raw
        .as_array()
        .filter(|parts| parts.len() >= 2)
        .ok_or_else(|| format!("malformed stat_sum_gt target: {raw}"))?;
    let app = parts[0]
        .as_str()
        .ok_or_else(|| format!("malformed stat_sum_gt target: {raw}"))?;
    let variable = parts[1]
        .as_str()
        .ok_or_else(|| format!("malformed stat_sum_gt target: {raw}"))?;
    Ok(StatRef {
        app: app.to_string(),
        variable: variable.to_string(),
    })
}

/// The merged (category, subcategory, item) rule tree.
#[derive(Debug, Clone, Default)]
pub struct RuleRepository {
    categories: BTreeMap<String, BTreeMap<String, BTreeMap<String, BadgeRule>>>,
}

impl RuleRepository {
    /// Load and merge every rule document under `rules_dir`.
    ///
    /// The root and every category subfolder must exist and contain at least
    /// one file; otherwise loading fails with no partial repository. A file
    /// that is unreadable, unparseable or empty only skips its subcategory,
    /// and an item with an unresolvable operation only skips that item.
    pub fn load(rules_dir: &Path) -> Result<Self, ProfileError> {
        if !rules_dir.exists() {
            return Err(ProfileError::MissingRules(rules_dir.to_path_buf()));
        }

        let mut repository = Self::default();
        for category in RULE_CATEGORIES {
            let folder = rules_dir.join(category);
            if !folder.is_dir() {
                return Err(ProfileError::MissingRules(folder));
            }

            let mut rule_files: Vec<_> = std::fs::read_dir(&folder)?
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .collect();
            if rule_files.is_empty() {
                return Err(ProfileError::MissingRules(folder));
            }
            rule_files.sort();

            for path in rule_files {
                let Some(subcategory) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                repository.load_document(category, subcategory, &path);
            }
        }
        Ok(repository)
    }

    /// Parse one rule document and merge its items. Document-level problems
    /// skip the subcategory; item-level problems skip the item.
    fn load_document(&mut self, category: &str, subcategory: &str, path: &Path) {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("skipping unreadable rule file {}: {err}", path.display());
                return;
            }
        };

        let items: BTreeMap<String, Value> = match serde_json::from_str(&content) {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!("skipping unparseable rule file {}: {err}", path.display());
                return;
            }
        };
        if items.is_empty() {
            tracing::warn!("rule file empty: {}", path.display());
            return;
        }

        for (item, raw) in items {
            let parsed: RawBadgeRule = match serde_json::from_value(raw) {
                Ok(parsed) => parsed,
                Err(err) => {
                    tracing::warn!(
                        "skipping malformed rule {category}:{subcategory}:{item}: {err}"
                    );
                    continue;
                }
            };
            match parsed.resolve() {
                Ok(rule) => self.insert(category, subcategory, &item, rule),
                Err(reason) => {
                    tracing::warn!("skipping rule {category}:{subcategory}:{item}: {reason}");
                }
            }
        }
    }

    pub fn insert(&mut self, category: &str, subcategory: &str, item: &str, rule: BadgeRule) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .entry(subcategory.to_string())
            .or_default()
            .insert(item.to_string(), rule);
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Iterate every rule as `(category, subcategory, item, rule)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str, &BadgeRule)> + '_ {
        self.categories.iter().flat_map(|(category, subcategories)| {
            subcategories.iter().flat_map(move |(subcategory, items)| {
                items.iter().map(move |(item, rule)| {
                    (
                        category.as_str(),
                        subcategory.as_str(),
                        item.as_str(),
                        rule,
                    )
                })
            })
        })
    }
}
