//! Badge evaluation
//!
//! Evaluates every badge rule against the aggregated app state and produces
//! an achievement snapshot. Evaluation runs in two passes: normal rules
//! first, then deferred (`push_back`) rules, which additionally see the
//! offline badge count derived from the first pass. The injection is the
//! only mutation of the aggregated state and is local to one call.

use std::collections::BTreeMap;

use serde_json::Value;

use super::error::ProfileError;
use super::levels::{calculate_level, LevelTable};
use super::rules::{BadgeOp, BadgeRule, RuleRepository};
use super::snapshot::{AchievementSnapshot, BadgeState};
use super::state::{stat_value, AppState, AppStateStore};
use super::xp::{calculate_xp, XpRuleSet};

/// Reserved pseudo-app carrying engine-derived aggregates (`xp`, `level`,
/// the offline badge count). Part of the rule file interface; never
/// persisted through the store.
pub const META_APP: &str = "kano-world";

/// Variable under [`META_APP`] holding the offline badge count, visible to
/// deferred rules only.
pub const OFFLINE_BADGES_VAR: &str = "num_offline_badges";

/// Source of the offline badge count injected between the two passes.
///
/// Its exact semantics are still owned by the sync layer; the engine only
/// defines the seam and where the value becomes visible.
pub trait OfflineBadgeCounter {
    fn count(&self, first_pass: &AchievementSnapshot) -> i64;
}

/// Legacy fixed count, kept until a real sync source exists.
#[derive(Debug, Clone, Copy)]
pub struct FixedOfflineBadgeCount(pub i64);

impl Default for FixedOfflineBadgeCount {
    fn default() -> Self {
        Self(18)
    }
}

impl OfflineBadgeCounter for FixedOfflineBadgeCount {
    fn count(&self, _first_pass: &AchievementSnapshot) -> i64 {
        self.0
    }
}

/// Counts the badges achieved in the first pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct AchievedBadgeCount;

impl OfflineBadgeCounter for AchievedBadgeCount {
    fn count(&self, first_pass: &AchievementSnapshot) -> i64 {
        first_pass
            .iter()
            .filter(|(_, _, _, state)| state.achieved)
            .count() as i64
    }
}

/// Aggregated state for one evaluation: every known app's state plus the
/// reserved pseudo-app. Read-only during a pass.
struct EvalContext {
    app_state: BTreeMap<String, AppState>,
}

impl EvalContext {
    fn value(&self, app: &str, variable: &str) -> Option<f64> {
        self.app_state
            .get(app)
            .and_then(|state| stat_value(state, variable))
    }

    /// Derive the second-pass context from the first-pass result.
    fn with_offline_count(mut self, count: i64) -> Self {
        self.app_state
            .entry(META_APP.to_string())
            .or_default()
            .insert(OFFLINE_BADGES_VAR.to_string(), Value::from(count));
        self
    }
}

/// Evaluate every badge rule and return the full achievement snapshot.
pub fn evaluate_badges(
    rules: &RuleRepository,
    xp_rules: &XpRuleSet,
    levels: &LevelTable,
    store: &dyn AppStateStore,
    offline: &dyn OfflineBadgeCounter,
) -> Result<AchievementSnapshot, ProfileError> {
    let mut app_state = BTreeMap::new();
    for app in store.app_list()? {
        let state = store.load_app_state(&app)?;
        app_state.insert(app, state);
    }

    // The pseudo-app exposes overall progression so meta-badges can match
    // against it like any other app.
    let xp = calculate_xp(xp_rules, store)?;
    let standing = calculate_level(levels, xp);
    let mut meta = AppState::new();
    meta.insert("xp".to_string(), Value::from(xp));
    meta.insert("level".to_string(), Value::from(standing.level));
    app_state.insert(META_APP.to_string(), meta);

    let ctx = EvalContext { app_state };
    let mut snapshot = AchievementSnapshot::default();
    run_pass(rules, &ctx, false, &mut snapshot);

    // Deferred rules run against the first pass's outcome, exposed through
    // the one injected counter.
    let ctx = ctx.with_offline_count(offline.count(&snapshot));
    run_pass(rules, &ctx, true, &mut snapshot);

    Ok(snapshot)
}

/// Evaluate the rules of one phase into the snapshot.
fn run_pass(rules: &RuleRepository, ctx: &EvalContext, push_back: bool, out: &mut AchievementSnapshot) {
    for (category, subcategory, item, rule) in rules.iter() {
        if rule.push_back != push_back {
            continue;
        }
        let achieved = evaluate_rule(rule, ctx);
        out.insert(
            category,
            subcategory,
            item,
            BadgeState {
                achieved,
                meta: rule.meta.clone(),
            },
        );
    }
}

/// A missing app or variable is a normal "not yet achieved" outcome (or a
/// zero contribution to a sum), never an error.
fn evaluate_rule(rule: &BadgeRule, ctx: &EvalContext) -> bool {
    match &rule.op {
        BadgeOp::StatsAtLeast(targets) => targets.iter().all(|target| {
            ctx.value(&target.app, &target.variable)
                .is_some_and(|value| value >= target.threshold)
        }),
        BadgeOp::StatSumAtLeast { targets, value } => {
            let sum: f64 = targets
                .iter()
                .filter_map(|target| ctx.value(&target.app, &target.variable))
                .sum();
            sum >= *value
        }
    }
}
