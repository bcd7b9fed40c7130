//! Profile session and state-change orchestration
//!
//! A [`ProfileSession`] owns the loaded rules, the state store and the
//! notification collaborator for one process. Its lifecycle belongs to the
//! top-level application; the engine keeps no global state. The session
//! wraps every state mutation with before/after progression snapshots and
//! fires a notification when the level changed or new badges were achieved.

use std::path::PathBuf;
use std::process::Command;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::Config;
use crate::paths;

use super::badges::{evaluate_badges, FixedOfflineBadgeCount, OfflineBadgeCounter};
use super::error::ProfileError;
use super::levels::{calculate_level, LevelStanding, LevelTable};
use super::rules::RuleRepository;
use super::snapshot::AchievementSnapshot;
use super::state::{stat_value, AppState, AppStateStore, FileAppStateStore};
use super::xp::{calculate_xp, XpRuleSet};

/// User-facing notification collaborator, fire-and-forget. A failure here
/// is logged and swallowed; it never rolls back a persisted state change.
pub trait Notifier {
    fn notify(&self, level_token: &str, item_tokens: &[String]) -> Result<(), ProfileError>;
}

/// Notifier for headless contexts: does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _level_token: &str, _item_tokens: &[String]) -> Result<(), ProfileError> {
        Ok(())
    }
}

/// Spawns an external command with the level token and the newly achieved
/// item tokens as arguments. The command is not waited on.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    command: PathBuf,
}

impl CommandNotifier {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self, level_token: &str, item_tokens: &[String]) -> Result<(), ProfileError> {
        let mut command = Command::new(&self.command);
        if !level_token.is_empty() {
            command.arg(level_token);
        }
        command.args(item_tokens);
        command
            .spawn()
            .map(|_| ())
            .map_err(|err| {
                ProfileError::Notification(format!("{}: {err}", self.command.display()))
            })
    }
}

/// Level plus full badge snapshot at one point in time. Ephemeral, never
/// persisted; only used to bracket a state mutation.
#[derive(Debug, Clone)]
pub struct ProgressionSnapshot {
    pub level: i64,
    pub badges: AchievementSnapshot,
    pub captured_at: DateTime<Utc>,
}

/// What a state save changed, as seen by the engine.
#[derive(Debug, Clone, Default)]
pub struct StateChange {
    /// `level:{n}` when the level changed, empty otherwise.
    pub level_token: String,
    /// Badges that flipped to achieved during the save.
    pub new_items: AchievementSnapshot,
}

impl StateChange {
    fn between(before: &ProgressionSnapshot, after: &ProgressionSnapshot) -> Self {
        let level_token = if before.level != after.level {
            format!("level:{}", after.level)
        } else {
            String::new()
        };
        Self {
            level_token,
            new_items: after.badges.newly_achieved(&before.badges),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.level_token.is_empty() && self.new_items.is_empty()
    }

    pub fn item_tokens(&self) -> Vec<String> {
        self.new_items.item_tokens()
    }
}

/// One user's progression engine: rules, state store, collaborators.
pub struct ProfileSession<S: AppStateStore> {
    store: S,
    rules: RuleRepository,
    xp_rules: XpRuleSet,
    levels: LevelTable,
    offline: Box<dyn OfflineBadgeCounter>,
    notifier: Box<dyn Notifier>,
    /// Unlocked profiles ignore direct writes to the `level` state variable.
    unlocked: bool,
}

impl ProfileSession<FileAppStateStore> {
    /// Assemble a session from the on-disk layout the config describes.
    pub fn open(config: &Config) -> Result<Self, ProfileError> {
        let rules_dir = config.rules_dir();
        let rules = RuleRepository::load(&rules_dir)?;
        let xp_rules = XpRuleSet::load(&rules_dir.join(paths::XP_RULES_FILE))?;
        let levels = LevelTable::load(&rules_dir.join(paths::LEVEL_TABLE_FILE))?;
        let store = FileAppStateStore::new(config.state_dir());

        let mut session =
            Self::new(store, rules, xp_rules, levels).with_unlocked(config.settings.unlocked);
        if config.settings.notify {
            if let Some(command) = &config.settings.notifier_command {
                session = session.with_notifier(Box::new(CommandNotifier::new(command)));
            }
        }
        Ok(session)
    }
}

impl<S: AppStateStore> ProfileSession<S> {
    /// Create a session with the default collaborators: the legacy fixed
    /// offline badge count and no notifications.
    pub fn new(store: S, rules: RuleRepository, xp_rules: XpRuleSet, levels: LevelTable) -> Self {
        Self {
            store,
            rules,
            xp_rules,
            levels,
            offline: Box::new(FixedOfflineBadgeCount::default()),
            notifier: Box::new(NullNotifier),
            unlocked: false,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_offline_counter(mut self, offline: Box<dyn OfflineBadgeCounter>) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_unlocked(mut self, unlocked: bool) -> Self {
        self.unlocked = unlocked;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Total XP, or `-1` when no XP rules are loaded.
    pub fn xp(&self) -> Result<i64, ProfileError> {
        calculate_xp(&self.xp_rules, &self.store)
    }

    /// Current level standing, sentinel `(-1, 0)` without a level table.
    pub fn level(&self) -> Result<LevelStanding, ProfileError> {
        Ok(calculate_level(&self.levels, self.xp()?))
    }

    /// Evaluate every badge rule against the current app state.
    pub fn badges(&self) -> Result<AchievementSnapshot, ProfileError> {
        evaluate_badges(
            &self.rules,
            &self.xp_rules,
            &self.levels,
            &self.store,
            self.offline.as_ref(),
        )
    }

    fn progression(&self) -> Result<ProgressionSnapshot, ProfileError> {
        Ok(ProgressionSnapshot {
            level: self.level()?.level,
            badges: self.badges()?,
            captured_at: Utc::now(),
        })
    }

    /// Persist `state` for `app`, bracketed by progression snapshots.
    ///
    /// When the save moved the level or achieved new badges, the notifier is
    /// invoked with the change tokens; its failure is logged and swallowed
    /// since the save has already succeeded. If the save itself fails,
    /// nothing is notified and the error propagates.
    pub fn save_app_state(&self, app: &str, state: &AppState) -> Result<StateChange, ProfileError> {
        let before = self.progression()?;
        self.store.save_app_state(app, state)?;
        let after = self.progression()?;

        let change = StateChange::between(&before, &after);
        if change.is_empty() {
            return Ok(change);
        }

        tracing::debug!(
            app,
            level = %change.level_token,
            items = change.new_items.len(),
            at = %after.captured_at,
            "progression changed"
        );
        if let Err(err) = self.notifier.notify(&change.level_token, &change.item_tokens()) {
            tracing::warn!("{err}");
        }
        Ok(change)
    }

    /// Set one state variable and save through the orchestrator.
    pub fn set_variable(
        &self,
        app: &str,
        variable: &str,
        value: Value,
    ) -> Result<StateChange, ProfileError> {
        if self.unlocked && variable == "level" {
            return Ok(StateChange::default());
        }
        let mut state = self.store.load_app_state(app)?;
        state.insert(variable.to_string(), value);
        self.save_app_state(app, &state)
    }

    /// Add `delta` to a numeric state variable (missing counts as 0) and
    /// save through the orchestrator.
    pub fn increment_variable(
        &self,
        app: &str,
        variable: &str,
        delta: f64,
    ) -> Result<StateChange, ProfileError> {
        if self.unlocked && variable == "level" {
            return Ok(StateChange::default());
        }
        let mut state = self.store.load_app_state(app)?;
        let next = stat_value(&state, variable).unwrap_or(0.0) + delta;
        // Keep whole-number counters integral in the stored document.
        let value = if next.fract() == 0.0 {
            Value::from(next as i64)
        } else {
            Value::from(next)
        };
        state.insert(variable.to_string(), value);
        self.save_app_state(app, &state)
    }
}
