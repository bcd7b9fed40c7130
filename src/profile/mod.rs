//! Rule-driven progression engine: XP, levels and badges over per-app state
//!
//! App modules report progress facts into the state store; declarative rule
//! documents turn that state into an XP total, a level and a set of achieved
//! badges. The session orchestrator diffs progression around every state
//! save to decide when the user should be notified.

mod badges;
mod error;
mod levels;
mod rules;
mod session;
mod snapshot;
mod state;
mod xp;

pub use badges::{
    evaluate_badges, AchievedBadgeCount, FixedOfflineBadgeCount, OfflineBadgeCounter, META_APP,
    OFFLINE_BADGES_VAR,
};
pub use error::ProfileError;
pub use levels::{calculate_level, LevelStanding, LevelTable};
pub use rules::{BadgeOp, BadgeRule, RuleRepository, StatRef, StatThreshold, RULE_CATEGORIES};
pub use session::{
    CommandNotifier, Notifier, NullNotifier, ProfileSession, ProgressionSnapshot, StateChange,
};
pub use snapshot::{AchievementSnapshot, BadgeState};
pub use state::{
    numeric, stat_value, AppState, AppStateStore, FileAppStateStore, MemoryAppStateStore,
};
pub use xp::{calculate_xp, AppXpRules, XpRuleSet};
