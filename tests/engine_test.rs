//! End-to-end tests for rule loading and progression evaluation over a real
//! on-disk rules tree and file-backed state store.

mod common;

use common::{write_json, write_rules_tree};
use serde_json::json;
use tempfile::TempDir;

use kudos::profile::{
    AppState, AppStateStore, FileAppStateStore, LevelTable, ProfileError, ProfileSession,
    RuleRepository, XpRuleSet,
};

fn session_over(dir: &TempDir) -> ProfileSession<FileAppStateStore> {
    let rules_dir = dir.path().join("rules");
    let rules = RuleRepository::load(&rules_dir).expect("rules load");
    let xp_rules = XpRuleSet::load(&rules_dir.join("xp.json")).expect("xp rules load");
    let levels = LevelTable::load(&rules_dir.join("levels.json")).expect("level table load");
    let store = FileAppStateStore::new(dir.path().join("state"));
    ProfileSession::new(store, rules, xp_rules, levels)
}

fn record(store: &FileAppStateStore, app: &str, vars: &[(&str, serde_json::Value)]) {
    let mut state = AppState::new();
    for (variable, value) in vars {
        state.insert(variable.to_string(), value.clone());
    }
    store.save_app_state(app, &state).expect("save state");
}

#[test]
fn test_loader_merges_all_categories() {
    let dir = TempDir::new().expect("temp dir");
    write_rules_tree(&dir.path().join("rules"));

    let rules = RuleRepository::load(&dir.path().join("rules")).expect("load");
    // arcade(2) + meta(2) + pixel(1) + spaces(1)
    assert_eq!(rules.len(), 6);
}

#[test]
fn test_loader_fails_without_rules_root() {
    let dir = TempDir::new().expect("temp dir");
    let result = RuleRepository::load(&dir.path().join("rules"));
    assert!(matches!(result, Err(ProfileError::MissingRules(_))));
}

#[test]
fn test_loader_fails_on_missing_category() {
    let dir = TempDir::new().expect("temp dir");
    let rules_dir = dir.path().join("rules");
    write_rules_tree(&rules_dir);
    std::fs::remove_dir_all(rules_dir.join("environments")).expect("remove category");

    let result = RuleRepository::load(&rules_dir);
    assert!(matches!(result, Err(ProfileError::MissingRules(_))));
}

#[test]
fn test_loader_skips_empty_document() {
    let dir = TempDir::new().expect("temp dir");
    let rules_dir = dir.path().join("rules");
    write_rules_tree(&rules_dir);
    write_json(&rules_dir.join("badges/hollow.json"), &json!({}));

    // The empty subcategory is skipped, everything else still loads.
    let rules = RuleRepository::load(&rules_dir).expect("load");
    assert_eq!(rules.len(), 6);
}

#[test]
fn test_loader_skips_unknown_operation_item() {
    let dir = TempDir::new().expect("temp dir");
    let rules_dir = dir.path().join("rules");
    write_rules_tree(&rules_dir);
    write_json(
        &rules_dir.join("badges/experimental.json"),
        &json!({
            "mystery": { "operation": "stat_median_lt", "targets": [] },
            "plain": {
                "operation": "stat_gta",
                "targets": [["snake", "wins", 1]],
            },
        }),
    );

    let rules = RuleRepository::load(&rules_dir).expect("load");
    assert_eq!(rules.len(), 7);
    let items: Vec<_> = rules.iter().map(|(_, _, item, _)| item).collect();
    assert!(items.contains(&"plain"));
    assert!(!items.contains(&"mystery"));
}

#[test]
fn test_xp_and_level_over_file_store() {
    let dir = TempDir::new().expect("temp dir");
    write_rules_tree(&dir.path().join("rules"));
    let session = session_over(&dir);

    record(session.store(), "snake", &[("level", json!(2)), ("wins", json!(3))]);
    record(session.store(), "pong", &[("score", json!(40))]);

    // snake: 10 + 20 + 3*5 = 45, pong: 40 * 0.5 = 20
    assert_eq!(session.xp().expect("xp"), 65);

    let standing = session.level().expect("level");
    assert_eq!(standing.level, 2);
    assert!((standing.progress - 15.0 / 100.0).abs() < 1e-9);
}

#[test]
fn test_badge_evaluation_end_to_end() {
    let dir = TempDir::new().expect("temp dir");
    write_rules_tree(&dir.path().join("rules"));
    let session = session_over(&dir);

    record(
        session.store(),
        "snake",
        &[("level", json!(2)), ("wins", json!(3)), ("score", json!(70))],
    );
    record(session.store(), "pong", &[("score", json!(40))]);

    let snapshot = session.badges().expect("badges");
    // Every loaded rule gets an entry with its achieved flag set
    assert_eq!(snapshot.len(), 6);

    let achieved = |c: &str, s: &str, i: &str| snapshot.get(c, s, i).expect("item").achieved;
    assert!(achieved("badges", "arcade", "first_win")); // 3 wins >= 1
    assert!(achieved("badges", "arcade", "high_roller")); // 70 + 40 >= 100
    assert!(!achieved("avatars", "pixel", "crown")); // 3 wins < 5
    assert!(achieved("environments", "spaces", "arcade_floor")); // xp 65 >= 50
    assert!(achieved("badges", "meta", "seasoned")); // level 2 >= 2
    assert!(achieved("badges", "meta", "collector")); // stub offline count 18 >= 10
}

#[test]
fn test_badge_metadata_survives_into_snapshot() {
    let dir = TempDir::new().expect("temp dir");
    write_rules_tree(&dir.path().join("rules"));
    let session = session_over(&dir);

    let snapshot = session.badges().expect("badges");
    let state = snapshot.get("badges", "arcade", "first_win").expect("item");
    assert_eq!(state.meta.get("title"), Some(&json!("First Win")));
}

#[test]
fn test_sentinels_without_rule_documents() {
    let dir = TempDir::new().expect("temp dir");
    let rules_dir = dir.path().join("rules");
    write_rules_tree(&rules_dir);
    std::fs::remove_file(rules_dir.join("xp.json")).expect("remove xp rules");
    std::fs::remove_file(rules_dir.join("levels.json")).expect("remove level table");

    let session = session_over(&dir);
    assert_eq!(session.xp().expect("xp"), -1);
    let standing = session.level().expect("level");
    assert_eq!(standing.level, -1);
    assert_eq!(standing.progress, 0.0);
}
