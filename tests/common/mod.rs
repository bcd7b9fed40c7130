//! Shared fixtures for engine integration tests

use std::path::Path;

use serde_json::{json, Value};

/// Write one JSON document, creating parent directories.
pub fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create dirs");
    }
    std::fs::write(path, serde_json::to_string_pretty(value).expect("serialize"))
        .expect("write document");
}

/// Build a small but complete rules tree under `rules_dir`:
/// all three category subfolders, XP rules and a level table.
pub fn write_rules_tree(rules_dir: &Path) {
    write_json(
        &rules_dir.join("badges/arcade.json"),
        &json!({
            "first_win": {
                "operation": "stat_gta",
                "targets": [["snake", "wins", 1]],
                "title": "First Win",
            },
            "high_roller": {
                "operation": "stat_sum_gt",
                "targets": [["snake", "score"], ["pong", "score"]],
                "value": 100,
                "title": "High Roller",
            },
        }),
    );
    write_json(
        &rules_dir.join("badges/meta.json"),
        &json!({
            "seasoned": {
                "operation": "stat_gta",
                "targets": [["kano-world", "level", 2]],
            },
            "collector": {
                "operation": "stat_gta",
                "targets": [["kano-world", "num_offline_badges", 10]],
                "push_back": true,
            },
        }),
    );
    write_json(
        &rules_dir.join("avatars/pixel.json"),
        &json!({
            "crown": {
                "operation": "stat_gta",
                "targets": [["snake", "wins", 5]],
            },
        }),
    );
    write_json(
        &rules_dir.join("environments/spaces.json"),
        &json!({
            "arcade_floor": {
                "operation": "stat_gta",
                "targets": [["kano-world", "xp", 50]],
            },
        }),
    );
    write_json(
        &rules_dir.join("xp.json"),
        &json!({
            "snake": {
                "level": { "1": 10, "2": 20 },
                "multipliers": { "wins": 5 },
            },
            "pong": {
                "multipliers": { "score": 0.5 },
            },
        }),
    );
    write_json(
        &rules_dir.join("levels.json"),
        &json!({ "1": 0, "2": 50, "3": 150 }),
    );
}
