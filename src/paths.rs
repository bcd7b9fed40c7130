//! Data layout under the user's home directory

use std::path::PathBuf;

/// XP rule document inside the rules directory.
pub const XP_RULES_FILE: &str = "xp.json";

/// Level table document inside the rules directory.
pub const LEVEL_TABLE_FILE: &str = "levels.json";

/// Root data directory (`~/.kudos/`).
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kudos")
}

/// Default rules tree root (`~/.kudos/rules/`).
pub fn default_rules_dir() -> PathBuf {
    data_dir().join("rules")
}

/// Default per-app state directory (`~/.kudos/state/`).
pub fn default_state_dir() -> PathBuf {
    data_dir().join("state")
}

/// Config file path (`~/.kudos/config.toml`).
pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}
