//! Per-app state storage
//!
//! Every application reports progress-relevant facts (counters, levels,
//! flags) as a flat JSON document. The engine only reads and writes these
//! documents through the [`AppStateStore`] trait, so embedders can swap the
//! file-backed store for their own.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use fs2::FileExt;
use serde_json::Value;

use super::error::ProfileError;

/// One app's state document: variable name -> JSON scalar.
pub type AppState = BTreeMap<String, Value>;

/// Numeric view of a state value.
///
/// Integers and floats map directly; booleans count as 0/1 so flags can feed
/// sum rules. Strings and compound values have no numeric reading.
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Look up a variable and coerce it to a number.
pub fn stat_value(state: &AppState, variable: &str) -> Option<f64> {
    state.get(variable).and_then(numeric)
}

/// Storage collaborator for per-app state documents.
///
/// Absent apps load as empty state. Implementations are expected to
/// serialize concurrent writers themselves; the engine's before/after
/// diffing assumes no other writer mutates the same app between snapshots.
pub trait AppStateStore {
    fn load_app_state(&self, app: &str) -> Result<AppState, ProfileError>;
    fn save_app_state(&self, app: &str, state: &AppState) -> Result<(), ProfileError>;
    /// All app identifiers with recorded state.
    fn app_list(&self) -> Result<Vec<String>, ProfileError>;
}

/// File-backed store: `<state_dir>/<app>.json`, one document per app.
#[derive(Debug, Clone)]
pub struct FileAppStateStore {
    state_dir: PathBuf,
}

impl FileAppStateStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    fn app_path(&self, app: &str) -> PathBuf {
        self.state_dir.join(format!("{app}.json"))
    }
}

impl AppStateStore for FileAppStateStore {
    fn load_app_state(&self, app: &str) -> Result<AppState, ProfileError> {
        let path = self.app_path(app);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(AppState::new()),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str(&content) {
            Ok(state) => Ok(state),
            Err(err) => {
                // A corrupt document degrades to "nothing recorded yet"; the
                // evaluator's missing-prerequisite policy handles the rest.
                tracing::warn!("ignoring unparseable state file {}: {err}", path.display());
                Ok(AppState::new())
            }
        }
    }

    /// Save with an exclusive advisory lock and an atomic temp-file rename,
    /// so a crash mid-write never leaves a truncated document behind.
    fn save_app_state(&self, app: &str, state: &AppState) -> Result<(), ProfileError> {
        std::fs::create_dir_all(&self.state_dir)?;

        let path = self.app_path(app);
        let lock_path = path.with_extension("json.lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)?;
        lock_file.lock_exclusive()?;

        let content = serde_json::to_string_pretty(state).map_err(|source| ProfileError::Parse {
            path: path.clone(),
            source,
        })?;

        let temp_path = path.with_extension("json.tmp");
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.sync_all()?;

        std::fs::rename(&temp_path, &path)?;
        // Lock released when lock_file is dropped.
        Ok(())
    }

    fn app_list(&self) -> Result<Vec<String>, ProfileError> {
        let entries = match std::fs::read_dir(&self.state_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut apps = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    apps.push(stem.to_string());
                }
            }
        }
        apps.sort();
        Ok(apps)
    }
}

/// In-memory store for embedders and tests.
#[derive(Debug, Default)]
pub struct MemoryAppStateStore {
    apps: Mutex<BTreeMap<String, AppState>>,
}

impl MemoryAppStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seeding of one app's state.
    pub fn with_app(self, app: &str, state: AppState) -> Self {
        self.apps
            .lock()
            .expect("lock")
            .insert(app.to_string(), state);
        self
    }
}

impl AppStateStore for MemoryAppStateStore {
    fn load_app_state(&self, app: &str) -> Result<AppState, ProfileError> {
        Ok(self
            .apps
            .lock()
            .expect("lock")
            .get(app)
            .cloned()
            .unwrap_or_default())
    }

    fn save_app_state(&self, app: &str, state: &AppState) -> Result<(), ProfileError> {
        self.apps
            .lock()
            .expect("lock")
            .insert(app.to_string(), state.clone());
        Ok(())
    }

    fn app_list(&self) -> Result<Vec<String>, ProfileError> {
        Ok(self.apps.lock().expect("lock").keys().cloned().collect())
    }
}
