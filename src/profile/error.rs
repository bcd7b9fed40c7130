use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the progression engine.
///
/// Most evaluator-level problems (missing apps, missing variables, unknown
/// rule operations) are recovered per item and never reach this type; these
/// variants cover the failures a caller has to handle.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// The rules root or one of its required category subfolders is absent
    /// or empty. Fatal to rule loading; no partial repository is returned.
    #[error("badge rules missing: {0}")]
    MissingRules(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("notification failed: {0}")]
    Notification(String),
}
