//! Level calculation
//!
//! A level table maps level numbers to the minimum cumulative XP needed to
//! reach them. Bands are contiguous and non-overlapping when the table is
//! monotone; the top level has no upper bound.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ProfileError;

/// level number -> minimum cumulative XP. Level 1 conventionally maps to 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelTable {
    pub thresholds: BTreeMap<u32, i64>,
}

impl LevelTable {
    /// Load the level table document. A missing or unparseable file yields
    /// an empty table, which makes [`calculate_level`] report its sentinel.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str(&content) {
            Ok(table) => Ok(table),
            Err(err) => {
                tracing::warn!("ignoring unparseable level table {}: {err}", path.display());
                Ok(Self::default())
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn max_level(&self) -> Option<u32> {
        self.thresholds.keys().next_back().copied()
    }
}

/// A level plus fractional progress through its XP band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelStanding {
    /// `-1` when no level table is loaded or the XP is below every band.
    pub level: i64,
    /// Fraction of the way through the current band, in `[0, 1]`. 0 at the
    /// exact lower bound; pinned to 1 at the top level, which has no upper
    /// bound to measure against.
    pub progress: f64,
}

impl LevelStanding {
    const NONE: LevelStanding = LevelStanding {
        level: -1,
        progress: 0.0,
    };
}

/// Find the level band containing `xp`, scanning ascending.
pub fn calculate_level(table: &LevelTable, xp: i64) -> LevelStanding {
    if table.is_empty() {
        return LevelStanding::NONE;
    }

    let mut bands = table.thresholds.iter().peekable();
    while let Some((&level, &level_min)) = bands.next() {
        let Some(&(_, &next_min)) = bands.peek() else {
            // Top level: unbounded band, full progress.
            if xp >= level_min {
                return LevelStanding {
                    level: i64::from(level),
                    progress: 1.0,
                };
            }
            break;
        };

        if xp >= level_min && xp < next_min {
            return LevelStanding {
                level: i64::from(level),
                progress: (xp - level_min) as f64 / (next_min - level_min) as f64,
            };
        }
    }

    // Below the lowest band (e.g. the -1 XP sentinel against a 0-based table).
    LevelStanding::NONE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LevelTable {
        LevelTable {
            thresholds: BTreeMap::from([(1, 0), (2, 100), (3, 250)]),
        }
    }

    #[test]
    fn test_band_lookup() {
        assert_eq!(calculate_level(&table(), 0).level, 1);
        assert_eq!(calculate_level(&table(), 99).level, 1);
        assert_eq!(calculate_level(&table(), 100).level, 2);
        assert_eq!(calculate_level(&table(), 249).level, 2);
        assert_eq!(calculate_level(&table(), 250).level, 3);
        assert_eq!(calculate_level(&table(), 100_000).level, 3);
    }

    #[test]
    fn test_progress_within_band() {
        let standing = calculate_level(&table(), 150);
        assert_eq!(standing.level, 2);
        assert!((standing.progress - 50.0 / 150.0).abs() < 1e-9);

        // Exact lower bound is 0% through the band
        assert_eq!(calculate_level(&table(), 100).progress, 0.0);
    }

    #[test]
    fn test_top_level_progress_is_full() {
        assert_eq!(calculate_level(&table(), 250).progress, 1.0);
        assert_eq!(calculate_level(&table(), 9_999).progress, 1.0);
    }

    #[test]
    fn test_empty_table_sentinel() {
        let standing = calculate_level(&LevelTable::default(), 500);
        assert_eq!(standing.level, -1);
        assert_eq!(standing.progress, 0.0);
    }

    #[test]
    fn test_xp_below_every_band() {
        let below = LevelTable {
            thresholds: BTreeMap::from([(1, 10), (2, 20)]),
        };
        assert_eq!(calculate_level(&below, 5).level, -1);
    }

    #[test]
    fn test_every_band_contains_its_xp() {
        let t = table();
        for xp in 0..400 {
            let standing = calculate_level(&t, xp);
            let min = t.thresholds[&(standing.level as u32)];
            assert!(min <= xp);
            if let Some(&next) = t.thresholds.get(&(standing.level as u32 + 1)) {
                assert!(xp < next);
            }
        }
    }
}
