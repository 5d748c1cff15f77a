//! Unit identity and registration
//!
//! The registry owns unit_id assignment. Identity derives deterministically
//! from the natural fixture key `(season_id, home, away)`, so re-runs always
//! reach the same id, and upserts only ever touch the result fields.

use crate::data::Database;
use crate::{Match, Outcome, Result, UnitKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable identifier for one fixture's feature unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(String);

impl UnitId {
    /// Derive from the natural fixture key: first 16 hex chars of
    /// SHA-256 over "season|home|away".
    pub fn derive(season_id: &str, home: &str, away: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(season_id.as_bytes());
        hasher.update(b"|");
        hasher.update(home.as_bytes());
        hasher.update(b"|");
        hasher.update(away.as_bytes());
        let digest = hasher.finalize();

        let mut id = String::with_capacity(16);
        for byte in &digest[..8] {
            id.push_str(&format!("{:02x}", byte));
        }
        UnitId(id)
    }

    /// Wrap an id read back from storage
    pub fn from_string(id: String) -> Self {
        UnitId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry row for one fixture's unit
#[derive(Debug, Clone)]
pub struct UnitRow {
    pub unit_id: UnitId,
    pub season_id: String,
    pub date: NaiveDate,
    pub home: String,
    pub away: String,
    /// "h-a", or None until the match is played
    pub score: Option<String>,
    pub outcome: Option<Outcome>,
    pub kind: UnitKind,
    /// Written later by the external prediction component
    pub home_win_prob: Option<f64>,
    pub draw_prob: Option<f64>,
    pub away_win_prob: Option<f64>,
}

/// Assigns and upserts unit identities
pub struct UnitRegistry<'a> {
    db: &'a Database,
}

impl<'a> UnitRegistry<'a> {
    pub fn new(db: &'a Database) -> Self {
        UnitRegistry { db }
    }

    /// Register (or refresh) a fixture's unit row and return its id.
    ///
    /// A second registration with a newly known score moves the unit from
    /// prediction to training without changing its id.
    pub fn register(&self, fixture: &Match) -> Result<UnitId> {
        let unit_id = UnitId::derive(&fixture.season_id, &fixture.home, &fixture.away);
        let kind = if fixture.played() {
            UnitKind::Training
        } else {
            UnitKind::Prediction
        };

        let row = UnitRow {
            unit_id: unit_id.clone(),
            season_id: fixture.season_id.clone(),
            date: fixture.date,
            home: fixture.home.clone(),
            away: fixture.away.clone(),
            score: fixture.score_string(),
            outcome: fixture.outcome(),
            kind,
            home_win_prob: None,
            draw_prob: None,
            away_win_prob: None,
        };
        self.db.upsert_unit(&row)?;
        Ok(unit_id)
    }

    /// Look up a unit row by natural fixture identity
    pub fn lookup(&self, season_id: &str, home: &str, away: &str) -> Result<Option<UnitRow>> {
        self.db.find_unit(season_id, home, away)
    }
}
