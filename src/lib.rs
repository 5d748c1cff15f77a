//! Football match outcome features from scraped stats
//!
//! Normalizes scraped match reports into a canonical store and derives
//! fixed-length rolling-history tensors per team for a sequence model.

pub mod data;
pub mod features;
pub mod pipeline;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Per-side match statistics from a full match report.
///
/// All fields are required: a report with a missing category never produces
/// a partial sheet, so a populated `StatSheet` is always usable as history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatSheet {
    pub possession: f32,
    pub passes_attempts: u32,
    pub passes_completed: u32,
    pub shots_attempts: u32,
    pub shots_completed: u32,
    pub saves_attempts: u32,
    pub saves_completed: u32,
    pub fouls: u32,
    pub corners: u32,
    pub crosses: u32,
    pub touches: u32,
    pub tackles: u32,
    pub interceptions: u32,
    pub aerials_won: u32,
    pub clearances: u32,
    pub offsides: u32,
    pub goal_kicks: u32,
    pub throw_ins: u32,
    pub long_balls: u32,
}

impl StatSheet {
    /// Number of stat columns per side
    pub const DIM: usize = 19;

    /// Flatten to a feature vector
    pub fn to_vec(&self) -> Vec<f32> {
        vec![
            self.possession,
            self.passes_attempts as f32,
            self.passes_completed as f32,
            self.shots_attempts as f32,
            self.shots_completed as f32,
            self.saves_attempts as f32,
            self.saves_completed as f32,
            self.fouls as f32,
            self.corners as f32,
            self.crosses as f32,
            self.touches as f32,
            self.tackles as f32,
            self.interceptions as f32,
            self.aerials_won as f32,
            self.clearances as f32,
            self.offsides as f32,
            self.goal_kicks as f32,
            self.throw_ins as f32,
            self.long_balls as f32,
        ]
    }
}

/// Both sides' stat sheets for one match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub home: StatSheet,
    pub away: StatSheet,
}

/// A canonical match record: played matches carry scores (and usually stats),
/// upcoming fixtures carry neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    /// Competition-season the fixture belongs to
    pub season_id: String,
    pub date: NaiveDate,
    pub home: String,
    pub away: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    /// Unique external match-report identifier
    pub report_link: String,
    pub attendance: Option<u32>,
    /// Full team stats, or None if any category is missing for the match
    pub stats: Option<MatchStats>,
}

impl Match {
    /// Both scores known?
    pub fn played(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }

    /// Did the given team take part?
    pub fn involves(&self, team: &str) -> bool {
        self.home == team || self.away == team
    }

    /// Was the given team the home side? None if it didn't play.
    pub fn is_home(&self, team: &str) -> Option<bool> {
        if self.home == team {
            Some(true)
        } else if self.away == team {
            Some(false)
        } else {
            None
        }
    }

    /// Match outcome, if played
    pub fn outcome(&self) -> Option<Outcome> {
        match (self.home_score, self.away_score) {
            (Some(h), Some(a)) => Some(Outcome::from_scores(h, a)),
            _ => None,
        }
    }

    /// Score as "h-a", if played
    pub fn score_string(&self) -> Option<String> {
        match (self.home_score, self.away_score) {
            (Some(h), Some(a)) => Some(format!("{}-{}", h, a)),
            _ => None,
        }
    }

    /// Usable as a rolling-history row: scores and every stat column present
    pub fn fully_populated(&self) -> bool {
        self.played() && self.stats.is_some()
    }
}

/// Match outcome from the home side's perspective.
///
/// The integer encoding is the model's class label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    HomeWin,
    AwayWin,
    Draw,
}

impl Outcome {
    pub fn from_scores(home: u32, away: u32) -> Self {
        match home.cmp(&away) {
            std::cmp::Ordering::Greater => Outcome::HomeWin,
            std::cmp::Ordering::Less => Outcome::AwayWin,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    pub fn label(&self) -> i64 {
        match self {
            Outcome::HomeWin => 0,
            Outcome::AwayWin => 1,
            Outcome::Draw => 2,
        }
    }

    pub fn from_label(label: i64) -> Option<Self> {
        match label {
            0 => Some(Outcome::HomeWin),
            1 => Some(Outcome::AwayWin),
            2 => Some(Outcome::Draw),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::HomeWin => write!(f, "home win"),
            Outcome::AwayWin => write!(f, "away win"),
            Outcome::Draw => write!(f, "draw"),
        }
    }
}

/// Whether a unit carries a known result or awaits one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    Training,
    Prediction,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Training => "training",
            UnitKind::Prediction => "prediction",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "training" => Some(UnitKind::Training),
            "prediction" => Some(UnitKind::Prediction),
            _ => None,
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum FootyError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed score '{score}' for match {report_link}")]
    MalformedScore { report_link: String, score: String },

    #[error("Unknown stat category '{category}' for match {report_link}")]
    UnknownStatCategory {
        report_link: String,
        category: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FootyError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
    /// Root directory for per-unit tensor files
    pub tensor_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Rolling-history window size per team
    pub window: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                database_path: "data/footy.db".to_string(),
                tensor_path: "data/tensors".to_string(),
            },
            pipeline: PipelineConfig { window: 10 },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FootyError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| FootyError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FootyError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
