//! Match feature representation for sequence-model input
//!
//! Each match in a team's history is encoded from that team's perspective:
//! own stats first, opponent stats second, regardless of which side the team
//! played. This keeps a team's rows comparable match-to-match.

use crate::{Match, StatSheet};

/// One history match viewed from a specific team's perspective
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    /// Goals scored by this team
    pub own_score: f32,
    pub own: StatSheet,
    /// Goals scored by the opponent
    pub opp_score: f32,
    pub opp: StatSheet,
}

impl FeatureRow {
    /// Width of the vectorized row: score + stat sheet for each side
    pub const DIM: usize = 2 * (1 + StatSheet::DIM);

    /// Orient a fully-populated match from `perspective_team`'s side.
    ///
    /// None if the team did not play or the match lacks scores or stats.
    pub fn from_match(record: &Match, perspective_team: &str) -> Option<Self> {
        let is_home = record.is_home(perspective_team)?;
        let stats = record.stats.as_ref()?;
        let home_score = record.home_score? as f32;
        let away_score = record.away_score? as f32;

        let (own_score, own, opp_score, opp) = if is_home {
            (home_score, stats.home, away_score, stats.away)
        } else {
            (away_score, stats.away, home_score, stats.home)
        };

        Some(FeatureRow {
            own_score,
            own,
            opp_score,
            opp,
        })
    }

    /// Flatten to one tensor row
    pub fn to_vec(&self) -> Vec<f32> {
        let mut v = Vec::with_capacity(Self::DIM);
        v.push(self.own_score);
        v.extend(self.own.to_vec());
        v.push(self.opp_score);
        v.extend(self.opp.to_vec());
        v
    }
}
