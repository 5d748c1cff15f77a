//! Raw report normalization
//!
//! Turns scraped rows (score strings, report stat blobs) into canonical
//! `Match` records. Every external stat-category label maps explicitly to a
//! destination column; an unknown category fails that row's stats loudly
//! instead of being dropped.

use crate::data::Database;
use crate::{FootyError, Match, MatchStats, Result, StatSheet};
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;

/// A scraped fixture row as delivered by the schedule/report scraper
#[derive(Debug, Clone)]
pub struct RawMatch {
    pub season_id: String,
    pub date: Option<String>,
    pub home: String,
    /// Score text like "2–1"; None for fixtures not yet played
    pub score: Option<String>,
    pub away: String,
    pub attendance: Option<String>,
    pub report_link: Option<String>,
    /// JSON blob: {"Possession": {"home": "61%", "away": "39%"}, ...}
    pub team_stats: Option<String>,
    /// Pipe-separated home/label/away triples: "12 | Fouls | 9 | ..."
    pub extra_stats: Option<String>,
}

/// Home/away value pair for one stat category in the report blob
#[derive(Debug, Deserialize)]
struct SideValues {
    home: String,
    away: String,
}

/// Counts reported after a transform run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformSummary {
    /// Rows normalized and upserted
    pub transformed: usize,
    /// Rows skipped: score text did not parse as two integers
    pub malformed_score: usize,
    /// Rows skipped: unparseable date
    pub malformed_date: usize,
    /// Rows upserted without stats: a category was missing or unparseable
    pub incomplete_stats: usize,
    /// Rows upserted without stats: an unrecognized category was rejected
    pub unknown_category: usize,
    /// Rows upserted without stats: the stats blob itself failed to parse
    pub malformed_blob: usize,
}

/// Normalizes transformable raw rows into the canonical matches table
pub struct DataTransformer<'a> {
    db: &'a Database,
    score_re: Regex,
    of_re: Regex,
    percent_re: Regex,
}

impl<'a> DataTransformer<'a> {
    pub fn new(db: &'a Database) -> Self {
        DataTransformer {
            db,
            // fbref renders scores with an en dash
            score_re: Regex::new(r"(\d+)\s*[–—-]\s*(\d+)").unwrap(),
            of_re: Regex::new(r"(\d+)\s*of\s*(\d+)").unwrap(),
            percent_re: Regex::new(r"(\d+(?:\.\d+)?)%").unwrap(),
        }
    }

    /// Transform every complete raw row, upserting canonical records
    pub fn run(&self) -> Result<TransformSummary> {
        let raw_rows = self.db.get_transformable_raw()?;
        log::info!("Transforming {} raw match rows", raw_rows.len());

        let mut summary = TransformSummary::default();
        for raw in &raw_rows {
            let report_link = raw.report_link.clone().unwrap_or_default();

            let date_str = raw.date.as_deref().unwrap_or_default();
            let date = match NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
                Ok(d) => d,
                Err(_) => {
                    log::warn!("Skipping {}: unparseable date '{}'", report_link, date_str);
                    summary.malformed_date += 1;
                    continue;
                }
            };

            let score_str = raw.score.as_deref().unwrap_or_default();
            let (home_score, away_score) = match self.parse_score(score_str, &report_link) {
                Ok(scores) => scores,
                Err(e) => {
                    log::warn!("Skipping score for {}: {}", report_link, e);
                    summary.malformed_score += 1;
                    continue;
                }
            };

            let stats = match self.parse_stats(raw, &report_link) {
                Ok(Some(stats)) => Some(stats),
                Ok(None) => {
                    log::debug!("Match {} has incomplete stats", report_link);
                    summary.incomplete_stats += 1;
                    None
                }
                Err(e @ FootyError::UnknownStatCategory { .. }) => {
                    log::error!("Rejecting stats for {}: {}", report_link, e);
                    summary.unknown_category += 1;
                    None
                }
                Err(e) => {
                    log::warn!("Unparseable stats blob for {}: {}", report_link, e);
                    summary.malformed_blob += 1;
                    None
                }
            };

            let m = Match {
                season_id: raw.season_id.clone(),
                date,
                home: raw.home.clone(),
                away: raw.away.clone(),
                home_score: Some(home_score),
                away_score: Some(away_score),
                report_link,
                attendance: parse_attendance(raw.attendance.as_deref()),
                stats,
            };

            self.db.upsert_match(&m)?;
            summary.transformed += 1;
        }

        log::info!(
            "Transformed {} matches ({} without stats, {} malformed scores)",
            summary.transformed,
            summary.incomplete_stats + summary.unknown_category + summary.malformed_blob,
            summary.malformed_score
        );
        Ok(summary)
    }

    /// Parse "2–1" into (2, 1)
    pub fn parse_score(&self, score: &str, report_link: &str) -> Result<(u32, u32)> {
        let caps = self
            .score_re
            .captures(score)
            .ok_or_else(|| FootyError::MalformedScore {
                report_link: report_link.to_string(),
                score: score.to_string(),
            })?;
        let home = caps[1].parse().map_err(|_| FootyError::MalformedScore {
            report_link: report_link.to_string(),
            score: score.to_string(),
        })?;
        let away = caps[2].parse().map_err(|_| FootyError::MalformedScore {
            report_link: report_link.to_string(),
            score: score.to_string(),
        })?;
        Ok((home, away))
    }

    /// Parse both stat blobs into full sheets.
    ///
    /// Ok(None) when a blob or category is missing; Err for an unknown
    /// category label.
    fn parse_stats(&self, raw: &RawMatch, report_link: &str) -> Result<Option<MatchStats>> {
        let (team_stats, extra_stats) = match (&raw.team_stats, &raw.extra_stats) {
            (Some(t), Some(e)) => (t, e),
            _ => return Ok(None),
        };

        let mut home = SheetBuilder::default();
        let mut away = SheetBuilder::default();

        let categories: HashMap<String, SideValues> = serde_json::from_str(team_stats)?;
        for (label, values) in &categories {
            self.apply_team_stat(label, values, &mut home, &mut away, report_link)?;
        }

        for (label, home_val, away_val) in parse_extra_triples(extra_stats) {
            apply_extra_stat(&label, &home_val, &away_val, &mut home, &mut away, report_link)?;
        }

        Ok(match (home.build(), away.build()) {
            (Some(home), Some(away)) => Some(MatchStats { home, away }),
            _ => None,
        })
    }

    fn apply_team_stat(
        &self,
        label: &str,
        values: &SideValues,
        home: &mut SheetBuilder,
        away: &mut SheetBuilder,
        report_link: &str,
    ) -> Result<()> {
        match label {
            "Possession" => {
                home.possession = self.parse_percent(&values.home);
                away.possession = self.parse_percent(&values.away);
            }
            "Passing Accuracy" => {
                if let Some((completed, attempts)) = self.parse_of(&values.home) {
                    home.passes_completed = Some(completed);
                    home.passes_attempts = Some(attempts);
                }
                if let Some((completed, attempts)) = self.parse_of(&values.away) {
                    away.passes_completed = Some(completed);
                    away.passes_attempts = Some(attempts);
                }
            }
            "Shots on Target" => {
                if let Some((on_target, attempts)) = self.parse_of(&values.home) {
                    home.shots_completed = Some(on_target);
                    home.shots_attempts = Some(attempts);
                }
                if let Some((on_target, attempts)) = self.parse_of(&values.away) {
                    away.shots_completed = Some(on_target);
                    away.shots_attempts = Some(attempts);
                }
            }
            "Saves" => {
                if let Some((saved, faced)) = self.parse_of(&values.home) {
                    home.saves_completed = Some(saved);
                    home.saves_attempts = Some(faced);
                }
                if let Some((saved, faced)) = self.parse_of(&values.away) {
                    away.saves_completed = Some(saved);
                    away.saves_attempts = Some(faced);
                }
            }
            // Rendered as icon rows in the report; not a feature column
            "Cards" => {}
            other => {
                return Err(FootyError::UnknownStatCategory {
                    report_link: report_link.to_string(),
                    category: other.to_string(),
                })
            }
        }
        Ok(())
    }

    /// "61%" -> 61.0
    fn parse_percent(&self, text: &str) -> Option<f32> {
        self.percent_re
            .captures(text)
            .and_then(|caps| caps[1].parse().ok())
    }

    /// "384 of 582" -> (384, 582); also matches inside "66%384 of 582"
    fn parse_of(&self, text: &str) -> Option<(u32, u32)> {
        let caps = self.of_re.captures(text)?;
        Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
    }
}

/// Split "12 | Fouls | 9 | Corners | 4 | ..." into (label, home, away) triples
fn parse_extra_triples(extra: &str) -> Vec<(String, String, String)> {
    let tokens: Vec<&str> = extra.split('|').map(str::trim).collect();
    tokens
        .chunks_exact(3)
        .map(|chunk| {
            (
                chunk[1].to_string(),
                chunk[0].to_string(),
                chunk[2].to_string(),
            )
        })
        .collect()
}

fn apply_extra_stat(
    label: &str,
    home_val: &str,
    away_val: &str,
    home: &mut SheetBuilder,
    away: &mut SheetBuilder,
    report_link: &str,
) -> Result<()> {
    let home_count: Option<u32> = home_val.parse().ok();
    let away_count: Option<u32> = away_val.parse().ok();

    let (home_slot, away_slot) = match label {
        "Fouls" => (&mut home.fouls, &mut away.fouls),
        "Corners" => (&mut home.corners, &mut away.corners),
        "Crosses" => (&mut home.crosses, &mut away.crosses),
        "Touches" => (&mut home.touches, &mut away.touches),
        "Tackles" => (&mut home.tackles, &mut away.tackles),
        "Interceptions" => (&mut home.interceptions, &mut away.interceptions),
        "Aerials Won" => (&mut home.aerials_won, &mut away.aerials_won),
        "Clearances" => (&mut home.clearances, &mut away.clearances),
        "Offsides" => (&mut home.offsides, &mut away.offsides),
        "Goal Kicks" => (&mut home.goal_kicks, &mut away.goal_kicks),
        "Throw Ins" => (&mut home.throw_ins, &mut away.throw_ins),
        "Long Balls" => (&mut home.long_balls, &mut away.long_balls),
        other => {
            return Err(FootyError::UnknownStatCategory {
                report_link: report_link.to_string(),
                category: other.to_string(),
            })
        }
    };

    *home_slot = home_count;
    *away_slot = away_count;
    Ok(())
}

/// "30,412" -> 30412
fn parse_attendance(text: Option<&str>) -> Option<u32> {
    text?.replace(',', "").trim().parse().ok()
}

/// All destination columns for one side; incomplete builders produce no sheet
#[derive(Debug, Default)]
struct SheetBuilder {
    possession: Option<f32>,
    passes_attempts: Option<u32>,
    passes_completed: Option<u32>,
    shots_attempts: Option<u32>,
    shots_completed: Option<u32>,
    saves_attempts: Option<u32>,
    saves_completed: Option<u32>,
    fouls: Option<u32>,
    corners: Option<u32>,
    crosses: Option<u32>,
    touches: Option<u32>,
    tackles: Option<u32>,
    interceptions: Option<u32>,
    aerials_won: Option<u32>,
    clearances: Option<u32>,
    offsides: Option<u32>,
    goal_kicks: Option<u32>,
    throw_ins: Option<u32>,
    long_balls: Option<u32>,
}

impl SheetBuilder {
    fn build(self) -> Option<StatSheet> {
        Some(StatSheet {
            possession: self.possession?,
            passes_attempts: self.passes_attempts?,
            passes_completed: self.passes_completed?,
            shots_attempts: self.shots_attempts?,
            shots_completed: self.shots_completed?,
            saves_attempts: self.saves_attempts?,
            saves_completed: self.saves_completed?,
            fouls: self.fouls?,
            corners: self.corners?,
            crosses: self.crosses?,
            touches: self.touches?,
            tackles: self.tackles?,
            interceptions: self.interceptions?,
            aerials_won: self.aerials_won?,
            clearances: self.clearances?,
            offsides: self.offsides?,
            goal_kicks: self.goal_kicks?,
            throw_ins: self.throw_ins?,
            long_balls: self.long_balls?,
        })
    }
}
