//! SQLite database management for match data
//!
//! Three tables: `raw_matches` (scraped rows as delivered), `matches`
//! (canonical transformed records, one schema) and `units` (the registry of
//! feature units keyed by natural fixture identity).

use crate::data::registry::UnitRow;
use crate::data::transform::RawMatch;
use crate::{Match, MatchStats, Outcome, Result, StatSheet, UnitKind};
use chrono::NaiveDate;
use rusqlite::{named_params, params, Connection, OptionalExtension, Row};
use std::path::Path;

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS raw_matches (
                season_id TEXT NOT NULL,
                date TEXT,
                home TEXT NOT NULL,
                score TEXT,
                away TEXT NOT NULL,
                attendance TEXT,
                report_link TEXT UNIQUE,
                team_stats TEXT,
                extra_stats TEXT,
                date_added TEXT NOT NULL DEFAULT (datetime('now')),
                last_updated TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (season_id, home, away)
            );

            CREATE TABLE IF NOT EXISTS matches (
                season_id TEXT NOT NULL,
                date TEXT NOT NULL,
                home TEXT NOT NULL,
                away TEXT NOT NULL,
                home_score INTEGER,
                away_score INTEGER,
                report_link TEXT NOT NULL UNIQUE,
                attendance INTEGER,
                home_possession REAL,        away_possession REAL,
                home_passes_attempts INTEGER,  away_passes_attempts INTEGER,
                home_passes_completed INTEGER, away_passes_completed INTEGER,
                home_shots_attempts INTEGER,   away_shots_attempts INTEGER,
                home_shots_completed INTEGER,  away_shots_completed INTEGER,
                home_saves_attempts INTEGER,   away_saves_attempts INTEGER,
                home_saves_completed INTEGER,  away_saves_completed INTEGER,
                home_fouls INTEGER,          away_fouls INTEGER,
                home_corners INTEGER,        away_corners INTEGER,
                home_crosses INTEGER,        away_crosses INTEGER,
                home_touches INTEGER,        away_touches INTEGER,
                home_tackles INTEGER,        away_tackles INTEGER,
                home_interceptions INTEGER,  away_interceptions INTEGER,
                home_aerials_won INTEGER,    away_aerials_won INTEGER,
                home_clearances INTEGER,     away_clearances INTEGER,
                home_offsides INTEGER,       away_offsides INTEGER,
                home_goal_kicks INTEGER,     away_goal_kicks INTEGER,
                home_throw_ins INTEGER,      away_throw_ins INTEGER,
                home_long_balls INTEGER,     away_long_balls INTEGER,
                date_added TEXT NOT NULL DEFAULT (datetime('now')),
                last_updated TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS units (
                unit_id TEXT PRIMARY KEY,
                season_id TEXT NOT NULL,
                date TEXT NOT NULL,
                home TEXT NOT NULL,
                away TEXT NOT NULL,
                score TEXT,
                outcome INTEGER,
                kind TEXT NOT NULL,
                home_win_prob REAL,
                draw_prob REAL,
                away_win_prob REAL,
                date_added TEXT NOT NULL DEFAULT (datetime('now')),
                last_updated TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(season_id, home, away)
            );

            CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(date);
            CREATE INDEX IF NOT EXISTS idx_matches_teams ON matches(home, away);
            CREATE INDEX IF NOT EXISTS idx_raw_report_link ON raw_matches(report_link);
            "#,
        )?;
        Ok(())
    }

    // ==================== Raw Match Operations ====================

    /// Insert or update a scraped row, keyed on the natural fixture identity
    pub fn upsert_raw_match(&self, raw: &RawMatch) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO raw_matches (season_id, date, home, score, away,
                                     attendance, report_link, team_stats, extra_stats)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(season_id, home, away) DO UPDATE SET
                date = excluded.date,
                score = excluded.score,
                attendance = excluded.attendance,
                report_link = COALESCE(excluded.report_link, report_link),
                team_stats = COALESCE(excluded.team_stats, team_stats),
                extra_stats = COALESCE(excluded.extra_stats, extra_stats),
                last_updated = datetime('now')
            "#,
            params![
                raw.season_id,
                raw.date,
                raw.home,
                raw.score,
                raw.away,
                raw.attendance,
                raw.report_link,
                raw.team_stats,
                raw.extra_stats,
            ],
        )?;
        Ok(())
    }

    /// Scraped rows complete enough to transform (played, report and stats present)
    pub fn get_transformable_raw(&self) -> Result<Vec<RawMatch>> {
        let mut stmt = self.conn.prepare(
            "SELECT season_id, date, home, score, away, attendance,
                    report_link, team_stats, extra_stats
             FROM raw_matches
             WHERE date IS NOT NULL
               AND score IS NOT NULL
               AND report_link IS NOT NULL
             ORDER BY date",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(RawMatch {
                    season_id: row.get(0)?,
                    date: row.get(1)?,
                    home: row.get(2)?,
                    score: row.get(3)?,
                    away: row.get(4)?,
                    attendance: row.get(5)?,
                    report_link: row.get(6)?,
                    team_stats: row.get(7)?,
                    extra_stats: row.get(8)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Upcoming fixtures: scraped rows with no score yet, as bare matches
    pub fn get_unplayed_fixtures(&self) -> Result<Vec<Match>> {
        let mut stmt = self.conn.prepare(
            "SELECT season_id, date, home, away, report_link
             FROM raw_matches
             WHERE score IS NULL AND date IS NOT NULL
             ORDER BY date",
        )?;

        let fixtures = stmt
            .query_map([], |row| {
                let date_str: String = row.get(1)?;
                Ok(Match {
                    season_id: row.get(0)?,
                    date: parse_date(&date_str),
                    home: row.get(2)?,
                    away: row.get(3)?,
                    home_score: None,
                    away_score: None,
                    report_link: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    attendance: None,
                    stats: None,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(fixtures)
    }

    // ==================== Match Operations ====================

    /// Insert or update a canonical match record, keyed on report_link
    pub fn upsert_match(&self, m: &Match) -> Result<()> {
        let home_sheet = m.stats.as_ref().map(|s| s.home);
        let away_sheet = m.stats.as_ref().map(|s| s.away);
        self.conn.execute(
            r#"
            INSERT INTO matches (
                season_id, date, home, away, home_score, away_score,
                report_link, attendance,
                home_possession, away_possession,
                home_passes_attempts, away_passes_attempts,
                home_passes_completed, away_passes_completed,
                home_shots_attempts, away_shots_attempts,
                home_shots_completed, away_shots_completed,
                home_saves_attempts, away_saves_attempts,
                home_saves_completed, away_saves_completed,
                home_fouls, away_fouls,
                home_corners, away_corners,
                home_crosses, away_crosses,
                home_touches, away_touches,
                home_tackles, away_tackles,
                home_interceptions, away_interceptions,
                home_aerials_won, away_aerials_won,
                home_clearances, away_clearances,
                home_offsides, away_offsides,
                home_goal_kicks, away_goal_kicks,
                home_throw_ins, away_throw_ins,
                home_long_balls, away_long_balls
            )
            VALUES (
                :season_id, :date, :home, :away, :home_score, :away_score,
                :report_link, :attendance,
                :h_possession, :a_possession,
                :h_passes_attempts, :a_passes_attempts,
                :h_passes_completed, :a_passes_completed,
                :h_shots_attempts, :a_shots_attempts,
                :h_shots_completed, :a_shots_completed,
                :h_saves_attempts, :a_saves_attempts,
                :h_saves_completed, :a_saves_completed,
                :h_fouls, :a_fouls,
                :h_corners, :a_corners,
                :h_crosses, :a_crosses,
                :h_touches, :a_touches,
                :h_tackles, :a_tackles,
                :h_interceptions, :a_interceptions,
                :h_aerials_won, :a_aerials_won,
                :h_clearances, :a_clearances,
                :h_offsides, :a_offsides,
                :h_goal_kicks, :a_goal_kicks,
                :h_throw_ins, :a_throw_ins,
                :h_long_balls, :a_long_balls
            )
            ON CONFLICT(report_link) DO UPDATE SET
                season_id = excluded.season_id,
                date = excluded.date,
                home = excluded.home,
                away = excluded.away,
                home_score = excluded.home_score,
                away_score = excluded.away_score,
                attendance = excluded.attendance,
                home_possession = excluded.home_possession,
                away_possession = excluded.away_possession,
                home_passes_attempts = excluded.home_passes_attempts,
                away_passes_attempts = excluded.away_passes_attempts,
                home_passes_completed = excluded.home_passes_completed,
                away_passes_completed = excluded.away_passes_completed,
                home_shots_attempts = excluded.home_shots_attempts,
                away_shots_attempts = excluded.away_shots_attempts,
                home_shots_completed = excluded.home_shots_completed,
                away_shots_completed = excluded.away_shots_completed,
                home_saves_attempts = excluded.home_saves_attempts,
                away_saves_attempts = excluded.away_saves_attempts,
                home_saves_completed = excluded.home_saves_completed,
                away_saves_completed = excluded.away_saves_completed,
                home_fouls = excluded.home_fouls,
                away_fouls = excluded.away_fouls,
                home_corners = excluded.home_corners,
                away_corners = excluded.away_corners,
                home_crosses = excluded.home_crosses,
                away_crosses = excluded.away_crosses,
                home_touches = excluded.home_touches,
                away_touches = excluded.away_touches,
                home_tackles = excluded.home_tackles,
                away_tackles = excluded.away_tackles,
                home_interceptions = excluded.home_interceptions,
                away_interceptions = excluded.away_interceptions,
                home_aerials_won = excluded.home_aerials_won,
                away_aerials_won = excluded.away_aerials_won,
                home_clearances = excluded.home_clearances,
                away_clearances = excluded.away_clearances,
                home_offsides = excluded.home_offsides,
                away_offsides = excluded.away_offsides,
                home_goal_kicks = excluded.home_goal_kicks,
                away_goal_kicks = excluded.away_goal_kicks,
                home_throw_ins = excluded.home_throw_ins,
                away_throw_ins = excluded.away_throw_ins,
                home_long_balls = excluded.home_long_balls,
                away_long_balls = excluded.away_long_balls,
                last_updated = datetime('now')
            "#,
            named_params! {
                ":season_id": m.season_id,
                ":date": m.date.format("%Y-%m-%d").to_string(),
                ":home": m.home,
                ":away": m.away,
                ":home_score": m.home_score,
                ":away_score": m.away_score,
                ":report_link": m.report_link,
                ":attendance": m.attendance,
                ":h_possession": home_sheet.map(|s| s.possession as f64),
                ":a_possession": away_sheet.map(|s| s.possession as f64),
                ":h_passes_attempts": home_sheet.map(|s| s.passes_attempts),
                ":a_passes_attempts": away_sheet.map(|s| s.passes_attempts),
                ":h_passes_completed": home_sheet.map(|s| s.passes_completed),
                ":a_passes_completed": away_sheet.map(|s| s.passes_completed),
                ":h_shots_attempts": home_sheet.map(|s| s.shots_attempts),
                ":a_shots_attempts": away_sheet.map(|s| s.shots_attempts),
                ":h_shots_completed": home_sheet.map(|s| s.shots_completed),
                ":a_shots_completed": away_sheet.map(|s| s.shots_completed),
                ":h_saves_attempts": home_sheet.map(|s| s.saves_attempts),
                ":a_saves_attempts": away_sheet.map(|s| s.saves_attempts),
                ":h_saves_completed": home_sheet.map(|s| s.saves_completed),
                ":a_saves_completed": away_sheet.map(|s| s.saves_completed),
                ":h_fouls": home_sheet.map(|s| s.fouls),
                ":a_fouls": away_sheet.map(|s| s.fouls),
                ":h_corners": home_sheet.map(|s| s.corners),
                ":a_corners": away_sheet.map(|s| s.corners),
                ":h_crosses": home_sheet.map(|s| s.crosses),
                ":a_crosses": away_sheet.map(|s| s.crosses),
                ":h_touches": home_sheet.map(|s| s.touches),
                ":a_touches": away_sheet.map(|s| s.touches),
                ":h_tackles": home_sheet.map(|s| s.tackles),
                ":a_tackles": away_sheet.map(|s| s.tackles),
                ":h_interceptions": home_sheet.map(|s| s.interceptions),
                ":a_interceptions": away_sheet.map(|s| s.interceptions),
                ":h_aerials_won": home_sheet.map(|s| s.aerials_won),
                ":a_aerials_won": away_sheet.map(|s| s.aerials_won),
                ":h_clearances": home_sheet.map(|s| s.clearances),
                ":a_clearances": away_sheet.map(|s| s.clearances),
                ":h_offsides": home_sheet.map(|s| s.offsides),
                ":a_offsides": away_sheet.map(|s| s.offsides),
                ":h_goal_kicks": home_sheet.map(|s| s.goal_kicks),
                ":a_goal_kicks": away_sheet.map(|s| s.goal_kicks),
                ":h_throw_ins": home_sheet.map(|s| s.throw_ins),
                ":a_throw_ins": away_sheet.map(|s| s.throw_ins),
                ":h_long_balls": home_sheet.map(|s| s.long_balls),
                ":a_long_balls": away_sheet.map(|s| s.long_balls),
            },
        )?;
        Ok(())
    }

    /// All transformed matches, ascending by date
    pub fn get_all_matches(&self) -> Result<Vec<Match>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM matches ORDER BY date, season_id, home, away",
        )?;

        let matches = stmt
            .query_map([], row_to_match)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(matches)
    }

    /// The full chronological stream the pipeline consumes: transformed
    /// matches plus unplayed fixtures, ascending by date with a total
    /// tie-break so replays are deterministic.
    pub fn get_match_stream(&self) -> Result<Vec<Match>> {
        let mut stream = self.get_all_matches()?;
        stream.extend(self.get_unplayed_fixtures()?);
        stream.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.season_id.cmp(&b.season_id))
                .then_with(|| a.home.cmp(&b.home))
                .then_with(|| a.away.cmp(&b.away))
        });
        Ok(stream)
    }

    // ==================== Unit Registry Operations ====================

    /// Insert or update a unit row. Conflicts on the natural fixture key
    /// update result fields only; unit_id and date_added are preserved.
    pub fn upsert_unit(&self, unit: &UnitRow) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO units (unit_id, season_id, date, home, away, score, outcome, kind)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(season_id, home, away) DO UPDATE SET
                score = excluded.score,
                outcome = excluded.outcome,
                kind = excluded.kind,
                last_updated = datetime('now')
            "#,
            params![
                unit.unit_id.as_str(),
                unit.season_id,
                unit.date.format("%Y-%m-%d").to_string(),
                unit.home,
                unit.away,
                unit.score,
                unit.outcome.map(|o| o.label()),
                unit.kind.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Find a unit row by natural fixture identity
    pub fn find_unit(&self, season_id: &str, home: &str, away: &str) -> Result<Option<UnitRow>> {
        let unit = self
            .conn
            .query_row(
                "SELECT unit_id, season_id, date, home, away, score, outcome, kind,
                        home_win_prob, draw_prob, away_win_prob
                 FROM units
                 WHERE season_id = ?1 AND home = ?2 AND away = ?3",
                params![season_id, home, away],
                row_to_unit,
            )
            .optional()?;
        Ok(unit)
    }

    /// All unit rows, ascending by date
    pub fn get_all_units(&self) -> Result<Vec<UnitRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT unit_id, season_id, date, home, away, score, outcome, kind,
                    home_win_prob, draw_prob, away_win_prob
             FROM units ORDER BY date, season_id, home, away",
        )?;

        let units = stmt
            .query_map([], row_to_unit)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(units)
    }

    /// Write outcome probabilities produced by the external model
    pub fn record_prediction(
        &self,
        unit_id: &str,
        home_win_prob: f64,
        draw_prob: f64,
        away_win_prob: f64,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE units
             SET home_win_prob = ?2, draw_prob = ?3, away_win_prob = ?4,
                 last_updated = datetime('now')
             WHERE unit_id = ?1",
            params![unit_id, home_win_prob, draw_prob, away_win_prob],
        )?;
        Ok(())
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let raw_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM raw_matches", [], |row| row.get(0))?;

        let match_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;

        let training_units: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM units WHERE kind = 'training'",
            [],
            |row| row.get(0),
        )?;

        let prediction_units: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM units WHERE kind = 'prediction'",
            [],
            |row| row.get(0),
        )?;

        let min_date: Option<String> = self
            .conn
            .query_row("SELECT MIN(date) FROM matches", [], |row| row.get(0))
            .optional()?
            .flatten();

        let max_date: Option<String> = self
            .conn
            .query_row("SELECT MAX(date) FROM matches", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(DatabaseStats {
            raw_count: raw_count as usize,
            match_count: match_count as usize,
            training_units: training_units as usize,
            prediction_units: prediction_units as usize,
            earliest_match: min_date.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            latest_match: max_date.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        })
    }
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())
}

fn row_to_unit(row: &Row) -> rusqlite::Result<UnitRow> {
    let date_str: String = row.get(2)?;
    let kind_str: String = row.get(7)?;
    Ok(UnitRow {
        unit_id: crate::data::registry::UnitId::from_string(row.get(0)?),
        season_id: row.get(1)?,
        date: parse_date(&date_str),
        home: row.get(3)?,
        away: row.get(4)?,
        score: row.get(5)?,
        outcome: row
            .get::<_, Option<i64>>(6)?
            .and_then(Outcome::from_label),
        kind: UnitKind::parse(&kind_str).unwrap_or(UnitKind::Prediction),
        home_win_prob: row.get(8)?,
        draw_prob: row.get(9)?,
        away_win_prob: row.get(10)?,
    })
}

fn row_to_match(row: &Row) -> rusqlite::Result<Match> {
    let date_str: String = row.get("date")?;
    Ok(Match {
        season_id: row.get("season_id")?,
        date: parse_date(&date_str),
        home: row.get("home")?,
        away: row.get("away")?,
        home_score: row.get("home_score")?,
        away_score: row.get("away_score")?,
        report_link: row.get("report_link")?,
        attendance: row.get("attendance")?,
        stats: row_to_stats(row)?,
    })
}

/// Read both stat sheets; any NULL column collapses the whole match to
/// stats = None so partial rows can never enter a history window.
fn row_to_stats(row: &Row) -> rusqlite::Result<Option<MatchStats>> {
    let home = sheet_from_row(row, "home")?;
    let away = sheet_from_row(row, "away")?;
    Ok(match (home, away) {
        (Some(home), Some(away)) => Some(MatchStats { home, away }),
        _ => None,
    })
}

fn sheet_from_row(row: &Row, side: &str) -> rusqlite::Result<Option<StatSheet>> {
    macro_rules! col {
        ($name:literal, $ty:ty) => {
            match row.get::<_, Option<$ty>>(format!("{}_{}", side, $name).as_str())? {
                Some(v) => v,
                None => return Ok(None),
            }
        };
    }

    Ok(Some(StatSheet {
        possession: col!("possession", f64) as f32,
        passes_attempts: col!("passes_attempts", u32),
        passes_completed: col!("passes_completed", u32),
        shots_attempts: col!("shots_attempts", u32),
        shots_completed: col!("shots_completed", u32),
        saves_attempts: col!("saves_attempts", u32),
        saves_completed: col!("saves_completed", u32),
        fouls: col!("fouls", u32),
        corners: col!("corners", u32),
        crosses: col!("crosses", u32),
        touches: col!("touches", u32),
        tackles: col!("tackles", u32),
        interceptions: col!("interceptions", u32),
        aerials_won: col!("aerials_won", u32),
        clearances: col!("clearances", u32),
        offsides: col!("offsides", u32),
        goal_kicks: col!("goal_kicks", u32),
        throw_ins: col!("throw_ins", u32),
        long_balls: col!("long_balls", u32),
    }))
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub raw_count: usize,
    pub match_count: usize,
    pub training_units: usize,
    pub prediction_units: usize,
    pub earliest_match: Option<NaiveDate>,
    pub latest_match: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{played_match, sheet};

    #[test]
    fn test_create_database() {
        let db = Database::in_memory().unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.raw_count, 0);
        assert_eq!(stats.match_count, 0);
    }

    #[test]
    fn test_upsert_match_round_trip() {
        let db = Database::in_memory().unwrap();
        let m = played_match("2016", "Milan", "Roma", "2024-03-01", 2, 1);
        db.upsert_match(&m).unwrap();

        let all = db.get_all_matches().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].home, "Milan");
        assert_eq!(all[0].home_score, Some(2));
        assert_eq!(all[0].stats.unwrap().home, sheet(2));
    }

    #[test]
    fn test_upsert_match_idempotent_on_report_link() {
        let db = Database::in_memory().unwrap();
        let mut m = played_match("2016", "Milan", "Roma", "2024-03-01", 2, 1);
        db.upsert_match(&m).unwrap();

        // Re-transform with a corrected score
        m.home_score = Some(3);
        db.upsert_match(&m).unwrap();

        let all = db.get_all_matches().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].home_score, Some(3));
    }

    #[test]
    fn test_null_stat_column_collapses_to_none() {
        let db = Database::in_memory().unwrap();
        let m = played_match("2016", "Milan", "Roma", "2024-03-01", 2, 1);
        db.upsert_match(&m).unwrap();
        db.conn
            .execute("UPDATE matches SET home_possession = NULL", [])
            .unwrap();

        let all = db.get_all_matches().unwrap();
        assert!(all[0].stats.is_none());
    }

    #[test]
    fn test_record_prediction_fills_probability_columns() {
        let db = Database::in_memory().unwrap();
        let registry = crate::data::UnitRegistry::new(&db);
        let id = registry
            .register(&played_match("2016", "Milan", "Roma", "2024-03-01", 2, 1))
            .unwrap();

        db.record_prediction(id.as_str(), 0.5, 0.3, 0.2).unwrap();

        let unit = db.find_unit("2016", "Milan", "Roma").unwrap().unwrap();
        assert_eq!(unit.home_win_prob, Some(0.5));
        assert_eq!(unit.draw_prob, Some(0.3));
        assert_eq!(unit.away_win_prob, Some(0.2));
    }

    #[test]
    fn test_match_stream_includes_unplayed_fixtures() {
        let db = Database::in_memory().unwrap();
        db.upsert_match(&played_match("2016", "Milan", "Roma", "2024-03-01", 2, 1))
            .unwrap();
        db.upsert_raw_match(&RawMatch {
            season_id: "2016".to_string(),
            date: Some("2024-03-08".to_string()),
            home: "Inter".to_string(),
            score: None,
            away: "Napoli".to_string(),
            attendance: None,
            report_link: None,
            team_stats: None,
            extra_stats: None,
        })
        .unwrap();

        let stream = db.get_match_stream().unwrap();
        assert_eq!(stream.len(), 2);
        assert!(stream[0].played());
        assert!(!stream[1].played());
        assert_eq!(stream[1].home, "Inter");
    }
}
