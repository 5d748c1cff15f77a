//! Single-pass feature pipeline
//!
//! One chronological scan over the match stream. Each fixture's history
//! windows are drawn only from strictly earlier matches of the same pass,
//! so no future information can leak backward. Units are committed
//! tensors-first, registry-second: an interrupted run never claims a label
//! for absent tensors, and re-running from the start is always safe.

use crate::data::{Database, TensorStore, UnitId, UnitRegistry, UnitTensors};
use crate::features::{select_history, FeatureRow, HistoryTensor};
use crate::{Match, Outcome, Result, UnitKind};
use std::fmt;

/// One fixture's complete feature package, before persistence
#[derive(Debug, Clone)]
pub struct FeatureUnit {
    pub fixture: Match,
    pub kind: UnitKind,
    pub outcome: Option<Outcome>,
    pub home_tensor: HistoryTensor,
    pub away_tensor: HistoryTensor,
}

/// Build a fixture's unit when both sides have a full history window.
///
/// None rejects the fixture; with fewer than `n` qualifying rows on either
/// side there is nothing to pad or impute, the fixture simply is not ready.
pub fn build_unit(
    fixture: &Match,
    home_history: &[FeatureRow],
    away_history: &[FeatureRow],
    n: usize,
) -> Option<FeatureUnit> {
    if home_history.len() != n || away_history.len() != n {
        return None;
    }

    let outcome = fixture.outcome();
    let kind = if outcome.is_some() {
        UnitKind::Training
    } else {
        UnitKind::Prediction
    };

    Some(FeatureUnit {
        fixture: fixture.clone(),
        kind,
        outcome,
        home_tensor: HistoryTensor::from_rows(home_history),
        away_tensor: HistoryTensor::from_rows(away_history),
    })
}

/// Counts reported after a pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Fixtures in the stream
    pub total: usize,
    /// Units built and persisted
    pub processed: usize,
    /// Fixtures rejected: a side had fewer than n qualifying matches
    pub insufficient_history: usize,
    /// Units whose tensor write or registration failed
    pub persistence_failures: usize,
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed {}/{} fixtures ({} insufficient history, {} persistence failures)",
            self.processed, self.total, self.insufficient_history, self.persistence_failures
        )
    }
}

/// Sequential batch job over the full match stream
pub struct FeaturePipeline<'a> {
    db: &'a Database,
    store: TensorStore,
    window: usize,
}

impl<'a> FeaturePipeline<'a> {
    pub fn new(db: &'a Database, store: TensorStore, window: usize) -> Self {
        FeaturePipeline { db, store, window }
    }

    /// Run the full chronological pass
    pub fn run(&self) -> Result<PipelineSummary> {
        let stream = self.db.get_match_stream()?;
        let registry = UnitRegistry::new(self.db);
        log::info!(
            "Featurizing {} fixtures with window {}",
            stream.len(),
            self.window
        );

        let mut summary = PipelineSummary {
            total: stream.len(),
            ..PipelineSummary::default()
        };

        for (i, fixture) in stream.iter().enumerate() {
            // Only matches strictly earlier in this pass are visible
            let earlier = &stream[..i];
            let home_history = select_history(earlier, &fixture.home, fixture.date, self.window);
            let away_history = select_history(earlier, &fixture.away, fixture.date, self.window);

            let unit = match build_unit(fixture, &home_history, &away_history, self.window) {
                Some(unit) => unit,
                None => {
                    log::debug!(
                        "Skipping {} vs {} on {}: history {}/{} home, {}/{} away",
                        fixture.home,
                        fixture.away,
                        fixture.date,
                        home_history.len(),
                        self.window,
                        away_history.len(),
                        self.window
                    );
                    summary.insufficient_history += 1;
                    continue;
                }
            };

            if let Err(e) = self.persist(&registry, &unit) {
                log::error!(
                    "Failed to persist unit for {} {} vs {} on {}: {}",
                    fixture.season_id,
                    fixture.home,
                    fixture.away,
                    fixture.date,
                    e
                );
                summary.persistence_failures += 1;
                continue;
            }
            summary.processed += 1;
        }

        log::info!("Feature pass complete: {}", summary);
        Ok(summary)
    }

    /// Commit one unit: tensors first, registry row second
    fn persist(&self, registry: &UnitRegistry, unit: &FeatureUnit) -> Result<()> {
        let fixture = &unit.fixture;
        let unit_id = UnitId::derive(&fixture.season_id, &fixture.home, &fixture.away);

        self.store.save(
            &unit_id,
            &UnitTensors {
                home: unit.home_tensor.clone(),
                away: unit.away_tensor.clone(),
                label: unit.outcome.map(|o| o.label()),
            },
        )?;
        registry.register(fixture)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawMatch;
    use crate::test_support::{played_match, upcoming_fixture, TempDir};

    const WINDOW: usize = 2;

    /// Played warm-up matches so Milan and Roma each have two qualifying
    /// history rows before 2024-01-15
    fn seed_history(db: &Database) {
        db.upsert_match(&played_match("2016", "Milan", "Roma", "2024-01-01", 1, 0))
            .unwrap();
        db.upsert_match(&played_match("2016", "Roma", "Milan", "2024-01-08", 2, 2))
            .unwrap();
    }

    fn history_for(db: &Database, team: &str, as_of: &str) -> Vec<FeatureRow> {
        let stream = db.get_match_stream().unwrap();
        let date = chrono::NaiveDate::parse_from_str(as_of, "%Y-%m-%d").unwrap();
        select_history(&stream, team, date, WINDOW)
    }

    #[test]
    fn test_build_unit_labels() {
        let db = Database::in_memory().unwrap();
        seed_history(&db);
        let home = history_for(&db, "Milan", "2024-01-15");
        let away = history_for(&db, "Roma", "2024-01-15");

        let won = played_match("2016", "Milan", "Roma", "2024-01-15", 3, 1);
        let unit = build_unit(&won, &home, &away, WINDOW).unwrap();
        assert_eq!(unit.kind, UnitKind::Training);
        assert_eq!(unit.outcome.map(|o| o.label()), Some(0));

        let lost = played_match("2016", "Milan", "Roma", "2024-01-15", 0, 2);
        let unit = build_unit(&lost, &home, &away, WINDOW).unwrap();
        assert_eq!(unit.outcome.map(|o| o.label()), Some(1));

        let drawn = played_match("2016", "Milan", "Roma", "2024-01-15", 1, 1);
        let unit = build_unit(&drawn, &home, &away, WINDOW).unwrap();
        assert_eq!(unit.outcome.map(|o| o.label()), Some(2));

        let upcoming = upcoming_fixture("2016", "Milan", "Roma", "2024-01-15");
        let unit = build_unit(&upcoming, &home, &away, WINDOW).unwrap();
        assert_eq!(unit.kind, UnitKind::Prediction);
        assert!(unit.outcome.is_none());
    }

    #[test]
    fn test_build_unit_rejects_short_window() {
        let db = Database::in_memory().unwrap();
        seed_history(&db);
        let full = history_for(&db, "Milan", "2024-01-15");
        // One match earlier, only one qualifying row
        let short = history_for(&db, "Roma", "2024-01-08");
        assert_eq!(full.len(), WINDOW);
        assert_eq!(short.len(), WINDOW - 1);

        let fixture = played_match("2016", "Milan", "Roma", "2024-01-15", 3, 1);
        assert!(build_unit(&fixture, &full, &short, WINDOW).is_none());
        assert!(build_unit(&fixture, &short, &full, WINDOW).is_none());
        assert!(build_unit(&fixture, &full, &full, WINDOW).is_some());
    }

    #[test]
    fn test_pipeline_processes_ready_fixtures_only() {
        let db = Database::in_memory().unwrap();
        let dir = TempDir::new("pipeline");
        seed_history(&db);
        db.upsert_match(&played_match("2016", "Milan", "Roma", "2024-01-15", 3, 1))
            .unwrap();

        let store = TensorStore::open(dir.path()).unwrap();
        let summary = FeaturePipeline::new(&db, store, WINDOW).run().unwrap();

        // The two warm-up fixtures lack history; only the third is ready
        assert_eq!(summary.total, 3);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.insufficient_history, 2);
        assert_eq!(summary.persistence_failures, 0);

        let units = db.get_all_units().unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].kind, UnitKind::Training);
        assert_eq!(units[0].score.as_deref(), Some("3-1"));

        let store = TensorStore::open(dir.path()).unwrap();
        let tensors = store.load(&units[0].unit_id).unwrap().unwrap();
        assert_eq!(tensors.home.shape(), (WINDOW, FeatureRow::DIM));
        assert_eq!(tensors.away.shape(), (WINDOW, FeatureRow::DIM));
        assert_eq!(tensors.label, Some(0));
    }

    #[test]
    fn test_replay_is_deterministic_and_idempotent() {
        let db = Database::in_memory().unwrap();
        let dir = TempDir::new("pipeline");
        seed_history(&db);
        db.upsert_match(&played_match("2016", "Milan", "Roma", "2024-01-15", 3, 1))
            .unwrap();

        let first = FeaturePipeline::new(&db, TensorStore::open(dir.path()).unwrap(), WINDOW)
            .run()
            .unwrap();
        let unit_id = db.get_all_units().unwrap()[0].unit_id.clone();
        let tensor_file = dir
            .path()
            .join(unit_id.as_str())
            .join("tensors.json");
        let first_bytes = std::fs::read(&tensor_file).unwrap();

        let second = FeaturePipeline::new(&db, TensorStore::open(dir.path()).unwrap(), WINDOW)
            .run()
            .unwrap();
        let second_bytes = std::fs::read(&tensor_file).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_bytes, second_bytes);
        assert_eq!(db.get_all_units().unwrap().len(), 1);
        // No duplicate unit directories appear on replay
        let dirs = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(dirs, 1);
    }

    #[test]
    fn test_persistence_failure_is_counted_and_isolated() {
        let db = Database::in_memory().unwrap();
        let dir = TempDir::new("pipeline");
        seed_history(&db);
        db.upsert_match(&played_match("2016", "Milan", "Roma", "2024-01-15", 3, 1))
            .unwrap();

        // A plain file where the unit's directory belongs makes the
        // tensor write fail
        let unit_id = UnitId::derive("2016", "Milan", "Roma");
        std::fs::write(dir.path().join(unit_id.as_str()), b"").unwrap();

        let summary = FeaturePipeline::new(&db, TensorStore::open(dir.path()).unwrap(), WINDOW)
            .run()
            .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.persistence_failures, 1);

        // Tensors commit before registration, so the failed unit has no row
        assert!(db.get_all_units().unwrap().is_empty());
    }

    #[test]
    fn test_prediction_unit_upgrades_to_training() {
        let db = Database::in_memory().unwrap();
        let dir = TempDir::new("pipeline");
        seed_history(&db);
        db.upsert_raw_match(&RawMatch {
            season_id: "2016".to_string(),
            date: Some("2024-01-15".to_string()),
            home: "Milan".to_string(),
            score: None,
            away: "Roma".to_string(),
            attendance: None,
            report_link: Some("/report/milan-roma-3".to_string()),
            team_stats: None,
            extra_stats: None,
        })
        .unwrap();

        let summary = FeaturePipeline::new(&db, TensorStore::open(dir.path()).unwrap(), WINDOW)
            .run()
            .unwrap();
        assert_eq!(summary.processed, 1);

        let unit = db.find_unit("2016", "Milan", "Roma").unwrap().unwrap();
        assert_eq!(unit.kind, UnitKind::Prediction);
        let store = TensorStore::open(dir.path()).unwrap();
        assert_eq!(store.load(&unit.unit_id).unwrap().unwrap().label, None);

        // The match gets played: the raw row gains a score and the
        // transformed record lands under the same report link
        db.upsert_raw_match(&RawMatch {
            season_id: "2016".to_string(),
            date: Some("2024-01-15".to_string()),
            home: "Milan".to_string(),
            score: Some("3–1".to_string()),
            away: "Roma".to_string(),
            attendance: None,
            report_link: Some("/report/milan-roma-3".to_string()),
            team_stats: None,
            extra_stats: None,
        })
        .unwrap();
        let mut played = played_match("2016", "Milan", "Roma", "2024-01-15", 3, 1);
        played.report_link = "/report/milan-roma-3".to_string();
        db.upsert_match(&played).unwrap();

        FeaturePipeline::new(&db, TensorStore::open(dir.path()).unwrap(), WINDOW)
            .run()
            .unwrap();

        let upgraded = db.find_unit("2016", "Milan", "Roma").unwrap().unwrap();
        assert_eq!(upgraded.unit_id, unit.unit_id);
        assert_eq!(upgraded.kind, UnitKind::Training);
        assert_eq!(upgraded.score.as_deref(), Some("3-1"));
        assert_eq!(
            store.load(&unit.unit_id).unwrap().unwrap().label,
            Some(Outcome::HomeWin.label())
        );
    }
}
