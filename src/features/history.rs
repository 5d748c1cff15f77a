//! Rolling-history selection
//!
//! Picks the most recent n fully-populated matches a team played strictly
//! before a fixture date. The strict inequality is the anti-leakage rule:
//! a fixture never sees same-day or later information.

use crate::features::FeatureRow;
use crate::Match;
use chrono::NaiveDate;

/// Select the team's rolling-history window before `as_of`.
///
/// Qualifying matches span seasons; the filter is team and date only.
/// Returns up to `n` rows, oldest first. Fewer than `n` (including zero) is a
/// normal "not yet ready" result, not an error.
pub fn select_history(matches: &[Match], team: &str, as_of: NaiveDate, n: usize) -> Vec<FeatureRow> {
    let mut qualifying: Vec<&Match> = matches
        .iter()
        .filter(|m| m.date < as_of && m.involves(team) && m.fully_populated())
        .collect();
    qualifying.sort_by_key(|m| m.date);

    let start = qualifying.len().saturating_sub(n);
    qualifying[start..]
        .iter()
        .filter_map(|m| FeatureRow::from_match(m, team))
        .collect()
}
