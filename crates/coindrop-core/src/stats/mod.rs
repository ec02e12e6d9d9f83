//! Streak and statistics aggregation.
//!
//! Pure read-side computation over the full session log: no hidden state,
//! every value is a function of the records passed in. Days are grouped by
//! local calendar day (local midnight boundary), so the daily total resets
//! at midnight simply by virtue of being recomputed.

use std::collections::BTreeMap;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::storage::FocusSessionRecord;

/// A day qualifies for the streak at 10 focused minutes.
pub const STREAK_THRESHOLD_SECS: u64 = 600;

/// Per-activity share of one day, sorted descending by time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityBreakdown {
    pub activity_name: String,
    pub duration_secs: u64,
}

/// Simple sums across the full log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub total_coins: u64,
    pub total_secs: u64,
}

/// Total focus seconds per local calendar day.
pub fn day_totals(records: &[FocusSessionRecord]) -> BTreeMap<NaiveDate, u64> {
    let mut totals = BTreeMap::new();
    for record in records {
        let day = local_day(record);
        *totals.entry(day).or_insert(0) += record.duration_secs as u64;
    }
    totals
}

/// Whether a day meets the streak threshold.
pub fn day_qualifies(records: &[FocusSessionRecord], day: NaiveDate) -> bool {
    day_totals(records).get(&day).copied().unwrap_or(0) >= STREAK_THRESHOLD_SECS
}

/// Consecutive qualifying days ending at (or just before) `today`.
///
/// Today counts only once it already qualifies; an unfinished today does
/// not break the run of days preceding it.
pub fn current_streak(records: &[FocusSessionRecord], today: NaiveDate) -> u32 {
    let totals = day_totals(records);
    let qualifies = |day: NaiveDate| totals.get(&day).copied().unwrap_or(0) >= STREAK_THRESHOLD_SECS;

    let mut streak = if qualifies(today) { 1 } else { 0 };
    let mut day = today.pred_opt();
    while let Some(d) = day {
        if !qualifies(d) {
            break;
        }
        streak += 1;
        day = d.pred_opt();
    }
    streak
}

/// Longest run of adjacent qualifying days anywhere in the log.
pub fn longest_streak(records: &[FocusSessionRecord]) -> u32 {
    let totals = day_totals(records);
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;

    // BTreeMap iteration is chronological.
    for (&day, &secs) in &totals {
        if secs < STREAK_THRESHOLD_SECS {
            run = 0;
            prev = None;
            continue;
        }
        run = match prev {
            Some(p) if day.num_days_from_ce() - p.num_days_from_ce() == 1 => run + 1,
            _ => 1,
        };
        prev = Some(day);
        longest = longest.max(run);
    }
    longest
}

/// Per-activity seconds within one local day, descending by time.
pub fn daily_breakdown(records: &[FocusSessionRecord], day: NaiveDate) -> Vec<ActivityBreakdown> {
    let mut by_activity: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        if local_day(record) == day {
            *by_activity.entry(record.activity_name.as_str()).or_insert(0) +=
                record.duration_secs as u64;
        }
    }
    let mut breakdown: Vec<ActivityBreakdown> = by_activity
        .into_iter()
        .map(|(name, secs)| ActivityBreakdown {
            activity_name: name.to_string(),
            duration_secs: secs,
        })
        .collect();
    breakdown.sort_by(|a, b| b.duration_secs.cmp(&a.duration_secs));
    breakdown
}

pub fn totals(records: &[FocusSessionRecord]) -> Totals {
    Totals {
        total_coins: records.iter().map(|r| r.collected_count as u64).sum(),
        total_secs: records.iter().map(|r| r.duration_secs as u64).sum(),
    }
}

/// Focus seconds recorded on `today` -- recomputed from the log at load,
/// never stored independently.
pub fn today_focus_secs(records: &[FocusSessionRecord], today: NaiveDate) -> u64 {
    day_totals(records).get(&today).copied().unwrap_or(0)
}

fn local_day(record: &FocusSessionRecord) -> NaiveDate {
    record.completed_at.with_timezone(&Local).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn record(activity: &str, duration_secs: u32, completed_at: DateTime<Utc>) -> FocusSessionRecord {
        FocusSessionRecord {
            id: 0,
            activity_name: activity.to_string(),
            activity_glyph: "🪙".to_string(),
            collected_count: duration_secs / 30,
            duration_secs,
            completed_at,
        }
    }

    fn on_day(day: NaiveDate, activity: &str, duration_secs: u32) -> FocusSessionRecord {
        let at = Local
            .from_local_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
            .unwrap()
            .with_timezone(&Utc);
        record(activity, duration_secs, at)
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn current_streak_counts_back_from_today() {
        let today = day("2026-08-23");
        let records = vec![
            on_day(today, "Study", 900),
            on_day(today - Duration::days(1), "Study", 600),
            on_day(today - Duration::days(2), "Work", 700),
            // D-3 exists but falls short of the threshold.
            on_day(today - Duration::days(3), "Study", 300),
        ];
        assert_eq!(current_streak(&records, today), 3);
    }

    #[test]
    fn unqualified_today_does_not_break_preceding_run() {
        let today = day("2026-08-23");
        let records = vec![
            on_day(today, "Study", 120),
            on_day(today - Duration::days(1), "Study", 600),
            on_day(today - Duration::days(2), "Study", 600),
        ];
        assert_eq!(current_streak(&records, today), 2);
    }

    #[test]
    fn missing_day_ends_current_streak() {
        let today = day("2026-08-23");
        let records = vec![
            on_day(today, "Study", 900),
            // No records at all on D-1.
            on_day(today - Duration::days(2), "Study", 900),
        ];
        assert_eq!(current_streak(&records, today), 1);
    }

    #[test]
    fn longest_streak_spans_a_gap_correctly() {
        let today = day("2026-08-23");
        // Qualifying on D-5..D-3 (3 consecutive) and D-1..D (2), gap at D-2.
        let records = vec![
            on_day(today, "Study", 600),
            on_day(today - Duration::days(1), "Study", 600),
            on_day(today - Duration::days(3), "Study", 600),
            on_day(today - Duration::days(4), "Study", 600),
            on_day(today - Duration::days(5), "Study", 600),
        ];
        assert_eq!(longest_streak(&records), 3);
    }

    #[test]
    fn non_qualifying_day_breaks_longest_run() {
        let today = day("2026-08-23");
        let records = vec![
            on_day(today, "Study", 600),
            on_day(today - Duration::days(1), "Study", 599),
            on_day(today - Duration::days(2), "Study", 600),
            on_day(today - Duration::days(3), "Study", 600),
        ];
        assert_eq!(longest_streak(&records), 2);
    }

    #[test]
    fn multiple_records_per_day_sum_toward_threshold() {
        let today = day("2026-08-23");
        let records = vec![
            on_day(today, "Study", 300),
            on_day(today, "Work", 300),
        ];
        assert!(day_qualifies(&records, today));
        assert_eq!(current_streak(&records, today), 1);
    }

    #[test]
    fn breakdown_sorts_descending_by_time() {
        let today = day("2026-08-23");
        let records = vec![
            on_day(today, "Read", 300),
            on_day(today, "Study", 900),
            on_day(today, "Study", 60),
            on_day(today - Duration::days(1), "Work", 9_000),
        ];
        let breakdown = daily_breakdown(&records, today);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].activity_name, "Study");
        assert_eq!(breakdown[0].duration_secs, 960);
        assert_eq!(breakdown[1].activity_name, "Read");
    }

    #[test]
    fn totals_sum_whole_log() {
        let today = day("2026-08-23");
        let records = vec![
            on_day(today, "Study", 150),
            on_day(today - Duration::days(10), "Work", 60),
        ];
        let t = totals(&records);
        assert_eq!(t.total_coins, 5 + 2);
        assert_eq!(t.total_secs, 210);
        assert_eq!(today_focus_secs(&records, today), 150);
    }

    #[test]
    fn empty_log_yields_zeroes() {
        let today = day("2026-08-23");
        assert_eq!(current_streak(&[], today), 0);
        assert_eq!(longest_streak(&[]), 0);
        assert_eq!(totals(&[]), Totals::default());
    }
}
