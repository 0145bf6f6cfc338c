//! Streak tracking over habit log history
//!
//! The headline streak is the best-ever run of consecutive days found anywhere
//! in a user's history. The trailing streak is the run still alive today.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};

use super::HabitLogEntry;

/// Longest run of consecutive completed days in `history`.
///
/// Entries are sorted by date first (stable), then folded left to right
/// carrying `(last_date, current_run, best_run)`:
/// - a missed entry closes the current run
/// - a completed entry exactly one day after the previous entry extends it
/// - any other completed entry (first entry, gap, or same date as the
///   previous entry) starts a new run of 1
pub fn compute_streak(history: &[HabitLogEntry]) -> u32 {
    let mut sorted: Vec<&HabitLogEntry> = history.iter().collect();
    sorted.sort_by_key(|entry| entry.date);

    let mut last_date: Option<NaiveDate> = None;
    let mut current = 0u32;
    let mut best = 0u32;

    for entry in sorted {
        if !entry.completed {
            best = best.max(current);
            current = 0;
        } else if last_date.and_then(|d| d.succ_opt()) == Some(entry.date) {
            current += 1;
        } else {
            current = 1;
        }
        best = best.max(current);
        last_date = Some(entry.date);
    }

    best
}

/// Consecutive distinct completed days ending today, or yesterday if nothing
/// has been completed yet today. Zero once a full day has been skipped.
pub fn trailing_streak(history: &[HabitLogEntry], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = history
        .iter()
        .filter(|entry| entry.completed && entry.date <= today)
        .map(|entry| entry.date)
        .collect();

    let yesterday = today - Duration::days(1);
    let mut cursor = if days.contains(&today) {
        today
    } else if days.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    streak
}

/// Entries falling in the Monday-to-Sunday week that contains `reference`.
pub fn filter_logs_by_week(history: &[HabitLogEntry], reference: NaiveDate) -> Vec<HabitLogEntry> {
    let week_start = reference - Duration::days(reference.weekday().num_days_from_monday() as i64);
    let week_end = week_start + Duration::days(6);

    history
        .iter()
        .filter(|entry| entry.date >= week_start && entry.date <= week_end)
        .cloned()
        .collect()
}
