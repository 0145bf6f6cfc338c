use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use super::{
    default_calculators, streaks, sum_points, AchievementRecord, CompletionOutcome,
    CompletionRequest, CompletionResult, DashboardSnapshot, HabitAttributes, HabitLogEntry,
    PointsCalculator, ProgressSnapshot, RuleTables, UserProgressState,
};

/// Pure scoring and progression engine.
///
/// Holds no mutable state; `complete` only describes the mutation the caller
/// must persist. Callers must not run two completions for the same user
/// concurrently against the same snapshot, or points and streaks will be
/// computed from stale state.
pub struct CompletionEngine {
    rules: RuleTables,
    calculators: Vec<Arc<dyn PointsCalculator>>,
}

impl Default for CompletionEngine {
    fn default() -> Self {
        Self::new(RuleTables::default())
    }
}

impl CompletionEngine {
    pub fn new(rules: RuleTables) -> Self {
        Self::with_calculators(rules, default_calculators())
    }

    pub fn with_calculators(
        rules: RuleTables,
        mut calculators: Vec<Arc<dyn PointsCalculator>>,
    ) -> Self {
        calculators.sort_by_key(|c| c.priority());
        Self { rules, calculators }
    }

    pub fn rules(&self) -> &RuleTables {
        &self.rules
    }

    pub fn compute_points(&self, habit: &HabitAttributes, completed_on: NaiveDate) -> u32 {
        sum_points(&self.calculators, habit, completed_on)
    }

    pub fn complete(
        &self,
        request: CompletionRequest<'_>,
        snapshot: ProgressSnapshot<'_>,
    ) -> CompletionOutcome {
        let CompletionRequest {
            user_id,
            habit,
            completed_on,
        } = request;

        let points = self.compute_points(habit, completed_on);
        let log_entry = HabitLogEntry::completed(habit.id.clone(), completed_on, points);
        let history = upsert_entry(snapshot.history, &log_entry);

        let streak = streaks::compute_streak(&history);
        let achievements = self.rules.unlocked(streak);

        let new_achievements: Vec<AchievementRecord> = achievements
            .iter()
            .filter(|code| !snapshot.recorded_codes.contains(code))
            .map(|code| AchievementRecord {
                user_id: user_id.to_string(),
                code: code.clone(),
                name: achievement_name(code),
                earned_on: completed_on,
            })
            .collect();

        let mut updated_profile = snapshot.profile.clone();
        updated_profile.total_points = updated_profile.total_points.saturating_add(points);
        updated_profile.current_streak = streak;
        updated_profile.longest_streak = updated_profile.longest_streak.max(streak);
        updated_profile.last_completed = Some(completed_on);

        let level = self.rules.determine_level(updated_profile.total_points);
        updated_profile.level = level;

        debug!(
            user_id,
            habit_id = %habit.id,
            %completed_on,
            points,
            streak,
            level,
            new_achievements = new_achievements.len(),
            "Computed habit completion"
        );

        CompletionOutcome {
            result: CompletionResult {
                habit_id: habit.id.clone(),
                completed_on,
                points_awarded: points,
                achievements,
                level,
                streak,
            },
            updated_profile,
            log_entry,
            new_achievements,
        }
    }

    pub fn dashboard(
        &self,
        profile: &UserProgressState,
        history: &[HabitLogEntry],
        today: NaiveDate,
    ) -> DashboardSnapshot {
        let streak = streaks::compute_streak(history);

        DashboardSnapshot {
            profile: profile.clone(),
            streak,
            active_streak: streaks::trailing_streak(history, today),
            week_logs: streaks::filter_logs_by_week(history, today),
            achievements: self.rules.unlocked(streak),
            level: self.rules.level_progress(profile.total_points),
        }
    }
}

/// History with `entry` written over any existing entry for the same habit
/// and date, or appended when there is none.
fn upsert_entry(history: &[HabitLogEntry], entry: &HabitLogEntry) -> Vec<HabitLogEntry> {
    let mut merged = history.to_vec();
    match merged
        .iter_mut()
        .find(|existing| existing.habit_id == entry.habit_id && existing.date == entry.date)
    {
        Some(existing) => {
            existing.completed = entry.completed;
            existing.points_awarded = entry.points_awarded;
        }
        None => merged.push(entry.clone()),
    }
    merged
}

/// Display name for an achievement code: underscores become spaces and each
/// word is title-cased ("racha_semana" -> "Racha Semana").
pub fn achievement_name(code: &str) -> String {
    let mut name = String::with_capacity(code.len());
    let mut previous_is_letter = false;

    for ch in code.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if previous_is_letter {
                name.extend(ch.to_lowercase());
            } else {
                name.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            name.push(ch);
            previous_is_letter = false;
        }
    }
    name
}
