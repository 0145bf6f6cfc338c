//! Declarative unlock rules: cumulative achievements, exact-match streak
//! specials, and point-based levels.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LevelProgress, ProgressError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    pub code: String,
    pub threshold: u32,
}

impl RuleEntry {
    pub fn new(code: impl Into<String>, threshold: u32) -> Self {
        Self {
            code: code.into(),
            threshold,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRuleTables {
    #[serde(default)]
    achievements: Vec<RuleEntry>,
    #[serde(default)]
    special_streaks: Vec<RuleEntry>,
    levels: Vec<RuleEntry>,
}

/// Immutable rule tables. Always valid once constructed: the level table is
/// non-empty, starts at threshold 0 and increases strictly, the
/// achievement table increases strictly, and no table repeats a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRuleTables")]
pub struct RuleTables {
    achievements: Vec<RuleEntry>,
    special_streaks: Vec<RuleEntry>,
    levels: Vec<RuleEntry>,
}

impl TryFrom<RawRuleTables> for RuleTables {
    type Error = ProgressError;

    fn try_from(raw: RawRuleTables) -> Result<Self, Self::Error> {
        Self::new(raw.achievements, raw.special_streaks, raw.levels)
    }
}

impl Default for RuleTables {
    fn default() -> Self {
        Self {
            achievements: vec![
                RuleEntry::new("medalla_7", 7),
                RuleEntry::new("medalla_14", 14),
                RuleEntry::new("medalla_30", 30),
                RuleEntry::new("medalla_90", 90),
            ],
            special_streaks: vec![
                RuleEntry::new("racha_semana", 7),
                RuleEntry::new("racha_mes", 30),
            ],
            levels: vec![
                RuleEntry::new("nivel_1", 0),
                RuleEntry::new("nivel_2", 200),
                RuleEntry::new("nivel_3", 500),
                RuleEntry::new("nivel_4", 900),
                RuleEntry::new("nivel_5", 1500),
            ],
        }
    }
}

impl RuleTables {
    pub fn new(
        achievements: Vec<RuleEntry>,
        special_streaks: Vec<RuleEntry>,
        levels: Vec<RuleEntry>,
    ) -> Result<Self, ProgressError> {
        match levels.first() {
            None => {
                return Err(ProgressError::InvalidInput(
                    "level table is empty".to_string(),
                ))
            }
            Some(floor) if floor.threshold != 0 => {
                return Err(ProgressError::InvalidInput(format!(
                    "level table must start at threshold 0, found {} at {}",
                    floor.threshold, floor.code
                )))
            }
            Some(_) => {}
        }
        ensure_increasing("level", &levels)?;
        ensure_increasing("achievement", &achievements)?;
        ensure_unique_codes("level", &levels)?;
        ensure_unique_codes("achievement", &achievements)?;
        ensure_unique_codes("special streak", &special_streaks)?;

        Ok(Self {
            achievements,
            special_streaks,
            levels,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, ProgressError> {
        serde_json::from_str(raw)
            .map_err(|e| ProgressError::InvalidInput(format!("invalid rule tables: {e}")))
    }

    pub fn from_path(path: &Path) -> Result<Self, ProgressError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ProgressError::Config(format!("cannot read rule tables {}: {e}", path.display()))
        })?;
        let tables = Self::from_json(&raw)?;
        debug!(
            path = %path.display(),
            achievements = tables.achievements.len(),
            special_streaks = tables.special_streaks.len(),
            levels = tables.levels.len(),
            "Loaded rule tables"
        );
        Ok(tables)
    }

    pub fn achievements(&self) -> &[RuleEntry] {
        &self.achievements
    }

    pub fn special_streaks(&self) -> &[RuleEntry] {
        &self.special_streaks
    }

    pub fn levels(&self) -> &[RuleEntry] {
        &self.levels
    }

    /// Every achievement whose threshold the streak has reached, in table order.
    pub fn check_achievements(&self, streak: u32) -> Vec<String> {
        self.achievements
            .iter()
            .filter(|rule| streak >= rule.threshold)
            .map(|rule| rule.code.clone())
            .collect()
    }

    /// Specials whose threshold equals the streak exactly.
    pub fn check_special_streak(&self, streak: u32) -> Vec<String> {
        self.special_streaks
            .iter()
            .filter(|rule| streak == rule.threshold)
            .map(|rule| rule.code.clone())
            .collect()
    }

    /// 1-based index of the highest level whose threshold `total_points` meets.
    pub fn determine_level(&self, total_points: u32) -> u32 {
        self.levels
            .iter()
            .rposition(|rule| total_points >= rule.threshold)
            .map(|idx| idx as u32 + 1)
            .unwrap_or(1)
    }

    /// Cumulative codes followed by exact-match codes, first occurrence kept.
    pub fn unlocked(&self, streak: u32) -> Vec<String> {
        let mut codes: Vec<String> = Vec::new();
        let candidates = self
            .check_achievements(streak)
            .into_iter()
            .chain(self.check_special_streak(streak));
        for code in candidates {
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
        codes
    }

    /// Sorted set of every code held at this streak and point total,
    /// including the current level's code.
    pub fn achieved_set(&self, streak: u32, total_points: u32) -> Vec<String> {
        let mut set: BTreeSet<String> = self.unlocked(streak).into_iter().collect();
        let level = self.determine_level(total_points);
        if let Some(rule) = self.levels.get(level as usize - 1) {
            set.insert(rule.code.clone());
        }
        set.into_iter().collect()
    }

    pub fn level_progress(&self, total_points: u32) -> LevelProgress {
        let level = self.determine_level(total_points);
        let current = self.levels.get(level as usize - 1);
        let current_threshold = current.map(|rule| rule.threshold).unwrap_or(0);
        let next_threshold = self.levels.get(level as usize).map(|rule| rule.threshold);

        let progress = match next_threshold {
            Some(next) => {
                let span = next - current_threshold;
                if span == 0 {
                    1.0
                } else {
                    (total_points - current_threshold) as f32 / span as f32
                }
            }
            None => 1.0,
        };

        LevelProgress {
            level,
            code: current.map(|rule| rule.code.clone()),
            current_threshold,
            next_threshold,
            progress,
        }
    }
}

fn ensure_increasing(table: &str, entries: &[RuleEntry]) -> Result<(), ProgressError> {
    for pair in entries.windows(2) {
        if pair[1].threshold <= pair[0].threshold {
            return Err(ProgressError::InvalidInput(format!(
                "{table} thresholds must increase: {} ({}) follows {} ({})",
                pair[1].code, pair[1].threshold, pair[0].code, pair[0].threshold
            )));
        }
    }
    Ok(())
}

fn ensure_unique_codes(table: &str, entries: &[RuleEntry]) -> Result<(), ProgressError> {
    let mut seen = BTreeSet::new();
    for entry in entries {
        if !seen.insert(entry.code.as_str()) {
            return Err(ProgressError::InvalidInput(format!(
                "{table} table lists code {} more than once",
                entry.code
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn achievements_are_cumulative() {
        let rules = RuleTables::default();
        let medals = rules.check_achievements(30);

        assert_eq!(medals, vec!["medalla_7", "medalla_14", "medalla_30"]);
        assert!(!medals.contains(&"medalla_90".to_string()));
    }

    #[test]
    fn short_streak_unlocks_nothing() {
        let rules = RuleTables::default();
        assert!(rules.check_achievements(6).is_empty());
        assert!(rules.check_achievements(0).is_empty());
    }

    #[test]
    fn special_streaks_need_exact_match() {
        let rules = RuleTables::default();
        assert_eq!(rules.check_special_streak(7), vec!["racha_semana"]);
        assert!(rules.check_special_streak(8).is_empty());
        assert_eq!(rules.check_special_streak(30), vec!["racha_mes"]);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(199, 1)]
    #[case(200, 2)]
    #[case(499, 2)]
    #[case(500, 3)]
    #[case(900, 4)]
    #[case(1499, 4)]
    #[case(1500, 5)]
    #[case(2000, 5)]
    fn level_follows_thresholds(#[case] points: u32, #[case] expected: u32) {
        assert_eq!(RuleTables::default().determine_level(points), expected);
    }

    #[test]
    fn unlocked_orders_cumulative_before_specials() {
        let rules = RuleTables::default();
        assert_eq!(
            rules.unlocked(7),
            vec!["medalla_7".to_string(), "racha_semana".to_string()]
        );
        assert_eq!(
            rules.unlocked(30),
            vec!["medalla_7", "medalla_14", "medalla_30", "racha_mes"]
        );
    }

    #[test]
    fn unlocked_drops_codes_present_in_both_tables() {
        let rules = RuleTables::new(
            vec![RuleEntry::new("week", 7)],
            vec![RuleEntry::new("week", 7), RuleEntry::new("exact", 7)],
            vec![RuleEntry::new("lvl", 0)],
        )
        .unwrap();
        assert_eq!(rules.unlocked(7), vec!["week", "exact"]);
    }

    #[test]
    fn achieved_set_includes_level_code_sorted() {
        let rules = RuleTables::default();
        assert_eq!(
            rules.achieved_set(7, 250),
            vec!["medalla_7", "nivel_2", "racha_semana"]
        );
        assert_eq!(rules.achieved_set(0, 0), vec!["nivel_1"]);
    }

    #[test]
    fn level_progress_reports_fraction_to_next() {
        let rules = RuleTables::default();
        let progress = rules.level_progress(350);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.code.as_deref(), Some("nivel_2"));
        assert_eq!(progress.current_threshold, 200);
        assert_eq!(progress.next_threshold, Some(500));
        assert!((progress.progress - 0.5).abs() < 0.001);
    }

    #[test]
    fn level_progress_is_full_at_max_level() {
        let progress = RuleTables::default().level_progress(5000);
        assert_eq!(progress.level, 5);
        assert_eq!(progress.next_threshold, None);
        assert_eq!(progress.progress, 1.0);
    }

    #[test]
    fn rejects_empty_level_table() {
        let result = RuleTables::new(vec![], vec![], vec![]);
        assert!(matches!(result, Err(ProgressError::InvalidInput(_))));
    }

    #[test]
    fn rejects_level_table_without_zero_floor() {
        let result = RuleTables::new(vec![], vec![], vec![RuleEntry::new("lvl", 100)]);
        assert!(matches!(result, Err(ProgressError::InvalidInput(_))));
    }

    #[test]
    fn rejects_non_increasing_thresholds() {
        let levels = vec![RuleEntry::new("a", 0), RuleEntry::new("b", 0)];
        assert!(RuleTables::new(vec![], vec![], levels).is_err());

        let achievements = vec![RuleEntry::new("x", 14), RuleEntry::new("y", 7)];
        let levels = vec![RuleEntry::new("a", 0)];
        assert!(RuleTables::new(achievements, vec![], levels).is_err());
    }

    #[test]
    fn rejects_repeated_code_within_a_table() {
        let levels = vec![RuleEntry::new("lvl", 0)];

        let achievements = vec![RuleEntry::new("medal", 1), RuleEntry::new("medal", 2)];
        let result = RuleTables::new(achievements, vec![], levels.clone());
        assert!(matches!(result, Err(ProgressError::InvalidInput(_))));

        let specials = vec![RuleEntry::new("pair", 2), RuleEntry::new("pair", 4)];
        let result = RuleTables::new(vec![], specials, levels);
        assert!(matches!(result, Err(ProgressError::InvalidInput(_))));

        let levels = vec![RuleEntry::new("lvl", 0), RuleEntry::new("lvl", 100)];
        let result = RuleTables::new(vec![], vec![], levels);
        assert!(matches!(result, Err(ProgressError::InvalidInput(_))));
    }

    #[test]
    fn json_tables_with_repeated_codes_are_rejected() {
        let result = RuleTables::from_json(
            r#"{
                "achievements": [{"code": "medal", "threshold": 1}, {"code": "medal", "threshold": 2}],
                "levels": [{"code": "lvl", "threshold": 0}]
            }"#,
        );
        assert!(matches!(result, Err(ProgressError::InvalidInput(_))));
    }

    #[test]
    fn loads_tables_from_json() {
        let rules = RuleTables::from_json(
            r#"{
                "achievements": [{"code": "first", "threshold": 1}],
                "special_streaks": [{"code": "pair", "threshold": 2}],
                "levels": [{"code": "rookie", "threshold": 0}, {"code": "pro", "threshold": 50}]
            }"#,
        )
        .unwrap();

        assert_eq!(rules.check_achievements(1), vec!["first"]);
        assert_eq!(rules.check_special_streak(2), vec!["pair"]);
        assert_eq!(rules.determine_level(50), 2);
    }

    #[test]
    fn json_tables_are_validated() {
        let result = RuleTables::from_json(r#"{"levels": []}"#);
        assert!(matches!(result, Err(ProgressError::InvalidInput(_))));
    }

    #[test]
    fn default_tables_pass_validation() {
        let defaults = RuleTables::default();
        let rebuilt = RuleTables::new(
            defaults.achievements().to_vec(),
            defaults.special_streaks().to_vec(),
            defaults.levels().to_vec(),
        )
        .unwrap();
        assert_eq!(rebuilt, defaults);
    }
}
