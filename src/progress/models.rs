use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::EnumIter;

use super::ProgressError;

/// Difficulty tier of a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Unknown tiers yield `None`, which scores like `Easy`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

fn lenient_difficulty<'de, D>(deserializer: D) -> Result<Option<Difficulty>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Difficulty::parse))
}

/// Scoring-relevant attributes of a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitAttributes {
    pub id: String,
    pub points_value: u32,
    #[serde(default, deserialize_with = "lenient_difficulty")]
    pub difficulty: Option<Difficulty>,
}

impl HabitAttributes {
    pub fn new(id: impl Into<String>, points_value: u32, difficulty: Option<Difficulty>) -> Self {
        Self {
            id: id.into(),
            points_value,
            difficulty,
        }
    }

    /// Builds attributes from an untrusted signed point value.
    pub fn try_new(
        id: impl Into<String>,
        points_value: i64,
        difficulty: Option<Difficulty>,
    ) -> Result<Self, ProgressError> {
        let id = id.into();
        let points_value = u32::try_from(points_value).map_err(|_| {
            ProgressError::InvalidInput(format!(
                "habit {id} has invalid base point value {points_value}"
            ))
        })?;
        Ok(Self::new(id, points_value, difficulty))
    }
}

/// One day's recorded attempt for one habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitLogEntry {
    pub habit_id: String,
    pub date: NaiveDate,
    pub completed: bool,
    pub points_awarded: u32,
}

impl HabitLogEntry {
    pub fn completed(habit_id: impl Into<String>, date: NaiveDate, points_awarded: u32) -> Self {
        Self {
            habit_id: habit_id.into(),
            date,
            completed: true,
            points_awarded,
        }
    }

    pub fn missed(habit_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            habit_id: habit_id.into(),
            date,
            completed: false,
            points_awarded: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgressState {
    pub total_points: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_completed: Option<NaiveDate>,
    pub level: u32,
}

impl Default for UserProgressState {
    fn default() -> Self {
        Self {
            total_points: 0,
            current_streak: 0,
            longest_streak: 0,
            last_completed: None,
            level: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub user_id: String,
    pub code: String,
    pub name: String,
    pub earned_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub habit_id: String,
    pub completed_on: NaiveDate,
    pub points_awarded: u32,
    pub achievements: Vec<String>,
    pub level: u32,
    pub streak: u32,
}

/// Everything the storage layer must apply after a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub result: CompletionResult,
    pub updated_profile: UserProgressState,
    pub log_entry: HabitLogEntry,
    pub new_achievements: Vec<AchievementRecord>,
}

/// A completion event as seen by the engine.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub user_id: &'a str,
    pub habit: &'a HabitAttributes,
    pub completed_on: NaiveDate,
}

/// Caller-supplied state the engine reduces over.
#[derive(Debug, Clone, Copy)]
pub struct ProgressSnapshot<'a> {
    pub profile: &'a UserProgressState,
    pub history: &'a [HabitLogEntry],
    pub recorded_codes: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub user_id: String,
    pub display_name: String,
    pub progress: UserProgressState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub display_name: String,
    pub total_points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub code: Option<String>,
    pub current_threshold: u32,
    /// `None` once the last level is reached
    pub next_threshold: Option<u32>,
    /// Fraction of the way to the next level (0.0 - 1.0)
    pub progress: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub profile: UserProgressState,
    pub streak: u32,
    pub active_streak: u32,
    pub week_logs: Vec<HabitLogEntry>,
    pub achievements: Vec<String>,
    pub level: LevelProgress,
}

/// Parses an ISO `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ProgressError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| ProgressError::InvalidInput(format!("malformed date {raw:?}: {e}")))
}
