pub mod calculators;
pub mod engine;
pub mod ranking;
pub mod rules;
pub mod service;
pub mod streaks;

mod errors;
pub mod models;
pub mod repository;

pub use engine::{achievement_name, CompletionEngine};
pub use errors::ProgressError;
pub use models::*;
pub use ranking::generate_ranking;
pub use repository::{InMemoryProgressRepository, ProgressRepository};
pub use rules::{RuleEntry, RuleTables};
pub use service::{ProgressService, ProgressServiceBuilder};
pub use streaks::{compute_streak, filter_logs_by_week, trailing_streak};

use std::sync::Arc;

use chrono::NaiveDate;

use calculators::{BasePointsCalculator, DifficultyBonusCalculator, WeekendBonusCalculator};

/// Priority constants for points calculators.
/// Lower values run first; the award is the sum of every calculator.
pub mod calculator_priority {
    /// The habit's own point value
    pub const BASE: u32 = 100;
    /// Difficulty tier bonus
    pub const DIFFICULTY: u32 = 200;
    /// Calendar-based bonuses (e.g., weekends)
    pub const CALENDAR: u32 = 300;
}

/// One additive term of a completion's point award.
pub trait PointsCalculator: Send + Sync {
    fn calculate(&self, habit: &HabitAttributes, completed_on: NaiveDate) -> u32;

    fn priority(&self) -> u32;
}

pub fn default_calculators() -> Vec<Arc<dyn PointsCalculator>> {
    vec![
        Arc::new(BasePointsCalculator::new()),
        Arc::new(DifficultyBonusCalculator::new()),
        Arc::new(WeekendBonusCalculator::new()),
    ]
}

/// Points for completing `habit` on `completed_on` with the stock calculators:
/// base value + difficulty bonus + weekend bonus.
pub fn compute_points(habit: &HabitAttributes, completed_on: NaiveDate) -> u32 {
    sum_points(&default_calculators(), habit, completed_on)
}

pub(crate) fn sum_points(
    calculators: &[Arc<dyn PointsCalculator>],
    habit: &HabitAttributes,
    completed_on: NaiveDate,
) -> u32 {
    calculators.iter().fold(0u32, |total, calculator| {
        total.saturating_add(calculator.calculate(habit, completed_on))
    })
}
