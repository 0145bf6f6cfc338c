use chrono::NaiveDate;

use super::super::{calculator_priority, Difficulty, HabitAttributes, PointsCalculator};

pub struct DifficultyBonusCalculator;

impl Default for DifficultyBonusCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl DifficultyBonusCalculator {
    pub fn new() -> Self {
        Self
    }

    /// A habit without a recognised tier earns no bonus, not the medium one.
    pub fn bonus(difficulty: Option<Difficulty>) -> u32 {
        match difficulty {
            Some(Difficulty::Easy) | None => 0,
            Some(Difficulty::Medium) => 2,
            Some(Difficulty::Hard) => 5,
        }
    }
}

impl PointsCalculator for DifficultyBonusCalculator {
    fn calculate(&self, habit: &HabitAttributes, _completed_on: NaiveDate) -> u32 {
        Self::bonus(habit.difficulty)
    }

    fn priority(&self) -> u32 {
        calculator_priority::DIFFICULTY
    }
}
