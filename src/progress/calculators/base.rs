use chrono::NaiveDate;

use super::super::{calculator_priority, HabitAttributes, PointsCalculator};

pub struct BasePointsCalculator;

impl Default for BasePointsCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl BasePointsCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl PointsCalculator for BasePointsCalculator {
    fn calculate(&self, habit: &HabitAttributes, _completed_on: NaiveDate) -> u32 {
        habit.points_value
    }

    fn priority(&self) -> u32 {
        calculator_priority::BASE
    }
}
