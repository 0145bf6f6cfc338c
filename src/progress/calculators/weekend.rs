use chrono::{Datelike, NaiveDate};

use super::super::{calculator_priority, HabitAttributes, PointsCalculator};

const WEEKEND_BONUS: u32 = 3;

pub struct WeekendBonusCalculator;

impl Default for WeekendBonusCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl WeekendBonusCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn is_weekend(date: NaiveDate) -> bool {
        // ISO weekday 6 = Saturday, 7 = Sunday
        date.weekday().number_from_monday() >= 6
    }
}

impl PointsCalculator for WeekendBonusCalculator {
    fn calculate(&self, _habit: &HabitAttributes, completed_on: NaiveDate) -> u32 {
        if Self::is_weekend(completed_on) {
            WEEKEND_BONUS
        } else {
            0
        }
    }

    fn priority(&self) -> u32 {
        calculator_priority::CALENDAR
    }
}
