mod base;
mod difficulty;
mod weekend;

pub use base::BasePointsCalculator;
pub use difficulty::DifficultyBonusCalculator;
pub use weekend::WeekendBonusCalculator;
