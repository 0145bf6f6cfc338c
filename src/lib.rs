// Library crate for the habit scoring and progression engine
// This file exposes the public API for the binary and integration tests

pub mod config;
pub mod progress;

// Re-export commonly used types for easier access in tests
pub use config::EngineConfig;
pub use progress::{
    compute_points, compute_streak, generate_ranking, CompletionEngine, CompletionOutcome,
    CompletionResult, Difficulty, HabitAttributes, HabitLogEntry, InMemoryProgressRepository,
    ProgressError, ProgressRepository, ProgressService, RuleTables, UserProgressState,
};
