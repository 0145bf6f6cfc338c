use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, instrument};

use super::{
    default_calculators, generate_ranking, repository::ProgressRepository, AchievementRecord,
    CompletionEngine, CompletionRequest, CompletionResult, DashboardSnapshot, PointsCalculator,
    ProgressError, ProgressSnapshot, RankingEntry, RuleTables,
};

/// Runs completions against a storage collaborator, holding a per-user lock
/// across fetch, compute and store.
pub struct ProgressService {
    engine: CompletionEngine,
    repository: Arc<dyn ProgressRepository>,
    user_mutexes: Arc<RwLock<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl ProgressService {
    pub fn builder(repository: Arc<dyn ProgressRepository>) -> ProgressServiceBuilder {
        ProgressServiceBuilder::new(repository)
    }

    pub fn engine(&self) -> &CompletionEngine {
        &self.engine
    }

    #[instrument(skip(self))]
    pub async fn complete_habit(
        &self,
        user_id: &str,
        habit_id: &str,
        completed_on: NaiveDate,
    ) -> Result<CompletionResult, ProgressError> {
        // Habit attributes are not written by completions, so they can be
        // resolved before locking. Unknown users never get a lock entry.
        let habit = self
            .repository
            .get_habit(user_id, habit_id)
            .await?
            .ok_or_else(|| ProgressError::NotFound(format!("habit {habit_id} for user {user_id}")))?;

        let user_lock = self.user_lock(user_id).await;
        let _guard = user_lock.lock().await;

        let profile = self
            .repository
            .get_progress(user_id)
            .await?
            .unwrap_or_default();
        let history = self.repository.list_logs(user_id).await?;
        let recorded_codes: Vec<String> = self
            .repository
            .list_achievements(user_id)
            .await?
            .into_iter()
            .map(|record| record.code)
            .collect();

        let outcome = self.engine.complete(
            CompletionRequest {
                user_id,
                habit: &habit,
                completed_on,
            },
            ProgressSnapshot {
                profile: &profile,
                history: &history,
                recorded_codes: &recorded_codes,
            },
        );

        // Not atomic across the three writes, see ProgressRepository.
        self.repository
            .upsert_log(user_id, outcome.log_entry)
            .await?;
        self.repository
            .save_progress(user_id, outcome.updated_profile)
            .await?;
        let inserted = self
            .repository
            .insert_achievements(outcome.new_achievements)
            .await?;

        info!(
            user_id,
            habit_id,
            points = outcome.result.points_awarded,
            streak = outcome.result.streak,
            level = outcome.result.level,
            new_achievements = inserted,
            "Habit completion recorded"
        );

        Ok(outcome.result)
    }

    #[instrument(skip(self))]
    pub async fn ranking(&self) -> Result<Vec<RankingEntry>, ProgressError> {
        let profiles = self.repository.list_profiles().await?;
        debug!(profile_count = profiles.len(), "Generating ranking");
        Ok(generate_ranking(&profiles))
    }

    #[instrument(skip(self))]
    pub async fn dashboard(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<DashboardSnapshot, ProgressError> {
        let profile = self
            .repository
            .get_progress(user_id)
            .await?
            .unwrap_or_default();
        let history = self.repository.list_logs(user_id).await?;
        Ok(self.engine.dashboard(&profile, &history, today))
    }

    /// Recorded achievements, most recently earned first.
    pub async fn achievements(&self, user_id: &str) -> Result<Vec<AchievementRecord>, ProgressError> {
        let mut records = self.repository.list_achievements(user_id).await?;
        records.sort_by(|a, b| b.earned_on.cmp(&a.earned_on));
        Ok(records)
    }

    async fn user_lock(&self, user_id: &str) -> Arc<AsyncMutex<()>> {
        {
            let guard = self.user_mutexes.read().await;
            if let Some(lock) = guard.get(user_id) {
                return lock.clone();
            }
        }

        let mut guard = self.user_mutexes.write().await;
        guard
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

pub struct ProgressServiceBuilder {
    rules: RuleTables,
    calculators: Vec<Arc<dyn PointsCalculator>>,
    repository: Arc<dyn ProgressRepository>,
}

impl ProgressServiceBuilder {
    fn new(repository: Arc<dyn ProgressRepository>) -> Self {
        Self {
            rules: RuleTables::default(),
            calculators: default_calculators(),
            repository,
        }
    }

    pub fn with_rules(mut self, rules: RuleTables) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_calculator(mut self, calculator: Arc<dyn PointsCalculator>) -> Self {
        self.calculators.push(calculator);
        self
    }

    pub fn build(self) -> ProgressService {
        ProgressService {
            engine: CompletionEngine::with_calculators(self.rules, self.calculators),
            repository: self.repository,
            user_mutexes: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}
