use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{
    AchievementRecord, HabitAttributes, HabitLogEntry, ProfileSnapshot, ProgressError,
    UserProgressState,
};

/// Storage collaborator for habits, logs, progress and achievements.
///
/// A completion writes `upsert_log`, then `save_progress`, then
/// `insert_achievements`, with no rollback if a later write fails. Durable
/// backends should run the three writes in one transaction.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn get_habit(
        &self,
        user_id: &str,
        habit_id: &str,
    ) -> Result<Option<HabitAttributes>, ProgressError>;

    async fn get_progress(&self, user_id: &str)
        -> Result<Option<UserProgressState>, ProgressError>;

    async fn save_progress(
        &self,
        user_id: &str,
        progress: UserProgressState,
    ) -> Result<(), ProgressError>;

    /// Full log history across all of the user's habits, in any order.
    async fn list_logs(&self, user_id: &str) -> Result<Vec<HabitLogEntry>, ProgressError>;

    /// Inserts or replaces the entry for `(entry.habit_id, entry.date)`.
    async fn upsert_log(&self, user_id: &str, entry: HabitLogEntry) -> Result<(), ProgressError>;

    async fn list_achievements(
        &self,
        user_id: &str,
    ) -> Result<Vec<AchievementRecord>, ProgressError>;

    /// Inserts records, skipping any `(user, code)` already stored.
    /// Returns the number actually inserted.
    async fn insert_achievements(
        &self,
        records: Vec<AchievementRecord>,
    ) -> Result<usize, ProgressError>;

    /// Every known user with their progress, in a stable order.
    async fn list_profiles(&self) -> Result<Vec<ProfileSnapshot>, ProgressError>;
}

#[derive(Debug, Clone, Default)]
struct UserRecord {
    display_name: String,
    habits: HashMap<String, HabitAttributes>,
    progress: Option<UserProgressState>,
    logs: Vec<HabitLogEntry>,
    achievements: Vec<AchievementRecord>,
}

#[derive(Debug, Default)]
struct Store {
    users: HashMap<String, UserRecord>,
    registration_order: Vec<String>,
}

impl Store {
    fn user_mut(&mut self, user_id: &str) -> Result<&mut UserRecord, ProgressError> {
        self.users
            .get_mut(user_id)
            .ok_or_else(|| ProgressError::NotFound(format!("user {user_id}")))
    }
}

/// In-memory implementation of ProgressRepository for development and testing
#[derive(Debug, Default)]
pub struct InMemoryProgressRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryProgressRepository {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
        }
    }

    pub fn generate_user_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Registers a user under a fresh UUID and returns it.
    pub async fn register_user(&self, display_name: &str) -> String {
        let user_id = Self::generate_user_id();
        self.register_user_with_id(&user_id, display_name).await;
        user_id
    }

    /// Registers a user under a known ID. Re-registering only renames.
    #[instrument(skip(self))]
    pub async fn register_user_with_id(&self, user_id: &str, display_name: &str) {
        let mut store = self.store.write().await;
        match store.users.get_mut(user_id) {
            Some(existing) => {
                warn!(user_id, "User already registered, updating display name");
                existing.display_name = display_name.to_string();
            }
            None => {
                store.users.insert(
                    user_id.to_string(),
                    UserRecord {
                        display_name: display_name.to_string(),
                        ..UserRecord::default()
                    },
                );
                store.registration_order.push(user_id.to_string());
                debug!(user_id, "Registered user");
            }
        }
    }

    #[instrument(skip(self, habit), fields(habit_id = %habit.id))]
    pub async fn add_habit(&self, user_id: &str, habit: HabitAttributes) -> Result<(), ProgressError> {
        let mut store = self.store.write().await;
        let user = store.user_mut(user_id)?;
        user.habits.insert(habit.id.clone(), habit);
        Ok(())
    }

    pub async fn user_count(&self) -> usize {
        self.store.read().await.users.len()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryProgressRepository {
    async fn get_habit(
        &self,
        user_id: &str,
        habit_id: &str,
    ) -> Result<Option<HabitAttributes>, ProgressError> {
        let store = self.store.read().await;
        Ok(store
            .users
            .get(user_id)
            .and_then(|user| user.habits.get(habit_id))
            .cloned())
    }

    async fn get_progress(
        &self,
        user_id: &str,
    ) -> Result<Option<UserProgressState>, ProgressError> {
        let store = self.store.read().await;
        Ok(store
            .users
            .get(user_id)
            .and_then(|user| user.progress.clone()))
    }

    #[instrument(skip(self, progress))]
    async fn save_progress(
        &self,
        user_id: &str,
        progress: UserProgressState,
    ) -> Result<(), ProgressError> {
        let mut store = self.store.write().await;
        store.user_mut(user_id)?.progress = Some(progress);
        Ok(())
    }

    async fn list_logs(&self, user_id: &str) -> Result<Vec<HabitLogEntry>, ProgressError> {
        let store = self.store.read().await;
        Ok(store
            .users
            .get(user_id)
            .map(|user| user.logs.clone())
            .unwrap_or_default())
    }

    #[instrument(skip(self, entry), fields(habit_id = %entry.habit_id, date = %entry.date))]
    async fn upsert_log(&self, user_id: &str, entry: HabitLogEntry) -> Result<(), ProgressError> {
        let mut store = self.store.write().await;
        let user = store.user_mut(user_id)?;

        match user
            .logs
            .iter_mut()
            .find(|log| log.habit_id == entry.habit_id && log.date == entry.date)
        {
            Some(existing) => *existing = entry,
            None => user.logs.push(entry),
        }
        Ok(())
    }

    async fn list_achievements(
        &self,
        user_id: &str,
    ) -> Result<Vec<AchievementRecord>, ProgressError> {
        let store = self.store.read().await;
        Ok(store
            .users
            .get(user_id)
            .map(|user| user.achievements.clone())
            .unwrap_or_default())
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn insert_achievements(
        &self,
        records: Vec<AchievementRecord>,
    ) -> Result<usize, ProgressError> {
        let mut store = self.store.write().await;
        let mut inserted = 0;

        for record in records {
            let user = store.user_mut(&record.user_id)?;
            if user.achievements.iter().any(|a| a.code == record.code) {
                debug!(user_id = %record.user_id, code = %record.code, "Skipping duplicate achievement");
                continue;
            }
            user.achievements.push(record);
            inserted += 1;
        }

        Ok(inserted)
    }

    async fn list_profiles(&self) -> Result<Vec<ProfileSnapshot>, ProgressError> {
        let store = self.store.read().await;
        Ok(store
            .registration_order
            .iter()
            .filter_map(|user_id| {
                store.users.get(user_id).map(|user| ProfileSnapshot {
                    user_id: user_id.clone(),
                    display_name: user.display_name.clone(),
                    progress: user.progress.clone().unwrap_or_default(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, d).unwrap()
    }

    fn record(user_id: &str, code: &str) -> AchievementRecord {
        AchievementRecord {
            user_id: user_id.to_string(),
            code: code.to_string(),
            name: code.to_string(),
            earned_on: day(1),
        }
    }

    #[tokio::test]
    async fn upsert_replaces_entry_for_same_habit_and_day() {
        let repo = InMemoryProgressRepository::new();
        repo.register_user_with_id("u1", "Ana").await;

        repo.upsert_log("u1", HabitLogEntry::missed("read", day(2)))
            .await
            .unwrap();
        repo.upsert_log("u1", HabitLogEntry::completed("read", day(2), 12))
            .await
            .unwrap();
        repo.upsert_log("u1", HabitLogEntry::completed("run", day(2), 10))
            .await
            .unwrap();

        let logs = repo.list_logs("u1").await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs
            .iter()
            .any(|l| l.habit_id == "read" && l.completed && l.points_awarded == 12));
    }

    #[tokio::test]
    async fn insert_achievements_skips_duplicates() {
        let repo = InMemoryProgressRepository::new();
        repo.register_user_with_id("u1", "Ana").await;
        repo.register_user_with_id("u2", "Bruno").await;

        let first = repo
            .insert_achievements(vec![record("u1", "medalla_7"), record("u2", "medalla_7")])
            .await
            .unwrap();
        let second = repo
            .insert_achievements(vec![record("u1", "medalla_7"), record("u1", "racha_semana")])
            .await
            .unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 1);
        assert_eq!(repo.list_achievements("u1").await.unwrap().len(), 2);
        assert_eq!(repo.list_achievements("u2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn writes_for_unknown_user_fail() {
        let repo = InMemoryProgressRepository::new();

        let result = repo
            .save_progress("ghost", UserProgressState::default())
            .await;
        assert!(matches!(result, Err(ProgressError::NotFound(_))));

        let result = repo
            .add_habit("ghost", HabitAttributes::new("read", 10, None))
            .await;
        assert!(matches!(result, Err(ProgressError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_profiles_keeps_registration_order_and_defaults() {
        let repo = InMemoryProgressRepository::new();
        repo.register_user_with_id("u1", "Ana").await;
        repo.register_user_with_id("u2", "Bruno").await;
        repo.save_progress(
            "u2",
            UserProgressState {
                total_points: 40,
                ..UserProgressState::default()
            },
        )
        .await
        .unwrap();

        let profiles = repo.list_profiles().await.unwrap();
        let names: Vec<&str> = profiles.iter().map(|p| p.display_name.as_str()).collect();

        assert_eq!(names, vec!["Ana", "Bruno"]);
        assert_eq!(profiles[0].progress, UserProgressState::default());
        assert_eq!(profiles[1].progress.total_points, 40);
    }

    #[tokio::test]
    async fn register_user_generates_unique_ids() {
        let repo = InMemoryProgressRepository::new();
        let a = repo.register_user("Ana").await;
        let b = repo.register_user("Ana").await;

        assert_ne!(a, b);
        assert_eq!(repo.user_count().await, 2);
    }
}
