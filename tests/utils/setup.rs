use std::sync::Arc;

use chrono::NaiveDate;
use habitmaster::{
    progress::RuleTables, Difficulty, HabitAttributes, InMemoryProgressRepository,
    ProgressService,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub fn day(month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, d).unwrap()
}

pub struct TestSetup {
    pub repository: Arc<InMemoryProgressRepository>,
    pub service: Arc<ProgressService>,
    pub users: Vec<String>,
}

pub struct TestSetupBuilder {
    users: Vec<String>,
    habits: Vec<HabitAttributes>,
    rules: RuleTables,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            users: vec![],
            habits: vec![],
            rules: RuleTables::default(),
        }
    }

    pub fn with_users(mut self, users: Vec<&str>) -> Self {
        self.users = users.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_four_users(self) -> Self {
        self.with_users(vec!["alice", "bob", "charlie", "david"])
    }

    pub fn with_habit(
        mut self,
        id: &str,
        points_value: u32,
        difficulty: Option<Difficulty>,
    ) -> Self {
        self.habits
            .push(HabitAttributes::new(id, points_value, difficulty));
        self
    }

    #[allow(dead_code)]
    pub fn with_rules(mut self, rules: RuleTables) -> Self {
        self.rules = rules;
        self
    }

    pub async fn build(self) -> TestSetup {
        let repository = Arc::new(InMemoryProgressRepository::new());

        for user in &self.users {
            repository.register_user_with_id(user, user).await;
            for habit in &self.habits {
                repository
                    .add_habit(user, habit.clone())
                    .await
                    .expect("registered user should accept habits");
            }
        }

        let service = Arc::new(
            ProgressService::builder(repository.clone())
                .with_rules(self.rules)
                .build(),
        );

        TestSetup {
            repository,
            service,
            users: self.users,
        }
    }
}
