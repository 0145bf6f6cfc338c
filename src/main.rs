use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use habitmaster::{
    progress::{HabitAttributes, InMemoryProgressRepository, ProgressService},
    Difficulty, EngineConfig,
};
use rand::Rng;
use strum::IntoEnumIterator;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "habitmaster=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env()?;
    let rules = config.load_rules()?;
    info!(?config, "Starting habitmaster demo");

    let repository = Arc::new(InMemoryProgressRepository::new());
    let service = ProgressService::builder(repository.clone())
        .with_rules(rules)
        .build();

    let mut users = Vec::with_capacity(config.demo_users);
    for _ in 0..config.demo_users {
        let display_name = petname::Petnames::default().generate_one(2, "-");
        let user_id = repository.register_user(&display_name).await;
        for difficulty in Difficulty::iter() {
            let habit = HabitAttributes::new(difficulty.as_str(), 10, Some(difficulty));
            repository.add_habit(&user_id, habit).await?;
        }
        users.push((user_id, display_name));
    }

    let today = Local::now().date_naive();
    let plan = completion_plan(&users, today, config.demo_days);
    info!(completions = plan.len(), "Replaying simulated completions");

    for (user_id, habit_id, completed_on) in plan {
        if let Err(err) = service
            .complete_habit(&user_id, &habit_id, completed_on)
            .await
        {
            warn!(?err, user_id = %user_id, habit_id = %habit_id, "Completion rejected");
        }
    }

    for (user_id, display_name) in &users {
        let dashboard = service.dashboard(user_id, today).await?;
        info!(
            display_name = %display_name,
            streak = dashboard.streak,
            active_streak = dashboard.active_streak,
            level = dashboard.level.level,
            achievements = ?dashboard.achievements,
            "Dashboard"
        );
    }

    let ranking = service.ranking().await?;
    println!("{}", serde_json::to_string_pretty(&ranking)?);

    Ok(())
}

/// Random completions over the last `days` days, oldest first.
fn completion_plan(
    users: &[(String, String)],
    today: NaiveDate,
    days: u32,
) -> Vec<(String, String, NaiveDate)> {
    let mut rng = rand::rng();
    let mut plan = Vec::new();

    for offset in (0..days).rev() {
        let date = today - Duration::days(offset as i64);
        for (user_id, _) in users {
            for difficulty in Difficulty::iter() {
                if rng.random_bool(0.6) {
                    plan.push((user_id.clone(), difficulty.as_str().to_string(), date));
                }
            }
        }
    }
    plan
}
